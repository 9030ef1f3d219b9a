// Cross-cutting prompt fragments shared by the parser and research prompts.

/// Appended to every system prompt that expects structured output.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps the model from inventing facts about companies it cannot verify.
pub const NO_FABRICATION_INSTRUCTION: &str = "If you are not confident about a field, \
    use null rather than guessing. Never invent company details.";
