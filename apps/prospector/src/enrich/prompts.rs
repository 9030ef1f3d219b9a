// All LLM prompt constants for the enrichment collaborators. The JSON-only
// and no-fabrication fragments come from llm_client::prompts and are
// appended to the system prompts at call time.

/// System prompt for posting parsing.
pub const POSTING_PARSE_SYSTEM: &str =
    "You are an analyst extracting sales intelligence from job postings. \
    Given one posting, extract the hiring company's name, the operational \
    pain points implied by the posting, and the skills requested.";

/// Posting parse template. Replace `{title}`, `{description}`, `{company}`
/// before sending.
pub const POSTING_PARSE_TEMPLATE: &str = r#"Extract structured fields from this job posting.

Return a JSON object with this EXACT schema (no extra fields):
{
  "company_name": "Acme HVAC" or null,
  "pain_points": ["can't keep up with service calls"],
  "skills": ["EPA certification", "residential HVAC"]
}

Rules:
- company_name: the actual hiring company, not the job board. Use null if unclear.
- pain_points: operational problems the posting implies (max 5). Empty array if none.
- skills: concrete skills/certifications requested (max 8). Empty array if none.

Board-listed company: {company}
Title: {title}
Description:
{description}
"#;

/// System prompt for company research.
pub const RESEARCH_SYSTEM: &str =
    "You are a B2B sales researcher. Summarize what is publicly inferable \
    about a company from its name and location.";

/// Research template. Replace `{company}` and `{location}` before sending.
pub const RESEARCH_TEMPLATE: &str = r#"Research this company for a sales outreach brief.

Return a JSON object with this EXACT schema (no extra fields):
{
  "summary": "Two-sentence overview" or null,
  "website": "https://..." or null,
  "employee_estimate": 40 or null
}

Company: {company}
Location: {location}
"#;
