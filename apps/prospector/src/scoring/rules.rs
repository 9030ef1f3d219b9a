//! Declarative signal rule tables.
//!
//! Every keyword heuristic the scorer uses lives here as data; the scorer is
//! an interpreter over these tables. Matching is lowercase substring search
//! against `JobPosting::signal_text`, except the high-volume pattern which
//! is a regex. Keep phrases lowercase.

use std::sync::LazyLock;

use regex::Regex;

/// Category keys used in `SignalEvidence::matched` and
/// `ScoreResult::component_scores`. Kept as constants so evidence, scoring,
/// and opportunity matching agree on spelling.
pub mod category {
    pub const DISQUALIFIER: &str = "disqualifier";
    pub const EXPANSION: &str = "expansion";
    pub const CAPACITY_STRESS: &str = "capacity_stress";
    pub const REVENUE_ROLE: &str = "revenue_role";
    pub const TOOLING: &str = "tooling";
    pub const ROLE_BUCKET: &str = "role_bucket";

    pub const VELOCITY: &str = "hiring_velocity";
    pub const GROWTH: &str = "growth_signals";
    pub const EXPANSION_SCORE: &str = "expansion_indicators";
    pub const MATURITY: &str = "operational_maturity";
}

/// Staffing/agency/spam markers. A hit in the company name or combined
/// posting text disqualifies the company outright.
pub static DISQUALIFIER_NAME: &[&str] = &[
    "staffing",
    "recruiting agency",
    "recruitment agency",
    "talent solutions",
    "talent acquisition",
    "headhunt",
    "temp agency",
    "employment agency",
];

pub static DISQUALIFIER_TEXT: &[&str] = &[
    "our client is seeking",
    "on behalf of our client",
    "confidential client",
    "no experience necessary, start today",
    "work from home and earn",
];

/// Explicit expansion language.
pub static EXPANSION_PHRASES: &[&str] = &[
    "we're expanding",
    "we are expanding",
    "expanding to",
    "expanding into",
    "new location",
    "new office",
    "second location",
    "opening our",
    "now open in",
    "rapid growth",
    "rapidly growing",
    "fast-growing",
    "growing team",
    "scaling our",
];

/// Capacity-stress phrases: demand outrunning headcount.
pub static CAPACITY_STRESS_PHRASES: &[&str] = &[
    "can't keep up",
    "cannot keep up",
    "overwhelmed",
    "backlog",
    "booked out",
    "overbooked",
    "understaffed",
    "stretched thin",
    "urgent need",
    "immediate start",
    "start immediately",
    "demand is outpacing",
];

/// Revenue-driving role types, matched against posting titles.
pub static REVENUE_ROLE_TITLES: &[&str] = &[
    "sales",
    "account executive",
    "account manager",
    "business development",
    "partnerships",
    "revenue",
    "estimator",
];

/// Job-category buckets for cross-functional hiring detection,
/// matched against posting titles.
pub static ROLE_BUCKETS: &[(&str, &[&str])] = &[
    ("field_ops", &["technician", "installer", "plumber", "electrician", "mechanic", "driver", "crew"]),
    ("sales", &["sales", "account executive", "business development", "estimator"]),
    ("office_ops", &["dispatcher", "scheduler", "office manager", "coordinator", "admin"]),
    ("marketing", &["marketing", "content", "seo", "social media"]),
    ("finance", &["bookkeeper", "accountant", "controller", "finance", "payroll"]),
    ("support", &["customer service", "customer support", "csr", "receptionist"]),
    ("management", &["supervisor", "manager", "director", "lead", "foreman"]),
];

/// Operational tooling categories. The number of distinct categories matched
/// feeds the maturity score.
pub static TOOLING_CATEGORIES: &[(&str, &[&str])] = &[
    ("crm", &["salesforce", "hubspot", " crm"]),
    ("scheduling", &["servicetitan", "jobber", "housecall pro", "calendly", "scheduling software"]),
    ("accounting", &["quickbooks", "xero", "netsuite", "sage"]),
    ("automation", &["zapier", "automation", "automated workflows"]),
    ("data", &["tableau", "power bi", "looker", "reporting dashboards"]),
];

/// Markers of a structured recruiting process.
pub static STRUCTURED_RECRUITING_PHRASES: &[&str] = &[
    "interview process",
    "hiring process",
    "applicant tracking",
    "structured interview",
    "multi-stage interview",
];

/// Matches "hiring 12+", "adding 10+", "15+ openings", "20+ technicians" etc.
/// The captured count must meet `HIGH_VOLUME_MIN` to count as high volume.
pub static HIGH_VOLUME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:hiring|adding|add|bringing on)\s+(\d{1,3})\s*\+|\b(\d{1,3})\s*\+\s*(?:positions|openings|roles|people|hires|technicians|installers|drivers|reps)\b",
    )
    .expect("high-volume pattern is valid")
});

pub const HIGH_VOLUME_MIN: u32 = 5;

/// Returns true when `text` announces hiring at or above `HIGH_VOLUME_MIN`
/// heads, e.g. "hiring 12+ technicians".
pub fn detects_high_volume(text: &str) -> bool {
    HIGH_VOLUME_RE.captures_iter(text).any(|caps| {
        caps.iter()
            .skip(1)
            .flatten()
            .filter_map(|m| m.as_str().parse::<u32>().ok())
            .any(|n| n >= HIGH_VOLUME_MIN)
    })
}

/// All phrases from `phrases` found in `text` (text must be lowercased).
pub fn phrases_in(text: &str, phrases: &[&str]) -> Vec<String> {
    phrases
        .iter()
        .filter(|p| text.contains(*p))
        .map(|p| p.to_string())
        .collect()
}

/// Distinct bucket names from `table` whose any keyword appears in `text`.
pub fn buckets_in(text: &str, table: &[(&str, &[&str])]) -> Vec<String> {
    table
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(bucket, _)| bucket.to_string())
        .collect()
}
