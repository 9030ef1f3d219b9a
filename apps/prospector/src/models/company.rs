//! Company grouping — attributes postings to companies for one run.
//!
//! Groups are built exactly once per run and never mutated afterwards;
//! downstream stages only select subsets. Grouping is deterministic: the
//! same postings always produce the same groups in the same order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::job::JobPosting;

/// Fallback name when a posting carries no usable company name.
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// A company name mapped to the ordered postings it was hiring for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyGroup {
    pub name: String,
    pub postings: Vec<JobPosting>,
}

impl CompanyGroup {
    /// Number of distinct posting locations (case-insensitive).
    pub fn distinct_locations(&self) -> usize {
        let mut seen: Vec<String> = Vec::new();
        for p in &self.postings {
            let loc = p.location.trim().to_lowercase();
            if !loc.is_empty() && !seen.contains(&loc) {
                seen.push(loc);
            }
        }
        seen.len()
    }

    /// All posting signal text joined, lowercased, for rule matching.
    pub fn combined_text(&self) -> String {
        self.postings
            .iter()
            .map(|p| p.signal_text().to_lowercase())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Groups postings by normalized company name.
///
/// Postings keep their scrape order within each group; groups come out
/// sorted by name so two runs over the same input are identical.
pub fn group_by_company(postings: Vec<JobPosting>) -> Vec<CompanyGroup> {
    let mut by_name: BTreeMap<String, Vec<JobPosting>> = BTreeMap::new();

    for posting in postings {
        let name = normalize_company_name(&posting.company);
        by_name.entry(name).or_default().push(posting);
    }

    by_name
        .into_iter()
        .map(|(name, postings)| CompanyGroup { name, postings })
        .collect()
}

/// Trims noise from a scraped company name; empty names become the
/// "Unknown Company" bucket rather than being dropped.
fn normalize_company_name(raw: &str) -> String {
    let cleaned = raw
        .trim()
        .trim_end_matches(|c: char| c == '.' || c == ',')
        .trim();

    if cleaned.is_empty() {
        UNKNOWN_COMPANY.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(company: &str, title: &str, location: &str) -> JobPosting {
        JobPosting {
            title: title.to_string(),
            url: format!("https://board.example/{company}/{title}"),
            description: "Great role".to_string(),
            location: location.to_string(),
            company: company.to_string(),
            posted_date: None,
        }
    }

    #[test]
    fn test_grouping_is_deterministic_and_sorted() {
        let postings = vec![
            posting("Zeta Plumbing", "Plumber", "Austin, TX"),
            posting("Acme HVAC", "Technician", "Dallas, TX"),
            posting("Acme HVAC", "Dispatcher", "Dallas, TX"),
        ];

        let groups_a = group_by_company(postings.clone());
        let groups_b = group_by_company(postings);

        assert_eq!(groups_a.len(), 2);
        assert_eq!(groups_a[0].name, "Acme HVAC");
        assert_eq!(groups_a[0].postings.len(), 2);
        assert_eq!(groups_a[1].name, "Zeta Plumbing");
        assert_eq!(
            serde_json::to_string(&groups_a).unwrap(),
            serde_json::to_string(&groups_b).unwrap(),
            "same input must produce identical groups"
        );
    }

    #[test]
    fn test_postings_keep_scrape_order_within_group() {
        let groups = group_by_company(vec![
            posting("Acme", "First", "Austin, TX"),
            posting("Acme", "Second", "Austin, TX"),
        ]);
        assert_eq!(groups[0].postings[0].title, "First");
        assert_eq!(groups[0].postings[1].title, "Second");
    }

    #[test]
    fn test_blank_company_goes_to_unknown_bucket() {
        let groups = group_by_company(vec![posting("  ", "Mystery Role", "Remote")]);
        assert_eq!(groups[0].name, UNKNOWN_COMPANY);
    }

    #[test]
    fn test_trailing_punctuation_stripped() {
        let groups = group_by_company(vec![
            posting("Acme Inc.", "Tech", "Austin, TX"),
            posting("Acme Inc", "Dispatcher", "Austin, TX"),
        ]);
        assert_eq!(groups.len(), 1, "names differing only by punctuation merge");
    }

    #[test]
    fn test_distinct_locations_ignores_case_and_blanks() {
        let group = CompanyGroup {
            name: "Acme".to_string(),
            postings: vec![
                posting("Acme", "A", "Austin, TX"),
                posting("Acme", "B", "austin, tx"),
                posting("Acme", "C", "Dallas, TX"),
                posting("Acme", "D", ""),
            ],
        };
        assert_eq!(group.distinct_locations(), 2);
    }
}
