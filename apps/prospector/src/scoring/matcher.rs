//! Service-opportunity matching — maps scored evidence to the services we
//! would pitch. Pure and rule-driven, same spirit as the scorer: the numeric
//! score is never changed here, only interpreted.

use serde::{Deserialize, Serialize};

use crate::models::company::CompanyGroup;
use crate::scoring::rules::category;
use crate::scoring::scorer::ScoreResult;

/// One service we could offer a company, with the evidence-backed reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOpportunity {
    pub service: String,
    pub rationale: String,
}

/// Number of postings at which recruiting volume alone justifies a pitch.
const RECRUITING_VOLUME_FLOOR: usize = 7;

/// Derives service opportunities from a score result. Deterministic: rules
/// are checked in a fixed order, so output order is stable.
pub fn match_opportunities(group: &CompanyGroup, score: &ScoreResult) -> Vec<ServiceOpportunity> {
    let mut opportunities = Vec::new();

    if score.disqualified {
        return opportunities;
    }
    let evidence = &score.evidence;

    if evidence.expansion_language_found || evidence.distinct_locations >= 2 {
        opportunities.push(ServiceOpportunity {
            service: "Multi-site expansion consulting".to_string(),
            rationale: format!(
                "Expansion language ({} phrase(s)) across {} location(s)",
                evidence.match_count(category::EXPANSION),
                evidence.distinct_locations.max(1)
            ),
        });
    }

    if evidence.high_volume_hiring || group.postings.len() >= RECRUITING_VOLUME_FLOOR {
        opportunities.push(ServiceOpportunity {
            service: "High-volume recruiting automation".to_string(),
            rationale: format!(
                "{} open postings{}",
                group.postings.len(),
                if evidence.high_volume_hiring {
                    ", explicit bulk-hiring language"
                } else {
                    ""
                }
            ),
        });
    }

    if evidence.match_count(category::CAPACITY_STRESS) > 0 {
        opportunities.push(ServiceOpportunity {
            service: "Capacity planning and scheduling".to_string(),
            rationale: format!(
                "{} capacity-stress signal(s) in posting text",
                evidence.match_count(category::CAPACITY_STRESS)
            ),
        });
    }

    if evidence.match_count(category::TOOLING) == 0 {
        opportunities.push(ServiceOpportunity {
            service: "CRM and back-office tooling setup".to_string(),
            rationale: "No operational tooling mentioned in any posting".to_string(),
        });
    }

    if evidence.cross_functional_hiring {
        opportunities.push(ServiceOpportunity {
            service: "Org design and hiring roadmap".to_string(),
            rationale: format!(
                "Hiring across {} role categories at once",
                evidence.match_count(category::ROLE_BUCKET)
            ),
        });
    }

    opportunities
}
