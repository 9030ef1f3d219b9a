//! Growth-signal scoring — deterministic, weighted, multi-signal.
//!
//! `LeadScorer` is the pluggable seam: the default `KeywordLeadScorer` is a
//! pure interpreter over the rule tables in `scoring::rules`; an ML-backed
//! scorer would implement the same trait. The core is `compute_lead_score`,
//! a pure function of (company group, weights, thresholds) — rescoring the
//! same inputs always yields an identical result.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;
use crate::models::company::CompanyGroup;
use crate::scoring::rules::{self, category};

/// Evidence snippets kept per category for human review.
const MAX_SNIPPETS_PER_CATEGORY: usize = 10;

/// Multiplicative bonuses, applied after the weighted base in this order.
const EXPANSION_MULTIPLIER: f64 = 1.25;
const CROSS_FUNCTIONAL_MULTIPLIER: f64 = 1.15;
const CAPACITY_MULTIPLIER: f64 = 1.10;
/// Capacity-stress matches needed before the capacity multiplier fires.
const CAPACITY_MULTIPLIER_MIN: usize = 2;

/// Qualification bucket derived from the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Hot,
    Qualified,
    Potential,
    Skip,
}

/// Component weights. Must sum to 1.0 so the maximum attainable base is 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub velocity: f64,
    pub growth: f64,
    pub expansion: f64,
    pub maturity: f64,
}

impl Default for ScoringWeights {
    /// Canonical profile: hiring velocity carries the majority share.
    fn default() -> Self {
        Self {
            velocity: 0.55,
            growth: 0.20,
            expansion: 0.15,
            maturity: 0.10,
        }
    }
}

impl ScoringWeights {
    /// Deprecated balanced profile kept for comparison against historical
    /// scores. Not selectable from configuration.
    pub fn legacy_balanced() -> Self {
        Self {
            velocity: 0.30,
            growth: 0.30,
            expansion: 0.25,
            maturity: 0.15,
        }
    }

    pub fn sum(&self) -> f64 {
        self.velocity + self.growth + self.expansion + self.maturity
    }
}

/// Tier floors. Monotonic: hot > qualified > potential > 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierThresholds {
    pub hot: f64,
    pub qualified: f64,
    pub potential: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            hot: 75.0,
            qualified: 45.0,
            potential: 25.0,
        }
    }
}

impl TierThresholds {
    pub fn classify(&self, total_score: f64) -> Tier {
        if total_score >= self.hot {
            Tier::Hot
        } else if total_score >= self.qualified {
            Tier::Qualified
        } else if total_score >= self.potential {
            Tier::Potential
        } else {
            Tier::Skip
        }
    }

    pub fn is_monotonic(&self) -> bool {
        self.hot > self.qualified && self.qualified > self.potential && self.potential > 0.0
    }
}

/// Which signal categories matched, how strongly, and representative
/// snippets. Read-only justification — never feeds back into the score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalEvidence {
    pub expansion_language_found: bool,
    pub high_volume_hiring: bool,
    pub cross_functional_hiring: bool,
    pub structured_recruiting: bool,
    pub distinct_locations: usize,
    /// category → up to 10 matched phrases.
    pub matched: BTreeMap<String, Vec<String>>,
}

impl SignalEvidence {
    fn record(&mut self, cat: &str, mut hits: Vec<String>) {
        if hits.is_empty() {
            return;
        }
        hits.truncate(MAX_SNIPPETS_PER_CATEGORY);
        self.matched.insert(cat.to_string(), hits);
    }

    pub fn match_count(&self, cat: &str) -> usize {
        self.matched.get(cat).map_or(0, Vec::len)
    }

    /// Coarse growth-signal strength in [0, 1], used to gate the optional
    /// research stage. Fraction of the five headline signals present.
    pub fn signal_strength(&self) -> f64 {
        let hits = [
            self.expansion_language_found,
            self.high_volume_hiring,
            self.cross_functional_hiring,
            self.match_count(category::CAPACITY_STRESS) > 0,
            self.distinct_locations >= 2,
        ]
        .iter()
        .filter(|b| **b)
        .count();
        hits as f64 / 5.0
    }
}

/// Final scoring output for one company. Immutable; rescoring produces a new
/// value rather than mutating this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    pub company_name: String,
    /// component name → raw component score in [0, 100], pre-weighting.
    pub component_scores: BTreeMap<String, f64>,
    pub multiplier: f64,
    pub total_score: f64,
    pub tier: Tier,
    /// Business-rule exclusion, distinct from a processing error.
    pub disqualified: bool,
    pub evidence: SignalEvidence,
}

/// The pluggable scorer seam. Held as `Arc<dyn LeadScorer>` by the
/// orchestrator so an ML backend can be swapped in without touching it.
#[async_trait]
pub trait LeadScorer: Send + Sync {
    async fn score(&self, group: &CompanyGroup) -> Result<ScoreResult, PipelineError>;
}

/// Default deterministic scorer: pure rule-table interpretation, no I/O.
pub struct KeywordLeadScorer {
    pub weights: ScoringWeights,
    pub thresholds: TierThresholds,
}

impl Default for KeywordLeadScorer {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            thresholds: TierThresholds::default(),
        }
    }
}

#[async_trait]
impl LeadScorer for KeywordLeadScorer {
    async fn score(&self, group: &CompanyGroup) -> Result<ScoreResult, PipelineError> {
        Ok(compute_lead_score(group, &self.weights, &self.thresholds))
    }
}

/// Extracts all signal evidence for a group. Pure; safe to call repeatedly.
pub fn extract_evidence(group: &CompanyGroup) -> SignalEvidence {
    let text = group.combined_text();
    let titles = group
        .postings
        .iter()
        .map(|p| p.title.to_lowercase())
        .collect::<Vec<_>>()
        .join("\n");

    let mut evidence = SignalEvidence::default();

    let expansion = rules::phrases_in(&text, rules::EXPANSION_PHRASES);
    evidence.expansion_language_found = !expansion.is_empty();
    evidence.record(category::EXPANSION, expansion);

    evidence.record(
        category::CAPACITY_STRESS,
        rules::phrases_in(&text, rules::CAPACITY_STRESS_PHRASES),
    );
    evidence.record(
        category::REVENUE_ROLE,
        rules::phrases_in(&titles, rules::REVENUE_ROLE_TITLES),
    );

    let buckets = rules::buckets_in(&titles, rules::ROLE_BUCKETS);
    evidence.cross_functional_hiring = buckets.len() >= 2;
    evidence.record(category::ROLE_BUCKET, buckets);

    evidence.record(
        category::TOOLING,
        rules::buckets_in(&text, rules::TOOLING_CATEGORIES),
    );

    evidence.structured_recruiting =
        !rules::phrases_in(&text, rules::STRUCTURED_RECRUITING_PHRASES).is_empty();
    evidence.high_volume_hiring = rules::detects_high_volume(&text);
    evidence.distinct_locations = group.distinct_locations();

    evidence
}

/// Disqualification check: agency/staffing markers in the company name or
/// spam markers in the posting text. Returns the matched phrases.
fn disqualifiers_for(group: &CompanyGroup) -> Vec<String> {
    let name = group.name.to_lowercase();
    let mut hits = rules::phrases_in(&name, rules::DISQUALIFIER_NAME);
    hits.extend(rules::phrases_in(
        &group.combined_text(),
        rules::DISQUALIFIER_TEXT,
    ));
    hits
}

/// Step function of posting count. Velocity is the dominant signal: ≥10
/// postings maxes it out, 1–2 barely registers.
pub fn velocity_score(posting_count: usize) -> f64 {
    match posting_count {
        0 => 0.0,
        1..=2 => 15.0,
        3..=4 => 45.0,
        5..=6 => 65.0,
        7..=9 => 85.0,
        _ => 100.0,
    }
}

fn growth_score(evidence: &SignalEvidence) -> f64 {
    let mut score = 0.0;
    if evidence.cross_functional_hiring {
        score += 25.0;
    }
    score += (evidence.match_count(category::REVENUE_ROLE).min(5) * 5) as f64;
    score += (evidence.match_count(category::CAPACITY_STRESS).min(5) * 5) as f64;
    if evidence.high_volume_hiring {
        score += 25.0;
    }
    score.min(100.0)
}

fn expansion_score(evidence: &SignalEvidence) -> f64 {
    let phrases = evidence.match_count(category::EXPANSION);
    let mut score: f64 = 0.0;
    if phrases >= 1 {
        score += 60.0;
    }
    if evidence.distinct_locations >= 2 {
        score += 25.0;
    }
    if phrases >= 3 {
        score += 15.0;
    }
    score.min(100.0)
}

fn maturity_score(evidence: &SignalEvidence) -> f64 {
    let mut score = (evidence.match_count(category::TOOLING).min(4) * 20) as f64;
    if evidence.structured_recruiting {
        score += 20.0;
    }
    score.min(100.0)
}

/// Scores one company. Disqualification dominates: a single agency/spam hit
/// short-circuits to Skip with total 0 no matter what else matched.
pub fn compute_lead_score(
    group: &CompanyGroup,
    weights: &ScoringWeights,
    thresholds: &TierThresholds,
) -> ScoreResult {
    let disqualifiers = disqualifiers_for(group);
    if !disqualifiers.is_empty() {
        let mut evidence = SignalEvidence::default();
        evidence.record(category::DISQUALIFIER, disqualifiers);
        return ScoreResult {
            company_name: group.name.clone(),
            component_scores: BTreeMap::new(),
            multiplier: 1.0,
            total_score: 0.0,
            tier: Tier::Skip,
            disqualified: true,
            evidence,
        };
    }

    let evidence = extract_evidence(group);

    let mut component_scores = BTreeMap::new();
    component_scores.insert(
        category::VELOCITY.to_string(),
        velocity_score(group.postings.len()),
    );
    component_scores.insert(category::GROWTH.to_string(), growth_score(&evidence));
    component_scores.insert(
        category::EXPANSION_SCORE.to_string(),
        expansion_score(&evidence),
    );
    component_scores.insert(category::MATURITY.to_string(), maturity_score(&evidence));

    let base_score = component_scores[category::VELOCITY] * weights.velocity
        + component_scores[category::GROWTH] * weights.growth
        + component_scores[category::EXPANSION_SCORE] * weights.expansion
        + component_scores[category::MATURITY] * weights.maturity;

    // Multipliers compound in fixed order, strictly after the base.
    let mut multiplier = 1.0;
    if evidence.expansion_language_found {
        multiplier *= EXPANSION_MULTIPLIER;
    }
    if evidence.cross_functional_hiring {
        multiplier *= CROSS_FUNCTIONAL_MULTIPLIER;
    }
    if evidence.match_count(category::CAPACITY_STRESS) >= CAPACITY_MULTIPLIER_MIN {
        multiplier *= CAPACITY_MULTIPLIER;
    }

    let total_score = (base_score * multiplier).clamp(0.0, 100.0);

    ScoreResult {
        company_name: group.name.clone(),
        component_scores,
        multiplier,
        total_score,
        tier: thresholds.classify(total_score),
        disqualified: false,
        evidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::{JobPosting, QUICK_SCAN_PLACEHOLDER};

    fn posting(company: &str, title: &str, description: &str, location: &str) -> JobPosting {
        JobPosting {
            title: title.to_string(),
            url: format!("https://board.example/{}/{}", company, title.replace(' ', "-")),
            description: description.to_string(),
            location: location.to_string(),
            company: company.to_string(),
            posted_date: None,
        }
    }

    fn group(name: &str, postings: Vec<JobPosting>) -> CompanyGroup {
        CompanyGroup {
            name: name.to_string(),
            postings,
        }
    }

    fn score(group: &CompanyGroup) -> ScoreResult {
        compute_lead_score(
            group,
            &ScoringWeights::default(),
            &TierThresholds::default(),
        )
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let g = group(
            "Acme HVAC",
            vec![
                posting("Acme HVAC", "HVAC Technician", "We're expanding fast", "Austin, TX"),
                posting("Acme HVAC", "Sales Estimator", "urgent need for estimators", "Dallas, TX"),
                posting("Acme HVAC", "Dispatcher", "quickbooks experience a plus", "Austin, TX"),
            ],
        );
        let a = score(&g);
        let b = score(&g);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap(),
            "identical inputs must produce identical results"
        );
    }

    #[test]
    fn test_total_score_bounded() {
        // Everything fires at once: every multiplier, every component.
        let description = "We're expanding fast, new location opening our second office. \
            Rapid growth, can't keep up, overwhelmed by backlog, urgent need. \
            We use salesforce, servicetitan, quickbooks, zapier, tableau. \
            Structured interview process. Hiring 25+ technicians.";
        let postings: Vec<_> = (0..12)
            .map(|i| {
                let title = if i % 2 == 0 { "HVAC Technician" } else { "Sales Manager" };
                let mut p = posting("Acme", title, description, "Austin, TX");
                p.url = format!("https://board.example/acme/{i}");
                p.location = format!("City {i}, TX");
                p
            })
            .collect();
        let result = score(&group("Acme", postings));
        assert!(result.total_score <= 100.0, "got {}", result.total_score);
        assert!(result.total_score >= 0.0);
        assert!(result.multiplier > 1.0, "all multipliers should have fired");
        assert_eq!(result.tier, Tier::Hot);
    }

    #[test]
    fn test_disqualification_dominates_positive_signals() {
        // 10 postings full of strong signals, but the name is an agency.
        let postings: Vec<_> = (0..10)
            .map(|i| {
                let mut p = posting(
                    "Apex Staffing Solutions",
                    "HVAC Technician",
                    "We're expanding, hiring 20+ technicians",
                    "Austin, TX",
                );
                p.url = format!("https://board.example/apex/{i}");
                p
            })
            .collect();
        let result = score(&group("Apex Staffing Solutions", postings));
        assert_eq!(result.tier, Tier::Skip);
        assert_eq!(result.total_score, 0.0);
        assert!(result.disqualified);
        assert!(
            result.component_scores.is_empty(),
            "disqualification short-circuits component scoring"
        );
        assert!(result.evidence.matched.contains_key(category::DISQUALIFIER));
    }

    #[test]
    fn test_disqualification_by_posting_text() {
        let g = group(
            "Plainly Named LLC",
            vec![posting(
                "Plainly Named LLC",
                "Technician",
                "Our client is seeking a technician",
                "Austin, TX",
            )],
        );
        let result = score(&g);
        assert!(result.disqualified);
        assert_eq!(result.tier, Tier::Skip);
    }

    #[test]
    fn test_velocity_is_monotonic_in_posting_count() {
        let mut last = -1.0;
        for count in 0..15 {
            let v = velocity_score(count);
            assert!(v >= last, "velocity regressed at count {count}");
            last = v;
        }
        assert_eq!(velocity_score(10), 100.0);
    }

    #[test]
    fn test_more_postings_never_score_lower_velocity_component() {
        let make = |n: usize| {
            let postings: Vec<_> = (0..n)
                .map(|i| {
                    let mut p = posting("Acme", "Technician", "Join our team", "Austin, TX");
                    p.url = format!("https://board.example/acme/{i}");
                    p
                })
                .collect();
            score(&group("Acme", postings))
        };
        let smaller = make(3);
        let bigger = make(8);
        assert!(
            bigger.component_scores[category::VELOCITY]
                >= smaller.component_scores[category::VELOCITY]
        );
    }

    #[test]
    fn test_happy_path_expansion_and_high_volume() {
        // 3 postings, "we're expanding", "hiring 12+ technicians".
        let g = group(
            "Acme Corp",
            vec![
                posting("Acme Corp", "HVAC Technician", "We're expanding across the metro. Hiring 12+ technicians.", "Austin, TX"),
                posting("Acme Corp", "HVAC Technician II", "We're expanding. Join us.", "Austin, TX"),
                posting("Acme Corp", "Service Technician", "Great benefits.", "Austin, TX"),
            ],
        );
        let result = score(&g);
        assert!(result.evidence.expansion_language_found);
        assert!(result.evidence.high_volume_hiring);
        assert!(
            matches!(result.tier, Tier::Hot | Tier::Qualified),
            "expected HOT or QUALIFIED, got {:?} at {}",
            result.tier,
            result.total_score
        );
    }

    #[test]
    fn test_quick_scan_postings_score_on_titles_only() {
        let g = group(
            "Acme Corp",
            vec![
                posting("Acme Corp", "Sales Estimator", QUICK_SCAN_PLACEHOLDER, "Austin, TX"),
                posting("Acme Corp", "HVAC Technician", QUICK_SCAN_PLACEHOLDER, "Dallas, TX"),
                posting("Acme Corp", "Dispatcher", QUICK_SCAN_PLACEHOLDER, "Austin, TX"),
            ],
        );
        let result = score(&g);
        // Titles alone still establish cross-functional hiring and a velocity
        // score; the placeholder text contributes nothing.
        assert!(result.evidence.cross_functional_hiring);
        assert!(result.total_score > 0.0);
        assert!(!result.disqualified);
    }

    #[test]
    fn test_multipliers_compound_multiplicatively() {
        // Expansion + cross-functional + 2 stress phrases → all three fire.
        let g = group(
            "Acme Corp",
            vec![
                posting("Acme Corp", "HVAC Technician", "We're expanding. Overwhelmed with demand, can't keep up.", "Austin, TX"),
                posting("Acme Corp", "Sales Estimator", "Urgent role", "Austin, TX"),
                posting("Acme Corp", "Dispatcher", "Great team", "Austin, TX"),
            ],
        );
        let result = score(&g);
        let expected =
            EXPANSION_MULTIPLIER * CROSS_FUNCTIONAL_MULTIPLIER * CAPACITY_MULTIPLIER;
        assert!(
            (result.multiplier - expected).abs() < 1e-9,
            "expected compounded {expected}, got {}",
            result.multiplier
        );
    }

    #[test]
    fn test_evidence_snippets_capped_at_ten() {
        let evidence = {
            let mut e = SignalEvidence::default();
            e.record(
                category::EXPANSION,
                (0..20).map(|i| format!("phrase {i}")).collect(),
            );
            e
        };
        assert_eq!(evidence.match_count(category::EXPANSION), 10);
    }

    #[test]
    fn test_signal_strength_counts_headline_signals() {
        let mut evidence = SignalEvidence::default();
        assert_eq!(evidence.signal_strength(), 0.0);
        evidence.expansion_language_found = true;
        evidence.high_volume_hiring = true;
        assert!((evidence.signal_strength() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((ScoringWeights::default().sum() - 1.0).abs() < 1e-9);
        assert!((ScoringWeights::legacy_balanced().sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_weight_is_majority_share() {
        let w = ScoringWeights::default();
        assert!(w.velocity > 0.5, "velocity must dominate by design");
    }

    #[test]
    fn test_default_thresholds_are_monotonic() {
        assert!(TierThresholds::default().is_monotonic());
    }

    #[test]
    fn test_tier_classification_boundaries() {
        let t = TierThresholds::default();
        assert_eq!(t.classify(90.0), Tier::Hot);
        assert_eq!(t.classify(75.0), Tier::Hot);
        assert_eq!(t.classify(60.0), Tier::Qualified);
        assert_eq!(t.classify(30.0), Tier::Potential);
        assert_eq!(t.classify(10.0), Tier::Skip);
    }

    #[tokio::test]
    async fn test_keyword_scorer_trait_matches_pure_function() {
        let g = group(
            "Acme Corp",
            vec![posting("Acme Corp", "Technician", "We're expanding", "Austin, TX")],
        );
        let scorer = KeywordLeadScorer::default();
        let via_trait = scorer.score(&g).await.unwrap();
        let direct = compute_lead_score(
            &g,
            &ScoringWeights::default(),
            &TierThresholds::default(),
        );
        assert_eq!(via_trait.total_score, direct.total_score);
        assert_eq!(via_trait.tier, direct.tier);
    }
}
