// Deterministic growth-signal scoring.
// The scorer interprets the rule tables in `rules`; no I/O anywhere in this
// module, so results are reproducible run to run.

pub mod matcher;
pub mod rules;
pub mod scorer;
