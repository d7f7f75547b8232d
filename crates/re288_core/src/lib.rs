//! # re288_core - Count-Aware Run Expectancy
//!
//! Discrete-state run expectancy model for plate appearances. For each of the
//! 288 pre-pitch situations (outs × ball-strike count × base occupancy) it
//! computes the mean runs scored through the end of the half-inning, and the
//! marginal run value of a strike, ball or foul in that situation.
//!
//! ## Pipeline
//! 1. [`dataset::annotate`] - raw pitch rows to (situation, category, runs to score)
//! 2. [`aggregate::aggregate`] - per-situation expectancy and frequencies
//! 3. [`propagate::propagate`] - successor states, value changes, scorecards
//! 4. [`export`] - count tables and the keyed record set
//!
//! Unobserved situations carry `None` expectancy all the way to the output.

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod outcome;
pub mod propagate;
pub mod situation;
pub mod transition;

pub use aggregate::{aggregate, Aggregation, SituationStats};
pub use config::{ModelConfig, SeasonWindow, SwapWeighting, CONFIG_PATH_ENV};
pub use dataset::{annotate, filter_season, AnnotatedPitch, HalfInning, HalfInningId, PitchEvent};
pub use error::{ModelError, Result};
pub use export::{expectancy_table, record_map, value_table, CountTable, ExportedState, TableRow};
pub use outcome::{Outcome, PerOutcome, PitchCategory};
pub use propagate::{propagate, Scorecard, SituationRecord, ValueModel};
pub use situation::{Bases, Situation, StateKey, SITUATION_COUNT};
pub use transition::{successors, transition, transition_key};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Annotate, aggregate and propagate in one call.
pub fn build_model(events: &[PitchEvent], config: &ModelConfig) -> Result<ValueModel> {
    let pitches = annotate(events);
    build_model_from_pitches(&pitches, config)
}

/// Aggregate and propagate already annotated pitches.
pub fn build_model_from_pitches(
    pitches: &[AnnotatedPitch],
    config: &ModelConfig,
) -> Result<ValueModel> {
    let aggregation = aggregate(pitches, config.parallel_threshold)?;
    if log::log_enabled!(log::Level::Debug) {
        let unobserved: Vec<String> = aggregation.unobserved().map(|s| s.key()).collect();
        if !unobserved.is_empty() {
            log::debug!("Unobserved situations: {}", unobserved.join(", "));
        }
    }
    Ok(propagate(&aggregation, config.swap_weighting))
}
