//! Empirical Aggregator
//!
//! Turns annotated pitches into per-situation statistics:
//! - `expected_runs`: mean runs still to score after the situation was observed
//! - `frequency`: situation count / all pitches
//! - `category_frequency[c]`: situation count with outcome c / all pitches with outcome c
//!
//! Denominators are whole-dataset totals, including pitches outside the
//! situation space. An unobserved situation has no expected runs (`None`).
//!
//! Counting is a fold over pitches; large datasets fold in parallel chunks on
//! the rayon pool and merge. Integer sums keep the result order-independent.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dataset::AnnotatedPitch;
use crate::error::{ModelError, Result};
use crate::outcome::{Outcome, PerOutcome};
use crate::situation::{Situation, SITUATION_COUNT};

/// Observed statistics for one situation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SituationStats {
    pub situation: Situation,
    pub observations: u64,
    pub expected_runs: Option<f64>,
    pub frequency: f64,
    /// `None` only when the whole dataset has no pitch of that outcome
    pub category_frequency: PerOutcome<Option<f64>>,
}

/// Aggregator output for the whole space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub total_events: u64,
    pub category_totals: PerOutcome<u64>,
    /// Pitches that matched no live situation
    pub out_of_space: u64,
    /// Indexed by [`Situation::index`]
    situations: Vec<SituationStats>,
}

impl Aggregation {
    pub fn get(&self, situation: Situation) -> &SituationStats {
        &self.situations[situation.index()]
    }

    pub fn expected_runs(&self, situation: Situation) -> Option<f64> {
        self.get(situation).expected_runs
    }

    /// All situations in index order
    pub fn iter(&self) -> impl Iterator<Item = &SituationStats> {
        self.situations.iter()
    }

    pub fn unobserved(&self) -> impl Iterator<Item = Situation> + '_ {
        self.situations
            .iter()
            .filter(|s| s.expected_runs.is_none())
            .map(|s| s.situation)
    }

    pub fn observed_count(&self) -> usize {
        self.situations
            .iter()
            .filter(|s| s.expected_runs.is_some())
            .count()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SituationTally {
    events: u64,
    runs: i64,
    outcomes: PerOutcome<u64>,
}

#[derive(Debug, Clone)]
struct Tally {
    events: u64,
    out_of_space: u64,
    outcomes: PerOutcome<u64>,
    situations: Vec<SituationTally>,
}

impl Tally {
    fn new() -> Self {
        Self {
            events: 0,
            out_of_space: 0,
            outcomes: PerOutcome::default(),
            situations: vec![SituationTally::default(); SITUATION_COUNT],
        }
    }

    fn record(mut self, pitch: &AnnotatedPitch) -> Self {
        self.events += 1;
        let outcome = pitch.category.outcome();
        if let Some(outcome) = outcome {
            self.outcomes[outcome] += 1;
        }

        match pitch.situation {
            Some(situation) => {
                let slot = &mut self.situations[situation.index()];
                slot.events += 1;
                slot.runs += i64::from(pitch.runs_to_score);
                if let Some(outcome) = outcome {
                    slot.outcomes[outcome] += 1;
                }
            }
            None => self.out_of_space += 1,
        }
        self
    }

    fn merge(mut self, other: Tally) -> Self {
        self.events += other.events;
        self.out_of_space += other.out_of_space;
        for outcome in Outcome::ALL {
            self.outcomes[outcome] += other.outcomes[outcome];
        }
        for (mine, theirs) in self.situations.iter_mut().zip(other.situations) {
            mine.events += theirs.events;
            mine.runs += theirs.runs;
            for outcome in Outcome::ALL {
                mine.outcomes[outcome] += theirs.outcomes[outcome];
            }
        }
        self
    }
}

/// Aggregate annotated pitches over the full situation space.
///
/// Datasets with at least `parallel_threshold` pitches are counted on the rayon pool.
pub fn aggregate(pitches: &[AnnotatedPitch], parallel_threshold: usize) -> Result<Aggregation> {
    if pitches.is_empty() {
        return Err(ModelError::EmptyDataset);
    }

    let tally = if pitches.len() >= parallel_threshold {
        pitches
            .par_iter()
            .fold(Tally::new, Tally::record)
            .reduce(Tally::new, Tally::merge)
    } else {
        pitches.iter().fold(Tally::new(), Tally::record)
    };

    let total = tally.events as f64;
    let totals = tally.outcomes;

    let situations: Vec<SituationStats> = Situation::all()
        .zip(&tally.situations)
        .map(|(situation, slot)| SituationStats {
            situation,
            observations: slot.events,
            expected_runs: (slot.events > 0).then(|| slot.runs as f64 / slot.events as f64),
            frequency: slot.events as f64 / total,
            category_frequency: PerOutcome::from_fn(|outcome| {
                let denominator = totals[outcome];
                (denominator > 0).then(|| slot.outcomes[outcome] as f64 / denominator as f64)
            }),
        })
        .collect();

    let aggregation = Aggregation {
        total_events: tally.events,
        category_totals: totals,
        out_of_space: tally.out_of_space,
        situations,
    };

    log::info!(
        "Aggregated {} pitches: {} of {} situations observed (S={}, B={}, F={})",
        aggregation.total_events,
        aggregation.observed_count(),
        SITUATION_COUNT,
        totals.strike,
        totals.ball,
        totals.foul
    );
    for outcome in Outcome::ALL {
        if totals[outcome] == 0 {
            log::warn!("No {} pitches in dataset; its category frequencies are undefined", outcome);
        }
    }

    Ok(aggregation)
}
