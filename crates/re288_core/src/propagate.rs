//! Value Propagator
//!
//! For each live situation and outcome, resolves the successor state and the
//! change in run expectancy the outcome causes. The changes are rolled up into
//! two scorecards:
//! - generic: weighted by overall situation frequency
//! - specific: weighted by how often the outcome itself occurs in the situation
//!
//! Terminal expectancies: `INNING_OVER` is 0; a forced-run terminal is the
//! bases-loaded 0-0 expectancy at the same outs plus one run.
//!
//! An undefined term anywhere in a sum makes that scorecard entry undefined.

use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregation, SituationStats};
use crate::config::SwapWeighting;
use crate::outcome::{Outcome, PerOutcome};
use crate::situation::{Situation, StateKey};
use crate::transition::successors;

/// Aggregated and propagated values for one situation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SituationRecord {
    pub situation: Situation,
    pub expected_runs: Option<f64>,
    pub frequency: f64,
    pub category_frequency: PerOutcome<Option<f64>>,
    pub next: PerOutcome<StateKey>,
    /// `expected_runs(next[c]) - expected_runs(self)`
    pub value_change: PerOutcome<Option<f64>>,
}

/// Run value per outcome, plus the two swap values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Scorecard {
    #[serde(rename = "S")]
    pub strike: Option<f64>,
    #[serde(rename = "B")]
    pub ball: Option<f64>,
    #[serde(rename = "F")]
    pub foul: Option<f64>,
    pub ball_to_strike: Option<f64>,
    pub strike_to_ball: Option<f64>,
}

/// Full model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueModel {
    /// Indexed by [`Situation::index`]
    records: Vec<SituationRecord>,
    pub generic: Scorecard,
    pub specific: Scorecard,
}

impl ValueModel {
    pub fn record(&self, situation: Situation) -> &SituationRecord {
        &self.records[situation.index()]
    }

    pub fn records(&self) -> impl Iterator<Item = &SituationRecord> {
        self.records.iter()
    }

    /// Situations with no observations, in index order
    pub fn unobserved(&self) -> impl Iterator<Item = Situation> + '_ {
        self.records
            .iter()
            .filter(|r| r.expected_runs.is_none())
            .map(|r| r.situation)
    }

    /// Expected runs of any state, terminals included.
    pub fn expected_runs(&self, state: StateKey) -> Option<f64> {
        state_expectancy(state, |s| self.record(s).expected_runs)
    }
}

/// Running sum that turns undefined as soon as one undefined term is added.
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    sum: f64,
    undefined_terms: usize,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            sum: 0.0,
            undefined_terms: 0,
        }
    }

    fn add(&mut self, term: Option<f64>) {
        match term {
            Some(v) => self.sum += v,
            None => self.undefined_terms += 1,
        }
    }

    fn value(&self) -> Option<f64> {
        (self.undefined_terms == 0).then_some(self.sum)
    }
}

fn state_expectancy(state: StateKey, lookup: impl Fn(Situation) -> Option<f64>) -> Option<f64> {
    match state {
        StateKey::Live(situation) => lookup(situation),
        StateKey::InningOver => Some(0.0),
        StateKey::ForcedRun(base) => lookup(base).map(|runs| runs + 1.0),
    }
}

fn product(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? * b?)
}

fn difference(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? - b?)
}

/// Propagate value changes over every live situation and build both scorecards.
pub fn propagate(aggregation: &Aggregation, swap_weighting: SwapWeighting) -> ValueModel {
    let lookup = |s: Situation| aggregation.expected_runs(s);

    let mut generic = PerOutcome::from_fn(|_| Accumulator::new());
    let mut specific = PerOutcome::from_fn(|_| Accumulator::new());
    let mut ball_to_strike = Accumulator::new();
    let mut strike_to_ball = Accumulator::new();

    let records: Vec<SituationRecord> = aggregation
        .iter()
        .map(|stats: &SituationStats| {
            let next = successors(stats.situation);
            let next_runs = next.map(|&state| state_expectancy(state, lookup));
            let value_change =
                PerOutcome::from_fn(|outcome| difference(next_runs[outcome], stats.expected_runs));

            for outcome in Outcome::ALL {
                generic[outcome].add(product(value_change[outcome], Some(stats.frequency)));
                specific[outcome].add(product(
                    value_change[outcome],
                    stats.category_frequency[outcome],
                ));
            }

            let swap = difference(next_runs.ball, next_runs.strike);
            ball_to_strike.add(product(swap, stats.category_frequency.ball));
            let strike_to_ball_weight = match swap_weighting {
                SwapWeighting::BallFrequency => stats.category_frequency.ball,
                SwapWeighting::OwnCategory => stats.category_frequency.strike,
            };
            strike_to_ball.add(product(swap.map(|v| -v), strike_to_ball_weight));

            SituationRecord {
                situation: stats.situation,
                expected_runs: stats.expected_runs,
                frequency: stats.frequency,
                category_frequency: stats.category_frequency,
                next,
                value_change,
            }
        })
        .collect();

    let generic_values = generic.map(Accumulator::value);
    let generic = Scorecard {
        strike: generic_values.strike,
        ball: generic_values.ball,
        foul: generic_values.foul,
        ball_to_strike: difference(generic_values.ball, generic_values.strike),
        strike_to_ball: difference(generic_values.strike, generic_values.ball),
    };
    let specific_values = specific.map(Accumulator::value);
    let specific = Scorecard {
        strike: specific_values.strike,
        ball: specific_values.ball,
        foul: specific_values.foul,
        ball_to_strike: ball_to_strike.value(),
        strike_to_ball: strike_to_ball.value(),
    };

    let undefined = records
        .iter()
        .filter(|r| Outcome::ALL.iter().any(|&o| r.value_change[o].is_none()))
        .count();
    if undefined > 0 {
        log::warn!(
            "{} situations have undefined value changes; scorecards touching them are undefined",
            undefined
        );
    }

    ValueModel {
        records,
        generic,
        specific,
    }
}
