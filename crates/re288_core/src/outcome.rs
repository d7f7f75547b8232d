//! Pitch Outcome Categories
//!
//! Raw Statcast pitch descriptions collapse into six categories. Only three of
//! them (strike, ball, foul) move the count without ending the plate appearance
//! and therefore have a transition rule; the rest are carried for dataset totals.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Category of a single pitch, derived from its raw description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchCategory {
    Strike,
    Ball,
    Foul,
    HitByPitch,
    /// Ball put in play
    InPlay,
    /// Anything without a mapping (pitchouts, automatic balls, unknown text)
    Other,
}

impl PitchCategory {
    /// All categories in code order
    pub const ALL: [PitchCategory; 6] = [
        PitchCategory::Strike,
        PitchCategory::Ball,
        PitchCategory::Foul,
        PitchCategory::HitByPitch,
        PitchCategory::InPlay,
        PitchCategory::Other,
    ];

    /// Classify a raw pitch description.
    ///
    /// Total over all inputs: descriptions outside the known table fall into
    /// [`PitchCategory::Other`]. Surrounding whitespace is ignored before the
    /// exact-match lookup.
    pub fn classify(description: &str) -> Self {
        match description.trim() {
            "called_strike" | "swinging_strike" | "swinging_strike_blocked" | "foul_tip"
            | "foul_bunt" | "missed_bunt" | "bunt_foul_tip" => PitchCategory::Strike,
            "ball" | "blocked_ball" => PitchCategory::Ball,
            "foul" => PitchCategory::Foul,
            "hit_by_pitch" => PitchCategory::HitByPitch,
            "hit_into_play" => PitchCategory::InPlay,
            _ => PitchCategory::Other,
        }
    }

    /// Short code used in exported data (S, B, F, HBP, P, X)
    pub fn code(&self) -> &'static str {
        match self {
            PitchCategory::Strike => "S",
            PitchCategory::Ball => "B",
            PitchCategory::Foul => "F",
            PitchCategory::HitByPitch => "HBP",
            PitchCategory::InPlay => "P",
            PitchCategory::Other => "X",
        }
    }

    /// The modeled outcome for this category, if it has a transition rule.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            PitchCategory::Strike => Some(Outcome::Strike),
            PitchCategory::Ball => Some(Outcome::Ball),
            PitchCategory::Foul => Some(Outcome::Foul),
            PitchCategory::HitByPitch | PitchCategory::InPlay | PitchCategory::Other => None,
        }
    }
}

/// Pitch outcome with a transition rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "S")]
    Strike,
    #[serde(rename = "B")]
    Ball,
    #[serde(rename = "F")]
    Foul,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Strike, Outcome::Ball, Outcome::Foul];

    pub fn code(&self) -> &'static str {
        match self {
            Outcome::Strike => "S",
            Outcome::Ball => "B",
            Outcome::Foul => "F",
        }
    }

    /// Parse an outcome code (`S`, `B`, `F`, case-insensitive).
    pub fn from_code(code: &str) -> Result<Self> {
        match code.trim() {
            "S" | "s" => Ok(Outcome::Strike),
            "B" | "b" => Ok(Outcome::Ball),
            "F" | "f" => Ok(Outcome::Foul),
            other => Err(ModelError::UnknownOutcome(other.to_string())),
        }
    }

    fn index(&self) -> usize {
        match self {
            Outcome::Strike => 0,
            Outcome::Ball => 1,
            Outcome::Foul => 2,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One value per modeled outcome, serialized as `{"S": .., "B": .., "F": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerOutcome<T> {
    #[serde(rename = "S")]
    pub strike: T,
    #[serde(rename = "B")]
    pub ball: T,
    #[serde(rename = "F")]
    pub foul: T,
}

impl<T> PerOutcome<T> {
    /// Build by evaluating `f` once per outcome.
    pub fn from_fn(mut f: impl FnMut(Outcome) -> T) -> Self {
        Self {
            strike: f(Outcome::Strike),
            ball: f(Outcome::Ball),
            foul: f(Outcome::Foul),
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> PerOutcome<U> {
        PerOutcome {
            strike: f(&self.strike),
            ball: f(&self.ball),
            foul: f(&self.foul),
        }
    }
}

impl<T> Index<Outcome> for PerOutcome<T> {
    type Output = T;

    fn index(&self, outcome: Outcome) -> &T {
        match outcome.index() {
            0 => &self.strike,
            1 => &self.ball,
            _ => &self.foul,
        }
    }
}

impl<T> IndexMut<Outcome> for PerOutcome<T> {
    fn index_mut(&mut self, outcome: Outcome) -> &mut T {
        match outcome.index() {
            0 => &mut self.strike,
            1 => &mut self.ball,
            _ => &mut self.foul,
        }
    }
}
