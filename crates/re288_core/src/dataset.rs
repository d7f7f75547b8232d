//! Pitch Event Dataset
//!
//! Statcast-style pitch rows and their annotation into model inputs:
//! situation, outcome category and runs still to score in the half-inning.
//!
//! Runs scored by the end of a half-inning are read off the event with the
//! highest at-bat number in that half-inning (its `post_bat_score`).

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::SeasonWindow;
use crate::outcome::PitchCategory;
use crate::situation::{Bases, Situation};

/// Half of an inning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HalfInning {
    #[serde(rename = "Top")]
    Top,
    #[serde(rename = "Bot")]
    Bottom,
}

/// One raw pitch row.
///
/// Field names follow the Statcast CSV columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchEvent {
    pub game_pk: u64,
    #[serde(default)]
    pub game_date: Option<NaiveDate>,
    pub inning: u8,
    pub inning_topbot: HalfInning,
    pub at_bat_number: u32,
    pub outs_when_up: u8,
    pub balls: u8,
    pub strikes: u8,
    /// Runner id on first (empty when unoccupied)
    #[serde(default)]
    pub on_1b: Option<f64>,
    #[serde(default)]
    pub on_2b: Option<f64>,
    #[serde(default)]
    pub on_3b: Option<f64>,
    pub bat_score: i32,
    pub post_bat_score: i32,
    pub description: String,
}

impl PitchEvent {
    pub fn half_inning_id(&self) -> HalfInningId {
        HalfInningId {
            game_pk: self.game_pk,
            inning: self.inning,
            half: self.inning_topbot,
        }
    }

    pub fn bases(&self) -> Bases {
        let occupied = |runner: Option<f64>| runner.is_some_and(|id| id > 0.0);
        Bases::new(occupied(self.on_1b), occupied(self.on_2b), occupied(self.on_3b))
    }

    /// The pre-pitch situation, or `None` if the row lies outside the 288-state space.
    pub fn situation(&self) -> Option<Situation> {
        Situation::new(self.outs_when_up, self.balls, self.strikes, self.bases()).ok()
    }

    pub fn category(&self) -> PitchCategory {
        PitchCategory::classify(&self.description)
    }

    /// Undated rows are always kept.
    pub fn in_season(&self, window: &SeasonWindow) -> bool {
        self.game_date.map_or(true, |date| window.contains(date))
    }
}

/// Identifies one half-inning of one game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HalfInningId {
    pub game_pk: u64,
    pub inning: u8,
    pub half: HalfInning,
}

/// A pitch ready for aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPitch {
    /// `None` for rows outside the situation space; they still count toward totals.
    pub situation: Option<Situation>,
    pub category: PitchCategory,
    /// Runs the batting team scores from this pitch to the end of the half-inning
    pub runs_to_score: i32,
}

/// Annotate raw events.
///
/// Output order matches input order.
pub fn annotate(events: &[PitchEvent]) -> Vec<AnnotatedPitch> {
    let final_scores = half_inning_final_scores(events);

    let annotated: Vec<AnnotatedPitch> = events
        .iter()
        .map(|event| {
            let final_score = final_scores
                .get(&event.half_inning_id())
                .map(|last| last.post_bat_score)
                .unwrap_or(event.post_bat_score);
            AnnotatedPitch {
                situation: event.situation(),
                category: event.category(),
                runs_to_score: final_score - event.bat_score,
            }
        })
        .collect();

    let outside = annotated.iter().filter(|p| p.situation.is_none()).count();
    if outside > 0 {
        log::warn!(
            "{} of {} pitches fall outside the situation space",
            outside,
            annotated.len()
        );
    }
    log::debug!(
        "Annotated {} pitches across {} half-innings",
        annotated.len(),
        final_scores.len()
    );

    annotated
}

/// Keep only events inside the season window.
pub fn filter_season(events: Vec<PitchEvent>, window: &SeasonWindow) -> Vec<PitchEvent> {
    let before = events.len();
    let kept: Vec<PitchEvent> = events.into_iter().filter(|e| e.in_season(window)).collect();
    if kept.len() < before {
        log::info!(
            "Season window {}..{} kept {} of {} pitches",
            window.start,
            window.end,
            kept.len(),
            before
        );
    }
    kept
}

#[derive(Debug, Clone, Copy)]
struct LastAtBat {
    at_bat_number: u32,
    post_bat_score: i32,
}

fn half_inning_final_scores(events: &[PitchEvent]) -> FxHashMap<HalfInningId, LastAtBat> {
    let mut finals: FxHashMap<HalfInningId, LastAtBat> = FxHashMap::default();

    for event in events {
        let candidate = LastAtBat {
            at_bat_number: event.at_bat_number,
            post_bat_score: event.post_bat_score,
        };
        finals
            .entry(event.half_inning_id())
            .and_modify(|last| {
                // Ties on at-bat number keep the highest score seen in that at-bat
                if (candidate.at_bat_number, candidate.post_bat_score)
                    > (last.at_bat_number, last.post_bat_score)
                {
                    *last = candidate;
                }
            })
            .or_insert(candidate);
    }

    finals
}
