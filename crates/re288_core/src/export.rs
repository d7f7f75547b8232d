//! Table Exporter
//!
//! Reshapes model output for presentation:
//! - outs×bases by count tables (24 rows × 12 columns), rounded
//! - the full record set keyed by state identifier
//!
//! Undefined values stay `None` and serialize as `null`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::outcome::{Outcome, PerOutcome};
use crate::propagate::ValueModel;
use crate::situation::{Bases, Situation, StateKey, MAX_OUTS};

/// Column order: pitcher's counts first, hitter's counts last.
pub const COUNT_COLUMNS: [(u8, u8); 12] = [
    (0, 2),
    (1, 2),
    (0, 1),
    (2, 2),
    (1, 1),
    (0, 0),
    (1, 0),
    (2, 1),
    (3, 2),
    (2, 0),
    (3, 1),
    (3, 0),
];

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    (value * scale).round() / scale
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// e.g. `1outOXO`
    pub label: String,
    pub cells: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountTable {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl CountTable {
    fn build(precision: u32, value: impl Fn(Situation) -> Option<f64>) -> Self {
        let columns = COUNT_COLUMNS
            .iter()
            .map(|(balls, strikes)| format!("{balls}{strikes}"))
            .collect();

        let mut rows = Vec::with_capacity(24);
        for outs in 0..=MAX_OUTS {
            for bases in Bases::ALL {
                let cells = COUNT_COLUMNS
                    .iter()
                    .map(|&(balls, strikes)| {
                        let situation = Situation::new(outs, balls, strikes, bases).ok()?;
                        value(situation).map(|v| round_to(v, precision))
                    })
                    .collect();
                rows.push(TableRow {
                    label: format!("{outs}out{}", bases.code()),
                    cells,
                });
            }
        }

        Self { columns, rows }
    }

    pub fn cell(&self, row_label: &str, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows
            .iter()
            .find(|r| r.label == row_label)
            .and_then(|r| r.cells[col])
    }
}

/// Run expectancy by outs×bases and count.
pub fn expectancy_table(model: &ValueModel, precision: u32) -> CountTable {
    CountTable::build(precision, |s| model.record(s).expected_runs)
}

/// Value change of one outcome by outs×bases and count.
pub fn value_table(model: &ValueModel, outcome: Outcome, precision: u32) -> CountTable {
    CountTable::build(precision, |s| model.record(s).value_change[outcome])
}

/// Exported form of a live situation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveRecordView {
    pub value: Option<f64>,
    pub frequency: f64,
    pub cat_frequency: PerOutcome<Option<f64>>,
    #[serde(rename = "S")]
    pub next_strike: StateKey,
    #[serde(rename = "B")]
    pub next_ball: StateKey,
    #[serde(rename = "F")]
    pub next_foul: StateKey,
    pub value_change_if: PerOutcome<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExportedState {
    Live(LiveRecordView),
    Terminal { value: Option<f64> },
}

/// Every state, live and terminal, keyed by identifier.
pub fn record_map(model: &ValueModel) -> BTreeMap<String, ExportedState> {
    let mut map: BTreeMap<String, ExportedState> = model
        .records()
        .map(|r| {
            let view = LiveRecordView {
                value: r.expected_runs,
                frequency: r.frequency,
                cat_frequency: r.category_frequency,
                next_strike: r.next.strike,
                next_ball: r.next.ball,
                next_foul: r.next.foul,
                value_change_if: r.value_change,
            };
            (r.situation.key(), ExportedState::Live(view))
        })
        .collect();

    for terminal in std::iter::once(StateKey::InningOver).chain(StateKey::forced_run_keys()) {
        map.insert(
            terminal.key(),
            ExportedState::Terminal {
                value: model.expected_runs(terminal),
            },
        );
    }

    map
}
