use thiserror::Error;

use crate::outcome::Outcome;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid situation: outs={outs}, balls={balls}, strikes={strikes}")]
    InvalidSituation { outs: u8, balls: u8, strikes: u8 },

    #[error("Invalid situation identifier: '{0}'")]
    InvalidKey(String),

    #[error("Cannot apply {outcome:?} to terminal state '{key}'")]
    TerminalTransition { key: String, outcome: Outcome },

    #[error("Unknown outcome code: '{0}' (expected S, B or F)")]
    UnknownOutcome(String),

    #[error("Dataset contains no pitch events")]
    EmptyDataset,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
