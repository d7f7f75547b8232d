//! Situation Space
//!
//! A situation is the game state immediately before a pitch: outs, ball-strike
//! count and base occupancy. There are 3 × 12 × 8 = 288 live situations.
//!
//! ## Identifier format
//!
//! Six characters: outs, balls, strikes, then one character per base
//! (first, second, third), `O` for occupied and `X` for empty.
//!
//! - `000XXX` = no outs, 0-0, bases empty
//! - `132OXO` = one out, full count, runners on first and third
//!
//! Terminal states have their own identifiers:
//! - `INNING_OVER` = third out recorded
//! - `000OOO+`, `100OOO+`, `200OOO+` = bases-loaded walk that forced in a run

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

pub const MAX_OUTS: u8 = 2;
pub const MAX_BALLS: u8 = 3;
pub const MAX_STRIKES: u8 = 2;

/// Number of live situations
pub const SITUATION_COUNT: usize = 288;

pub const INNING_OVER_KEY: &str = "INNING_OVER";
pub const FORCED_RUN_MARKER: char = '+';

/// Base occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bases {
    pub first: bool,
    pub second: bool,
    pub third: bool,
}

impl Bases {
    pub const EMPTY: Bases = Bases::new(false, false, false);
    pub const LOADED: Bases = Bases::new(true, true, true);

    /// All occupancy patterns in index order: XXX, OXX, XOX, OOX, XXO, OXO, XOO, OOO
    pub const ALL: [Bases; 8] = [
        Bases::new(false, false, false),
        Bases::new(true, false, false),
        Bases::new(false, true, false),
        Bases::new(true, true, false),
        Bases::new(false, false, true),
        Bases::new(true, false, true),
        Bases::new(false, true, true),
        Bases::new(true, true, true),
    ];

    pub const fn new(first: bool, second: bool, third: bool) -> Self {
        Self {
            first,
            second,
            third,
        }
    }

    /// Index 0-7 (first = bit 0, second = bit 1, third = bit 2)
    pub fn index(&self) -> usize {
        (self.first as usize) | ((self.second as usize) << 1) | ((self.third as usize) << 2)
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn is_loaded(&self) -> bool {
        self.first && self.second && self.third
    }

    /// Three-character occupancy code, e.g. `OXO`
    pub fn code(&self) -> String {
        [self.first, self.second, self.third]
            .iter()
            .map(|&occupied| if occupied { 'O' } else { 'X' })
            .collect()
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let mut flags = [false; 3];
        if code.chars().count() != 3 {
            return None;
        }
        for (flag, c) in flags.iter_mut().zip(code.chars()) {
            *flag = match c {
                'O' => true,
                'X' => false,
                _ => return None,
            };
        }
        Some(Bases::new(flags[0], flags[1], flags[2]))
    }
}

/// A live pre-pitch game situation.
///
/// Fields are private so every value in circulation is inside the 288-state space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Situation {
    outs: u8,
    balls: u8,
    strikes: u8,
    bases: Bases,
}

impl Situation {
    pub fn new(outs: u8, balls: u8, strikes: u8, bases: Bases) -> Result<Self> {
        if outs > MAX_OUTS || balls > MAX_BALLS || strikes > MAX_STRIKES {
            return Err(ModelError::InvalidSituation {
                outs,
                balls,
                strikes,
            });
        }
        Ok(Self {
            outs,
            balls,
            strikes,
            bases,
        })
    }

    /// Build from the six raw fields.
    pub fn encode(
        outs: u8,
        balls: u8,
        strikes: u8,
        first: bool,
        second: bool,
        third: bool,
    ) -> Result<Self> {
        Self::new(outs, balls, strikes, Bases::new(first, second, third))
    }

    /// Recover the six raw fields: (outs, balls, strikes, first, second, third).
    pub fn decode(&self) -> (u8, u8, u8, bool, bool, bool) {
        (
            self.outs,
            self.balls,
            self.strikes,
            self.bases.first,
            self.bases.second,
            self.bases.third,
        )
    }

    pub fn outs(&self) -> u8 {
        self.outs
    }

    pub fn balls(&self) -> u8 {
        self.balls
    }

    pub fn strikes(&self) -> u8 {
        self.strikes
    }

    pub fn bases(&self) -> Bases {
        self.bases
    }

    /// Count index 0-11 in `balls * 3 + strikes` order (00, 01, 02, 10, ..., 32)
    pub fn count_index(&self) -> usize {
        self.balls as usize * 3 + self.strikes as usize
    }

    /// Dense index 0-287, outs-major then count then bases.
    pub fn index(&self) -> usize {
        self.outs as usize * 96 + self.count_index() * 8 + self.bases.index()
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        if idx >= SITUATION_COUNT {
            return None;
        }
        let outs = (idx / 96) as u8;
        let count = (idx % 96) / 8;
        let bases = Bases::from_index(idx % 8)?;
        Some(Self {
            outs,
            balls: (count / 3) as u8,
            strikes: (count % 3) as u8,
            bases,
        })
    }

    /// Every live situation, in index order.
    pub fn all() -> impl Iterator<Item = Situation> {
        (0..SITUATION_COUNT).filter_map(Situation::from_index)
    }

    /// Two-character count code, e.g. `32`
    pub fn count_code(&self) -> String {
        format!("{}{}", self.balls, self.strikes)
    }

    /// Six-character identifier, e.g. `132OXO`
    pub fn key(&self) -> String {
        format!("{}{}{}{}", self.outs, self.balls, self.strikes, self.bases.code())
    }

    /// Parse a six-character identifier.
    pub fn from_key(key: &str) -> Result<Self> {
        let invalid = || ModelError::InvalidKey(key.to_string());

        if key.len() != 6 || !key.is_ascii() {
            return Err(invalid());
        }
        let digit = |i: usize| key[i..i + 1].parse::<u8>().map_err(|_| invalid());
        let outs = digit(0)?;
        let balls = digit(1)?;
        let strikes = digit(2)?;
        let bases = Bases::from_code(&key[3..]).ok_or_else(invalid)?;

        Self::new(outs, balls, strikes, bases).map_err(|_| invalid())
    }

    /// Construct from fields already known to be in range.
    pub(crate) fn from_parts(outs: u8, balls: u8, strikes: u8, bases: Bases) -> Self {
        debug_assert!(outs <= MAX_OUTS && balls <= MAX_BALLS && strikes <= MAX_STRIKES);
        Self {
            outs,
            balls,
            strikes,
            bases,
        }
    }
}

impl fmt::Display for Situation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for Situation {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Situation::from_key(s)
    }
}

impl TryFrom<String> for Situation {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        Situation::from_key(&value)
    }
}

impl From<Situation> for String {
    fn from(value: Situation) -> Self {
        value.key()
    }
}

/// Any state the model can name: a live situation or one of the terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    Live(Situation),
    /// Third out recorded
    InningOver,
    /// Bases-loaded walk; holds the bases-loaded 0-0 situation at the same outs.
    ForcedRun(Situation),
}

impl StateKey {
    /// The three forced-run terminals, one per out count.
    pub fn forced_run_keys() -> impl Iterator<Item = StateKey> {
        (0..=MAX_OUTS).filter_map(|outs| {
            Situation::new(outs, 0, 0, Bases::LOADED)
                .ok()
                .map(StateKey::ForcedRun)
        })
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, StateKey::Live(_))
    }

    pub fn key(&self) -> String {
        match self {
            StateKey::Live(situation) => situation.key(),
            StateKey::InningOver => INNING_OVER_KEY.to_string(),
            StateKey::ForcedRun(situation) => format!("{}{}", situation.key(), FORCED_RUN_MARKER),
        }
    }

    pub fn parse(key: &str) -> Result<Self> {
        if key == INNING_OVER_KEY {
            return Ok(StateKey::InningOver);
        }
        if let Some(base) = key.strip_suffix(FORCED_RUN_MARKER) {
            let situation =
                Situation::from_key(base).map_err(|_| ModelError::InvalidKey(key.to_string()))?;
            if situation.count_index() != 0 || !situation.bases().is_loaded() {
                return Err(ModelError::InvalidKey(key.to_string()));
            }
            return Ok(StateKey::ForcedRun(situation));
        }
        Situation::from_key(key).map(StateKey::Live)
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl Serialize for StateKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}

impl<'de> Deserialize<'de> for StateKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        StateKey::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_has_288_unique_situations() {
        let all: Vec<Situation> = Situation::all().collect();
        assert_eq!(all.len(), SITUATION_COUNT);

        let keys: std::collections::HashSet<String> = all.iter().map(|s| s.key()).collect();
        assert_eq!(keys.len(), SITUATION_COUNT);

        for (idx, situation) in all.iter().enumerate() {
            assert_eq!(situation.index(), idx);
        }
    }

    #[test]
    fn test_key_format() {
        let s = Situation::encode(1, 3, 2, true, false, true).unwrap();
        assert_eq!(s.key(), "132OXO");
        assert_eq!(s.count_code(), "32");
        assert_eq!(Situation::from_key("132OXO").unwrap(), s);
        assert_eq!(s.decode(), (1, 3, 2, true, false, true));
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(Situation::encode(3, 0, 0, false, false, false).is_err());
        assert!(Situation::encode(0, 4, 0, false, false, false).is_err());
        assert!(Situation::encode(0, 0, 3, false, false, false).is_err());
        assert!(Situation::from_key("040XXX").is_err());
        assert!(Situation::from_key("000XXQ").is_err());
        assert!(Situation::from_key("000XX").is_err());
    }

    #[test]
    fn test_terminal_keys() {
        assert_eq!(StateKey::parse("INNING_OVER").unwrap(), StateKey::InningOver);

        let forced: Vec<String> = StateKey::forced_run_keys().map(|k| k.key()).collect();
        assert_eq!(forced, vec!["000OOO+", "100OOO+", "200OOO+"]);
        for key in &forced {
            assert_eq!(&StateKey::parse(key).unwrap().key(), key);
        }

        // Forced run only exists from the bases-loaded 0-0 situation
        assert!(StateKey::parse("010OOO+").is_err());
        assert!(StateKey::parse("000OXO+").is_err());
    }

    #[test]
    fn test_situation_serde_as_key() {
        let s = Situation::from_key("221XOO").unwrap();
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"221XOO\"");
        let back: Situation = serde_json::from_str("\"221XOO\"").unwrap();
        assert_eq!(back, s);
    }

    mod proptests {
        use crate::situation::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: encode and decode are inverse over the whole space
            #[test]
            fn prop_encode_decode_roundtrip(
                outs in 0u8..=2,
                balls in 0u8..=3,
                strikes in 0u8..=2,
                first in any::<bool>(),
                second in any::<bool>(),
                third in any::<bool>()
            ) {
                let s = Situation::encode(outs, balls, strikes, first, second, third).unwrap();
                prop_assert_eq!(s.decode(), (outs, balls, strikes, first, second, third));
                prop_assert_eq!(Situation::from_key(&s.key()).unwrap(), s);
                prop_assert_eq!(Situation::from_index(s.index()), Some(s));
            }

            /// Property: anything outside the ranges is rejected
            #[test]
            fn prop_out_of_range_rejected(outs in 3u8..10, balls in 4u8..10, strikes in 3u8..10) {
                prop_assert!(Situation::encode(outs, 0, 0, false, false, false).is_err());
                prop_assert!(Situation::encode(0, balls, 0, false, false, false).is_err());
                prop_assert!(Situation::encode(0, 0, strikes, false, false, false).is_err());
            }
        }
    }
}
