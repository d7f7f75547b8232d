//! Transition Engine
//!
//! Maps (situation, outcome) to the next state. Pure and total over live
//! situations; terminal states have no successors.
//!
//! ## Rules
//! - Ball: ball four resets the count and forces runners forward only as far as
//!   the batter pushes them. With the bases loaded a run scores and the state
//!   becomes the forced-run terminal for the current out count.
//! - Strike: strike three resets the count and adds an out; the third out ends
//!   the inning.
//! - Foul: adds a strike below two strikes, otherwise leaves the state unchanged.

use crate::error::{ModelError, Result};
use crate::outcome::{Outcome, PerOutcome};
use crate::situation::{Bases, Situation, StateKey, MAX_BALLS, MAX_OUTS, MAX_STRIKES};

/// Next state after `outcome` is thrown in `situation`.
pub fn transition(situation: Situation, outcome: Outcome) -> StateKey {
    let (outs, balls, strikes, _, _, _) = situation.decode();
    let bases = situation.bases();

    match outcome {
        Outcome::Ball if balls == MAX_BALLS => walk(outs, bases),
        Outcome::Ball => StateKey::Live(Situation::from_parts(outs, balls + 1, strikes, bases)),
        Outcome::Strike if strikes == MAX_STRIKES => {
            if outs == MAX_OUTS {
                StateKey::InningOver
            } else {
                StateKey::Live(Situation::from_parts(outs + 1, 0, 0, bases))
            }
        }
        Outcome::Strike | Outcome::Foul if strikes < MAX_STRIKES => {
            StateKey::Live(Situation::from_parts(outs, balls, strikes + 1, bases))
        }
        // Two-strike foul
        Outcome::Strike | Outcome::Foul => StateKey::Live(situation),
    }
}

/// Successors for all three outcomes.
pub fn successors(situation: Situation) -> PerOutcome<StateKey> {
    PerOutcome::from_fn(|outcome| transition(situation, outcome))
}

/// Key-level transition. Terminal inputs are rejected.
pub fn transition_key(state: StateKey, outcome: Outcome) -> Result<StateKey> {
    match state {
        StateKey::Live(situation) => Ok(transition(situation, outcome)),
        StateKey::InningOver | StateKey::ForcedRun(_) => Err(ModelError::TerminalTransition {
            key: state.key(),
            outcome,
        }),
    }
}

/// Ball four: batter to first, runners move only when forced.
fn walk(outs: u8, bases: Bases) -> StateKey {
    let after = if !bases.first {
        Bases { first: true, ..bases }
    } else if !bases.second {
        Bases { second: true, ..bases }
    } else if !bases.third {
        Bases::LOADED
    } else {
        return StateKey::ForcedRun(Situation::from_parts(outs, 0, 0, Bases::LOADED));
    };
    StateKey::Live(Situation::from_parts(outs, 0, 0, after))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Situation {
        Situation::from_key(s).unwrap()
    }

    fn next(s: &str, outcome: Outcome) -> String {
        transition(key(s), outcome).key()
    }

    #[test]
    fn test_ball_increments_count() {
        assert_eq!(next("000XXX", Outcome::Ball), "010XXX");
        assert_eq!(next("122OXO", Outcome::Ball), "132OXO");
    }

    #[test]
    fn test_walk_forces_only_required_runners() {
        assert_eq!(next("030XXX", Outcome::Ball), "000OXX");
        assert_eq!(next("031OXX", Outcome::Ball), "000OOX");
        assert_eq!(next("132XOX", Outcome::Ball), "100OOX");
        assert_eq!(next("130XXO", Outcome::Ball), "100OXO");
        assert_eq!(next("230XOO", Outcome::Ball), "200OOO");
        assert_eq!(next("032OXO", Outcome::Ball), "000OOO");
        assert_eq!(next("232OOX", Outcome::Ball), "200OOO");
    }

    #[test]
    fn test_bases_loaded_walk_forces_run() {
        for outs in 0..=2u8 {
            for strikes in 0..=2u8 {
                let s = Situation::encode(outs, 3, strikes, true, true, true).unwrap();
                let result = transition(s, Outcome::Ball);
                assert_eq!(result.key(), format!("{}00OOO+", outs));
                assert!(result.is_terminal());
            }
        }
    }

    #[test]
    fn test_strikeout() {
        assert_eq!(next("002OXX", Outcome::Strike), "100OXX");
        assert_eq!(next("132XXO", Outcome::Strike), "200XXO");
        assert_eq!(transition(key("232OOO"), Outcome::Strike), StateKey::InningOver);
        assert_eq!(transition(key("202XXX"), Outcome::Strike), StateKey::InningOver);
    }

    #[test]
    fn test_strike_below_two() {
        assert_eq!(next("000XXX", Outcome::Strike), "001XXX");
        assert_eq!(next("231XOX", Outcome::Strike), "232XOX");
    }

    #[test]
    fn test_foul_never_ends_plate_appearance() {
        assert_eq!(next("000XXX", Outcome::Foul), "001XXX");
        assert_eq!(next("011XXX", Outcome::Foul), "012XXX");

        for situation in Situation::all().filter(|s| s.strikes() == 2) {
            assert_eq!(transition(situation, Outcome::Foul), StateKey::Live(situation));
        }
    }

    #[test]
    fn test_three_strikes_from_empty_count() {
        let s0 = key("000XXX");
        let s1 = transition(s0, Outcome::Strike);
        assert_eq!(s1.key(), "001XXX");

        let StateKey::Live(s1) = s1 else {
            panic!("expected live state");
        };
        let StateKey::Live(s2) = transition(s1, Outcome::Strike) else {
            panic!("expected live state");
        };
        assert_eq!(s2.key(), "002XXX");
        assert_eq!(transition(s2, Outcome::Strike).key(), "100XXX");
    }

    #[test]
    fn test_terminal_input_fails_loudly() {
        for outcome in Outcome::ALL {
            let err = transition_key(StateKey::InningOver, outcome).unwrap_err();
            assert!(matches!(err, ModelError::TerminalTransition { .. }));
        }
        let forced = StateKey::parse("100OOO+").unwrap();
        assert!(transition_key(forced, Outcome::Foul).is_err());
        assert_eq!(
            transition_key(StateKey::parse("000XXX").unwrap(), Outcome::Foul).unwrap().key(),
            "001XXX"
        );
    }

    #[test]
    fn test_successors_cover_all_outcomes() {
        let next = successors(key("212OXX"));
        assert_eq!(next.strike, StateKey::InningOver);
        assert_eq!(next.ball.key(), "222OXX");
        assert_eq!(next.foul.key(), "212OXX");
    }

    mod proptests {
        use crate::outcome::Outcome;
        use crate::situation::{Bases, Situation, StateKey};
        use crate::transition::transition;
        use proptest::prelude::*;

        fn any_situation() -> impl Strategy<Value = Situation> {
            (0usize..288).prop_map(|idx| Situation::from_index(idx).unwrap())
        }

        fn any_outcome() -> impl Strategy<Value = Outcome> {
            prop_oneof![
                Just(Outcome::Strike),
                Just(Outcome::Ball),
                Just(Outcome::Foul)
            ]
        }

        proptest! {
            /// Property: outs never decrease and runners never leave the bases
            #[test]
            fn prop_outs_monotone_and_runners_kept(s in any_situation(), o in any_outcome()) {
                match transition(s, o) {
                    StateKey::Live(n) => {
                        prop_assert!(n.outs() >= s.outs());
                        let runners = |b: Bases| b.first as u8 + b.second as u8 + b.third as u8;
                        prop_assert!(runners(n.bases()) >= runners(s.bases()));
                    }
                    StateKey::InningOver => {
                        prop_assert_eq!(s.outs(), 2);
                        prop_assert_eq!(s.strikes(), 2);
                        prop_assert_eq!(o, Outcome::Strike);
                    }
                    StateKey::ForcedRun(n) => {
                        prop_assert!(s.bases().is_loaded());
                        prop_assert_eq!(s.balls(), 3);
                        prop_assert_eq!(n.outs(), s.outs());
                    }
                }
            }

            /// Property: a plate appearance that ends resets the count
            #[test]
            fn prop_count_resets_on_new_batter(s in any_situation(), o in any_outcome()) {
                if let StateKey::Live(n) = transition(s, o) {
                    let pa_over = n.outs() != s.outs() || n.bases() != s.bases();
                    if pa_over {
                        prop_assert_eq!(n.count_index(), 0);
                    }
                }
            }
        }
    }
}
