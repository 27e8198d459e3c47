//! Load → weight derivation.
//!
//! Two modes: participant count against a configured capacity, or a
//! pre-normalized stress level. Either way the result is floored to an
//! integer and clamped to `[1, max_percentage]`; 0 is never emitted because
//! "no traffic" is expressed by `drain`, not by a zero weight.

use std::fmt;
use thiserror::Error;

use crate::config::WeightConfig;

/// Errors from weight derivation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightError {
    #[error("{field} must be greater than 0")]
    ZeroBound { field: &'static str },

    #[error("{signal} is not a finite number ({value})")]
    NonFinite { signal: &'static str, value: f64 },
}

/// Load signal carried by a stats snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadSignal {
    /// Raw participant count.
    Participants(f64),
    /// Normalized 0..=1 stress level.
    Stress(f64),
}

/// Integer traffic weight in `[1, max_percentage]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Weight(u32);

impl Weight {
    /// Floor `raw` and clamp it into `[1, max]`.
    fn clamped(raw: f64, max: u32) -> Self {
        let floored = raw.floor();
        if floored <= 0.0 {
            Weight(1)
        } else if floored >= max as f64 {
            Weight(max)
        } else {
            Weight(floored as u32)
        }
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps load to a weight using one consistent pair of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightCalculator {
    max_participants: u32,
    max_percentage: u32,
}

impl WeightCalculator {
    pub fn new(max_participants: u32, max_percentage: u32) -> Result<Self, WeightError> {
        if max_participants == 0 {
            return Err(WeightError::ZeroBound {
                field: "max_participants",
            });
        }
        if max_percentage == 0 {
            return Err(WeightError::ZeroBound {
                field: "max_percentage",
            });
        }
        Ok(Self {
            max_participants,
            max_percentage,
        })
    }

    pub fn from_config(config: &WeightConfig) -> Result<Self, WeightError> {
        Self::new(config.max_participants, config.max_percentage)
    }

    pub fn max_participants(&self) -> u32 {
        self.max_participants
    }

    pub fn max_percentage(&self) -> u32 {
        self.max_percentage
    }

    pub fn weight_for(&self, load: LoadSignal) -> Result<Weight, WeightError> {
        match load {
            LoadSignal::Participants(p) => self.from_participants(p),
            LoadSignal::Stress(s) => self.from_stress(s),
        }
    }

    /// `floor(((max - round(p)) / max) * max_percentage)`, with `round(p)`
    /// clamped to `[0, max]`.
    pub fn from_participants(&self, participants: f64) -> Result<Weight, WeightError> {
        if !participants.is_finite() {
            return Err(WeightError::NonFinite {
                signal: "participants",
                value: participants,
            });
        }

        let max = self.max_participants as f64;
        let p = participants.round().clamp(0.0, max);
        let raw = ((max - p) / max) * self.max_percentage as f64;

        tracing::trace!(participants = p, max_participants = self.max_participants, raw, "Participant weight");
        Ok(Weight::clamped(raw, self.max_percentage))
    }

    /// `floor((1 - s) * max_percentage)`, with `s` clamped to `[0, 1]`.
    pub fn from_stress(&self, stress: f64) -> Result<Weight, WeightError> {
        if !stress.is_finite() {
            return Err(WeightError::NonFinite {
                signal: "stress_level",
                value: stress,
            });
        }

        let s = stress.clamp(0.0, 1.0);
        let raw = (1.0 - s) * self.max_percentage as f64;

        tracing::trace!(stress_level = s, raw, "Stress weight");
        Ok(Weight::clamped(raw, self.max_percentage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> WeightCalculator {
        WeightCalculator::new(250, 100).unwrap()
    }

    #[test]
    fn idle_backend_gets_full_weight() {
        assert_eq!(calc().from_participants(0.0).unwrap().get(), 100);
    }

    #[test]
    fn documented_example() {
        // floor((250 - 200) / 250 * 100) = 20
        assert_eq!(calc().from_participants(200.0).unwrap().get(), 20);
    }

    #[test]
    fn full_or_overloaded_backend_floors_to_one() {
        assert_eq!(calc().from_participants(250.0).unwrap().get(), 1);
        assert_eq!(calc().from_participants(1000.0).unwrap().get(), 1);
        assert_eq!(calc().from_participants(249.6).unwrap().get(), 1);
    }

    #[test]
    fn rounds_fractional_participants() {
        assert_eq!(calc().from_participants(124.5).unwrap(), calc().from_participants(125.0).unwrap());
        assert_eq!(calc().from_participants(0.4).unwrap().get(), 100);
    }

    #[test]
    fn participant_weight_is_non_increasing_and_bounded() {
        for (max_participants, max_percentage) in [(250, 100), (7, 100), (1000, 256), (3, 1)] {
            let calc = WeightCalculator::new(max_participants, max_percentage).unwrap();
            let mut previous = u32::MAX;
            for p in 0..=max_participants + 5 {
                let w = calc.from_participants(p as f64).unwrap().get();
                assert!(w <= previous, "weight rose at p={p}");
                assert!((1..=max_percentage).contains(&w), "w={w} out of range at p={p}");
                previous = w;
            }
        }
    }

    #[test]
    fn negative_participants_stay_within_bounds() {
        assert_eq!(calc().from_participants(-20.0).unwrap().get(), 100);
    }

    #[test]
    fn stress_weight() {
        let calc = calc();
        assert_eq!(calc.from_stress(0.0).unwrap().get(), 100);
        assert_eq!(calc.from_stress(0.25).unwrap().get(), 75);
        assert_eq!(calc.from_stress(0.999).unwrap().get(), 1);
        assert_eq!(calc.from_stress(1.0).unwrap().get(), 1);
    }

    #[test]
    fn stress_matches_formula_across_range() {
        let calc = WeightCalculator::new(250, 100).unwrap();
        for i in 0..=1000 {
            let s = i as f64 / 1000.0;
            let expected = (((1.0 - s) * 100.0).floor() as i64).max(1) as u32;
            assert_eq!(calc.from_stress(s).unwrap().get(), expected, "s={s}");
        }
    }

    #[test]
    fn out_of_range_stress_is_clamped() {
        assert_eq!(calc().from_stress(1.7).unwrap().get(), 1);
        assert_eq!(calc().from_stress(-0.5).unwrap().get(), 100);
    }

    #[test]
    fn non_finite_input_is_an_error() {
        assert!(matches!(
            calc().from_participants(f64::NAN),
            Err(WeightError::NonFinite { signal: "participants", .. })
        ));
        assert!(calc().from_stress(f64::INFINITY).is_err());
    }

    #[test]
    fn zero_bounds_rejected() {
        assert_eq!(
            WeightCalculator::new(0, 100),
            Err(WeightError::ZeroBound { field: "max_participants" })
        );
        assert!(WeightCalculator::new(250, 0).is_err());
    }

    #[test]
    fn weight_for_dispatches_on_signal() {
        let calc = calc();
        assert_eq!(calc.weight_for(LoadSignal::Participants(200.0)).unwrap().get(), 20);
        assert_eq!(calc.weight_for(LoadSignal::Stress(0.5)).unwrap().get(), 50);
    }
}
