//! # Dice
//!
//! Parser and roller for `NdS+M` dice notation: roll `N` dice of `S` sides,
//! sum them and add the flat modifier `M`. `NdS` and `NdS-M` are accepted too.

use std::{fmt, str::FromStr};

use crate::error::DiceError;

/// A parsed dice expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dice {
    /// Number of dice rolled
    pub count: u32,
    /// Sides per die
    pub sides: u32,
    /// Flat modifier added to the sum
    pub modifier: i32,
}

impl Dice {
    /// Rolls the dice with the given random source.
    ///
    /// A negative modifier never takes the result below zero.
    pub fn roll(&self, rng: &mut fastrand::Rng) -> i32 {
        let mut total = self.modifier;
        for _ in 0..self.count {
            total = total.saturating_add_unsigned(rng.u32(1..=self.sides));
        }
        total.max(0)
    }

    /// Smallest possible roll.
    pub fn min(&self) -> i32 {
        self.modifier.saturating_add_unsigned(self.count).max(0)
    }
}

impl FromStr for Dice {
    type Err = DiceError;

    fn from_str(notation: &str) -> Result<Self, Self::Err> {
        let malformed = || DiceError::Malformed(notation.to_string());
        let trimmed = notation.trim();

        let (count, rest) = trimmed.split_once('d').ok_or_else(malformed)?;
        let (sides, modifier) = match rest.find(['+', '-']) {
            Some(at) => {
                let (sides, modifier) = rest.split_at(at);
                let modifier: i32 = modifier
                    .trim_start_matches('+')
                    .parse()
                    .map_err(|_| malformed())?;
                (sides, modifier)
            }
            None => (rest, 0),
        };

        let count: u32 = count.parse().map_err(|_| malformed())?;
        let sides: u32 = sides.parse().map_err(|_| malformed())?;
        if sides == 0 {
            return Err(DiceError::ZeroSides(notation.to_string()));
        }

        Ok(Dice {
            count,
            sides,
            modifier,
        })
    }
}

impl fmt::Display for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            0 => write!(f, "{}d{}", self.count, self.sides),
            m if m > 0 => write!(f, "{}d{}+{}", self.count, self.sides, m),
            m => write!(f, "{}d{}{}", self.count, self.sides, m),
        }
    }
}

/// Parses and rolls `notation` in one step.
///
/// # Errors
/// Returns a [`DiceError`] if the notation does not parse.
pub fn roll_dice(rng: &mut fastrand::Rng, notation: &str) -> Result<i32, DiceError> {
    Ok(notation.parse::<Dice>()?.roll(rng))
}
