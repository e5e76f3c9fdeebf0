use serde::{Deserialize, Serialize};
use std::{fmt, ops, str::FromStr};
use thiserror::Error;

/// Traffic class of a stream, `0` (lowest) to `7` (highest).
///
/// ```
/// # use tsnsynth_core::measure::Priority;
/// let p = Priority::new(7).unwrap();
/// assert_eq!(p.index(), 7);
/// assert!(Priority::new(8).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("priority must be in 0..={max}, got {0}", max = Priority::COUNT - 1)]
pub struct PriorityError(pub u8);

impl Priority {
    /// number of traffic classes
    pub const COUNT: usize = 8;

    pub const LOWEST: Self = Self(0);
    pub const HIGHEST: Self = Self(Self::COUNT as u8 - 1);

    pub fn new(value: u8) -> Result<Self, PriorityError> {
        if (value as usize) < Self::COUNT {
            Ok(Self(value))
        } else {
            Err(PriorityError(value))
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Priority {
    type Error = PriorityError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A value per [`Priority`], e.g. the maximum per-hop delay of a link for
/// each of the eight traffic classes.
///
/// ```
/// # use tsnsynth_core::measure::{PerPriority, Priority};
/// let inf = f64::INFINITY;
/// let delays = PerPriority::new([inf, inf, inf, inf, 50e6, 10e6, 500e3, 150e3]);
/// assert_eq!(delays[Priority::HIGHEST], 150e3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerPriority<T>([T; Priority::COUNT]);

impl<T> PerPriority<T> {
    pub const fn new(values: [T; Priority::COUNT]) -> Self {
        Self(values)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T: Copy> PerPriority<T> {
    /// the same value for every priority
    pub const fn splat(value: T) -> Self {
        Self([value; Priority::COUNT])
    }
}

impl<T> ops::Index<Priority> for PerPriority<T> {
    type Output = T;
    fn index(&self, priority: Priority) -> &Self::Output {
        &self.0[priority.index()]
    }
}

impl<T> From<[T; Priority::COUNT]> for PerPriority<T> {
    fn from(values: [T; Priority::COUNT]) -> Self {
        Self(values)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PerPriorityParseError {
    #[error("expecting {expected} comma separated values, got {0}", expected = Priority::COUNT)]
    WrongLength(usize),
    #[error("invalid value `{0}'")]
    InvalidValue(String),
}

/// Parses eight comma separated numbers, `inf` being accepted.
///
/// ```
/// # use tsnsynth_core::measure::PerPriority;
/// let slopes: PerPriority<f64> = "inf,inf,inf,inf,100e6,100e6,100e6,50e6".parse().unwrap();
/// assert!(slopes.iter().take(4).all(|v| v.is_infinite()));
/// ```
impl FromStr for PerPriority<f64> {
    type Err = PerPriorityParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|value| {
                value
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| PerPriorityParseError::InvalidValue(value.trim().to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let len = values.len();
        let values: [f64; Priority::COUNT] = values
            .try_into()
            .map_err(|_| PerPriorityParseError::WrongLength(len))?;

        Ok(Self(values))
    }
}
