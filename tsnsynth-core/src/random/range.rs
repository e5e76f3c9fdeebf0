use super::{between, choose, log_uniform_f64, uniform_f64};
use crate::measure::Bandwidth;
use logos::{Lexer, Logos};
use rand_core::Rng;
use serde::{Deserialize, Deserializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// A parameter that is resolved to a concrete value when a generator or
/// the stream factory needs it.
///
/// Each resolution draws a new value: a [`Range`] used for "hosts per
/// branch switch" gives every branch switch its own count.
///
/// # Example
///
/// ```
/// # use tsnsynth_core::{random::Range, Context};
/// let mut ctx = Context::new();
///
/// let fixed = Range::fixed(4u64);
/// assert_eq!(fixed.sample(ctx.rng()).unwrap(), 4);
///
/// let rate: Range<f64> = "[10e3, 50e6, log]".parse().unwrap();
/// let value = rate.sample(ctx.rng()).unwrap();
/// assert!((10e3..=50e6).contains(&value));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Range<T> {
    /// always the same value
    Fixed(T),
    /// `[min, max]`: inclusive for integers, uniform for floats
    Uniform { min: T, max: T },
    /// `[min, max, "log"]`: uniform over the logarithms of the bounds
    LogUniform { min: T, max: T },
    /// uniform pick of one of the values
    Choice(Vec<T>),
}

/// One element of a range given as a sequence (`[2, 5]`, `[1, 9, "log"]`).
#[derive(Debug, Clone, PartialEq)]
pub enum RangeItem<T> {
    Value(T),
    Marker(String),
}

/// Errors of a misconfigured [`Range`], raised when the range is built
/// from a sequence or when it is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error(
        "range can either be a number, or a list [min, max], or a list [min, max, 'log'] (got {len} elements)"
    )]
    MalformedSequence { len: usize },
    #[error("range[2] can only be 'log' for logarithmically scaled random choice, not `{0}'")]
    UnknownScale(String),
    #[error("range bounds must be values, not `{0}'")]
    MarkerAsBound(String),
    #[error("range lower bound {min} is greater than the upper bound {max}")]
    InvalidBounds { min: String, max: String },
    #[error("logarithmic range requires strictly positive bounds, got [{min}, {max}]")]
    NonPositiveLogBound { min: String, max: String },
    #[error("logarithmic range is not supported for {0}")]
    LogScaleUnsupported(&'static str),
    #[error("cannot choose from an empty set")]
    EmptyChoice,
}

/// Values a [`Range`] can produce.
pub trait Sample: Sized + Clone + PartialOrd + fmt::Debug {
    /// uniform draw in `[min, max]`; `min <= max` is checked by the caller
    fn uniform<R: Rng + ?Sized>(rng: &mut R, min: &Self, max: &Self) -> Self;

    /// log-uniform draw in `[min, max]`
    fn log_uniform<R: Rng + ?Sized>(
        _rng: &mut R,
        _min: &Self,
        _max: &Self,
    ) -> Result<Self, RangeError> {
        Err(RangeError::LogScaleUnsupported(std::any::type_name::<Self>()))
    }
}

macro_rules! sample_unsigned {
    ($($ty:ty),+) => {
        $(
            impl Sample for $ty {
                fn uniform<R: Rng + ?Sized>(rng: &mut R, min: &Self, max: &Self) -> Self {
                    between(rng, *min as u64, *max as u64) as $ty
                }

                fn log_uniform<R: Rng + ?Sized>(
                    rng: &mut R,
                    min: &Self,
                    max: &Self,
                ) -> Result<Self, RangeError> {
                    if *min == 0 {
                        return Err(non_positive(min, max));
                    }
                    let value = log_uniform_f64(rng, *min as f64, *max as f64).round() as $ty;
                    Ok(value.clamp(*min, *max))
                }
            }
        )+
    };
}

sample_unsigned!(u8, u16, u32, u64, usize);

impl Sample for f64 {
    fn uniform<R: Rng + ?Sized>(rng: &mut R, min: &Self, max: &Self) -> Self {
        uniform_f64(rng, *min, *max)
    }

    fn log_uniform<R: Rng + ?Sized>(
        rng: &mut R,
        min: &Self,
        max: &Self,
    ) -> Result<Self, RangeError> {
        if *min <= 0.0 {
            return Err(non_positive(min, max));
        }
        Ok(log_uniform_f64(rng, *min, *max).clamp(*min, *max))
    }
}

impl Sample for Bandwidth {
    fn uniform<R: Rng + ?Sized>(rng: &mut R, min: &Self, max: &Self) -> Self {
        Bandwidth::new(between(rng, min.bits_per_sec(), max.bits_per_sec()))
    }

    fn log_uniform<R: Rng + ?Sized>(
        rng: &mut R,
        min: &Self,
        max: &Self,
    ) -> Result<Self, RangeError> {
        if min.bits_per_sec() == 0 {
            return Err(non_positive(min, max));
        }
        let value = Bandwidth::from_f64(log_uniform_f64(rng, min.as_f64(), max.as_f64()));
        Ok(value.clamp(*min, *max))
    }
}

impl Sample for bool {
    fn uniform<R: Rng + ?Sized>(rng: &mut R, min: &Self, max: &Self) -> Self {
        if min == max {
            *min
        } else {
            rng.next_u64() & 1 == 1
        }
    }
}

fn non_positive<T: fmt::Debug>(min: &T, max: &T) -> RangeError {
    RangeError::NonPositiveLogBound {
        min: format!("{min:?}"),
        max: format!("{max:?}"),
    }
}

impl<T> Range<T> {
    pub fn fixed(value: T) -> Self {
        Self::Fixed(value)
    }

    pub fn uniform(min: T, max: T) -> Self {
        Self::Uniform { min, max }
    }

    pub fn log_uniform(min: T, max: T) -> Self {
        Self::LogUniform { min, max }
    }

    pub fn choice(values: impl IntoIterator<Item = T>) -> Self {
        Self::Choice(values.into_iter().collect())
    }

    /// Build a range from its sequence form.
    ///
    /// * `[min, max]` is a [`Range::Uniform`];
    /// * `[min, max, "log"]` is a [`Range::LogUniform`].
    ///
    /// Any other length, or a third element other than `log`, is a
    /// configuration error.
    pub fn from_sequence(items: Vec<RangeItem<T>>) -> Result<Self, RangeError> {
        let len = items.len();
        if !(2..=3).contains(&len) {
            return Err(RangeError::MalformedSequence { len });
        }

        let mut items = items.into_iter();
        let min = bound(items.next())?;
        let max = bound(items.next())?;

        match items.next() {
            None => Ok(Self::Uniform { min, max }),
            Some(RangeItem::Marker(marker)) if marker == "log" => Ok(Self::LogUniform { min, max }),
            Some(RangeItem::Marker(marker)) => Err(RangeError::UnknownScale(marker)),
            Some(RangeItem::Value(_)) => Err(RangeError::UnknownScale(String::from("<value>"))),
        }
    }
}

fn bound<T>(item: Option<RangeItem<T>>) -> Result<T, RangeError> {
    match item {
        Some(RangeItem::Value(value)) => Ok(value),
        Some(RangeItem::Marker(marker)) => Err(RangeError::MarkerAsBound(marker)),
        None => Err(RangeError::MalformedSequence { len: 0 }),
    }
}

impl<T: Sample> Range<T> {
    /// Resolve the range into a concrete value.
    ///
    /// # Errors
    ///
    /// Misconfigured ranges ([`RangeError`]) are reported here, at
    /// resolution time, not when the range is constructed.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<T, RangeError> {
        match self {
            Self::Fixed(value) => Ok(value.clone()),
            Self::Uniform { min, max } => {
                check_bounds(min, max)?;
                Ok(T::uniform(rng, min, max))
            }
            Self::LogUniform { min, max } => {
                check_bounds(min, max)?;
                T::log_uniform(rng, min, max)
            }
            Self::Choice(values) => choose(rng, values).cloned().ok_or(RangeError::EmptyChoice),
        }
    }
}

fn check_bounds<T: PartialOrd + fmt::Debug>(min: &T, max: &T) -> Result<(), RangeError> {
    if min > max {
        Err(RangeError::InvalidBounds {
            min: format!("{min:?}"),
            max: format!("{max:?}"),
        })
    } else {
        Ok(())
    }
}

impl<T> From<T> for Range<T> {
    fn from(value: T) -> Self {
        Self::Fixed(value)
    }
}

impl<T: Default> Default for Range<T> {
    fn default() -> Self {
        Self::Fixed(T::default())
    }
}

// --- FromStr ---

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\n\f]+")]
enum RangeToken {
    #[token("[")]
    OpenSequence,
    #[token("]")]
    CloseSequence,
    #[token("{")]
    OpenSet,
    #[token("}")]
    CloseSet,
    #[token(",")]
    Comma,

    #[regex(r#"[^\[\]{},\s"']+"#)]
    Item,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeParseError {
    #[error("unexpected input at `{0}'")]
    Unexpected(String),
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("invalid value `{item}': {reason}")]
    InvalidItem { item: String, reason: String },
    #[error("{0}")]
    Range(#[from] RangeError),
}

fn parse_item<T>(item: &str) -> Result<T, RangeParseError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    item.parse().map_err(|error: T::Err| RangeParseError::InvalidItem {
        item: item.to_owned(),
        reason: error.to_string(),
    })
}

/// read the comma separated items up to the `close` token
fn parse_list<'s>(
    lex: &mut Lexer<'s, RangeToken>,
    close: RangeToken,
) -> Result<Vec<&'s str>, RangeParseError> {
    let mut items = Vec::new();
    loop {
        match lex.next() {
            Some(Ok(RangeToken::Item)) => items.push(lex.slice()),
            Some(Ok(token)) if token == close && items.is_empty() => return Ok(items),
            Some(_) => return Err(RangeParseError::Unexpected(lex.slice().to_owned())),
            None => return Err(RangeParseError::UnexpectedEnd),
        }

        match lex.next() {
            Some(Ok(RangeToken::Comma)) => {}
            Some(Ok(token)) if token == close => return Ok(items),
            Some(_) => return Err(RangeParseError::Unexpected(lex.slice().to_owned())),
            None => return Err(RangeParseError::UnexpectedEnd),
        }
    }
}

/// Text form of a [`Range`]:
///
/// * `4` — a fixed value;
/// * `[2, 5]` — uniform between the bounds;
/// * `[10e3, 50e6, log]` — log-uniform between the bounds;
/// * `{1gbps, 2.5gbps}` — one of the listed values.
impl<T> FromStr for Range<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    type Err = RangeParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lex = Lexer::<'_, RangeToken>::new(s);

        let range = match lex.next() {
            Some(Ok(RangeToken::Item)) => Self::Fixed(parse_item(lex.slice())?),
            Some(Ok(RangeToken::OpenSequence)) => {
                let items = parse_list(&mut lex, RangeToken::CloseSequence)?
                    .into_iter()
                    .enumerate()
                    // past the bounds only a scale marker is expected
                    .map(|(index, item)| match item {
                        "log" => Ok(RangeItem::Marker(item.to_owned())),
                        item if index >= 2 => Ok(RangeItem::Marker(item.to_owned())),
                        item => parse_item(item).map(RangeItem::Value),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Self::from_sequence(items)?
            }
            Some(Ok(RangeToken::OpenSet)) => Self::Choice(
                parse_list(&mut lex, RangeToken::CloseSet)?
                    .into_iter()
                    .map(parse_item)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Some(_) => return Err(RangeParseError::Unexpected(lex.slice().to_owned())),
            None => return Err(RangeParseError::UnexpectedEnd),
        };

        if lex.next().is_some() {
            return Err(RangeParseError::Unexpected(lex.slice().to_owned()));
        }

        Ok(range)
    }
}

// --- Deserialize ---

/// Accepts a value, a `[min, max]` / `[min, max, "log"]` array, or
/// `{"choice": [...]}`.
impl<'de, T> Deserialize<'de> for Range<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged, bound(deserialize = "T: Deserialize<'de>"))]
        enum Item<T> {
            Value(T),
            Marker(String),
        }

        #[derive(Deserialize)]
        #[serde(untagged, bound(deserialize = "T: Deserialize<'de>"))]
        enum Repr<T> {
            Fixed(T),
            Sequence(Vec<Item<T>>),
            Choice { choice: Vec<T> },
        }

        match Repr::<T>::deserialize(deserializer)? {
            Repr::Fixed(value) => Ok(Self::Fixed(value)),
            Repr::Sequence(items) => Self::from_sequence(
                items
                    .into_iter()
                    .map(|item| match item {
                        Item::Value(value) => RangeItem::Value(value),
                        Item::Marker(marker) => RangeItem::Marker(marker),
                    })
                    .collect(),
            )
            .map_err(serde::de::Error::custom),
            Repr::Choice { choice } => Ok(Self::Choice(choice)),
        }
    }
}
