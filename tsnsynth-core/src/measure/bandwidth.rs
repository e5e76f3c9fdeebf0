use logos::{Lexer, Logos};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// The [`Bandwidth`] of a link, in bits per second.
///
/// Generated topologies speak in round SI numbers (`1e9`, `2.5e9`,
/// `100e6`), so the unit multipliers are decimal: `1kbps` is `1_000`
/// bits per second, not `1_024`.
///
/// # Example
///
/// ```
/// # use tsnsynth_core::measure::Bandwidth;
/// let bw: Bandwidth = "2.5gbps".parse().unwrap();
/// assert_eq!(bw.bits_per_sec(), 2_500_000_000);
/// assert_eq!(bw.to_string(), "2500mbps");
/// ```
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Bandwidth(u64);

const K: u64 = 1_000;
const M: u64 = 1_000 * 1_000;
const G: u64 = 1_000 * 1_000 * 1_000;

impl Bandwidth {
    pub const ZERO: Self = Self::new(0);

    /// create a new [`Bandwidth`] of `bits_per_sec` bits per second.
    pub const fn new(bits_per_sec: u64) -> Self {
        Self(bits_per_sec)
    }

    /// Create a bandwidth from a floating point value as found in
    /// scenario descriptions (`1e9`, `2.5e9`).
    ///
    /// Negative and NaN values saturate to [`Bandwidth::ZERO`].
    pub fn from_f64(bits_per_sec: f64) -> Self {
        Self(bits_per_sec.round() as u64)
    }

    #[inline]
    pub const fn bits_per_sec(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }

    /// Time needed to serialize `bits` on this link, in nanoseconds.
    ///
    /// A zero bandwidth never finishes: the result is `+∞`.
    ///
    /// ```
    /// # use tsnsynth_core::measure::Bandwidth;
    /// let bw: Bandwidth = "1gbps".parse().unwrap();
    /// assert_eq!(bw.serialization_ns(512), 512.0);
    /// ```
    pub fn serialization_ns(self, bits: u64) -> f64 {
        bits as f64 / (self.as_f64() / 1e9)
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;

        if v < K || v % K != 0 {
            write!(f, "{v}bps")
        } else if v < M || v % M != 0 {
            write!(f, "{}kbps", v / K)
        } else if v < G || v % G != 0 {
            write!(f, "{}mbps", v / M)
        } else {
            write!(f, "{}gbps", v / G)
        }
    }
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\n\f]+")]
enum BandwidthToken {
    #[token("bps")]
    Bps,
    #[token("kbps")]
    Kbps,
    #[token("mbps")]
    Mbps,
    #[token("gbps")]
    Gbps,

    #[regex(r"[0-9]+(\.[0-9]+)?([eE][0-9]+)?")]
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BandwidthParseError {
    #[error("Expecting to parse a number")]
    MissingNumber,
    #[error("Invalid number `{0}'")]
    InvalidNumber(String),
    #[error("Expecting to parse a unit (bps, kbps, mbps, gbps)")]
    MissingUnit,
    #[error("Not expecting any other tokens to parse a bandwidth")]
    TrailingTokens,
}

impl FromStr for Bandwidth {
    type Err = BandwidthParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lex = Lexer::<'_, BandwidthToken>::new(s);

        let Some(Ok(BandwidthToken::Value)) = lex.next() else {
            return Err(BandwidthParseError::MissingNumber);
        };
        let number: f64 = lex
            .slice()
            .parse()
            .map_err(|_| BandwidthParseError::InvalidNumber(lex.slice().to_owned()))?;
        let multiplier = match lex.next() {
            Some(Ok(BandwidthToken::Bps)) => 1,
            Some(Ok(BandwidthToken::Kbps)) => K,
            Some(Ok(BandwidthToken::Mbps)) => M,
            Some(Ok(BandwidthToken::Gbps)) => G,
            _ => return Err(BandwidthParseError::MissingUnit),
        };

        if lex.next().is_some() {
            return Err(BandwidthParseError::TrailingTokens);
        }

        Ok(Self::from_f64(number * multiplier as f64))
    }
}

impl Serialize for Bandwidth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

/// Accepts either a number of bits per second or a string such as `"1gbps"`.
impl<'de> Deserialize<'de> for Bandwidth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(number) => Ok(Self::from_f64(number)),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bandwidth() {
        macro_rules! assert_bandwidth {
            ($string:literal == $value:expr) => {
                assert_eq!($string.parse::<Bandwidth>().unwrap(), Bandwidth::new($value));
            };
        }

        assert_bandwidth!("0bps" == 0);
        assert_bandwidth!("42bps" == 42);
        assert_bandwidth!("42kbps" == 42_000);
        assert_bandwidth!("42mbps" == 42_000_000);
        assert_bandwidth!("10gbps" == 10_000_000_000);
        assert_bandwidth!("2.5gbps" == 2_500_000_000);
        assert_bandwidth!("1e9bps" == 1_000_000_000);
        assert_bandwidth!(" 100 mbps " == 100_000_000);
    }

    #[test]
    fn print_bandwidth() {
        assert_eq!(Bandwidth::new(0).to_string(), "0bps");
        assert_eq!(Bandwidth::new(999).to_string(), "999bps");
        assert_eq!(Bandwidth::new(10_000).to_string(), "10kbps");
        assert_eq!(Bandwidth::new(100_000_000).to_string(), "100mbps");
        assert_eq!(Bandwidth::new(10_000_000_000).to_string(), "10gbps");
        assert_eq!(Bandwidth::new(2_500_000_000).to_string(), "2500mbps");
        assert_eq!(Bandwidth::new(1_500).to_string(), "1500bps");
    }

    #[test]
    fn parse_invalid_strings() {
        assert_eq!(
            "42".parse::<Bandwidth>(),
            Err(BandwidthParseError::MissingUnit)
        );
        assert_eq!(
            "mbps".parse::<Bandwidth>(),
            Err(BandwidthParseError::MissingNumber)
        );
        assert_eq!(
            "".parse::<Bandwidth>(),
            Err(BandwidthParseError::MissingNumber)
        );
        assert_eq!(
            "42mbps extra".parse::<Bandwidth>(),
            Err(BandwidthParseError::TrailingTokens)
        );
    }

    #[test]
    fn serialization_time() {
        let bw = Bandwidth::new(100_000_000);
        assert_eq!(bw.serialization_ns(512), 5_120.0);
        assert!(Bandwidth::ZERO.serialization_ns(512).is_infinite());
    }

    #[test]
    fn deserialize_number_or_text() {
        let bw: Bandwidth = serde_json::from_str("1e9").unwrap();
        assert_eq!(bw, Bandwidth::new(1_000_000_000));

        let bw: Bandwidth = serde_json::from_str("\"100mbps\"").unwrap();
        assert_eq!(bw, Bandwidth::new(100_000_000));

        assert!(serde_json::from_str::<Bandwidth>("\"fast\"").is_err());
    }

    #[test]
    fn ordering_and_eq() {
        let low = Bandwidth::new(1);
        let high = Bandwidth::new(5);

        assert!(low < high);
        assert_eq!(low, Bandwidth::new(1));
        assert_ne!(low, high);
    }
}
