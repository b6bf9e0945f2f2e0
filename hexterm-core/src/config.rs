//! Immutable per-session configuration.
//!
//! Built once before a session starts and passed by reference to every
//! component. Nothing in the crate mutates it.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HextermError;

/// Default size of a generated spam packet.
pub const DEFAULT_SPAM_SIZE: u32 = 1024;

/// Fastest fixed rate whose period is still a whole microsecond.
pub const MAX_SPAM_RATE: u32 = 1_000_000;

/// How bytes are shown on the console and parsed from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Space separated hex bytes.
    #[default]
    Hex,
    /// Literal characters; console lines are sent with a trailing newline.
    Ascii,
}

// ── SpamRate ─────────────────────────────────────────────────────

/// How often spam packets are transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RateRepr", into = "RateRepr")]
pub enum SpamRate {
    /// No spam.
    #[default]
    Disabled,
    /// Fixed number of packets per second.
    PerSecond(NonZeroU32),
    /// Back to back, gated only by transport writability.
    Unlimited,
}

impl SpamRate {
    /// Build from a raw count where 0 disables spam.
    pub fn per_second(rate: u32) -> Self {
        NonZeroU32::new(rate).map_or(Self::Disabled, Self::PerSecond)
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// Spacing between deadlines for fixed-rate spam.
    pub fn period(&self) -> Option<Duration> {
        match self {
            Self::PerSecond(rate) => Some(Duration::from_micros(1_000_000 / u64::from(rate.get()))),
            _ => None,
        }
    }
}

impl fmt::Display for SpamRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "0"),
            Self::PerSecond(rate) => write!(f, "{rate}"),
            Self::Unlimited => write!(f, "unlimited"),
        }
    }
}

impl FromStr for SpamRate {
    type Err = HextermError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unlimited") || s.eq_ignore_ascii_case("max") {
            return Ok(Self::Unlimited);
        }
        s.parse::<u32>()
            .map(Self::per_second)
            .map_err(|_| HextermError::InvalidConfig(format!("bad spam rate {s:?}")))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RateRepr {
    Count(u32),
    Named(String),
}

impl TryFrom<RateRepr> for SpamRate {
    type Error = HextermError;

    fn try_from(repr: RateRepr) -> Result<Self, Self::Error> {
        match repr {
            RateRepr::Count(n) => Ok(Self::per_second(n)),
            RateRepr::Named(s) => s.parse(),
        }
    }
}

impl From<SpamRate> for RateRepr {
    fn from(rate: SpamRate) -> Self {
        match rate {
            SpamRate::Disabled => RateRepr::Count(0),
            SpamRate::PerSecond(n) => RateRepr::Count(n.get()),
            SpamRate::Unlimited => RateRepr::Named("unlimited".into()),
        }
    }
}

// ── SpamConfig ───────────────────────────────────────────────────

/// Load generation and verification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpamConfig {
    /// Transmissions per second, `0` or `"unlimited"`.
    pub rate: SpamRate,
    /// Bytes per generated packet.
    pub size: u32,
    /// Run the spam verifier on every received buffer.
    pub verify: bool,
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            rate: SpamRate::Disabled,
            size: DEFAULT_SPAM_SIZE,
            verify: false,
        }
    }
}

// ── SessionConfig ────────────────────────────────────────────────

/// Everything a session needs to know about presentation and load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub display: DisplayMode,
    /// Bordered dumps and `Sent` confirmations.
    pub decorate: bool,
    pub print_checksums: bool,
    /// Dump received bytes (`false` = quiet receive).
    pub print_received: bool,
    /// Suppress spam transmission confirmations.
    pub quiet_send: bool,
    pub spam: SpamConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            display: DisplayMode::Hex,
            decorate: true,
            print_checksums: false,
            print_received: true,
            quiet_send: false,
            spam: SpamConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Reject settings the engine cannot honour.
    pub fn validate(&self) -> Result<(), HextermError> {
        if self.spam.rate.is_enabled() && self.spam.size == 0 {
            return Err("spam size must be at least 1 byte".into());
        }
        if let SpamRate::PerSecond(rate) = self.spam.rate {
            if rate.get() > MAX_SPAM_RATE {
                return Err(HextermError::InvalidConfig(format!(
                    "spam rate {rate}/s is above {MAX_SPAM_RATE}/s; use \"unlimited\" instead"
                )));
            }
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tool_defaults() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.display, DisplayMode::Hex);
        assert!(cfg.decorate);
        assert!(cfg.print_received);
        assert_eq!(cfg.spam.size, 1024);
        assert!(!cfg.spam.rate.is_enabled());
    }

    #[test]
    fn parse_spam_rates() {
        assert_eq!("0".parse::<SpamRate>().unwrap(), SpamRate::Disabled);
        assert_eq!("unlimited".parse::<SpamRate>().unwrap(), SpamRate::Unlimited);
        assert_eq!(
            "10".parse::<SpamRate>().unwrap(),
            SpamRate::PerSecond(NonZeroU32::new(10).unwrap())
        );
        assert!("fast".parse::<SpamRate>().is_err());
    }

    #[test]
    fn period_is_integer_microseconds() {
        assert_eq!(SpamRate::per_second(10).period(), Some(Duration::from_millis(100)));
        assert_eq!(SpamRate::per_second(3).period(), Some(Duration::from_micros(333_333)));
        assert_eq!(SpamRate::Unlimited.period(), None);
        assert_eq!(SpamRate::Disabled.period(), None);
    }

    #[test]
    fn zero_spam_size_rejected_only_when_spamming() {
        let mut cfg = SessionConfig::default();
        cfg.spam.size = 0;
        assert!(cfg.validate().is_ok());
        cfg.spam.rate = SpamRate::Unlimited;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rates_without_a_whole_microsecond_period_rejected() {
        let mut cfg = SessionConfig::default();
        cfg.spam.rate = SpamRate::per_second(MAX_SPAM_RATE);
        assert_eq!(cfg.spam.rate.period(), Some(Duration::from_micros(1)));
        assert!(cfg.validate().is_ok());

        cfg.spam.rate = SpamRate::per_second(MAX_SPAM_RATE + 1);
        assert_eq!(cfg.spam.rate.period(), Some(Duration::ZERO));
        assert!(matches!(cfg.validate(), Err(HextermError::InvalidConfig(_))));
    }
}
