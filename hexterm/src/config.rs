//! Terminal configuration: the TOML file plus command-line overrides.

use std::path::Path;

use clap::Args;
use serde::{Deserialize, Serialize};

use hexterm_core::{DisplayMode, SessionConfig, SpamRate};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HextermConfig {
    /// Presentation and load settings handed to every session.
    pub session: SessionConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level, overridden by `RUST_LOG`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

// ── Overrides ────────────────────────────────────────────────────

/// Session flags given on the command line. Each one that is set wins
/// over the file.
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Show and send ascii text instead of hex bytes.
    #[arg(short, long)]
    pub ascii: bool,

    /// No borders, no offsets, no "Sent" echoes.
    #[arg(short, long)]
    pub plain: bool,

    /// Print a checksum under every dump.
    #[arg(long)]
    pub print_checksums: bool,

    /// Don't dump received bytes.
    #[arg(long)]
    pub quiet_receive: bool,

    /// Don't log spam transmissions.
    #[arg(long)]
    pub quiet_send: bool,

    /// Spam packets per second, or "unlimited".
    #[arg(long, value_name = "N|unlimited")]
    pub spam_rate: Option<SpamRate>,

    /// Bytes per spam packet.
    #[arg(long, value_name = "BYTES")]
    pub spam_size: Option<u32>,

    /// Check every received buffer against the spam format.
    #[arg(long)]
    pub verify_spam: bool,
}

// ── Loading ──────────────────────────────────────────────────────

impl HextermConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn apply(&mut self, o: &Overrides) {
        let s = &mut self.session;
        if o.ascii {
            s.display = DisplayMode::Ascii;
        }
        if o.plain {
            s.decorate = false;
        }
        s.print_checksums |= o.print_checksums;
        if o.quiet_receive {
            s.print_received = false;
        }
        s.quiet_send |= o.quiet_send;
        if let Some(rate) = o.spam_rate {
            s.spam.rate = rate;
        }
        if let Some(size) = o.spam_size {
            s.spam.size = size;
        }
        s.spam.verify |= o.verify_spam;
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let text = toml::to_string_pretty(&HextermConfig::default()).unwrap();
        assert!(text.contains("[session]"));
        assert!(text.contains("[session.spam]"));
        assert!(text.contains("display = \"hex\""));
        assert!(text.contains("level = \"info\""));
    }

    #[test]
    fn roundtrip_config() {
        let mut cfg = HextermConfig::default();
        cfg.session.spam.rate = SpamRate::Unlimited;
        cfg.session.display = DisplayMode::Ascii;
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: HextermConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.session, cfg.session);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let parsed: HextermConfig = toml::from_str(
            r#"
            [session]
            print_checksums = true

            [session.spam]
            rate = 25
            "#,
        )
        .unwrap();
        assert!(parsed.session.print_checksums);
        assert!(parsed.session.decorate);
        assert_eq!(parsed.session.spam.rate, SpamRate::per_second(25));
        assert_eq!(parsed.session.spam.size, 1024);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn named_rate_in_file() {
        let parsed: HextermConfig = toml::from_str("[session.spam]\nrate = \"unlimited\"\n").unwrap();
        assert_eq!(parsed.session.spam.rate, SpamRate::Unlimited);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let cfg = HextermConfig::load(Path::new("/nonexistent/hexterm.toml"));
        assert_eq!(cfg.session, SessionConfig::default());
    }

    #[test]
    fn overrides_win_over_file() {
        let mut cfg = HextermConfig::default();
        cfg.session.spam.verify = true;
        cfg.apply(&Overrides {
            ascii: true,
            plain: true,
            quiet_receive: true,
            spam_rate: Some(SpamRate::per_second(5)),
            spam_size: Some(64),
            ..Default::default()
        });
        let s = &cfg.session;
        assert_eq!(s.display, DisplayMode::Ascii);
        assert!(!s.decorate);
        assert!(!s.print_received);
        assert_eq!(s.spam.rate, SpamRate::per_second(5));
        assert_eq!(s.spam.size, 64);
        // Unset flags leave the file's value alone.
        assert!(s.spam.verify);
    }
}
