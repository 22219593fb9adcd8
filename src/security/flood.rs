//! Byte-based flood protection.
//!
//! Every session owns a [`FloodWindow`]; the shared [`FloodProtection`]
//! holds the runtime-tunable period and thresholds. Windows start at the
//! session's own first byte, not on a global clock. This module only
//! reports a violation: what to do about it is the connection's call.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::config::FloodConfig;

/// Which flood parameter an admin is changing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloodParameter {
    /// Window length in seconds.
    Period,
    /// Byte threshold for ordinary accounts.
    User,
    /// Byte threshold for bot accounts.
    Bot,
}

impl FromStr for FloodParameter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PERIOD" => Ok(Self::Period),
            "USER" => Ok(Self::User),
            "BOT" => Ok(Self::Bot),
            _ => Err(()),
        }
    }
}

/// Per-session byte counter for the current window.
#[derive(Debug, Clone, Default)]
pub struct FloodWindow {
    started: Option<Instant>,
    bytes: u64,
    alerted: bool,
}

impl FloodWindow {
    /// Bytes counted in the window as of `now`; zero once the window expired.
    pub fn bytes_at(&self, period: Duration, now: Instant) -> u64 {
        match self.started {
            Some(started) if now.saturating_duration_since(started) < period => self.bytes,
            _ => 0,
        }
    }
}

/// Outcome of recording received bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloodVerdict {
    /// Still under the threshold, or already alerted in this window.
    Within,
    /// The threshold was crossed for the first time in this window.
    Exceeded { bytes: u64, threshold: u64 },
}

/// Shared flood parameters.
#[derive(Debug)]
pub struct FloodProtection {
    period_secs: AtomicU64,
    user_threshold: AtomicU64,
    bot_threshold: AtomicU64,
}

impl FloodProtection {
    pub const DEFAULT_PERIOD_SECS: u64 = 10;
    pub const DEFAULT_USER_THRESHOLD: u64 = 20_000;
    pub const DEFAULT_BOT_THRESHOLD: u64 = 50_000;

    pub fn new(period_secs: u64, user_threshold: u64, bot_threshold: u64) -> Self {
        Self {
            period_secs: AtomicU64::new(period_secs),
            user_threshold: AtomicU64::new(user_threshold),
            bot_threshold: AtomicU64::new(bot_threshold),
        }
    }

    pub fn from_config(config: &FloodConfig) -> Self {
        Self::new(config.period, config.user_threshold, config.bot_threshold)
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs.load(Ordering::Relaxed))
    }

    pub fn threshold(&self, bot: bool) -> u64 {
        if bot {
            self.bot_threshold.load(Ordering::Relaxed)
        } else {
            self.user_threshold.load(Ordering::Relaxed)
        }
    }

    /// Change one parameter. Takes effect on the next recorded line of every session.
    pub fn set(&self, parameter: FloodParameter, value: u64) {
        let slot = match parameter {
            FloodParameter::Period => &self.period_secs,
            FloodParameter::User => &self.user_threshold,
            FloodParameter::Bot => &self.bot_threshold,
        };
        slot.store(value, Ordering::Relaxed);
    }

    /// Record `bytes` received now.
    pub fn record(&self, window: &mut FloodWindow, bytes: usize, bot: bool) -> FloodVerdict {
        self.record_at(window, bytes, bot, Instant::now())
    }

    /// Record `bytes` received at `now`.
    pub fn record_at(
        &self,
        window: &mut FloodWindow,
        bytes: usize,
        bot: bool,
        now: Instant,
    ) -> FloodVerdict {
        let period = self.period();
        let expired = window
            .started
            .is_none_or(|started| now.saturating_duration_since(started) >= period);
        if expired {
            *window = FloodWindow {
                started: Some(now),
                bytes: 0,
                alerted: false,
            };
        }

        window.bytes = window.bytes.saturating_add(bytes as u64);
        let threshold = self.threshold(bot);
        if window.bytes > threshold && !window.alerted {
            window.alerted = true;
            return FloodVerdict::Exceeded {
                bytes: window.bytes,
                threshold,
            };
        }
        FloodVerdict::Within
    }
}

impl Default for FloodProtection {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_PERIOD_SECS,
            Self::DEFAULT_USER_THRESHOLD,
            Self::DEFAULT_BOT_THRESHOLD,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_alert_per_crossing() {
        let flood = FloodProtection::new(10, 100, 1000);
        let mut window = FloodWindow::default();
        let t0 = Instant::now();

        assert_eq!(flood.record_at(&mut window, 60, false, t0), FloodVerdict::Within);
        assert_eq!(
            flood.record_at(&mut window, 60, false, t0 + Duration::from_secs(1)),
            FloodVerdict::Exceeded {
                bytes: 120,
                threshold: 100
            }
        );
        assert_eq!(
            flood.record_at(&mut window, 60, false, t0 + Duration::from_secs(2)),
            FloodVerdict::Within
        );
    }

    #[test]
    fn test_window_resets_after_period() {
        let flood = FloodProtection::new(10, 100, 1000);
        let mut window = FloodWindow::default();
        let t0 = Instant::now();

        flood.record_at(&mut window, 150, false, t0);
        assert_eq!(window.bytes_at(flood.period(), t0), 150);

        let later = t0 + Duration::from_secs(10);
        assert_eq!(window.bytes_at(flood.period(), later), 0);
        assert_eq!(flood.record_at(&mut window, 50, false, later), FloodVerdict::Within);
        assert_eq!(window.bytes_at(flood.period(), later), 50);

        // A fresh window may alert again.
        assert!(matches!(
            flood.record_at(&mut window, 60, false, later + Duration::from_secs(1)),
            FloodVerdict::Exceeded { bytes: 110, .. }
        ));
    }

    #[test]
    fn test_window_measured_from_first_byte() {
        let flood = FloodProtection::new(10, 100, 1000);
        let mut window = FloodWindow::default();
        let t0 = Instant::now();

        flood.record_at(&mut window, 90, false, t0 + Duration::from_secs(5));
        // 9s after the first byte the window is still open.
        assert!(matches!(
            flood.record_at(&mut window, 20, false, t0 + Duration::from_secs(14)),
            FloodVerdict::Exceeded { .. }
        ));
    }

    #[test]
    fn test_bot_threshold() {
        let flood = FloodProtection::new(10, 100, 1000);
        let mut window = FloodWindow::default();
        let t0 = Instant::now();

        assert_eq!(flood.record_at(&mut window, 500, true, t0), FloodVerdict::Within);
        assert!(matches!(
            flood.record_at(&mut window, 501, true, t0),
            FloodVerdict::Exceeded { threshold: 1000, .. }
        ));
    }

    #[test]
    fn test_runtime_period_change() {
        let flood = FloodProtection::new(10, 100, 1000);
        let mut window = FloodWindow::default();
        let t0 = Instant::now();

        flood.set(FloodParameter::Period, 120);
        assert_eq!(flood.period(), Duration::from_secs(120));

        flood.record_at(&mut window, 60, false, t0);
        // Would have reset under the old 10s period.
        assert!(matches!(
            flood.record_at(&mut window, 60, false, t0 + Duration::from_secs(60)),
            FloodVerdict::Exceeded { bytes: 120, .. }
        ));
    }

    #[test]
    fn test_parameter_parse() {
        assert_eq!("period".parse(), Ok(FloodParameter::Period));
        assert_eq!("USER".parse(), Ok(FloodParameter::User));
        assert_eq!("Bot".parse(), Ok(FloodParameter::Bot));
        assert!("BYTES".parse::<FloodParameter>().is_err());
    }
}
