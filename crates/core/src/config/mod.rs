use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, RhythmError};

/// Top-level configuration structure for the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub clock: ClockConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing fields fall back to defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.clock.validate()?;
        self.session.validate()
    }
}

/// Timing of the periodic game clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Wall-clock spacing of clock interrupts.
    pub interrupt_interval_ms: u64,
    /// Interrupts per game tick.
    pub period: u16,
    /// Interrupt count at which the auxiliary cue fires.
    pub cue_threshold: u16,
    /// Capacity of the bounded event channel.
    pub queue_capacity: usize,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            interrupt_interval_ms: 16,
            period: 30,
            cue_threshold: 15,
            queue_capacity: 64,
        }
    }
}

impl ClockConfig {
    fn validate(&self) -> Result<()> {
        if self.interrupt_interval_ms == 0 {
            return Err(RhythmError::Config(
                "clock interrupt interval must be non-zero".into(),
            ));
        }
        if self.period == 0 {
            return Err(RhythmError::Config("clock period must be non-zero".into()));
        }
        if self.cue_threshold == 0 || self.cue_threshold >= self.period {
            return Err(RhythmError::Config(format!(
                "cue threshold {} must lie strictly inside the period {}",
                self.cue_threshold, self.period
            )));
        }
        if self.queue_capacity == 0 {
            return Err(RhythmError::Config("queue capacity must be non-zero".into()));
        }
        Ok(())
    }
}

/// Gameplay rules for a single session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub max_lives: i32,
    /// Scroll-only ticks before scoring starts.
    pub preroll_ticks: u32,
    pub window_width: usize,
    pub hit_score: u32,
    /// Ticks spent announcing the countdown before play starts.
    pub countdown_ticks: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_lives: 10,
            preroll_ticks: 10,
            window_width: 11,
            hit_score: 10,
            countdown_ticks: 3,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_lives <= 0 {
            return Err(RhythmError::Config("max lives must be positive".into()));
        }
        if self.window_width == 0 {
            return Err(RhythmError::Config("display window must hold at least one symbol".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_firmware_timing() {
        let config = AppConfig::default();
        assert_eq!(config.clock.period, 30);
        assert_eq!(config.clock.cue_threshold, 15);
        assert_eq!(config.session.preroll_ticks, 10);
        assert_eq!(config.session.window_width, 11);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = AppConfig::from_json(r#"{ "session": { "max_lives": 3 } }"#).unwrap();
        assert_eq!(config.session.max_lives, 3);
        assert_eq!(config.session.hit_score, 10);
        assert_eq!(config.clock, ClockConfig::default());
    }

    #[test]
    fn rejects_zero_interrupt_interval() {
        let err = AppConfig::from_json(r#"{ "clock": { "interrupt_interval_ms": 0 } }"#)
            .unwrap_err();
        assert!(format!("{err}").contains("interrupt interval"));
    }

    #[test]
    fn rejects_cue_outside_period() {
        let err = AppConfig::from_json(r#"{ "clock": { "period": 10, "cue_threshold": 10 } }"#)
            .unwrap_err();
        assert!(matches!(err, RhythmError::Config(_)));
    }
}
