//! Looper setup configuration
//!
//! Everything that decides allocation sizes or starting tempo. Read once at
//! startup; runtime changes go through [`LooperCommand`](crate::engine::LooperCommand).

use serde::{Deserialize, Serialize};

use crate::error::{LooperError, LooperResult};
use crate::types::{DEFAULT_BPM, DEFAULT_QUANTIZE_BEATS, DEFAULT_SAMPLE_RATE, MAX_UNDO_LEVELS};

/// Looper configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LooperConfig {
    /// Sample rate in Hz
    /// Default: 48000
    pub sample_rate: u32,

    /// Longest loop the buffer can hold, in seconds
    /// Default: 60.0
    pub max_loop_seconds: f64,

    /// Undo snapshot slots (0 disables undo, at most 3)
    /// Each slot is as large as the loop buffer.
    /// Default: 3
    pub undo_levels: usize,

    /// Starting tempo in BPM
    /// Default: 120.0
    pub bpm: f64,

    pub time_signature: TimeSignatureConfig,

    pub quantize: QuantizeConfig,
}

impl Default for LooperConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            max_loop_seconds: 60.0,
            undo_levels: MAX_UNDO_LEVELS,
            bpm: DEFAULT_BPM,
            time_signature: TimeSignatureConfig::default(),
            quantize: QuantizeConfig::default(),
        }
    }
}

/// Time signature, e.g. 3/4
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSignatureConfig {
    pub numerator: u8,
    pub denominator: u8,
}

impl Default for TimeSignatureConfig {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

/// Beat-grid alignment of recorded takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizeConfig {
    /// Default: false
    pub enabled: bool,
    /// Take lengths snap to multiples of this many beats
    /// Default: 4
    pub beats: usize,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            beats: DEFAULT_QUANTIZE_BEATS,
        }
    }
}

impl LooperConfig {
    /// Loop buffer size in samples: `round(sample_rate * max_loop_seconds)`
    pub fn buffer_capacity(&self) -> usize {
        let samples = self.sample_rate as f64 * self.max_loop_seconds;
        if samples.is_finite() && samples > 0.0 {
            samples.round() as usize
        } else {
            0
        }
    }

    /// Reject settings that cannot produce a working looper
    pub fn validate(&self) -> LooperResult<()> {
        if self.sample_rate == 0 {
            return Err(invalid("sample_rate must be positive"));
        }
        if self.buffer_capacity() == 0 {
            return Err(invalid(format!(
                "max_loop_seconds {} gives an empty buffer",
                self.max_loop_seconds
            )));
        }
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Err(invalid(format!("bpm {} must be positive", self.bpm)));
        }
        if self.time_signature.numerator == 0 || self.time_signature.denominator == 0 {
            return Err(invalid(format!(
                "time signature {}/{} has a zero part",
                self.time_signature.numerator, self.time_signature.denominator
            )));
        }
        if self.undo_levels > MAX_UNDO_LEVELS {
            return Err(invalid(format!(
                "undo_levels {} exceeds the maximum of {}",
                self.undo_levels, MAX_UNDO_LEVELS
            )));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> LooperError {
    LooperError::InvalidConfig(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LooperConfig::default();
        assert_eq!(config.buffer_capacity(), 2_880_000);
        assert_eq!(config.time_signature, TimeSignatureConfig { numerator: 4, denominator: 4 });
        assert!(!config.quantize.enabled);
        assert_eq!(config.quantize.beats, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_buffer_capacity_rounds() {
        let config = LooperConfig {
            sample_rate: 44100,
            max_loop_seconds: 0.00001,
            ..Default::default()
        };
        // 0.441 samples
        assert_eq!(config.buffer_capacity(), 0);

        let config = LooperConfig {
            sample_rate: 1000,
            max_loop_seconds: 1.2346,
            ..Default::default()
        };
        assert_eq!(config.buffer_capacity(), 1235);
    }

    #[test]
    fn test_validate_rejects_unusable_settings() {
        let cases = [
            LooperConfig { sample_rate: 0, ..Default::default() },
            LooperConfig { max_loop_seconds: 0.0, ..Default::default() },
            LooperConfig { max_loop_seconds: -3.0, ..Default::default() },
            LooperConfig { bpm: 0.0, ..Default::default() },
            LooperConfig { bpm: f64::NAN, ..Default::default() },
            LooperConfig {
                time_signature: TimeSignatureConfig { numerator: 0, denominator: 4 },
                ..Default::default()
            },
            LooperConfig { undo_levels: MAX_UNDO_LEVELS + 1, ..Default::default() },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(LooperError::InvalidConfig(_))),
                "{:?}",
                config
            );
        }
    }

    #[test]
    fn test_yaml_field_names() {
        let yaml = serde_yaml::to_string(&LooperConfig::default()).unwrap();
        assert!(yaml.contains("max_loop_seconds"));
        assert!(yaml.contains("undo_levels"));
        assert!(yaml.contains("numerator"));
    }
}
