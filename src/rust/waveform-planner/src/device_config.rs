// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::resolution::ResolutionMode;
use crate::{Error, Result};

fn default_channel() -> u8 {
    1
}

/// Channel configuration every planning call is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// DAC sample rate in Hz.
    pub sample_rate: f64,
    pub resolution: ResolutionMode,
    #[serde(default = "default_channel")]
    pub channel: u8,
}

impl DeviceConfig {
    pub fn new(sample_rate: f64, resolution: ResolutionMode) -> Self {
        DeviceConfig {
            sample_rate,
            resolution,
            channel: default_channel(),
        }
    }

    pub fn with_channel(self, channel: u8) -> Self {
        DeviceConfig { channel, ..self }
    }

    /// Load and validate a configuration from JSON, e.g.
    /// `{"sample_rate": 7.2e9, "resolution": "intx3"}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: DeviceConfig = serde_json::from_str(json)
            .map_err(|e| Error::new(format!("Invalid device configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(Error::Timing(format!(
                "Sample rate must be a positive finite value, got {}",
                self.sample_rate
            )));
        }
        if self.channel == 0 {
            return Err(Error::new("Channel numbers start at 1"));
        }
        Ok(())
    }

    /// Sample rate of the waveform data, i.e. the DAC rate divided by the
    /// interpolation factor in digital up-conversion modes.
    pub fn baseband_sample_rate(&self) -> f64 {
        self.sample_rate / f64::from(self.resolution.interpolation_factor())
    }
}
