//! Tunable constants for the whole field, gathered in one structure.
//!
//! Every section has reference defaults, so a JSON file only needs the keys
//! it wants to override:
//!
//! ```json
//! { "seeds": { "count": 24 }, "drift": { "amplitude": 0.02 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::activation::{DriftParams, FieldPalette, RevealStages, ShadingParams};
use crate::camera::CameraParams;
use crate::error::ConfigError;
use crate::geometry::VolumeShape;
use crate::seeds::SeedParams;
use crate::status::StatusTiming;

/// Complete configuration for a scene and its status line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub volume: VolumeShape,
    pub seeds: SeedParams,
    pub drift: DriftParams,
    pub reveal: RevealStages,
    pub shading: ShadingParams,
    pub palette: FieldPalette,
    pub camera: CameraParams,
    pub status: StatusTiming,
}

impl FieldConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: FieldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        tracing::info!(path = %path.as_ref().display(), "loaded field config");
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would make generation or shading meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.volume;
        if v.scale.min_element() <= 0.0 || !v.scale.is_finite() {
            return Err(invalid("volume.scale must be positive on every axis"));
        }
        if v.exponent.is_nan() || v.exponent <= 0.0 {
            return Err(invalid("volume.exponent must be positive"));
        }
        check_unit("volume.floor_keep", v.floor_keep)?;
        check_unit("volume.back_keep", v.back_keep)?;
        check_unit("volume.interior_density", v.interior_density)?;
        check_unit("volume.base_alpha_min", v.base_alpha_min)?;
        check_unit("volume.base_alpha_max", v.base_alpha_max)?;

        let s = &self.seeds;
        if s.speed_min <= 0.0 || s.speed_max < s.speed_min {
            return Err(invalid("seeds.speed range must be positive and ordered"));
        }
        if s.radius_min <= 0.0 || s.radius_max < s.radius_min {
            return Err(invalid("seeds.radius range must be positive and ordered"));
        }
        if s.center_bias <= 0.0 {
            return Err(invalid("seeds.center_bias must be positive"));
        }

        let r = &self.reveal;
        check_unit("reveal.surface_threshold_start", r.surface_threshold_start)?;
        if r.activation_end < r.activation_start || r.glow_end < r.glow_start {
            return Err(invalid("reveal stage ranges must be ordered"));
        }
        // The shader evaluates these edges itself, where equal edges are undefined.
        if r.surface_softness <= 0.0 {
            return Err(invalid("reveal.surface_softness must be positive"));
        }
        if !(r.progress_ease_secs >= 0.0 && r.progress_ease_secs.is_finite()) {
            return Err(invalid("reveal.progress_ease_secs must be finite and non-negative"));
        }

        let sh = &self.shading;
        if sh.depth_far <= sh.depth_near {
            return Err(invalid("shading.depth_far must be greater than depth_near"));
        }
        if sh.point_size <= 0.0 {
            return Err(invalid("shading.point_size must be positive"));
        }

        let st = &self.status;
        if st.char_delay_max_ms < st.char_delay_min_ms {
            return Err(invalid("status char delay range must be ordered"));
        }
        if st.char_delay_max_ms == 0 {
            return Err(invalid("status.char_delay_max_ms must be positive"));
        }
        if st.dwell_ms.saturating_add(st.fade_ms.saturating_mul(2)) == 0 {
            return Err(invalid("status dwell and fade cannot both be zero"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::Invalid(msg.to_string())
}

fn check_unit(name: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{} must be within [0, 1], got {}", name, value)))
    }
}
