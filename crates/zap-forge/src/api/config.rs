use serde::{Deserialize, Serialize};

use crate::api::error::ExportError;
use crate::geometry::flatten::FlattenOptions;
use crate::geometry::simplify::SimplifyOptions;

/// Settings for one export run, supplied by the host at invocation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    /// Authoring pixels per physics unit (default: 1). Every exported length
    /// is divided by this.
    pub pixels_per_unit: f64,
    /// Curve flattening tolerances.
    pub flatten: FlattenOptions,
    /// Defaults for `SimplifiedConvex` colliders; objects may override them
    /// with the `simplifyEpsilon` / `simplifyMaxPoints` custom params.
    pub simplify: SimplifyOptions,
    /// Timestamp written into every level's meta. When absent the current
    /// UTC time is used.
    pub timestamp: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pixels_per_unit: 1.0,
            flatten: FlattenOptions::default(),
            simplify: SimplifyOptions::default(),
            timestamp: None,
        }
    }
}

impl ExportConfig {
    /// Parse a config from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        serde_json::from_str(json).map_err(ExportError::Config)
    }

    pub fn with_pixels_per_unit(mut self, pixels_per_unit: f64) -> Self {
        self.pixels_per_unit = pixels_per_unit;
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// The scale to apply, or a warning message when the configured value is
    /// unusable (non-finite or not positive) and 1 must be used instead.
    pub fn checked_pixels_per_unit(&self) -> Result<f64, String> {
        let ppu = self.pixels_per_unit;
        if ppu.is_finite() && ppu > 0.0 {
            Ok(ppu)
        } else {
            Err(format!("pixelsPerUnit {} is invalid; using 1", ppu))
        }
    }

    /// Timestamp for this run: the configured one, or now in RFC 3339.
    pub fn resolve_timestamp(&self) -> String {
        self.timestamp
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.pixels_per_unit, 1.0);
        assert_eq!(config.flatten.curve_tolerance, 0.75);
        assert_eq!(config.flatten.max_recursion_depth, 10);
        assert_eq!(config.simplify.epsilon, 1.5);
        assert_eq!(config.simplify.max_points, None);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = ExportConfig::from_json(
            r#"{ "pixelsPerUnit": 32, "simplify": { "maxPoints": 8 } }"#,
        )
        .unwrap();
        assert_eq!(config.pixels_per_unit, 32.0);
        assert_eq!(config.simplify.max_points, Some(8));
        assert_eq!(config.simplify.epsilon, 1.5);
        assert_eq!(config.flatten, FlattenOptions::default());
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(ExportConfig::from_json("{}").unwrap(), ExportConfig::default());
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            ExportConfig::from_json("{ \"pixelsPerUnit\": \"lots\" }"),
            Err(ExportError::Config(_))
        ));
    }

    #[test]
    fn invalid_scale_is_rejected() {
        for bad in [0.0, -4.0, f64::NAN, f64::INFINITY] {
            let config = ExportConfig::default().with_pixels_per_unit(bad);
            assert!(config.checked_pixels_per_unit().is_err());
        }
        let config = ExportConfig::default().with_pixels_per_unit(16.0);
        assert_eq!(config.checked_pixels_per_unit(), Ok(16.0));
    }

    #[test]
    fn explicit_timestamp_is_kept() {
        let config = ExportConfig::default().with_timestamp("2024-01-01T00:00:00Z");
        assert_eq!(config.resolve_timestamp(), "2024-01-01T00:00:00Z");
        assert!(ExportConfig::default().resolve_timestamp().ends_with('Z'));
    }
}
