use crate::{DenoiseConfig, ViewshedError};
use serde::{Deserialize, Serialize};
use sightline::LosConfig;

/// Every tunable, loadable from a single JSON document.
///
/// ```
/// let config: viewshed::Config = serde_json::from_str(
///     r#"{"sampleStepMeters": 15, "noDataPolicy": "treatAsVisible", "denoiseWindowSize": 5}"#,
/// )
/// .unwrap();
/// assert_eq!(config.los.sample_step_meters, Some(15.0));
/// assert_eq!(config.denoise.window_size, 5);
/// assert_eq!(config.denoise.iterations, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub los: LosConfig,

    #[serde(flatten)]
    pub denoise: DenoiseConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ViewshedError> {
        self.los.validate()?;
        self.denoise.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use sightline::{NoDataPolicy, TieBreak};

    #[test]
    fn test_full_document() {
        let config: Config = serde_json::from_str(
            r#"{
                "sampleStepMeters": 10,
                "refractionCoefficient": 0.2,
                "noDataPolicy": "treatAsVisible",
                "tieBreak": "inclusive",
                "denoiseWindowSize": 5,
                "denoiseIterations": 2
            }"#,
        )
        .unwrap();
        assert_eq!(config.los.sample_step_meters, Some(10.0));
        assert_eq!(config.los.refraction_coefficient, 0.2);
        assert_eq!(config.los.no_data_policy, NoDataPolicy::TreatAsVisible);
        assert_eq!(config.los.tie_break, TieBreak::Inclusive);
        assert_eq!(config.denoise.window_size, 5);
        assert_eq!(config.denoise.iterations, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid() {
        let config: Config = serde_json::from_str(r#"{"denoiseWindowSize": 4}"#).unwrap();
        assert!(config.validate().is_err());
        let config: Config = serde_json::from_str(r#"{"refractionCoefficient": 1.5}"#).unwrap();
        assert!(config.validate().is_err());
    }
}
