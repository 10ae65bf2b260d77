//! Engine configuration loaded from TOML.
//!
//! ```toml
//! [scale]
//! categories = 5
//!
//! [estimator]
//! max_iter = 20
//! tol = 0.001
//! update_rule = "newton"
//! prior_variance = 4.0
//!
//! [population]
//! mean = 0.0
//! sd = 1.0
//!
//! [design]
//! fixed_items = ["BFE_01", "BFV_01", "BFG_01", "BFN_01", "BFO_01"]
//!
//! [design.stopping]
//! max_items = 20
//! min_items = 5
//! min_sem = 0.3
//! ```
//!
//! Every section and key is optional; missing values take their defaults.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::IrtResult;
use crate::estimation::{Estimator, EstimatorConfig};
use crate::item::{ItemBank, LikertScale};
use crate::scoring::PopulationNorms;
use crate::session::{CatDesign, CatSession};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scale: LikertScale,
    pub estimator: EstimatorConfig,
    pub population: PopulationNorms,
    pub design: CatDesign,
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> IrtResult<Self> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> IrtResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "engine config loaded");
        Ok(config)
    }

    /// Checks that do not need an item bank. Fixed ids are checked by [`Self::session`].
    pub fn validate(&self) -> IrtResult<()> {
        self.scale.validate()?;
        self.estimator.validate()?;
        self.population.validate()?;
        self.design.stopping.validate()
    }

    pub fn estimator(&self) -> IrtResult<Estimator> {
        Estimator::new(self.estimator.clone())
    }

    /// Start a session over `bank` with this configuration.
    pub fn session(&self, bank: Arc<ItemBank>) -> IrtResult<CatSession> {
        CatSession::new(bank, self.estimator()?, self.design.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IrtError;
    use crate::estimation::UpdateRule;

    #[test]
    fn empty_document_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.estimator.max_iter, 20);
        assert_eq!(config.scale.categories, 5);
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [estimator]
            update_rule = "damped_gradient"
            max_iter = 10

            [design.stopping]
            min_sem = 0.3
            "#,
        )
        .unwrap();
        assert_eq!(config.estimator.update_rule, UpdateRule::DampedGradient);
        assert_eq!(config.estimator.max_iter, 10);
        assert_eq!(config.estimator.tol, 1e-3);
        assert_eq!(config.design.stopping.min_sem, Some(0.3));
        assert_eq!(config.design.stopping.max_items, 10);
    }

    #[test]
    fn infinite_prior_variance_means_pure_mle() {
        let config = EngineConfig::from_toml_str("[estimator]\nprior_variance = inf").unwrap();
        assert_eq!(config.estimator.prior_precision(), 0.0);
        assert!(config.estimator().is_ok());
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("[population]\nsd = 0.0"),
            Err(IrtError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[scale]\ncategories = 1"),
            Err(IrtError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[estimator]\nupdate_rule = \"bisection\""),
            Err(IrtError::Parse(_))
        ));
    }
}
