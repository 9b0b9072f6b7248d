//! Service configuration

use anyhow::{Context, Result};
use scaler_lib::quantity::parse_quantity;
use scaler_lib::RlParameters;
use serde::Deserialize;

/// Which strategy new workloads get
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    QLearning,
    Noop,
}

/// Service configuration, read from `HYBRID_SCALER_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerConfig {
    /// Instance name attached to every log event
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// Port for the decision API, health probes and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default = "default_strategy")]
    pub strategy: StrategyKind,

    /// Exploration probability of new agents
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Default cost model, used when a request carries no parameters
    #[serde(default = "default_cpu_cost")]
    pub cpu_cost: String,

    #[serde(default = "default_memory_cost")]
    pub memory_cost: String,

    #[serde(default = "default_underprovisioning_penalty")]
    pub underprovisioning_penalty: String,

    #[serde(default = "default_alpha")]
    pub alpha: String,

    #[serde(default = "default_gamma")]
    pub gamma: String,

    /// Seed for reproducible exploration; entropy when unset
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_instance_name() -> String {
    std::env::var("POD_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| "hybrid-scaler".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_strategy() -> StrategyKind {
    StrategyKind::QLearning
}

fn default_epsilon() -> f64 {
    0.1
}

fn default_cpu_cost() -> String {
    "1".to_string()
}

fn default_memory_cost() -> String {
    "0.000000001".to_string()
}

fn default_underprovisioning_penalty() -> String {
    "2".to_string()
}

fn default_alpha() -> String {
    "0.5".to_string()
}

fn default_gamma() -> String {
    "0.9".to_string()
}

impl Default for ScalerConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            strategy: default_strategy(),
            epsilon: default_epsilon(),
            cpu_cost: default_cpu_cost(),
            memory_cost: default_memory_cost(),
            underprovisioning_penalty: default_underprovisioning_penalty(),
            alpha: default_alpha(),
            gamma: default_gamma(),
            rng_seed: None,
        }
    }
}

impl ScalerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("HYBRID_SCALER").try_parsing(true))
            .build()
            .context("failed to read configuration")?;

        let config: ScalerConfig = config
            .try_deserialize()
            .context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.epsilon) {
            anyhow::bail!("epsilon must be between 0 and 1, got {}", self.epsilon);
        }
        self.rl_parameters()?
            .validate()
            .context("invalid default learning parameters")?;
        Ok(())
    }

    /// Default learning parameters as exact decimals
    pub fn rl_parameters(&self) -> Result<RlParameters> {
        let parse = |value: &str, name: &str| {
            parse_quantity(value).with_context(|| format!("invalid {}: {:?}", name, value))
        };

        Ok(RlParameters {
            cpu_cost: parse(&self.cpu_cost, "cpu_cost")?,
            memory_cost: parse(&self.memory_cost, "memory_cost")?,
            underprovisioning_penalty: parse(
                &self.underprovisioning_penalty,
                "underprovisioning_penalty",
            )?,
            alpha: parse(&self.alpha, "alpha")?,
            gamma: parse(&self.gamma, "gamma")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_match_library_defaults() {
        let config = ScalerConfig::default();
        assert_eq!(config.rl_parameters().unwrap(), RlParameters::default());
        assert_eq!(config.strategy, StrategyKind::QLearning);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_cost_rejected() {
        let config = ScalerConfig {
            memory_cost: "cheap".to_string(),
            ..Default::default()
        };
        let err = config.rl_parameters().unwrap_err();
        assert!(err.to_string().contains("memory_cost"));
    }

    #[test]
    fn test_epsilon_out_of_range_rejected() {
        let config = ScalerConfig {
            epsilon: 2.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_strategy_names() {
        let kind: StrategyKind = serde_json::from_str(r#""q-learning""#).unwrap();
        assert_eq!(kind, StrategyKind::QLearning);
        let kind: StrategyKind = serde_json::from_str(r#""noop""#).unwrap();
        assert_eq!(kind, StrategyKind::Noop);
    }
}
