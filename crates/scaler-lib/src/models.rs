//! Core data models for the decision engine

use crate::decimal::Quantity;
use crate::error::{Result, ScalingError};
use crate::quantity::serde_quantity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// CPU and memory amounts as exact decimals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourcesList {
    #[serde(with = "serde_quantity")]
    pub cpu: Quantity,
    #[serde(with = "serde_quantity")]
    pub memory: Quantity,
}

impl ResourcesList {
    pub fn new(cpu: Quantity, memory: Quantity) -> Self {
        Self { cpu, memory }
    }
}

/// Requests and limits of a container or a whole pod
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    pub requests: ResourcesList,
    pub limits: ResourcesList,
}

/// Container name to its allocated resources
pub type ContainerResources = BTreeMap<String, Resources>;

/// Scaling bounds configured on the scaled resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    pub min_replicas: i32,
    pub max_replicas: i32,
    /// Per-pod lower bound
    pub min_resources: ResourcesList,
    /// Per-pod upper bound
    pub max_resources: ResourcesList,
}

/// Resource usage and allocation aggregated over one pod
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodMetrics {
    pub resource_usage: ResourcesList,
    pub requests: ResourcesList,
    pub limits: ResourcesList,
    #[serde(default)]
    pub latency_threshold_exceeded: bool,
}

/// Snapshot of a scaled workload, built fresh on every reconciliation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub replicas: i32,
    #[serde(default)]
    pub container_resources: ContainerResources,
    pub constraints: Constraints,
    pub pod_metrics: PodMetrics,
    /// Target utilization per resource, as a fraction (0.5 means 50%)
    pub target_utilization: ResourcesList,
}

/// The next desired allocation of a workload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingDecision {
    pub replicas: i32,
    pub container_resources: ContainerResources,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

impl ScalingDecision {
    /// A decision that keeps the current allocation
    pub fn unchanged(state: &State) -> Self {
        Self {
            replicas: state.replicas,
            container_resources: state.container_resources.clone(),
            action: None,
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }
}

/// Scaling actions available to the learning agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    None,
    Horizontal,
    Vertical,
    Hybrid,
    HybridInverse,
}

impl Action {
    /// Every action, in the order candidates are listed
    pub const ALL: [Action; 5] = [
        Action::None,
        Action::Horizontal,
        Action::Vertical,
        Action::Hybrid,
        Action::HybridInverse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::None => "NONE",
            Action::Horizontal => "HORIZONTAL",
            Action::Vertical => "VERTICAL",
            Action::Hybrid => "HYBRID",
            Action::HybridInverse => "HYBRID_INVERSE",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ScalingError;

    fn from_str(s: &str) -> Result<Self> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ScalingError::invalid_input(format!("unknown action {:?}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::dec;

    #[test]
    fn test_action_names_round_trip() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
        assert_eq!("hybrid_inverse".parse::<Action>().unwrap(), Action::HybridInverse);
        assert!("sideways".parse::<Action>().is_err());
    }

    #[test]
    fn test_action_serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&Action::HybridInverse).unwrap();
        assert_eq!(json, r#""HYBRID_INVERSE""#);
    }

    #[test]
    fn test_state_deserializes_kubernetes_quantities() {
        let json = r#"{
            "replicas": 2,
            "containerResources": {
                "app": {
                    "requests": {"cpu": "100m", "memory": "128Mi"},
                    "limits": {"cpu": "200m", "memory": "256Mi"}
                }
            },
            "constraints": {
                "minReplicas": 1,
                "maxReplicas": 5,
                "minResources": {"cpu": "50m", "memory": "64Mi"},
                "maxResources": {"cpu": "1", "memory": "1Gi"}
            },
            "podMetrics": {
                "resourceUsage": {"cpu": "80m", "memory": "100Mi"},
                "requests": {"cpu": "100m", "memory": "128Mi"},
                "limits": {"cpu": "200m", "memory": "256Mi"}
            },
            "targetUtilization": {"cpu": 0.5, "memory": "0.8"}
        }"#;

        let state: State = serde_json::from_str(json).unwrap();
        assert_eq!(state.replicas, 2);
        assert_eq!(state.container_resources["app"].requests.cpu, dec(1, 1));
        assert_eq!(state.constraints.max_resources.memory, dec(1_073_741_824, 0));
        assert_eq!(state.target_utilization.cpu, dec(5, 1));
        assert!(!state.pod_metrics.latency_threshold_exceeded);
    }

    #[test]
    fn test_unchanged_decision_mirrors_state() {
        let mut state = State {
            replicas: 4,
            ..Default::default()
        };
        state
            .container_resources
            .insert("app".to_string(), Resources::default());

        let decision = ScalingDecision::unchanged(&state).with_action(Action::None);
        assert_eq!(decision.replicas, 4);
        assert!(decision.container_resources.contains_key("app"));
        assert_eq!(decision.action, Some(Action::None));
    }
}
