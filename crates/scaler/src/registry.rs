//! Per-workload decision agents
//!
//! Every scaled workload gets its own agent, created on its first decision
//! request. Agents sit behind an async mutex so decisions for one workload
//! never overlap, while different workloads are decided in parallel.

use crate::config::StrategyKind;
use dashmap::{mapref::entry::Entry, DashMap};
use scaler_lib::{
    NoOpStrategy, QAgent, RlParameters, ScalerMetrics, ScalingStrategy, State, StrategyOutcome,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// A workload's strategy and the parameters it was built with
pub struct WorkloadAgent {
    strategy: Box<dyn ScalingStrategy>,
    parameters: RlParameters,
}

impl WorkloadAgent {
    pub fn make_decision(
        &mut self,
        state: &State,
        learning_state: &[u8],
    ) -> scaler_lib::Result<StrategyOutcome> {
        self.strategy.make_decision(state, learning_state)
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }
}

/// How new agents are built
#[derive(Debug, Clone)]
pub struct AgentFactory {
    pub strategy: StrategyKind,
    pub epsilon: f64,
    pub defaults: RlParameters,
    pub rng_seed: Option<u64>,
}

impl AgentFactory {
    fn build(
        &self,
        parameters: RlParameters,
        metrics: &ScalerMetrics,
    ) -> scaler_lib::Result<WorkloadAgent> {
        let strategy: Box<dyn ScalingStrategy> = match self.strategy {
            StrategyKind::Noop => Box::new(NoOpStrategy),
            StrategyKind::QLearning => {
                let agent = match self.rng_seed {
                    Some(seed) => QAgent::with_seed(parameters.clone(), self.epsilon, seed)?,
                    None => QAgent::new(parameters.clone(), self.epsilon)?,
                };
                Box::new(agent.with_metrics(metrics.clone()))
            }
        };
        Ok(WorkloadAgent {
            strategy,
            parameters,
        })
    }
}

pub type SharedAgent = Arc<Mutex<WorkloadAgent>>;

/// Concurrent map from workload key to its agent
#[derive(Clone)]
pub struct WorkloadRegistry {
    agents: Arc<DashMap<String, SharedAgent>>,
    factory: AgentFactory,
    metrics: ScalerMetrics,
}

impl WorkloadRegistry {
    pub fn new(factory: AgentFactory, metrics: ScalerMetrics) -> Self {
        Self {
            agents: Arc::new(DashMap::new()),
            factory,
            metrics,
        }
    }

    /// Agent for `workload`, created if missing
    ///
    /// An agent built with other parameters than `parameters` is replaced,
    /// which also drops its cached limits-to-requests ratios.
    pub async fn agent(
        &self,
        workload: &str,
        parameters: Option<RlParameters>,
    ) -> scaler_lib::Result<SharedAgent> {
        let parameters = parameters.unwrap_or_else(|| self.factory.defaults.clone());

        let mut replacing = false;
        if let Some(existing) = self.agents.get(workload).map(|entry| entry.value().clone()) {
            if existing.lock().await.parameters == parameters {
                return Ok(existing);
            }
            info!(workload = %workload, "Learning parameters changed, replacing agent");
            replacing = true;
        }

        let created = Arc::new(Mutex::new(self.factory.build(parameters, &self.metrics)?));
        // a concurrent first request may have won the race
        let agent = match self.agents.entry(workload.to_string()) {
            Entry::Occupied(entry) if !replacing => entry.get().clone(),
            Entry::Occupied(mut entry) => {
                entry.insert(created.clone());
                created
            }
            Entry::Vacant(entry) => {
                entry.insert(created.clone());
                info!(workload = %workload, strategy = ?self.factory.strategy, "Created decision agent");
                created
            }
        };
        self.metrics.set_workloads_tracked(self.agents.len() as i64);
        Ok(agent)
    }

    /// Forget a workload's agent; returns whether one existed
    pub fn remove(&self, workload: &str) -> bool {
        let removed = self.agents.remove(workload).is_some();
        self.metrics.set_workloads_tracked(self.agents.len() as i64);
        removed
    }

    /// Tracked workload keys, sorted
    pub fn workloads(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.agents.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
