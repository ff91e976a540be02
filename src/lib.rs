// cargo watch -x 'fmt' -x 'run'

pub mod config;
pub mod engine;
pub mod models;
pub mod output;
pub mod processing;

use config::TopologyConfig;
use engine::Plan;
use processing::Topology;
use std::error::Error;

/// Build the topology described by `config` into a fresh [`Plan`].
pub fn plan_topology(config: &TopologyConfig) -> Result<(Plan, Topology), Box<dyn Error>> {
    let mut plan = Plan::new();
    let topology = processing::build_topology(&mut plan, config)?;
    log::info!(
        "Planned {} resources and {} exports",
        plan.len(),
        plan.exports.len()
    );
    Ok((plan, topology))
}
