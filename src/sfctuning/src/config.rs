use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use sfcsim::allocation::ResourcePool;
use sfcsim::topology::Topology;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkConfig {
    pub a: String,
    pub b: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyntheticDemands {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemandConfig {
    /// Read magnitudes from a text file, one per line.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Generate magnitudes from a seeded uniform distribution.
    #[serde(default)]
    pub synthetic: Option<SyntheticDemands>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperimentConfig {
    /// Undirected weighted links of the physical topology.
    pub edges: Vec<LinkConfig>,

    /// The service function chain, in traversal order.
    pub chain: Vec<String>,

    /// Nominal VNF capacities at the start of the run.
    pub vnf_capacity: HashMap<String, f64>,

    /// Baseline available capacity per node.
    pub node_capacity: HashMap<String, f64>,

    /// Nodes allowed to host each VNF, in tie-break order.
    pub eligibility: HashMap<String, Vec<String>>,

    /// Where demands enter the network.
    pub source: String,

    /// Where demands leave the network.
    pub destination: String,

    pub demands: DemandConfig,

    /// Decrement node availability when a demand is accepted. Off by
    /// default: every demand then sees the same baseline pool.
    #[serde(default)]
    pub reserve_on_accept: bool,

    /// Where to write the four-line summary report.
    #[serde(default)]
    pub report: Option<PathBuf>,

    /// Where to write the DOT overlay of all routed flows.
    #[serde(default)]
    pub flow_graph: Option<PathBuf>,
}

pub fn read_config<P: AsRef<Path>>(path: P) -> Result<ExperimentConfig> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("fail to open {:?}", path.as_ref()))?;
    let config: ExperimentConfig =
        toml::from_str(&content).with_context(|| format!("fail to parse {:?}", path.as_ref()))?;
    config.validate()?;
    Ok(config)
}

impl ExperimentConfig {
    /// Cross-checks the configuration before any demand is processed.
    /// Every failure here aborts the run with no partial report.
    pub fn validate(&self) -> Result<()> {
        if self.edges.is_empty() {
            bail!("the topology has no links");
        }
        for e in &self.edges {
            if e.a == e.b {
                bail!("self-loop on node {}", e.a);
            }
            if !(e.weight >= 0.0) {
                bail!("link {} - {} has invalid weight {}", e.a, e.b, e.weight);
            }
        }
        let nodes: HashSet<&str> = self
            .edges
            .iter()
            .flat_map(|e| vec![e.a.as_str(), e.b.as_str()])
            .collect();

        if self.chain.is_empty() {
            bail!("the chain must name at least one VNF");
        }
        for vnf in &self.chain {
            match self.vnf_capacity.get(vnf) {
                Some(cap) if *cap > 0.0 => {}
                Some(cap) => bail!("VNF {} has non-positive capacity {}", vnf, cap),
                None => bail!("missing capacity for VNF {}", vnf),
            }
            let eligible = match self.eligibility.get(vnf) {
                Some(e) if !e.is_empty() => e,
                Some(_) => bail!("VNF {} has an empty eligible-node set", vnf),
                None => bail!("missing eligible-node entry for VNF {}", vnf),
            };
            for n in eligible {
                if !nodes.contains(n.as_str()) {
                    bail!("eligible node {} for VNF {} is not in the topology", n, vnf);
                }
            }
        }
        for (n, cap) in &self.node_capacity {
            if !nodes.contains(n.as_str()) {
                bail!("node capacity given for unknown node {}", n);
            }
            if *cap < 0.0 {
                bail!("node {} has negative capacity {}", n, cap);
            }
        }
        for endpoint in &[&self.source, &self.destination] {
            if !nodes.contains(endpoint.as_str()) {
                bail!("unknown endpoint node: {}", endpoint);
            }
        }
        match (&self.demands.file, &self.demands.synthetic) {
            (None, None) => bail!("no demand source configured"),
            (Some(_), Some(_)) => bail!("configure either a demand file or synthetic demands, not both"),
            (_, Some(spec)) => {
                if spec.count == 0 {
                    bail!("synthetic demand count must be positive");
                }
                if !(spec.min > 0.0 && spec.min <= spec.max) {
                    bail!(
                        "synthetic demand range [{}, {}] must be positive and ordered",
                        spec.min,
                        spec.max
                    );
                }
            }
            (Some(_), None) => {}
        }
        Ok(())
    }

    pub fn build_topology(&self) -> Topology {
        Topology::from_edges(self.edges.iter().map(|e| (&e.a, &e.b, e.weight)))
    }

    /// Nominal capacities keyed in chain order.
    pub fn vnf_capacities(&self) -> IndexMap<String, f64> {
        self.chain
            .iter()
            .map(|v| (v.clone(), self.vnf_capacity[v]))
            .collect()
    }

    /// Eligible-node lists keyed in chain order.
    pub fn eligibility_map(&self) -> IndexMap<String, Vec<String>> {
        self.chain
            .iter()
            .map(|v| (v.clone(), self.eligibility[v].clone()))
            .collect()
    }

    pub fn resource_pool(&self) -> ResourcePool {
        let baseline = self
            .node_capacity
            .iter()
            .map(|(n, c)| (n.clone(), *c))
            .collect();
        if self.reserve_on_accept {
            ResourcePool::with_reservation(baseline)
        } else {
            ResourcePool::new(baseline)
        }
    }
}
