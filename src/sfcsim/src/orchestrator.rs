//! Sequencing of a traffic demand through the whole chain:
//! tune, admit, bind, then route every stage boundary.

use indexmap::IndexMap;
use log::info;

use crate::allocation::{AllocationError, NodeAllocator, ResourcePool, VnfAllocation};
use crate::routing::{assign_flows, resolve_paths, RoutedPath, TieBreak};
use crate::topology::Topology;
use crate::tuning::tuned_capacity;
use crate::{Capacity, Traffic};

/// Routed paths for one stage boundary of the chain.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub label: String,
    pub paths: Vec<RoutedPath>,
}

impl StageResult {
    pub fn total_flow(&self) -> Traffic {
        self.paths.iter().map(|p| p.amount).sum()
    }
}

/// Terminal state of one processed demand.
#[derive(Debug)]
pub enum DemandOutcome {
    Accepted {
        allocations: Vec<VnfAllocation>,
        stages: Vec<StageResult>,
    },
    Rejected {
        error: AllocationError,
    },
}

impl DemandOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, DemandOutcome::Accepted { .. })
    }
}

/// Aggregate counters over a whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub demands_processed: usize,
    pub demands_accepted: usize,
    /// Percentage of demands admitted.
    pub acceptance_ratio: f64,
    /// Complement of the acceptance ratio.
    pub violation_ratio: f64,
    /// Capacity units held by all VNFs of all accepted demands.
    pub total_resources: Capacity,
}

/// Processes demands one at a time, in input order.
///
/// The only state carried across demands is each VNF's working capacity
/// (and node reservations, when the pool runs with reservation on); each
/// demand is otherwise evaluated from scratch.
pub struct ChainOrchestrator<'a> {
    topo: &'a Topology,
    chain: Vec<String>,
    capacities: IndexMap<String, Capacity>,
    eligibility: IndexMap<String, Vec<String>>,
    pool: ResourcePool,
    source: String,
    destination: String,
    processed: usize,
    accepted: usize,
    resources_used: Capacity,
}

impl<'a> ChainOrchestrator<'a> {
    pub fn new(
        topo: &'a Topology,
        chain: Vec<String>,
        capacities: IndexMap<String, Capacity>,
        eligibility: IndexMap<String, Vec<String>>,
        pool: ResourcePool,
        source: String,
        destination: String,
    ) -> Self {
        assert!(!chain.is_empty(), "the chain must name at least one VNF");
        for vnf in &chain {
            let cap = capacities
                .get(vnf)
                .unwrap_or_else(|| panic!("no capacity for VNF {}", vnf));
            assert!(*cap > 0.0, "nominal capacity of VNF {} must be positive", vnf);
            assert!(
                eligibility.contains_key(vnf),
                "no eligible-node entry for VNF {}",
                vnf
            );
        }
        assert!(topo.contains(&source), "unknown source node: {}", source);
        assert!(
            topo.contains(&destination),
            "unknown destination node: {}",
            destination
        );

        ChainOrchestrator {
            topo,
            chain,
            capacities,
            eligibility,
            pool,
            source,
            destination,
            processed: 0,
            accepted: 0,
            resources_used: 0.0,
        }
    }

    /// Runs one demand through `Tuning -> AllocationCheck ->
    /// { Rejected | Routing(stage 0..N) -> Accepted }`.
    pub fn process(&mut self, demand: Traffic) -> DemandOutcome {
        assert!(demand > 0.0, "demand magnitudes must be positive");
        self.processed += 1;

        // Tuning. The working capacities move even if the demand is later
        // rejected; the next demand starts from wherever this one ended.
        for vnf in &self.chain {
            let tuned = tuned_capacity(self.capacities[vnf.as_str()], demand);
            info!("VNF {} requires {} for demand {}", vnf, tuned, demand);
            self.capacities.insert(vnf.clone(), tuned);
        }

        // Allocation check, per VNF in chain order.
        let allocator = NodeAllocator::new(&self.pool, &self.eligibility);
        let mut allocations = Vec::with_capacity(self.chain.len());
        for vnf in &self.chain {
            let required = self.capacities[vnf.as_str()];
            match allocator.allocate(vnf, required, demand) {
                Ok(alloc) => allocations.push(alloc),
                Err(error) => {
                    info!("demand {} rejected: {}", demand, error);
                    return DemandOutcome::Rejected { error };
                }
            }
        }

        // Routing across the N+1 stage boundaries.
        let mut stages = Vec::with_capacity(self.chain.len() + 1);
        let mut supply = vec![(self.source.clone(), demand)];
        for (i, alloc) in allocations.iter().enumerate() {
            let upstream = if i == 0 {
                self.source.as_str()
            } else {
                allocations[i - 1].vnf.as_str()
            };
            let demand_side: Vec<(String, Traffic)> = alloc
                .bindings
                .iter()
                .map(|b| (b.node.clone(), b.traffic))
                .collect();
            stages.push(self.route_stage(
                format!("{} -> {}", upstream, alloc.vnf),
                &supply,
                &demand_side,
            ));
            supply = demand_side;
        }
        let last = &allocations[allocations.len() - 1].vnf;
        let dest_side = vec![(self.destination.clone(), demand)];
        stages.push(self.route_stage(
            format!("{} -> {}", last, self.destination),
            &supply,
            &dest_side,
        ));

        // Accepted.
        self.accepted += 1;
        for alloc in &allocations {
            self.resources_used += alloc.total_amount();
            self.pool.commit(alloc);
        }
        DemandOutcome::Accepted {
            allocations,
            stages,
        }
    }

    fn route_stage(
        &self,
        label: String,
        supply: &[(String, Traffic)],
        demand: &[(String, Traffic)],
    ) -> StageResult {
        let assignments = assign_flows(self.topo, supply, demand, &TieBreak::Natural);
        let paths = resolve_paths(self.topo, &assignments);
        for p in &paths {
            info!(
                "stage {}: path {:?} carries {:.2}",
                label, p.hops, p.amount
            );
        }
        StageResult { label, paths }
    }

    /// Working capacity of each VNF, as left by the last processed demand.
    pub fn capacities(&self) -> &IndexMap<String, Capacity> {
        &self.capacities
    }

    pub fn summary(&self) -> RunSummary {
        let acceptance_ratio = if self.processed == 0 {
            0.0
        } else {
            self.accepted as f64 / self.processed as f64 * 100.0
        };
        RunSummary {
            demands_processed: self.processed,
            demands_accepted: self.accepted,
            acceptance_ratio,
            violation_ratio: 100.0 - acceptance_ratio,
            total_resources: self.resources_used,
        }
    }
}
