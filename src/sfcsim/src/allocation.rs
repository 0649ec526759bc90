//! Capacity-aware binding of VNF instances to nodes.

use indexmap::IndexMap;
use log::{debug, info};
use thiserror::Error;

use crate::{Capacity, Traffic};

/// A share of one VNF instance bound to a concrete node.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub node: String,
    /// Capacity units taken on the node.
    pub amount: Capacity,
    /// Share of the demand magnitude flowing through the node.
    pub traffic: Traffic,
}

/// Ordered bindings of one VNF for one demand.
#[derive(Debug, Clone)]
pub struct VnfAllocation {
    pub vnf: String,
    pub bindings: Vec<Binding>,
}

impl VnfAllocation {
    pub fn total_amount(&self) -> Capacity {
        self.bindings.iter().map(|b| b.amount).sum()
    }

    pub fn total_traffic(&self) -> Traffic {
        self.bindings.iter().map(|b| b.traffic).sum()
    }
}

#[derive(Debug, Clone, Error)]
pub enum AllocationError {
    #[error("VNF {vnf} requires {required} but its eligible nodes only offer {available}")]
    Insufficient {
        vnf: String,
        required: Capacity,
        available: Capacity,
    },
}

/// Baseline node capacities, optionally depleted by accepted demands.
///
/// With reservation off (the default), every demand is admitted against the
/// same baseline; with it on, `commit` subtracts accepted bindings from the
/// availability seen by later demands.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    baseline: IndexMap<String, Capacity>,
    reserved: IndexMap<String, Capacity>,
    reserve_on_accept: bool,
}

impl ResourcePool {
    pub fn new(baseline: IndexMap<String, Capacity>) -> Self {
        ResourcePool {
            baseline,
            reserved: IndexMap::new(),
            reserve_on_accept: false,
        }
    }

    pub fn with_reservation(baseline: IndexMap<String, Capacity>) -> Self {
        ResourcePool {
            baseline,
            reserved: IndexMap::new(),
            reserve_on_accept: true,
        }
    }

    /// Capacity currently available on a node; unknown nodes offer nothing.
    pub fn available(&self, node: &str) -> Capacity {
        let base = self.baseline.get(node).copied().unwrap_or(0.0);
        let held = self.reserved.get(node).copied().unwrap_or(0.0);
        (base - held).max(0.0)
    }

    /// Records an accepted allocation. A no-op unless reservation is on.
    pub fn commit(&mut self, alloc: &VnfAllocation) {
        if !self.reserve_on_accept {
            return;
        }
        for b in &alloc.bindings {
            *self.reserved.entry(b.node.clone()).or_insert(0.0) += b.amount;
            debug!(
                "reserved {} on {}, {} left",
                b.amount,
                b.node,
                self.available(&b.node)
            );
        }
    }
}

/// Binds a tuned capacity requirement to eligible nodes.
pub struct NodeAllocator<'a> {
    pool: &'a ResourcePool,
    eligibility: &'a IndexMap<String, Vec<String>>,
}

impl<'a> NodeAllocator<'a> {
    pub fn new(pool: &'a ResourcePool, eligibility: &'a IndexMap<String, Vec<String>>) -> Self {
        NodeAllocator { pool, eligibility }
    }

    /// Produces the bindings of one VNF, or reports infeasibility when the
    /// eligible nodes cannot jointly cover the requirement.
    ///
    /// A node that can hold the whole requirement wins over any split; among
    /// such nodes the one with minimum slack wins, first in eligibility
    /// order on ties. Otherwise, nodes are filled greedily by descending
    /// availability, each taking a traffic share proportional to the
    /// capacity it hosts.
    pub fn allocate(
        &self,
        vnf: &str,
        required: Capacity,
        demand: Traffic,
    ) -> Result<VnfAllocation, AllocationError> {
        let candidates = self
            .eligibility
            .get(vnf)
            .unwrap_or_else(|| panic!("no eligible-node entry for VNF {}", vnf));

        let available: Capacity = candidates.iter().map(|n| self.pool.available(n)).sum();
        if available < required {
            return Err(AllocationError::Insufficient {
                vnf: vnf.to_owned(),
                required,
                available,
            });
        }

        // phase 1: a single node that holds the whole requirement
        let mut best: Option<(&str, Capacity)> = None;
        for node in candidates {
            let avail = self.pool.available(node);
            if avail < required {
                continue;
            }
            let slack = avail - required;
            match best {
                Some((_, s)) if slack >= s => {}
                _ => best = Some((node.as_str(), slack)),
            }
        }
        if let Some((node, _)) = best {
            info!("bound whole VNF {} ({}) to node {}", vnf, required, node);
            return Ok(VnfAllocation {
                vnf: vnf.to_owned(),
                bindings: vec![Binding {
                    node: node.to_owned(),
                    amount: required,
                    traffic: demand,
                }],
            });
        }

        // phase 2: split across nodes by descending availability; the sort
        // is stable, so equal availabilities keep eligibility order
        let mut sorted: Vec<&String> = candidates.iter().collect();
        sorted.sort_by(|a, b| {
            self.pool
                .available(b)
                .partial_cmp(&self.pool.available(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut bindings = Vec::new();
        let mut remaining = required;
        for node in sorted {
            let avail = self.pool.available(node);
            if avail <= 0.0 {
                continue;
            }
            let amount = remaining.min(avail);
            let traffic = demand * (amount / required);
            info!("bound part of VNF {} ({}) to node {}", vnf, amount, node);
            bindings.push(Binding {
                node: node.clone(),
                amount,
                traffic,
            });
            remaining -= amount;
            if remaining <= 0.0 {
                break;
            }
        }

        Ok(VnfAllocation {
            vnf: vnf.to_owned(),
            bindings,
        })
    }
}
