//! Cost-minimizing assignment of flow between supply and demand nodes,
//! and resolution of the concrete paths that carry it.

use fnv::FnvHashMap;
use log::debug;

use crate::topology::{NodeIx, Topology};
use crate::Traffic;

/// One matched (source, destination, amount) triple.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowAssignment {
    pub src: String,
    pub dst: String,
    pub amount: Traffic,
}

/// A flow assignment with the node sequence carrying it.
#[derive(Debug, Clone)]
pub struct RoutedPath {
    pub src: String,
    pub dst: String,
    pub amount: Traffic,
    pub hops: Vec<String>,
}

/// How equal-cost pairs are ordered.
#[derive(Debug, Clone)]
pub enum TieBreak {
    /// Lexicographic on the (source, destination) label pair.
    Natural,
    /// Explicit priority orderings: lower source rank first, then lower
    /// destination rank. Nodes absent from an ordering rank last.
    Ranked {
        supply_order: Vec<String>,
        demand_order: Vec<String>,
    },
}

fn rank_map(order: &[String]) -> FnvHashMap<&str, usize> {
    order
        .iter()
        .enumerate()
        .map(|(i, n)| (n.as_str(), i))
        .collect()
}

fn rank_of(ranks: &FnvHashMap<&str, usize>, node: &str) -> usize {
    ranks.get(node).copied().unwrap_or(usize::MAX)
}

/// Greedily matches supply against demand by minimum path cost.
///
/// Each round picks the globally cheapest reachable (source, destination)
/// pair with positive remaining amounts on both sides, assigns
/// `min(supply, demand)` and decrements both. Pairs with no path are
/// skipped; whatever they strand stays unassigned, by design a best-effort
/// residual rather than an error.
pub fn assign_flows(
    topo: &Topology,
    supply: &[(String, Traffic)],
    demand: &[(String, Traffic)],
    tie_break: &TieBreak,
) -> Vec<FlowAssignment> {
    // the graph is static, so one distance map per supply node suffices
    let mut dist: FnvHashMap<&str, std::collections::HashMap<NodeIx, f64>> = Default::default();
    for (s, _) in supply {
        dist.entry(s.as_str())
            .or_insert_with(|| topo.distances_from(topo.get_node_index(s)));
    }
    let ranks = match tie_break {
        TieBreak::Ranked {
            supply_order,
            demand_order,
        } => Some((rank_map(supply_order), rank_map(demand_order))),
        TieBreak::Natural => None,
    };

    let mut sremain: Vec<(String, Traffic)> = supply.to_vec();
    let mut dremain: Vec<(String, Traffic)> = demand.to_vec();
    let mut assignments = Vec::new();

    loop {
        let mut best: Option<(usize, usize, f64)> = None;
        for (si, (s, sflow)) in sremain.iter().enumerate() {
            if *sflow <= 0.0 {
                continue;
            }
            let dmap = &dist[s.as_str()];
            for (di, (d, dflow)) in dremain.iter().enumerate() {
                if *dflow <= 0.0 {
                    continue;
                }
                let cost = match topo.find_node(d).and_then(|ix| dmap.get(&ix)) {
                    Some(&c) => c,
                    None => continue, // unreachable pair
                };
                let wins = match best {
                    None => true,
                    Some((bsi, bdi, bcost)) => {
                        if cost < bcost {
                            true
                        } else if cost > bcost {
                            false
                        } else {
                            match &ranks {
                                Some((srank, drank)) => {
                                    (rank_of(srank, s), rank_of(drank, d))
                                        < (
                                            rank_of(srank, &sremain[bsi].0),
                                            rank_of(drank, &dremain[bdi].0),
                                        )
                                }
                                None => {
                                    (s.as_str(), d.as_str())
                                        < (sremain[bsi].0.as_str(), dremain[bdi].0.as_str())
                                }
                            }
                        }
                    }
                };
                if wins {
                    best = Some((si, di, cost));
                }
            }
        }

        let (si, di, cost) = match best {
            Some(b) => b,
            None => break,
        };
        let amount = sremain[si].1.min(dremain[di].1);
        debug!(
            "assigning {} from {} to {} at cost {}",
            amount, sremain[si].0, dremain[di].0, cost
        );
        assignments.push(FlowAssignment {
            src: sremain[si].0.clone(),
            dst: dremain[di].0.clone(),
            amount,
        });
        sremain[si].1 -= amount;
        dremain[di].1 -= amount;
    }

    assignments
}

/// Attaches one concrete shortest path to every assignment. The router has
/// already filtered out unreachable pairs.
pub fn resolve_paths(topo: &Topology, assignments: &[FlowAssignment]) -> Vec<RoutedPath> {
    assignments
        .iter()
        .map(|a| {
            let src = topo.get_node_index(&a.src);
            let dst = topo.get_node_index(&a.dst);
            let (_, path) = topo
                .shortest_path(src, dst)
                .unwrap_or_else(|| panic!("no path from {} to {}", a.src, a.dst));
            RoutedPath {
                src: a.src.clone(),
                dst: a.dst.clone(),
                amount: a.amount,
                hops: path.into_iter().map(|ix| topo[ix].name.clone()).collect(),
            }
        })
        .collect()
}
