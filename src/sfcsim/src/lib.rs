pub mod topology;

pub mod tuning;

pub mod allocation;

pub mod routing;

pub mod orchestrator;

pub mod flowgraph;

/// Capacity units of a VNF or a node.
pub type Capacity = f64;

/// Traffic volume of a demand or a share of it.
pub type Traffic = f64;
