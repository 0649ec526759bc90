use indexmap::IndexMap;

use sfcsim::allocation::ResourcePool;
use sfcsim::flowgraph::FlowGraph;
use sfcsim::orchestrator::{ChainOrchestrator, DemandOutcome};
use sfcsim::topology::Topology;

fn line_topology() -> Topology {
    Topology::from_edges(vec![
        ("src", "n1", 1.0),
        ("n1", "n2", 1.0),
        ("n2", "dst", 1.0),
    ])
}

fn capacities(list: &[(&str, f64)]) -> IndexMap<String, f64> {
    list.iter().map(|&(k, v)| (k.to_owned(), v)).collect()
}

fn eligibility(list: &[(&str, &[&str])]) -> IndexMap<String, Vec<String>> {
    list.iter()
        .map(|&(vnf, nodes)| {
            (
                vnf.to_owned(),
                nodes.iter().map(|&n| n.to_owned()).collect(),
            )
        })
        .collect()
}

#[test]
fn accepted_demand_conserves_flow_across_stages() {
    logging::init_log();

    let topo = line_topology();
    let mut orchestrator = ChainOrchestrator::new(
        &topo,
        vec!["f1".to_owned(), "f2".to_owned()],
        capacities(&[("f1", 1000.0), ("f2", 1000.0)]),
        eligibility(&[("f1", &["n1"]), ("f2", &["n2"])]),
        ResourcePool::new(capacities(&[("n1", 4000.0), ("n2", 4000.0)])),
        "src".to_owned(),
        "dst".to_owned(),
    );

    let outcome = orchestrator.process(600.0);
    let stages = match outcome {
        DemandOutcome::Accepted { stages, .. } => stages,
        DemandOutcome::Rejected { error } => panic!("unexpected rejection: {}", error),
    };

    // N = 2 VNFs means 3 stage boundaries, each carrying the full demand
    assert_eq!(stages.len(), 3);
    for stage in &stages {
        assert!(
            (stage.total_flow() - 600.0).abs() < 1e-9,
            "stage {} lost flow: {}",
            stage.label,
            stage.total_flow()
        );
    }
    assert_eq!(stages[0].label, "src -> f1");
    assert_eq!(stages[0].paths[0].hops, vec!["src", "n1"]);
    assert_eq!(stages[1].paths[0].hops, vec!["n1", "n2"]);
    assert_eq!(stages[2].paths[0].hops, vec!["n2", "dst"]);

    let summary = orchestrator.summary();
    assert_eq!(summary.acceptance_ratio, 100.0);
    assert_eq!(summary.violation_ratio, 0.0);
    // both VNFs stay at their nominal 1000 (600 sits inside the [200, 800] band)
    assert_eq!(summary.total_resources, 2000.0);
}

#[test]
fn rejection_skips_routing_and_counts_against_acceptance() {
    logging::init_log();

    let topo = line_topology();
    let mut orchestrator = ChainOrchestrator::new(
        &topo,
        vec!["f1".to_owned(), "f2".to_owned()],
        capacities(&[("f1", 1000.0), ("f2", 1000.0)]),
        // f2's only host cannot ever fit the tuned requirement
        eligibility(&[("f1", &["n1"]), ("f2", &["n2"])]),
        ResourcePool::new(capacities(&[("n1", 4000.0), ("n2", 500.0)])),
        "src".to_owned(),
        "dst".to_owned(),
    );

    assert!(!orchestrator.process(600.0).is_accepted());
    // 90 shrinks both VNFs down to 250, which n2 can host
    assert!(orchestrator.process(90.0).is_accepted());

    let summary = orchestrator.summary();
    assert_eq!(summary.demands_processed, 2);
    assert_eq!(summary.demands_accepted, 1);
    assert_eq!(summary.acceptance_ratio, 50.0);
    assert_eq!(summary.acceptance_ratio + summary.violation_ratio, 100.0);
}

#[test]
fn working_capacities_carry_across_demands() {
    logging::init_log();

    let topo = line_topology();
    let mut orchestrator = ChainOrchestrator::new(
        &topo,
        vec!["f1".to_owned()],
        capacities(&[("f1", 1000.0)]),
        eligibility(&[("f1", &["n1"])]),
        ResourcePool::new(capacities(&[("n1", 10000.0)])),
        "src".to_owned(),
        "dst".to_owned(),
    );

    // 100 < 0.2 * 1000 shrinks f1 to 500, where 100 sits on the band edge
    orchestrator.process(100.0);
    assert_eq!(orchestrator.capacities()["f1"], 500.0);

    // the next demand is tuned relative to 500, not the nominal 1000
    orchestrator.process(450.0);
    assert_eq!(orchestrator.capacities()["f1"], 750.0);
}

#[test]
fn split_allocation_routes_to_every_binding() {
    logging::init_log();

    // src reaches A cheaply and B dearly; both feed C, then dst
    let topo = Topology::from_edges(vec![
        ("src", "A", 1.0),
        ("src", "B", 2.0),
        ("A", "C", 1.0),
        ("B", "C", 1.0),
        ("C", "dst", 1.0),
    ]);
    let mut orchestrator = ChainOrchestrator::new(
        &topo,
        vec!["f1".to_owned(), "f2".to_owned()],
        capacities(&[("f1", 600.0), ("f2", 600.0)]),
        // no single node fits f1's 600, forcing the split fallback
        eligibility(&[("f1", &["A", "B"]), ("f2", &["C"])]),
        ResourcePool::new(capacities(&[("A", 400.0), ("B", 300.0), ("C", 600.0)])),
        "src".to_owned(),
        "dst".to_owned(),
    );

    // 480 lies exactly on the upper band edge of 600, so no retuning
    let outcome = orchestrator.process(480.0);
    let (allocations, stages) = match outcome {
        DemandOutcome::Accepted {
            allocations,
            stages,
        } => (allocations, stages),
        DemandOutcome::Rejected { error } => panic!("unexpected rejection: {}", error),
    };

    assert_eq!(allocations[0].bindings.len(), 2);
    assert_eq!(allocations[0].bindings[0].node, "A");
    assert_eq!(allocations[0].bindings[0].amount, 400.0);
    assert_eq!(allocations[0].bindings[0].traffic, 480.0 * 400.0 / 600.0);
    assert_eq!(allocations[0].bindings[1].node, "B");
    assert_eq!(allocations[0].bindings[1].amount, 200.0);

    // stage 0 fans out to both hosts and still carries the whole demand
    assert_eq!(stages[0].paths.len(), 2);
    assert!((stages[0].total_flow() - 480.0).abs() < 1e-9);
    for stage in &stages {
        assert!((stage.total_flow() - 480.0).abs() < 1e-9);
    }

    // the merged flow graph accumulates both branches into C
    let mut flows = FlowGraph::new();
    flows.merge(&stages);
    assert_eq!(flows.flow("C", "dst"), Some(480.0));
    let into_c = flows.flow("A", "C").unwrap() + flows.flow("B", "C").unwrap();
    assert!((into_c - 480.0).abs() < 1e-9);
}
