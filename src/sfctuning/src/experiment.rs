use std::time::Instant;

use anyhow::Context;
use structopt::StructOpt;

use sfcsim::flowgraph::{render_overlay, FlowGraph};
use sfcsim::orchestrator::{ChainOrchestrator, DemandOutcome};

use sfctuning::config::read_config;
use sfctuning::demand::load_demands;
use sfctuning::report::{format_report, write_report};

#[derive(Debug, Clone, StructOpt)]
#[structopt(name = "SFC Tuning Experiment", about = "Dynamic SFC tuning experiment")]
pub struct Opt {
    /// The configure file
    #[structopt(short = "c", long = "config")]
    pub config: std::path::PathBuf,

    /// Override the report path from the configure file
    #[structopt(short = "o", long = "report")]
    pub report: Option<std::path::PathBuf>,
}

fn main() -> anyhow::Result<()> {
    logging::init_log();

    let opt = Opt::from_args();
    log::info!("Opts: {:#?}", opt);

    let config = read_config(&opt.config)?;
    log::debug!("config: {:#?}", config);

    let demands = load_demands(&config.demands)?;
    log::info!("processing {} demand values", demands.len());

    let topo = config.build_topology();
    log::debug!("topology: {:?}", topo.to_dot());

    let mut orchestrator = ChainOrchestrator::new(
        &topo,
        config.chain.clone(),
        config.vnf_capacities(),
        config.eligibility_map(),
        config.resource_pool(),
        config.source.clone(),
        config.destination.clone(),
    );

    let mut flows = FlowGraph::new();
    let start = Instant::now();
    for &demand in &demands {
        log::info!("processing demand magnitude {}", demand);
        match orchestrator.process(demand) {
            DemandOutcome::Accepted { stages, .. } => flows.merge(&stages),
            DemandOutcome::Rejected { error } => {
                log::warn!("demand {} rejected: {}", demand, error)
            }
        }
    }
    let avg_secs = start.elapsed().as_secs_f64() / demands.len() as f64;

    let summary = orchestrator.summary();
    print!("{}", format_report(&summary, avg_secs));

    if let Some(path) = opt.report.as_ref().or_else(|| config.report.as_ref()) {
        write_report(path, &summary, avg_secs)?;
        log::info!("report written to {:?}", path);
    }
    if let Some(path) = &config.flow_graph {
        std::fs::write(path, render_overlay(&topo, &flows))
            .with_context(|| format!("fail to write flow graph to {:?}", path))?;
        log::info!("flow graph written to {:?}", path);
    }

    Ok(())
}
