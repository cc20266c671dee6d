use clap::Parser;
use sarpair::core::gpt::{self, GraphRunner, SnapGpt};
use sarpair::{config, logging};
use std::path::PathBuf;

/// Run an InSAR processing graph over a downloaded scene pair.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Processing-graph XML file
    graph: PathBuf,

    /// Reference scene path (earlier acquisition)
    #[arg(long)]
    in1: PathBuf,

    /// Secondary scene path (later acquisition)
    #[arg(long)]
    in2: PathBuf,

    /// Directory receiving processing products
    #[arg(long, default_value = config::DEFAULT_OUT_DIR)]
    out: PathBuf,

    /// Path to the gpt executable
    #[arg(long, default_value = config::DEFAULT_GPT_PATH)]
    gpt: PathBuf,
}

fn main() {
    let args = Args::parse();
    logging::init_for("process");
    if let Err(e) = run(&args) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let summary = gpt::summarize_graph(&args.graph)?;
    log::info!("Graph {}: {}", args.graph.display(), summary);

    let runner = SnapGpt::new(&args.gpt);
    let products = runner.run(&args.graph, &args.in1, &args.in2, &args.out)?;
    log::info!(
        "Processing complete, {} product(s) under {}",
        products.len(),
        args.out.display()
    );
    Ok(())
}
