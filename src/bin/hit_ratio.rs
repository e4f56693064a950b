use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use emu_analysis::metric::Metric;
use emu_analysis::plot::{PlotOptions, plot_time_cmp};
use emu_analysis::run::load_runs;
use emu_analysis::summary::compare;
use log::{error, info};

/// Plot the overall hit ratio of every emulator run (*.dat) in a directory.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Directory holding the emulator output files
    directory: PathBuf,
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let runs = load_runs(&args.directory)?;
    if runs.is_empty() {
        return Err(format!("no runs found in {}", args.directory.display()).into());
    }

    println!("{}", compare(&runs));

    let metric = Metric::TotalHitRatio;
    let series = runs.iter().map(|run| run.series(metric)).collect::<Vec<_>>();
    let options = PlotOptions {
        x_label: Some("Time (Days)".to_string()),
        y_label: Some(metric.axis_label()),
        ..PlotOptions::default()
    };

    let output = args.directory.join("hit_ratio.svg");
    plot_time_cmp(&output, &series, &options)?;
    info!("wrote {}", output.display());

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
