/// grfc: compiles a town-name project into a NewGRF file.
///
/// Usage: grfc <project.ron> [-o <out.grf>] [--records] [-v]

use clap::{ArgAction, Parser};
use grf_townnames::core::pipeline::TownNameGrf;
use log::LevelFilter;
use std::io::Write;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "grfc", about = "Compile a town-name project into a NewGRF")]
struct Cli {
    /// Project file (RON).
    project: PathBuf,

    /// Output file. Defaults to the project path with a .grf extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the compiled record table.
    #[arg(long)]
    records: bool,

    /// More output per occurrence (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only print errors.
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.project.with_extension("grf"));

    let grf = match TownNameGrf::builder().project(&cli.project).build() {
        Ok(grf) => grf,
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    };

    if cli.records {
        println!("{:>6}  {:>5}  {:>5}  id", "handle", "start", "parts");
        for (handle, node) in grf.compiled().nodes().iter().enumerate() {
            println!(
                "{:>6}  {:>5}  {:>5}  {}",
                handle,
                node.entropy_start,
                node.parts.len(),
                node.id
            );
        }
    }

    if let Err(e) = grf.write_to(&output) {
        log::error!("could not write '{}': {}", output.display(), e);
        process::exit(1);
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .filter_level(level)
        .parse_default_env()
        .init();
}
