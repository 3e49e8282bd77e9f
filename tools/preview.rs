/// Preview: decodes a compiled NewGRF and generates names the way the
/// game would.
///
/// Usage: preview <file.grf> [--count <n>] [--seed <n>] [--style <handle>]
///        preview <file.grf> --value <u32>

use clap::Parser;
use grf_townnames::core::reader::{read_grf, TownNameRecord};
use grf_townnames::core::sampler::Sampler;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(name = "preview", about = "Generate sample town names from a NewGRF")]
struct Cli {
    /// Compiled NewGRF file.
    file: PathBuf,

    /// Names to generate per style.
    #[arg(short, long, default_value_t = 10)]
    count: usize,

    /// RNG seed for the random draws.
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Only this style (record handle).
    #[arg(long)]
    style: Option<u8>,

    /// Generate from one explicit 32-bit value instead of random draws.
    #[arg(long)]
    value: Option<u32>,
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let bytes = std::fs::read(&cli.file).unwrap_or_else(|e| {
        eprintln!("Error reading '{}': {}", cli.file.display(), e);
        process::exit(1);
    });
    let grf = read_grf(&bytes).unwrap_or_else(|e| {
        eprintln!("Error decoding '{}': {}", cli.file.display(), e);
        process::exit(1);
    });

    println!(
        "{} [{}], {} records",
        grf.name,
        grf_id(&grf.grf_id),
        grf.records.len()
    );

    let sampler = Sampler::new(&grf.records);
    let styles: Vec<&TownNameRecord> = sampler
        .styles()
        .into_iter()
        .filter(|r| cli.style.map_or(true, |h| h == r.handle))
        .collect();

    if styles.is_empty() {
        eprintln!("No town-name style found");
        process::exit(1);
    }

    let mut rng = StdRng::seed_from_u64(cli.seed);
    for style in styles {
        let label = style
            .names
            .first()
            .map(|(_, name)| name.as_str())
            .unwrap_or("?");
        println!("\n== {} (handle {}) ==", label, style.handle);

        let names = match cli.value {
            Some(value) => vec![sampler.generate(style.handle, value)],
            None => (0..cli.count)
                .map(|_| sampler.sample(style.handle, &mut rng))
                .collect(),
        };
        for name in names {
            match name {
                Ok(name) => println!("  {}", name),
                Err(e) => {
                    eprintln!("  ERROR: {}", e);
                    process::exit(1);
                }
            }
        }
    }
}

fn grf_id(id: &[u8; 4]) -> String {
    id.iter().map(|b| format!("{:02X}", b)).collect()
}
