//! Demo host for the pulsefield animation.
//!
//! Opens a window with the field and a status line in the title bar. With
//! `--ramp` a background thread pretends to poll a backend and reports
//! progress; without it the field idles and the status line rotates.

use std::process::ExitCode;

use clap::Parser;

use pulsefield::{FieldConfig, Viewer, MAX_POINTS};

/// Columns and rows of the headless text frame.
const HEADLESS_SIZE: (u32, u32) = (72, 30);

/// Longest ramp or poll interval accepted on the command line.
const MAX_SECS: f32 = 86_400.0;

#[derive(Parser, Debug)]
#[command(
    name = "pulsefield",
    about = "Progress-linked point-field animation",
    after_help = "Set RUST_LOG (e.g. RUST_LOG=pulsefield=debug) to adjust logging."
)]
struct Args {
    /// Point count
    #[arg(
        long,
        default_value_t = 20_000,
        value_parser = clap::value_parser!(u32).range(0..=MAX_POINTS as i64)
    )]
    particles: u32,

    /// JSON config overriding the defaults
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    /// Simulate progress going 0 -> 1 over SECS
    #[arg(long, value_name = "SECS", value_parser = parse_secs)]
    ramp: Option<f32>,

    /// Simulated poll interval
    #[arg(long, value_name = "SECS", default_value_t = 5.0, value_parser = parse_secs)]
    poll: f32,

    /// No camera drift, no typewriter
    #[arg(long)]
    reduced_motion: bool,

    /// Fixed RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Render FRAMES frames as text instead of opening a window
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u32>,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

fn parse_secs(raw: &str) -> Result<f32, String> {
    let secs: f32 = raw.parse().map_err(|_| format!("not a number: {}", raw))?;
    if !secs.is_finite() || !(0.0..=MAX_SECS).contains(&secs) {
        return Err(format!("expected seconds in 0..={}", MAX_SECS));
    }
    Ok(secs)
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pulsefield=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    let config = match &args.config {
        Some(path) => match FieldConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => FieldConfig::default(),
    };

    if args.dump_config {
        return match config.to_json_pretty() {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let mut viewer = Viewer::new()
        .with_config(config)
        .with_particle_count(args.particles)
        .with_poll_interval(args.poll)
        .with_reduced_motion(args.reduced_motion);
    if let Some(secs) = args.ramp {
        viewer = viewer.with_progress_ramp(secs);
    }
    if let Some(seed) = args.seed {
        viewer = viewer.with_seed(seed);
    }

    let result = match args.headless {
        Some(frames) => {
            let (cols, rows) = HEADLESS_SIZE;
            viewer.run_headless(frames, cols, rows, |frame| {
                let last = frame.index + 1 == frames;
                if frame.index % 30 == 0 || last {
                    let progress = frame
                        .snapshot
                        .progress
                        .map_or("idle".to_string(), |p| format!("{:.0}%", p * 100.0));
                    println!(
                        "\x1b[2J\x1b[H{}\n[{:>5.2}s {}] {}",
                        frame.renderer.to_ascii(),
                        frame.snapshot.elapsed,
                        progress,
                        frame.status.render_line()
                    );
                }
            })
        }
        None => viewer.run(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("pulsefield").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.particles, 20_000);
        assert_eq!(args.poll, 5.0);
        assert!(args.ramp.is_none());
        assert!(!args.reduced_motion);
    }

    #[test]
    fn test_flags_parse() {
        let args = parse(&[
            "--particles", "500", "--ramp", "30", "--poll", "0.5", "--seed", "7",
            "--reduced-motion", "--headless", "90",
        ])
        .unwrap();
        assert_eq!(args.particles, 500);
        assert_eq!(args.ramp, Some(30.0));
        assert_eq!(args.poll, 0.5);
        assert_eq!(args.seed, Some(7));
        assert!(args.reduced_motion);
        assert_eq!(args.headless, Some(90));
    }

    #[test]
    fn test_non_finite_or_huge_seconds_rejected() {
        assert!(parse(&["--ramp", "inf"]).is_err());
        assert!(parse(&["--ramp", "NaN"]).is_err());
        assert!(parse(&["--poll", "1e30"]).is_err());
        assert!(parse(&["--poll", "-1"]).is_err());
    }

    #[test]
    fn test_particle_count_bounded() {
        assert!(parse(&["--particles", "50001"]).is_err());
        assert!(parse(&["--particles", "50000"]).is_ok());
    }
}
