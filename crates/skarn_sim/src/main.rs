mod sim;

use std::env;
use std::path::PathBuf;

use sim::SimConfig;

fn main() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();

    let mut config_path: Option<PathBuf> = None;
    let mut seed: Option<u64> = None;
    let mut radius: Option<i32> = None;
    let mut ticks: Option<u32> = None;
    let mut threads: Option<usize> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(value) = args.next() else {
                    eprintln!("--config expects a path argument");
                    std::process::exit(2);
                };
                config_path = Some(PathBuf::from(value));
            }
            "--seed" => seed = Some(parse_numeric(&mut args, "--seed")),
            "--radius" => radius = Some(parse_numeric(&mut args, "--radius")),
            "--ticks" => ticks = Some(parse_numeric(&mut args, "--ticks")),
            "--threads" => threads = Some(parse_numeric(&mut args, "--threads")),
            "--help" | "-h" => {
                println!(
                    "Usage: skarn_sim [--config <path>] [--seed <u64>] [--radius <chunks>] \
                     [--ticks <n>] [--threads <n>]"
                );
                return;
            }
            other => {
                eprintln!("unknown argument: {other}");
                std::process::exit(2);
            }
        }
    }

    let mut config = match config_path {
        Some(path) => match SimConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("failed to load config {}: {err}", path.display());
                std::process::exit(2);
            }
        },
        None => SimConfig::default(),
    };

    if let Some(seed) = seed {
        config.seed = seed;
    }
    if let Some(radius) = radius {
        config.radius = radius;
    }
    if let Some(ticks) = ticks {
        config.ticks = ticks;
    }
    if let Some(threads) = threads {
        config.threads = Some(threads);
    }
    let config = config.sanitize();

    if let Err(err) = sim::run(config) {
        eprintln!("simulation failed: {err}");
        std::process::exit(1);
    }
}

fn parse_numeric<T: std::str::FromStr>(args: &mut impl Iterator<Item = String>, flag: &str) -> T
where
    T::Err: std::fmt::Display,
{
    let Some(value) = args.next() else {
        eprintln!("{flag} expects a numeric argument");
        std::process::exit(2);
    };
    match value.parse::<T>() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("invalid value '{value}' for {flag}: {err}");
            std::process::exit(2);
        }
    }
}
