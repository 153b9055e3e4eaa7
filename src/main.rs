//! dbfs-probe - Subset loudness estimation demo
//!
//! Generates a synthetic signal, computes its true dBFS, then measures how
//! well random and positional sample subsets estimate it.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dbfs_probe::experiment::positional::PositionalReport;
use dbfs_probe::experiment::random::RandomSubsetReport;
use dbfs_probe::loudness::source::SampleSource;
use dbfs_probe::{
    run_positional, run_random_subset, BitDepth, ExperimentConfig, SampleBuffer, SignalGenerator,
    SignalKind, DEFAULT_FRAME_RATE,
};
use std::path::PathBuf;
use tracing::info;

/// Estimate dBFS loudness from random and positional sample subsets
#[derive(Parser, Debug)]
#[command(name = "dbfs-probe", version, about)]
struct Args {
    /// Run the random subset test
    #[arg(long = "do-random")]
    do_random: bool,

    /// Run the sequential (start/middle/end) subset test
    #[arg(long = "do-sequential")]
    do_sequential: bool,

    /// Sample until the estimate is within the error factor of the true value
    #[arg(short = 'u', long)]
    until_close: bool,

    /// Target error factor in dB
    #[arg(long)]
    error_factor: Option<f64>,

    /// Number of random subset trials
    #[arg(long)]
    repeat_random: Option<usize>,

    /// Amount of audio to subsample, in seconds
    #[arg(short = 'd', long = "dur")]
    duration: Option<f64>,

    /// Minimum samples to collect in until-close mode
    #[arg(long)]
    min_samples: Option<u64>,

    /// Maximum samples before giving up
    #[arg(long)]
    max_samples: Option<u64>,

    /// Keep one trace point every N samples
    #[arg(long)]
    plot_decimation: Option<usize>,

    /// Include running-dBFS traces in JSON output
    #[arg(long)]
    keep_traces: bool,

    /// Seed for reproducible random trials
    #[arg(long)]
    seed: Option<u64>,

    /// JSON experiment config; command-line flags override its values
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Print reports as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Synthetic signal to measure
    #[arg(long, value_enum, default_value_t = SignalArg::Noise)]
    signal: SignalArg,

    /// Sine frequency in Hz
    #[arg(long, default_value_t = 440.0)]
    frequency: f64,

    /// Length of the synthetic signal in seconds
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,

    /// Frame rate of the synthetic signal
    #[arg(long, default_value_t = DEFAULT_FRAME_RATE)]
    sample_rate: u32,

    /// Bits per sample (8, 16, 24 or 32)
    #[arg(long, default_value_t = 16)]
    bit_depth: u16,

    /// Peak amplitude relative to full scale
    #[arg(long, default_value_t = 0.5)]
    amplitude: f64,

    /// Seed for noise-based signals
    #[arg(long, default_value_t = 0)]
    signal_seed: u64,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum SignalArg {
    Sine,
    Square,
    Noise,
    Burst,
    Silence,
}

impl Args {
    fn signal_kind(&self) -> SignalKind {
        match self.signal {
            SignalArg::Sine => SignalKind::Sine {
                frequency_hz: self.frequency,
            },
            SignalArg::Square => SignalKind::Square,
            SignalArg::Noise => SignalKind::Noise,
            SignalArg::Burst => SignalKind::Burst,
            SignalArg::Silence => SignalKind::Silence,
        }
    }

    /// Config file (or defaults) with command-line overrides applied
    fn experiment_config(&self) -> Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::load(path)?,
            None => ExperimentConfig::default(),
        };

        config.until_close |= self.until_close;
        config.keep_traces |= self.keep_traces;
        if let Some(v) = self.error_factor {
            config.error_factor = v;
        }
        if let Some(v) = self.repeat_random {
            config.repeat_random = v;
        }
        if let Some(v) = self.duration {
            config.duration_secs = v;
        }
        if let Some(v) = self.min_samples {
            config.min_samples = v;
        }
        if let Some(v) = self.max_samples {
            config.max_samples = v;
        }
        if let Some(v) = self.plot_decimation {
            config.trace_decimation = v;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dbfs_probe=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = args.experiment_config()?;

    let bit_depth = BitDepth::try_from(args.bit_depth)?;
    let source = SignalGenerator::new(args.signal_kind(), args.sample_rate, bit_depth)
        .with_amplitude(args.amplitude)
        .with_seed(args.signal_seed)
        .generate(args.seconds)
        .context("Failed to generate synthetic signal")?;

    info!(
        signal = ?args.signal,
        samples = source.len(),
        frame_rate = source.frame_rate(),
        "Synthetic signal ready"
    );

    // Neither mode requested means run both
    let run_both = !args.do_random && !args.do_sequential;

    let random = if args.do_random || run_both {
        Some(run_random_subset(&source, &config).context("Random subset run failed")?)
    } else {
        None
    };
    let positional = if args.do_sequential || run_both {
        Some(run_positional(&source, &config).context("Positional run failed")?)
    } else {
        None
    };

    if args.json {
        let output = serde_json::json!({
            "version": dbfs_probe::VERSION,
            "signal": args.signal_kind(),
            "samples": source.len(),
            "config": config,
            "random": random,
            "positional": positional,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("dbfs-probe v{}", dbfs_probe::VERSION);
    println!(
        "Signal: {:?}, {} samples at {} Hz",
        args.signal,
        source.len(),
        source.frame_rate()
    );
    println!();

    if let Some(report) = &random {
        print_random(report, &source);
    }
    if let Some(report) = &positional {
        print_positional(report);
    }

    Ok(())
}

fn print_random(report: &RandomSubsetReport, source: &SampleBuffer) {
    println!("Random subset ({} trials)", report.trials.len());
    println!("────────────────────────────────────────");
    println!("True dBFS: {:.6}", report.true_dbfs);

    if report.until_close {
        let Some(samples) = report.samples_summary else {
            return;
        };
        let to_ms = |n: f64| source.samples_to_ms(n);
        println!(
            "Converged: {}/{}",
            report.converged_trials,
            report.trials.len()
        );
        println!(
            "Mean number of samples: {:.1} ({:.3} ms)",
            samples.mean,
            to_ms(samples.mean)
        );
        println!(
            "Min number of samples: {:.0} ({:.3} ms)",
            samples.min,
            to_ms(samples.min)
        );
        println!(
            "Max number of samples: {:.0} ({:.3} ms)",
            samples.max,
            to_ms(samples.max)
        );
    } else if let Some(dbfs) = report.dbfs_summary {
        let truth = report.true_dbfs;
        println!("Samples per trial: {}", report.sample_cap);
        println!(
            "Mean dBFS: {:.6} (Error: {:.6})",
            dbfs.mean,
            (truth - dbfs.mean).abs()
        );
        println!(
            "Min dBFS: {:.6} (Error: {:.6})",
            dbfs.min,
            (truth - dbfs.min).abs()
        );
        println!(
            "Max dBFS: {:.6} (Error: {:.6})",
            dbfs.max,
            (truth - dbfs.max).abs()
        );
        if let Some(std_dev) = dbfs.std_dev {
            println!("Standard Deviation: {:.6}", std_dev);
        }
    }
    println!();
}

fn print_positional(report: &PositionalReport) {
    println!("Positional subset");
    println!("────────────────────────────────────────");
    println!("True dBFS: {:.6}", report.true_dbfs);
    for walk in &report.walks {
        let marker = if report.until_close && !walk.converged {
            " [NOT CONVERGED]"
        } else {
            ""
        };
        println!(
            "{:<6} number of samples: {} ({:.6} dB){}",
            walk.walk, walk.samples_used, walk.final_dbfs, marker
        );
    }
    println!();
}
