use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use tapp_shake::shake::{
    AccelerationSample, ClassifierTrace, Delivery, ScriptedSource, ShakeDetector,
    ShakeEventChannel,
};

const TRACE_HEADER: &str = "shake_sample,ms,x,y,z";

#[derive(Debug, Parser)]
#[command(name = "shake_replay")]
#[command(about = "Replay an accelerometer trace through the shake detector")]
struct Cli {
    /// CSV trace with `shake_sample,ms,x,y,z` lines in m/s².
    trace: PathBuf,
    /// Fail unless exactly this many shakes are detected.
    #[arg(long)]
    expect: Option<usize>,
    /// Print the classifier trace for every sample.
    #[arg(long)]
    trace_samples: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let samples = parse_trace(&cli.trace)?;
    let channel = ShakeEventChannel::<NoopRawMutex>::new();
    let mut subscriber = channel.subscribe()?;
    let mut detector = ShakeDetector::new(ScriptedSource::default(), &channel);
    let mut guard = detector
        .listen()
        .with_context(|| format!("failed to start detector for {}", cli.trace.display()))?;

    if cli.trace_samples {
        println!("trace,ms,state,reason,spike,spike_count,g_force,window_ms");
    }

    let mut shake_ms: Vec<u64> = Vec::new();
    for sample in samples {
        let output = guard.on_sample(sample);
        if cli.trace_samples {
            print_trace(&output.trace);
        }
        if output.shake_detected() {
            shake_ms.push(sample.now_ms);
        }
    }
    drop(guard);

    let mut delivered = 0usize;
    while let Some(delivery) = subscriber.try_next() {
        if let Delivery::Shake(_) = delivery {
            delivered += 1;
        }
    }
    log::debug!(
        "replay: detected={} delivered={delivered}",
        shake_ms.len()
    );

    println!("event,ms");
    for ms in &shake_ms {
        println!("event,{ms}");
    }

    if let Some(expected) = cli.expect {
        if shake_ms.len() != expected {
            bail!(
                "expected {expected} shakes, detected {}",
                shake_ms.len()
            );
        }
    }

    Ok(())
}

fn print_trace(trace: &ClassifierTrace) {
    println!(
        "trace,{},{},{},{},{},{:.3},{}",
        trace.now_ms,
        trace.state_id.as_u8(),
        trace.reject_reason.as_u8(),
        trace.spike,
        trace.spike_count,
        trace.g_force,
        trace.window_ms
    );
}

fn parse_trace(path: &Path) -> Result<Vec<AccelerationSample>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    parse_lines(BufReader::new(file), path)
}

fn parse_lines(reader: impl BufRead, path: &Path) -> Result<Vec<AccelerationSample>> {
    let mut out = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line.with_context(|| format!("failed to read {}:{line_no}", path.display()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed == TRACE_HEADER {
            continue;
        }

        let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if parts[0] != "shake_sample" {
            continue;
        }
        if parts.len() != 5 {
            bail!(
                "{}:{line_no} invalid trace line, expected 5 columns",
                path.display()
            );
        }

        let now_ms = parts[1]
            .parse::<u64>()
            .with_context(|| format!("{}:{line_no} invalid ms", path.display()))?;
        let mut axes = [0f32; 3];
        for (axis, raw) in axes.iter_mut().zip(&parts[2..]) {
            *axis = raw
                .parse::<f32>()
                .with_context(|| format!("{}:{line_no} invalid axis `{raw}`", path.display()))?;
        }
        out.push(AccelerationSample::new(now_ms, axes[0], axes[1], axes[2]));
    }
    Ok(out)
}
