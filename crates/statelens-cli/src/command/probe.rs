use std::{fs::File, io::BufWriter, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use statelens_env::{ArchivalQuery, EpisodeArchive};
use statelens_probe::{
    EpisodeSource, EvalMethod, JsonlSink, NullSink, ProbeConfig, ProbeDriver, SweepSummary,
    TrackingSink,
};

use crate::util::{Output, read_json_file};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ProbeArg {
    /// Episode archive file path
    #[arg(long)]
    archive: PathBuf,
    /// Evaluation method; only the majority baseline runs without an
    /// external probe trainer
    #[arg(long, default_value = "majority")]
    method: EvalMethod,
    /// Entropy filter threshold in nats
    #[arg(long, default_value_t = 0.3)]
    entropy_threshold: f64,
    /// Probe batch size; episodes no longer than this are discarded
    #[arg(long, default_value_t = 64)]
    batch_size: usize,
    /// Number of seeds in the sweep
    #[arg(long, default_value_t = 1)]
    num_runs: usize,
    /// First seed of the sweep
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Keep only records produced by these algorithms (any match)
    #[arg(long)]
    algo: Vec<String>,
    /// Keep only records carrying all of these tags
    #[arg(long)]
    tag: Vec<String>,
    /// Append per-step metrics as JSON lines to this file
    #[arg(long)]
    metrics_log: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SweepReport {
    created_at: DateTime<Utc>,
    method: String,
    num_runs: usize,
    base_seed: u64,
    summary: SweepSummary,
}

pub(crate) fn run(arg: &ProbeArg) -> anyhow::Result<()> {
    let archive: EpisodeArchive = read_json_file("episode archive", &arg.archive)?;
    eprintln!(
        "loaded archive for '{}' with {} records",
        archive.env_name,
        archive.records.len()
    );

    let query = ArchivalQuery {
        env_name: archive.env_name.clone(),
        num_frame_stack: archive.num_frame_stack,
        downsample: archive.downsampled,
        algos: arg.algo.clone(),
        tags: arg.tag.clone(),
        use_representations: false,
    };
    let mut source = EpisodeSource::Archival {
        store: &archive,
        query,
    };
    let config = ProbeConfig {
        method: arg.method,
        entropy_threshold: arg.entropy_threshold,
        batch_size: arg.batch_size,
        num_runs: arg.num_runs,
        base_seed: arg.seed,
    };

    let mut sink: Box<dyn TrackingSink> = match &arg.metrics_log {
        Some(path) => {
            let file = File::create(path)?;
            Box::new(JsonlSink::new(BufWriter::new(file)))
        }
        None => Box::new(NullSink),
    };
    let summary = ProbeDriver::new(config, sink.as_mut()).run_sweep(&mut source, None)?;

    for (key, value) in &summary.mean {
        eprintln!("{key}: {value:.4}");
    }

    let report = SweepReport {
        created_at: Utc::now(),
        method: arg.method.to_string(),
        num_runs: arg.num_runs,
        base_seed: arg.seed,
        summary,
    };
    Output::save_json(&report, arg.output.clone())?;
    Ok(())
}
