use std::{iter, path::PathBuf};

use rand::SeedableRng as _;
use rand_pcg::Pcg64;
use statelens_env::{
    ArchiveRecord, EpisodeArchive, archive::ArchivedTensor, collect_random_agent,
    scripted::ScriptedEnv,
};

use crate::util::Output;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GenerateEpisodesArg {
    /// Number of parallel environment instances
    #[arg(long, default_value_t = 4)]
    num_instances: usize,
    /// Total step budget, divided evenly across instances
    #[arg(long, default_value_t = 10000)]
    total_steps: usize,
    /// Track width in pixels
    #[arg(long, default_value_t = 8)]
    width: usize,
    /// Frame height in pixels
    #[arg(long, default_value_t = 6)]
    height: usize,
    /// Steps per episode before the environment resets
    #[arg(long, default_value_t = 128)]
    episode_len: usize,
    /// Collection seed
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &GenerateEpisodesArg) -> anyhow::Result<()> {
    let mut env = ScriptedEnv::new(arg.num_instances, arg.width, arg.height, arg.episode_len);
    let mut rng = Pcg64::seed_from_u64(arg.seed);
    let rollout = collect_random_agent(&mut env, arg.total_steps, &mut rng)?;
    eprintln!("collected {} episodes", rollout.episodes.len());

    let records = iter::zip(
        iter::zip(rollout.episodes, rollout.labels),
        rollout.terminal_rewards,
    )
    .map(|((episode, labels), reward)| {
        // Archives store spatial frames channels-last
        let episode = episode.to_channels_last();
        ArchiveRecord {
            algo: "random".to_owned(),
            tags: vec!["probe".to_owned()],
            reward: reward.unwrap_or(0.0),
            frames: Some(ArchivedTensor {
                dims: episode.dims().to_vec(),
                data: episode.data().to_vec(),
            }),
            representations: None,
            labels,
        }
    })
    .collect();

    let archive = EpisodeArchive {
        env_name: ScriptedEnv::ENV_NAME.to_owned(),
        num_frame_stack: 1,
        downsampled: false,
        records,
    };
    Output::save_json(&archive, arg.output.clone())?;
    Ok(())
}
