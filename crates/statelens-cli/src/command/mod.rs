use clap::{Parser, Subcommand};

use self::{generate_episodes::GenerateEpisodesArg, probe::ProbeArg};

mod generate_episodes;
mod probe;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Run a probing evaluation sweep over an episode archive
    Probe(#[clap(flatten)] ProbeArg),
    /// Collect a random-agent episode archive from the built-in track
    /// environment
    GenerateEpisodes(#[clap(flatten)] GenerateEpisodesArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Probe(arg) => probe::run(&arg)?,
        Mode::GenerateEpisodes(arg) => generate_episodes::run(&arg)?,
    }
    Ok(())
}
