use crate::analysis::beat_accuracy::DEFAULT_EPS;
use crate::batch::DEFAULT_CONCURRENCY;
use crate::discovery::FilePattern;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "midi_census",
    about = "Compute per-file statistics over a corpus of MIDI files."
)]
pub struct Args {
    /// Directory holding the corpus.
    #[arg(short, long, default_value = "data/lmd_full")]
    pub root: PathBuf,

    /// Files to collect, relative to the root. Each `/`-separated segment may hold one `*`.
    #[arg(short, long, default_value = "*/*.mid")]
    pub pattern: FilePattern,

    /// Number of files processed concurrently.
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    pub jobs: usize,

    /// Where to write the JSON array of per-file statistics. Overwritten if it exists.
    #[arg(short, long, default_value = "statistics.json")]
    pub output: PathBuf,

    /// Half-width in seconds of the window around each beat used for beat accuracy.
    #[arg(long, default_value_t = DEFAULT_EPS)]
    pub eps: f64,
}
