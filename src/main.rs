use anyhow::Result;
use clap::Parser;
use log::info;
use midi_census::{Args, BatchRunner, MidiDecoder, StatisticsExtractor, write_statistics};

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!(
        "Collecting statistics for '{}' under '{}'...",
        args.pattern,
        args.root.display()
    );

    let runner = BatchRunner::new(MidiDecoder, StatisticsExtractor::new(args.eps), args.jobs);
    let records = runner.run(&args.root, &args.pattern)?;
    write_statistics(&records, &args.output)?;

    info!("Done..!");
    Ok(())
}
