use crate::analysis::extractor::{ExtractFault, Extraction, StatisticsExtractor};
use crate::discovery::{FilePattern, discover};
use crate::midi_importer::{MidiDecoder, ScoreDecoder};
use crate::model::statistics::FileStatistics;
use crate::writer::write_statistics;
use anyhow::{Context, Result, bail};
use log::{debug, info};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

pub const DEFAULT_CONCURRENCY: usize = 10;

/// Why a file produced no record.
#[derive(Debug)]
pub enum Skip {
    Decode(anyhow::Error),
    DecoderPanicked,
    Extract(ExtractFault),
}

#[derive(Debug)]
pub enum FileOutcome {
    Record(FileStatistics),
    NoRecord(Skip),
}

/// Applies a decoder and the statistics extractor to many files on a bounded thread pool.
#[derive(Debug, Clone)]
pub struct BatchRunner<D: ScoreDecoder> {
    decoder: D,
    extractor: StatisticsExtractor,
    concurrency: usize,
}

impl BatchRunner<MidiDecoder> {
    pub fn midi(concurrency: usize) -> Self {
        Self::new(MidiDecoder, StatisticsExtractor::default(), concurrency)
    }
}

impl<D: ScoreDecoder> BatchRunner<D> {
    pub fn new(decoder: D, extractor: StatisticsExtractor, concurrency: usize) -> Self {
        Self {
            decoder,
            extractor,
            concurrency,
        }
    }

    /// Discovers files under `root` and processes them, returning records in discovery order.
    pub fn run(&self, root: &Path, pattern: &FilePattern) -> Result<Vec<FileStatistics>> {
        let files = discover(root, pattern)?;
        info!(
            "Processing {} file(s) from {} with {} worker(s)...",
            files.len(),
            root.display(),
            self.concurrency
        );

        self.process_files(&files)
    }

    /// Processes `files` in parallel. The returned records keep the relative order of `files`;
    /// files that failed to decode or extract are left out.
    pub fn process_files(&self, files: &[PathBuf]) -> Result<Vec<FileStatistics>> {
        if self.concurrency == 0 {
            bail!("Concurrency must be at least 1..!");
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .build()
            .context("Failed to build worker pool")?;

        let (tx, rx) = mpsc::channel::<(usize, FileOutcome)>();
        pool.install(|| {
            files
                .par_iter()
                .enumerate()
                .for_each_with(tx, |tx, (idx, path)| {
                    // the receiver outlives the pool, so this cannot fail
                    let _ = tx.send((idx, self.process_file(path)));
                });
        });

        let mut slots: Vec<Option<FileStatistics>> = (0..files.len()).map(|_| None).collect();
        let mut skipped = 0usize;
        for (idx, outcome) in rx {
            match outcome {
                FileOutcome::Record(stats) => {
                    debug!(
                        "{}: beat distance {:.6}, on-beat ratio {:.3}",
                        files[idx].display(),
                        stats.beat_accuracy.avg_distance(),
                        stats.beat_accuracy.onbeat_ratio()
                    );
                    slots[idx] = Some(stats);
                }
                FileOutcome::NoRecord(skip) => {
                    skipped += 1;
                    debug!("Skipping {}: {:?}", files[idx].display(), skip);
                }
            }
        }

        let records: Vec<FileStatistics> = slots.into_iter().flatten().collect();
        info!(
            "Extracted statistics for {} of {} file(s), skipped {}..!",
            records.len(),
            files.len(),
            skipped
        );

        Ok(records)
    }

    /// Decodes then extracts a single file.
    pub fn process_file(&self, path: &Path) -> FileOutcome {
        let decoded = panic::catch_unwind(AssertUnwindSafe(|| self.decoder.decode(path)));

        let score = match decoded {
            Ok(Ok(score)) => score,
            Ok(Err(e)) => return FileOutcome::NoRecord(Skip::Decode(e)),
            Err(_) => return FileOutcome::NoRecord(Skip::DecoderPanicked),
        };

        match self.extractor.extract(&score) {
            Extraction::Record(stats) => FileOutcome::Record(stats),
            Extraction::NoRecord(fault) => FileOutcome::NoRecord(Skip::Extract(fault)),
        }
    }
}

/// Collects statistics for every MIDI file under `root` matching `pattern`.
pub fn run(root: &Path, pattern: &FilePattern, concurrency: usize) -> Result<Vec<FileStatistics>> {
    BatchRunner::midi(concurrency).run(root, pattern)
}

/// Runs the whole pipeline and writes the records to `output` as a single JSON array.
pub fn run_to_file(
    root: &Path,
    pattern: &FilePattern,
    concurrency: usize,
    output: &Path,
) -> Result<usize> {
    let records = run(root, pattern, concurrency)?;
    write_statistics(&records, output)?;
    Ok(records.len())
}
