use crate::analysis::beat_accuracy::{self, DEFAULT_EPS};
use crate::model::score::Score;
use crate::model::statistics::FileStatistics;
use thiserror::Error;

/// Reasons a decoded score yields no statistics record.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractFault {
    #[error("score has no instruments")]
    NoInstruments,

    #[error("malformed tempo map: {0}")]
    MalformedTempoMap(String),

    #[error("non-finite timing in {0}")]
    NonFiniteTiming(&'static str),

    #[error("could not derive beat grid: {0}")]
    BeatGrid(String),
}

/// Outcome of running the extractor over one score.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Record(FileStatistics),
    NoRecord(ExtractFault),
}

impl Extraction {
    pub fn into_record(self) -> Option<FileStatistics> {
        match self {
            Extraction::Record(stats) => Some(stats),
            Extraction::NoRecord(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StatisticsExtractor {
    eps: f64,
}

impl Default for StatisticsExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_EPS)
    }
}

impl StatisticsExtractor {
    pub fn new(eps: f64) -> Self {
        Self { eps }
    }

    pub fn extract(&self, score: &Score) -> Extraction {
        match self.try_extract(score) {
            Ok(stats) => Extraction::Record(stats),
            Err(fault) => Extraction::NoRecord(fault),
        }
    }

    fn try_extract(&self, score: &Score) -> Result<FileStatistics, ExtractFault> {
        validate(score)?;

        let primary = score.tracks.first().ok_or(ExtractFault::NoInstruments)?;
        let beats = score
            .beats()
            .map_err(|e| ExtractFault::BeatGrid(e.to_string()))?;

        let all_notes = || score.tracks.iter().flat_map(|track| track.notes.iter());

        Ok(FileStatistics {
            n_instruments: score.tracks.len(),
            notes: all_notes().map(|note| note.pitch).collect(),
            velocities: all_notes().map(|note| note.velocity).collect(),
            program_numbers: score
                .tracks
                .iter()
                .filter(|track| !track.is_drum)
                .map(|track| track.program)
                .collect(),
            key_numbers: score.key_signatures.iter().map(|k| k.key_number).collect(),
            tempos: score.tempo_changes.iter().map(|tc| tc.bpm).collect(),
            time_signature_changes: score
                .time_signatures
                .iter()
                .map(|ts| (ts.numerator, ts.denominator, ts.time))
                .collect(),
            end_time: score.end_time,
            lyrics: score.lyrics.iter().map(|l| l.text.clone()).collect(),
            beat_accuracy: beat_accuracy::score(&primary.notes, &beats, self.eps),
        })
    }
}

/// Shorthand for extracting with the default beat window.
pub fn extract(score: &Score) -> Extraction {
    StatisticsExtractor::default().extract(score)
}

// Every float that lands in a record must survive the trip through JSON.
fn validate(score: &Score) -> Result<(), ExtractFault> {
    if score.tracks.is_empty() {
        return Err(ExtractFault::NoInstruments);
    }

    if score.tempo_changes.is_empty() {
        return Err(ExtractFault::MalformedTempoMap("no tempo changes".into()));
    }
    for tc in &score.tempo_changes {
        if !tc.time.is_finite() || !tc.bpm.is_finite() || tc.bpm <= 0.0 {
            return Err(ExtractFault::MalformedTempoMap(format!(
                "{} bpm at {}s",
                tc.bpm, tc.time
            )));
        }
    }

    if !score.end_time.is_finite() {
        return Err(ExtractFault::NonFiniteTiming("end time"));
    }
    let notes_finite = score
        .tracks
        .iter()
        .flat_map(|track| track.notes.iter())
        .all(|note| note.start.is_finite() && note.end.is_finite());
    if !notes_finite {
        return Err(ExtractFault::NonFiniteTiming("notes"));
    }
    if !score.time_signatures.iter().all(|ts| ts.time.is_finite()) {
        return Err(ExtractFault::NonFiniteTiming("time signatures"));
    }
    if !score.key_signatures.iter().all(|ks| ks.time.is_finite()) {
        return Err(ExtractFault::NonFiniteTiming("key signatures"));
    }
    if !score.lyrics.iter().all(|lyric| lyric.time.is_finite()) {
        return Err(ExtractFault::NonFiniteTiming("lyrics"));
    }
    if !score.text_events.iter().all(|event| event.time.is_finite()) {
        return Err(ExtractFault::NonFiniteTiming("text events"));
    }
    let controls_finite = score
        .tracks
        .iter()
        .flat_map(|track| track.control_times.iter())
        .all(|time| time.is_finite());
    if !controls_finite {
        return Err(ExtractFault::NonFiniteTiming("controllers"));
    }

    Ok(())
}
