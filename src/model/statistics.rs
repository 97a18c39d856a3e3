use serde::{Deserialize, Serialize};

/// `(average onset distance, average on-beat ratio)`, serialized as a two element array.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BeatAccuracy(pub f64, pub f64);

impl BeatAccuracy {
    /// Sentinel for a score whose alignment cannot be measured.
    pub const NOT_COMPUTABLE: BeatAccuracy = BeatAccuracy(-1.0, -1.0);

    pub fn avg_distance(&self) -> f64 {
        self.0
    }

    pub fn onbeat_ratio(&self) -> f64 {
        self.1
    }
}

/// Descriptive statistics for a single file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileStatistics {
    pub n_instruments: usize,
    pub notes: Vec<u8>,
    pub velocities: Vec<u8>,
    pub program_numbers: Vec<u8>,
    pub key_numbers: Vec<u8>,
    pub tempos: Vec<f64>,
    /// `(numerator, denominator, time)`
    pub time_signature_changes: Vec<(u32, u32, f64)>,
    pub end_time: f64,
    pub lyrics: Vec<String>,
    pub beat_accuracy: BeatAccuracy,
}
