use crate::util::gt_or_close;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub pitch: u8,
    pub velocity: u8,
    pub start: f64,
    pub end: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Track {
    pub program: u8,
    pub is_drum: bool,
    pub name: Option<String>,
    pub notes: Vec<Note>,
    /// Times of controller and pitch bend events.
    pub control_times: Vec<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TempoChange {
    pub time: f64,
    pub bpm: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct KeySignature {
    /// 0..=11 for major keys (C = 0), 12..=23 for minor keys (C minor = 12).
    pub key_number: u8,
    pub time: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
    pub time: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Lyric {
    pub text: String,
    pub time: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TextEvent {
    pub text: String,
    pub time: f64,
}

/// Decoded, read-only view of one music file. All times are in seconds.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Score {
    pub tracks: Vec<Track>,
    pub tempo_changes: Vec<TempoChange>,
    pub key_signatures: Vec<KeySignature>,
    pub time_signatures: Vec<TimeSignature>,
    pub lyrics: Vec<Lyric>,
    pub text_events: Vec<TextEvent>,
    pub end_time: f64,
}

impl Score {
    /// Beat timestamps implied by the tempo and time signature maps, from 0 up to `end_time`.
    ///
    /// A beat that would straddle a tempo change is split across both tempo segments, and a beat
    /// landing on (or past) the next time signature change snaps to it.
    pub fn beats(&self) -> Result<Vec<f64>> {
        if self.tempo_changes.is_empty() {
            bail!("Tempo map is empty..!");
        }
        if let Some(bad) = self
            .tempo_changes
            .iter()
            .find(|tc| !tc.bpm.is_finite() || tc.bpm <= 0.0 || !tc.time.is_finite())
        {
            bail!("Invalid tempo change {:?}..!", bad);
        }
        if !self.end_time.is_finite() {
            bail!("End time is not finite..!");
        }

        let tempos = &self.tempo_changes;
        let mut signatures = self.time_signatures.clone();
        signatures.sort_by(|a, b| a.time.total_cmp(&b.time));

        let mut beats: Vec<f64> = vec![0.0];
        let mut tempo_idx = 0;
        while tempo_idx + 1 < tempos.len() && beats[0] > tempos[tempo_idx + 1].time {
            tempo_idx += 1;
        }
        let mut ts_idx = 0;
        while ts_idx + 1 < signatures.len() && beats[0] >= signatures[ts_idx + 1].time {
            ts_idx += 1;
        }

        let current_bpm = |tempo_idx: usize, ts_idx: usize| -> f64 {
            let qpm = tempos[tempo_idx].bpm;
            match signatures.get(ts_idx) {
                Some(ts) => qpm_to_bpm(qpm, ts.numerator, ts.denominator),
                None => qpm,
            }
        };

        let mut last = 0.0;
        while last < self.end_time {
            let mut bpm = current_bpm(tempo_idx, ts_idx);
            let mut next_beat = last + 60.0 / bpm;

            if tempo_idx + 1 < tempos.len() && next_beat > tempos[tempo_idx + 1].time {
                next_beat = last;
                let mut beat_remaining = 1.0;
                while tempo_idx + 1 < tempos.len()
                    && next_beat + beat_remaining * 60.0 / bpm >= tempos[tempo_idx + 1].time
                {
                    let overshot = (tempos[tempo_idx + 1].time - next_beat) / (60.0 / bpm);
                    next_beat += overshot * 60.0 / bpm;
                    beat_remaining -= overshot;
                    tempo_idx += 1;
                    bpm = current_bpm(tempo_idx, ts_idx);
                }
                next_beat += beat_remaining * 60.0 / bpm;
            }

            if ts_idx + 1 < signatures.len() {
                let next_ts_time = signatures[ts_idx + 1].time;
                if gt_or_close(next_beat, next_ts_time) {
                    next_beat = next_ts_time;
                    ts_idx += 1;
                }
            }

            beats.push(next_beat);
            last = next_beat;
        }

        // the final beat lands at or after the end of the piece
        beats.pop();
        Ok(beats)
    }
}

/// Converts a quarter-note tempo into beats per minute for the given meter.
pub fn qpm_to_bpm(qpm: f64, numerator: u32, denominator: u32) -> f64 {
    if !matches!(denominator, 1 | 2 | 4 | 8 | 16 | 32) {
        return qpm;
    }

    let scale = denominator as f64 / 4.0;
    if numerator == 3 {
        qpm * scale
    } else if numerator % 3 == 0 {
        qpm / 3.0 * scale
    } else {
        qpm * scale
    }
}
