use crate::model::score::*;
use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

const DEFAULT_MPQN: u32 = 500_000;
const MICROSECONDS_PER_MINUTE: f64 = 60_000_000.0;
const DRUM_CHANNEL: u8 = 9;

/// Anything that can turn a file on disk into a [`Score`].
pub trait ScoreDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Score>;
}

/// Decodes Standard MIDI Files.
#[derive(Debug, Clone, Copy, Default)]
pub struct MidiDecoder;

impl ScoreDecoder for MidiDecoder {
    fn decode(&self, path: &Path) -> Result<Score> {
        import_midi_file(path)
    }
}

#[derive(Debug, Clone)]
struct TempoSegment {
    pub mpqn: u32,
    pub start_tick: u64,
    pub seconds_at_start: f64,
}

/// Piecewise-linear tick to seconds conversion.
struct TempoMap {
    ticks_per_quarter: u64,
    segments: Vec<TempoSegment>,
}

impl TempoMap {
    /// `changes` must be sorted by tick and start at tick 0.
    fn new(ticks_per_quarter: u64, changes: &[(u64, u32)]) -> Self {
        let mut segments: Vec<TempoSegment> = Vec::with_capacity(changes.len());
        let mut seconds_accum = 0.0;
        let mut last_tick = 0u64;
        let mut last_mpqn = DEFAULT_MPQN;

        for &(tick, mpqn) in changes {
            seconds_accum += seconds_for(tick - last_tick, last_mpqn, ticks_per_quarter);
            segments.push(TempoSegment {
                mpqn,
                start_tick: tick,
                seconds_at_start: seconds_accum,
            });
            last_tick = tick;
            last_mpqn = mpqn;
        }

        Self {
            ticks_per_quarter,
            segments,
        }
    }

    fn seconds(&self, tick: u64) -> f64 {
        match self.segments.iter().rfind(|seg| seg.start_tick <= tick) {
            Some(seg) => {
                seg.seconds_at_start
                    + seconds_for(tick - seg.start_tick, seg.mpqn, self.ticks_per_quarter)
            }
            None => seconds_for(tick, DEFAULT_MPQN, self.ticks_per_quarter),
        }
    }
}

fn seconds_for(ticks: u64, mpqn: u32, ticks_per_quarter: u64) -> f64 {
    ticks as f64 * mpqn as f64 / ticks_per_quarter as f64 / 1_000_000.0
}

/// A completed note, still in ticks.
struct NoteInterval {
    pub pitch: u8,
    pub velocity: u8,
    pub start_tick: u64,
    pub end_tick: u64,
}

/// Notes grouped by (track, channel, program), in order of first completed note.
///
/// Controller and pitch bend ticks that arrive before their instrument has a note are parked per
/// (track, channel). Every instrument created on a (track, channel) that already has parked ticks
/// adopts that list, including anything parked there later. Parked ticks nobody adopts are dropped.
#[derive(Default)]
struct InstrumentTable {
    order: Vec<(usize, u8, u8)>,
    notes: HashMap<(usize, u8, u8), Vec<NoteInterval>>,
    controls: HashMap<(usize, u8, u8), Vec<u64>>,
    stragglers: HashMap<(usize, u8), Vec<u64>>,
    adopted: HashSet<(usize, u8, u8)>,
    names: HashMap<usize, String>,
}

impl InstrumentTable {
    fn push(&mut self, key: (usize, u8, u8), note: NoteInterval) {
        if !self.notes.contains_key(&key) {
            self.order.push(key);
            let (track_idx, ch, _) = key;
            if self.stragglers.contains_key(&(track_idx, ch)) {
                self.adopted.insert(key);
            }
        }
        self.notes.entry(key).or_default().push(note);
    }

    fn push_control(&mut self, key: (usize, u8, u8), tick: u64) {
        if self.notes.contains_key(&key) {
            self.controls.entry(key).or_default().push(tick);
        } else {
            let (track_idx, ch, _) = key;
            self.stragglers.entry((track_idx, ch)).or_default().push(tick);
        }
    }

    fn control_ticks(&self, key: &(usize, u8, u8)) -> Vec<u64> {
        let (track_idx, ch, _) = *key;
        let parked = self
            .stragglers
            .get(&(track_idx, ch))
            .filter(|_| self.adopted.contains(key))
            .into_iter()
            .flatten();
        let own = self.controls.get(key).into_iter().flatten();

        parked.chain(own).copied().collect()
    }
}

pub fn import_midi_file<P: AsRef<Path>>(path: P) -> Result<Score> {
    let bytes = fs::read(path.as_ref())
        .with_context(|| format!("Failed to read MIDI file {}", path.as_ref().display()))?;

    midi_bytes_to_score(&bytes)
}

pub fn midi_bytes_to_score(bytes: &[u8]) -> Result<Score> {
    let smf = Smf::parse(bytes).map_err(|e| anyhow!("Failed to parse MIDI: {:?}", e))?;

    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(t) => t.as_int() as u64,
        Timing::Timecode(_fps, _subframe) => {
            bail!("SMPTE timecode midi timing is not currently supported..!");
        }
    };
    if ticks_per_quarter == 0 {
        bail!("MIDI header declares zero ticks per quarter note..!");
    }

    debug!(
        "MIDI format: {:?}, tracks: {}, ticks per quarter note: {}",
        smf.header.format,
        smf.tracks.len(),
        ticks_per_quarter
    );

    let tempo_changes = read_tempo_changes(&smf);
    let tempo_map = TempoMap::new(ticks_per_quarter, &tempo_changes);

    let mut key_signatures: Vec<(u64, u8)> = Vec::new();
    let mut time_signatures: Vec<(u64, u32, u32)> = Vec::new();
    let mut lyrics: Vec<(u64, String)> = Vec::new();
    let mut text_events: Vec<(u64, String)> = Vec::new();
    let mut instruments = InstrumentTable::default();

    for (track_idx, track) in smf.tracks.iter().enumerate() {
        let mut abs_tick: u64 = 0;
        let mut programs = [0u8; 16];
        let mut open_notes: HashMap<(u8, u8), Vec<(u64, u8)>> = HashMap::new();

        for event in track.iter() {
            abs_tick = abs_tick.saturating_add(event.delta.as_int() as u64);

            match &event.kind {
                TrackEventKind::Meta(meta) => match meta {
                    MetaMessage::KeySignature(sharps, minor) => {
                        key_signatures.push((abs_tick, key_number(*sharps, *minor)?));
                    }
                    MetaMessage::TimeSignature(numerator, denom_pow, _, _) => {
                        if *numerator == 0 || *denom_pow > 31 {
                            bail!(
                                "Invalid time signature {}/2^{} at tick {}..!",
                                numerator,
                                denom_pow,
                                abs_tick
                            );
                        }
                        time_signatures.push((abs_tick, *numerator as u32, 1u32 << *denom_pow));
                    }
                    MetaMessage::Lyric(text) => {
                        lyrics.push((abs_tick, String::from_utf8_lossy(text).into_owned()));
                    }
                    MetaMessage::Text(text) => {
                        text_events.push((abs_tick, String::from_utf8_lossy(text).into_owned()));
                    }
                    MetaMessage::TrackName(name) => {
                        instruments
                            .names
                            .entry(track_idx)
                            .or_insert_with(|| String::from_utf8_lossy(name).into_owned());
                    }
                    _ => {}
                },
                TrackEventKind::Midi { channel, message } => {
                    let ch: u8 = channel.as_int();

                    match message {
                        MidiMessage::ProgramChange { program } => {
                            programs[ch as usize] = program.as_int();
                        }
                        MidiMessage::Controller { .. } | MidiMessage::PitchBend { .. } => {
                            let instrument = (track_idx, ch, programs[ch as usize]);
                            instruments.push_control(instrument, abs_tick);
                        }
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            open_notes
                                .entry((ch, key.as_int()))
                                .or_default()
                                .push((abs_tick, vel.as_int()));
                        }
                        MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                            let instrument = (track_idx, ch, programs[ch as usize]);
                            close_notes(
                                &mut open_notes,
                                &mut instruments,
                                instrument,
                                key.as_int(),
                                abs_tick,
                            );
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        let unclosed: usize = open_notes.values().map(Vec::len).sum();
        if unclosed > 0 {
            debug!(
                "Dropping {} unclosed note(s) at the end of track {}..!",
                unclosed, track_idx
            );
        }
    }

    key_signatures.sort_by_key(|(tick, _)| *tick);
    time_signatures.sort_by_key(|(tick, _, _)| *tick);
    lyrics.sort_by_key(|(tick, _)| *tick);
    text_events.sort_by_key(|(tick, _)| *tick);

    let tracks: Vec<Track> = instruments
        .order
        .iter()
        .map(|key| {
            let (track_idx, channel, program) = *key;
            let notes = instruments
                .notes
                .get(key)
                .map(|intervals| {
                    intervals
                        .iter()
                        .map(|interval| Note {
                            pitch: interval.pitch,
                            velocity: interval.velocity,
                            start: tempo_map.seconds(interval.start_tick),
                            end: tempo_map.seconds(interval.end_tick),
                        })
                        .collect()
                })
                .unwrap_or_default();

            let track = Track {
                program,
                is_drum: channel == DRUM_CHANNEL,
                name: instruments.names.get(&track_idx).cloned(),
                notes,
                control_times: instruments
                    .control_ticks(key)
                    .into_iter()
                    .map(|tick| tempo_map.seconds(tick))
                    .collect(),
            };

            debug!(
                "Instrument '{}' (track {}, channel {}, program {}): {} note(s)",
                track.name.as_deref().unwrap_or("<unnamed>"),
                track_idx,
                channel,
                program,
                track.notes.len()
            );
            track
        })
        .collect();

    let score = Score {
        tempo_changes: tempo_changes
            .iter()
            .map(|&(tick, mpqn)| TempoChange {
                time: tempo_map.seconds(tick),
                bpm: MICROSECONDS_PER_MINUTE / mpqn as f64,
            })
            .collect(),
        key_signatures: key_signatures
            .into_iter()
            .map(|(tick, key_number)| KeySignature {
                key_number,
                time: tempo_map.seconds(tick),
            })
            .collect(),
        time_signatures: time_signatures
            .into_iter()
            .map(|(tick, numerator, denominator)| TimeSignature {
                numerator,
                denominator,
                time: tempo_map.seconds(tick),
            })
            .collect(),
        lyrics: lyrics
            .into_iter()
            .map(|(tick, text)| Lyric {
                text,
                time: tempo_map.seconds(tick),
            })
            .collect(),
        text_events: text_events
            .into_iter()
            .map(|(tick, text)| TextEvent {
                text,
                time: tempo_map.seconds(tick),
            })
            .collect(),
        tracks,
        end_time: 0.0,
    };

    Ok(Score {
        end_time: end_time(&score),
        ..score
    })
}

/// Tempo changes from the first track, starting from 120bpm at tick 0. Repeats of the current
/// tempo are dropped.
fn read_tempo_changes(smf: &Smf) -> Vec<(u64, u32)> {
    let mut changes: Vec<(u64, u32)> = vec![(0, DEFAULT_MPQN)];

    let Some(track) = smf.tracks.first() else {
        return changes;
    };

    let mut abs_tick: u64 = 0;
    for event in track.iter() {
        abs_tick = abs_tick.saturating_add(event.delta.as_int() as u64);

        if let TrackEventKind::Meta(MetaMessage::Tempo(micro)) = event.kind {
            let mpqn = micro.as_int();
            debug!("Tempo change at tick {} -> {} us/qn", abs_tick, mpqn);

            if abs_tick == 0 {
                changes[0] = (0, mpqn);
            } else if changes.last().is_some_and(|&(_, last)| last != mpqn) {
                changes.push((abs_tick, mpqn));
            }
        }
    }

    changes
}

/// Closes every open note of `pitch` on the instrument's channel that started before this tick.
/// Notes that started on this very tick stay open only when something else was closed; otherwise
/// the whole stack is discarded.
fn close_notes(
    open_notes: &mut HashMap<(u8, u8), Vec<(u64, u8)>>,
    instruments: &mut InstrumentTable,
    instrument: (usize, u8, u8),
    pitch: u8,
    abs_tick: u64,
) {
    let (_, ch, _) = instrument;
    let Some(stack) = open_notes.get_mut(&(ch, pitch)) else {
        debug!("Orphaned NoteOff for {} ch{} at tick {}..!", pitch, ch, abs_tick);
        return;
    };

    let (to_close, to_keep): (Vec<_>, Vec<_>) =
        stack.drain(..).partition(|(start_tick, _)| *start_tick != abs_tick);

    let closed_any = !to_close.is_empty();
    for (start_tick, velocity) in to_close {
        instruments.push(
            instrument,
            NoteInterval {
                pitch,
                velocity,
                start_tick,
                end_tick: abs_tick,
            },
        );
    }

    if closed_any && !to_keep.is_empty() {
        *stack = to_keep;
    } else {
        open_notes.remove(&(ch, pitch));
    }
}

/// Maps a key signature (sharps if positive, flats if negative) to 0..=11 for major keys and
/// 12..=23 for minor keys, with C and C minor at 0 and 12.
pub fn key_number(sharps: i8, minor: bool) -> Result<u8> {
    if !(-7..=7).contains(&sharps) {
        bail!("Invalid key signature with {} sharps..!", sharps);
    }

    // each sharp moves the major tonic up a fifth
    let major_tonic = (sharps as i32 * 7).rem_euclid(12) as u8;
    if minor {
        Ok((major_tonic + 9) % 12 + 12)
    } else {
        Ok(major_tonic)
    }
}

fn end_time(score: &Score) -> f64 {
    let track_times = score.tracks.iter().flat_map(|track| {
        track
            .notes
            .iter()
            .map(|note| note.end)
            .chain(track.control_times.iter().copied())
    });
    let meta_times = score
        .tempo_changes
        .iter()
        .map(|tc| tc.time)
        .chain(score.key_signatures.iter().map(|ks| ks.time))
        .chain(score.time_signatures.iter().map(|ts| ts.time))
        .chain(score.lyrics.iter().map(|lyric| lyric.time))
        .chain(score.text_events.iter().map(|event| event.time));

    track_times.chain(meta_times).fold(0.0, f64::max)
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use midly::num::{u4, u7, u14, u15, u24, u28};
    use midly::{Format, Header, PitchBend, TrackEvent};

    pub(crate) const TICKS_PER_QUARTER: u16 = 480;

    pub(crate) fn meta(delta: u32, message: MetaMessage<'static>) -> TrackEvent<'static> {
        TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Meta(message),
        }
    }

    pub(crate) fn midi(delta: u32, channel: u8, message: MidiMessage) -> TrackEvent<'static> {
        TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi {
                channel: u4::new(channel),
                message,
            },
        }
    }

    pub(crate) fn note_on(delta: u32, channel: u8, key: u8, vel: u8) -> TrackEvent<'static> {
        midi(
            delta,
            channel,
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            },
        )
    }

    pub(crate) fn note_off(delta: u32, channel: u8, key: u8) -> TrackEvent<'static> {
        midi(
            delta,
            channel,
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            },
        )
    }

    /// A two-instrument song with a drum track, one tempo change, and lyrics.
    pub(crate) fn song_bytes() -> Vec<u8> {
        let conductor = vec![
            meta(0, MetaMessage::Tempo(u24::new(500_000))),
            meta(0, MetaMessage::TimeSignature(4, 2, 24, 8)),
            meta(0, MetaMessage::KeySignature(1, false)),
            meta(1920, MetaMessage::Tempo(u24::new(1_000_000))),
            meta(0, MetaMessage::EndOfTrack),
        ];

        let piano = vec![
            meta(0, MetaMessage::TrackName(b"Piano")),
            midi(
                0,
                0,
                MidiMessage::ProgramChange {
                    program: u7::new(4),
                },
            ),
            meta(0, MetaMessage::Lyric(b"Twin")),
            note_on(0, 0, 60, 100),
            note_off(480, 0, 60),
            meta(0, MetaMessage::Lyric(b"kle")),
            note_on(0, 0, 62, 90),
            // zero velocity note on acts as a note off
            note_on(480, 0, 62, 0),
            meta(0, MetaMessage::EndOfTrack),
        ];

        let drums = vec![
            note_on(0, 9, 36, 127),
            note_off(240, 9, 36),
            note_on(240, 9, 38, 110),
            note_off(240, 9, 38),
            // never closed
            note_on(0, 9, 42, 80),
            meta(0, MetaMessage::EndOfTrack),
        ];

        smf_bytes(vec![conductor, piano, drums])
    }

    pub(crate) fn smf_bytes(tracks: Vec<Vec<TrackEvent<'static>>>) -> Vec<u8> {
        let mut smf = Smf::new(Header::new(
            Format::Parallel,
            Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
        ));
        smf.tracks = tracks;

        let mut buf = Vec::new();
        smf.write(&mut buf).expect("in-memory MIDI write");
        buf
    }

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9
    }

    #[test]
    fn midi_bytes_import() {
        env_logger::try_init().unwrap_or(());

        let score = midi_bytes_to_score(&song_bytes()).unwrap();

        assert_eq!(score.tracks.len(), 2);

        let piano = &score.tracks[0];
        assert_eq!(piano.program, 4);
        assert!(!piano.is_drum);
        assert_eq!(piano.name.as_deref(), Some("Piano"));
        assert_eq!(
            piano.notes.iter().map(|n| (n.pitch, n.velocity)).collect::<Vec<_>>(),
            vec![(60, 100), (62, 90)]
        );
        assert!(approx_eq(piano.notes[0].start, 0.0));
        assert!(approx_eq(piano.notes[0].end, 0.5));
        assert!(approx_eq(piano.notes[1].start, 0.5));
        assert!(approx_eq(piano.notes[1].end, 1.0));

        let drums = &score.tracks[1];
        assert!(drums.is_drum);
        assert_eq!(drums.notes.len(), 2);
        assert!(approx_eq(drums.notes[1].start, 0.5));
        assert!(approx_eq(drums.notes[1].end, 0.75));

        assert_eq!(score.tempo_changes.len(), 2);
        assert!(approx_eq(score.tempo_changes[0].bpm, 120.0));
        assert!(approx_eq(score.tempo_changes[1].time, 2.0));
        assert!(approx_eq(score.tempo_changes[1].bpm, 60.0));

        assert_eq!(score.key_signatures.len(), 1);
        assert_eq!(score.key_signatures[0].key_number, 7);
        assert_eq!(
            (score.time_signatures[0].numerator, score.time_signatures[0].denominator),
            (4, 4)
        );
        assert_eq!(
            score.lyrics.iter().map(|l| l.text.as_str()).collect::<Vec<_>>(),
            vec!["Twin", "kle"]
        );
        assert!(approx_eq(score.end_time, 2.0));
    }

    #[test]
    fn ticks_after_tempo_change() {
        let conductor = vec![
            meta(960, MetaMessage::Tempo(u24::new(1_000_000))),
            meta(0, MetaMessage::EndOfTrack),
        ];
        let lead = vec![
            note_on(1440, 0, 67, 64),
            note_off(480, 0, 67),
            meta(0, MetaMessage::EndOfTrack),
        ];

        let score = midi_bytes_to_score(&smf_bytes(vec![conductor, lead])).unwrap();
        let note = score.tracks[0].notes[0];

        // 960 ticks at 120bpm, then 480 more at 60bpm
        assert!(approx_eq(note.start, 2.0));
        assert!(approx_eq(note.end, 3.0));
        assert!(approx_eq(score.end_time, 3.0));
    }

    #[test]
    fn program_changes_split_instruments() {
        let track = vec![
            note_on(0, 0, 60, 100),
            note_off(480, 0, 60),
            midi(
                0,
                0,
                MidiMessage::ProgramChange {
                    program: u7::new(40),
                },
            ),
            note_on(0, 0, 64, 100),
            note_off(480, 0, 64),
            note_on(0, 1, 67, 100),
            note_off(480, 1, 67),
            meta(0, MetaMessage::EndOfTrack),
        ];

        let score = midi_bytes_to_score(&smf_bytes(vec![track])).unwrap();
        assert_eq!(
            score
                .tracks
                .iter()
                .map(|t| (t.program, t.notes.len()))
                .collect::<Vec<_>>(),
            vec![(0, 1), (40, 1), (0, 1)]
        );
    }

    #[test]
    fn same_tick_note_stays_open() {
        let track = vec![
            note_on(0, 0, 60, 100),
            note_on(480, 0, 60, 90),
            note_off(0, 0, 60),
            note_off(480, 0, 60),
            meta(0, MetaMessage::EndOfTrack),
        ];

        let score = midi_bytes_to_score(&smf_bytes(vec![track])).unwrap();
        let notes = &score.tracks[0].notes;
        assert_eq!(notes.len(), 2);
        assert!(approx_eq(notes[0].end, 0.5));
        assert_eq!(notes[1].velocity, 90);
        assert!(approx_eq(notes[1].start, 0.5));
        assert!(approx_eq(notes[1].end, 1.0));
    }

    #[test]
    fn same_tick_on_off_pair_is_discarded() {
        let track = vec![
            note_on(0, 0, 60, 100),
            note_off(0, 0, 60),
            note_on(480, 0, 60, 90),
            note_off(480, 0, 60),
            meta(0, MetaMessage::EndOfTrack),
        ];

        let score = midi_bytes_to_score(&smf_bytes(vec![track])).unwrap();
        let notes = &score.tracks[0].notes;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].velocity, 90);
        assert!(approx_eq(notes[0].start, 0.5));
        assert!(approx_eq(notes[0].end, 1.0));
    }

    fn controller(delta: u32, channel: u8) -> TrackEvent<'static> {
        midi(
            delta,
            channel,
            MidiMessage::Controller {
                controller: u7::new(64),
                value: u7::new(0),
            },
        )
    }

    #[test]
    fn controllers_extend_end_time() {
        env_logger::try_init().unwrap_or(());

        let track = vec![
            controller(0, 0),
            note_on(0, 0, 60, 100),
            note_off(480, 0, 60),
            // sustain pedal released well after the last note
            controller(960, 0),
            meta(0, MetaMessage::EndOfTrack),
        ];

        let score = midi_bytes_to_score(&smf_bytes(vec![track])).unwrap();
        assert!(approx_eq(score.end_time, 1.5));
        assert_eq!(score.tracks[0].control_times.len(), 2);
        assert!(approx_eq(score.tracks[0].control_times[0], 0.0));
        assert!(approx_eq(score.tracks[0].control_times[1], 1.5));
    }

    #[test]
    fn unadopted_pitch_bends_are_ignored() {
        let track = vec![
            note_on(0, 0, 60, 100),
            note_off(480, 0, 60),
            midi(
                1920,
                5,
                MidiMessage::PitchBend {
                    bend: PitchBend(u14::new(8192)),
                },
            ),
            meta(0, MetaMessage::EndOfTrack),
        ];

        let score = midi_bytes_to_score(&smf_bytes(vec![track])).unwrap();
        assert_eq!(score.tracks.len(), 1);
        assert!(approx_eq(score.end_time, 0.5));
    }

    #[test]
    fn text_events_extend_end_time() {
        let track = vec![
            note_on(0, 0, 60, 100),
            note_off(480, 0, 60),
            meta(1440, MetaMessage::Text(b"fine")),
            meta(0, MetaMessage::EndOfTrack),
        ];

        let score = midi_bytes_to_score(&smf_bytes(vec![track])).unwrap();
        assert_eq!(score.text_events.len(), 1);
        assert_eq!(score.text_events[0].text, "fine");
        assert!(approx_eq(score.end_time, 2.0));
    }

    #[test]
    fn key_numbers() {
        assert_eq!(key_number(0, false).unwrap(), 0);
        assert_eq!(key_number(1, false).unwrap(), 7);
        assert_eq!(key_number(-1, false).unwrap(), 5);
        assert_eq!(key_number(0, true).unwrap(), 21);
        assert_eq!(key_number(-3, true).unwrap(), 12);
        assert_eq!(key_number(7, false).unwrap(), 1);
        assert!(key_number(8, false).is_err());
    }

    #[test]
    fn invalid_time_signature_is_rejected() {
        let track = vec![
            meta(0, MetaMessage::TimeSignature(0, 2, 24, 8)),
            meta(0, MetaMessage::EndOfTrack),
        ];
        assert!(midi_bytes_to_score(&smf_bytes(vec![track])).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        env_logger::try_init().unwrap_or(());
        assert!(midi_bytes_to_score(b"definitely not a midi file").is_err());
        assert!(import_midi_file("./does/not/exist.mid").is_err());
    }

    #[test]
    fn empty_file_has_default_tempo() {
        let score = midi_bytes_to_score(&smf_bytes(vec![vec![meta(
            0,
            MetaMessage::EndOfTrack,
        )]]))
        .unwrap();

        assert!(score.tracks.is_empty());
        assert_eq!(score.tempo_changes.len(), 1);
        assert!(approx_eq(score.tempo_changes[0].bpm, 120.0));
        assert_eq!(score.end_time, 0.0);
    }
}
