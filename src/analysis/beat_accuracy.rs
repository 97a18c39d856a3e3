use crate::model::score::Note;
use crate::model::statistics::BeatAccuracy;
use crate::util::is_close;

/// Half-width, in seconds, of the window around each beat in which onsets are considered.
pub const DEFAULT_EPS: f64 = 0.001;

/// Measures how well note onsets line up with a beat grid.
///
/// Every beat gathers the onsets inside `[beat - eps, beat + eps]`. A beat with at least one such
/// onset contributes the mean absolute distance of those onsets, plus the fraction of them that
/// are numerically indistinguishable from the beat itself. Both values are then averaged over the
/// contributing beats only. Beats with no nearby onset are ignored rather than counted as zero.
///
/// Returns [`BeatAccuracy::NOT_COMPUTABLE`] when there are no notes or no beat contributed.
pub fn score(notes: &[Note], beats: &[f64], eps: f64) -> BeatAccuracy {
    if notes.is_empty() {
        return BeatAccuracy::NOT_COMPUTABLE;
    }

    let mut onsets: Vec<f64> = notes.iter().map(|note| note.start).collect();
    onsets.sort_by(f64::total_cmp);

    let mut distance_sum = 0.0;
    let mut onbeat_sum = 0.0;
    let mut contributing = 0usize;

    for &beat in beats {
        let region_start = beat - eps;
        let region_end = beat + eps;

        let first = onsets.partition_point(|&onset| onset < region_start);
        let region = onsets[first..]
            .iter()
            .take_while(|&&onset| onset <= region_end);

        let mut k = 0usize;
        let mut dist = 0.0;
        let mut onbeat = 0usize;
        for &onset in region {
            k += 1;
            dist += (beat - onset).abs();
            if is_close(beat, onset) {
                onbeat += 1;
            }
        }

        if k == 0 {
            continue;
        }

        distance_sum += dist / k as f64;
        onbeat_sum += onbeat as f64 / k as f64;
        contributing += 1;
    }

    if contributing == 0 {
        return BeatAccuracy::NOT_COMPUTABLE;
    }

    BeatAccuracy(
        distance_sum / contributing as f64,
        onbeat_sum / contributing as f64,
    )
}
