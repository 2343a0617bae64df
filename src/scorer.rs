use std::cmp::Ordering;

use crate::models::TranscriptRow;

/// Orders two attempts at the same course, better attempt first.
///
/// Graded beats ungraded, higher score beats lower, and on an equal score a
/// passing letter beats `F`/`F+`. Anything else compares equal so a stable
/// sort keeps input order.
pub fn compare_attempts(a: &TranscriptRow, b: &TranscriptRow) -> Ordering {
    match (a.score(), b.score()) {
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
        (Some(x), Some(y)) => y
            .partial_cmp(&x)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.is_fail().cmp(&b.is_fail())),
    }
}

/// Positions of `rows`, best attempt first.
pub fn rank(rows: &[TranscriptRow]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&a, &b| compare_attempts(&rows[a], &rows[b]));
    order
}

/// Representative attempt, or `None` for an empty slice.
pub fn pick_best(rows: &[TranscriptRow]) -> Option<&TranscriptRow> {
    rank(rows).first().map(|&i| &rows[i])
}

/// Like [`pick_best`] over a subset of `rows` given by index. Returns the
/// winning index; ties go to the earliest entry of `candidates`.
pub(crate) fn best_index(rows: &[TranscriptRow], candidates: &[usize]) -> Option<usize> {
    let mut ordered = candidates.to_vec();
    ordered.sort_by(|&a, &b| compare_attempts(&rows[a], &rows[b]));
    ordered.first().copied()
}
