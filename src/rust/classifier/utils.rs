/// Index and value of the largest score. Ties resolve to the lowest index.
///
/// Returns `None` for an empty slice or if any score is NaN or infinite.
pub(crate) fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if !score.is_finite() {
            return None;
        }
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((i, score)),
        }
    }
    best
}

/// Converts a raw score into a percentage in [0, 100].
pub(crate) fn to_percentage(score: f32) -> f32 {
    (score * 100.0).clamp(0.0, 100.0)
}
