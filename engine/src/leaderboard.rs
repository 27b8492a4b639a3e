use crate::scoring;
use crate::{Prediction, TournamentResults};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing<'a> {
    /// 1-based position in the table.
    pub position: usize,
    pub prediction: &'a Prediction,
    pub score: u32,
}

/// Score every prediction against the current results and order them.
///
/// Highest score first. Equal scores go to the earliest submission, then to
/// the lower id, so the order never depends on how the store returned them.
pub fn rank<'a>(predictions: &'a [Prediction], results: &TournamentResults) -> Vec<Standing<'a>> {
    let mut scored: Vec<(&Prediction, u32)> = predictions
        .iter()
        .map(|p| (p, scoring::score(p, results)))
        .collect();

    scored.sort_by(|(a, a_score), (b, b_score)| {
        b_score
            .cmp(a_score)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
            .then_with(|| a.id.cmp(&b.id))
    });

    scored
        .into_iter()
        .enumerate()
        .map(|(i, (prediction, score))| Standing {
            position: i + 1,
            prediction,
            score,
        })
        .collect()
}
