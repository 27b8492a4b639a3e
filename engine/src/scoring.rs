use crate::{GroupId, MatchOutcome, Phase, Prediction, Slot, TournamentResults};
use std::collections::BTreeMap;

pub const QUALIFIER_POINTS: u32 = 2;
pub const POSITION_POINTS: u32 = 1;
pub const EXTRA_TIME_POINTS: u32 = 1;
pub const PENALTY_POINTS: u32 = 2;
pub const CHAMPION_BONUS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifierPick {
    pub team: String,
    /// Team is among the official qualifiers of its group.
    pub qualified: bool,
    /// Team finished exactly where it was picked.
    pub exact_position: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupBreakdown {
    pub picks: Vec<QualifierPick>,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchBreakdown {
    pub predicted_winner: Option<String>,
    pub winner_correct: bool,
    pub predicted_score: (u16, u16),
    pub official_score: (u16, u16),
    pub score_correct: bool,
    pub extra_time_correct: bool,
    pub penalties_correct: bool,
    pub points: u32,
}

/// Element-wise comparison of one prediction against the official results.
///
/// Knockout slots without an official result are left out entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub groups: BTreeMap<GroupId, GroupBreakdown>,
    pub knockout: BTreeMap<Slot, MatchBreakdown>,
    pub total: u32,
}

impl ScoreBreakdown {
    pub fn group_points(&self) -> u32 {
        self.groups.values().map(|g| g.points).sum()
    }

    pub fn knockout_points(&self) -> u32 {
        self.knockout.values().map(|m| m.points).sum()
    }
}

/// Total points for a prediction. Always computed from the current results.
pub fn score(prediction: &Prediction, results: &TournamentResults) -> u32 {
    analyze(prediction, results).total
}

pub fn analyze(prediction: &Prediction, results: &TournamentResults) -> ScoreBreakdown {
    let groups: BTreeMap<GroupId, GroupBreakdown> = GroupId::ALL
        .into_iter()
        .map(|g| (g, score_group(prediction.picks(g), results.qualified(g))))
        .collect();

    let knockout: BTreeMap<Slot, MatchBreakdown> = prediction
        .knockout_predictions
        .iter()
        .filter_map(|(slot, predicted)| {
            let official = results.knockout_results.get(slot)?;
            Some((*slot, score_match(*slot, predicted, official)))
        })
        .collect();

    let total = groups.values().map(|g| g.points).sum::<u32>()
        + knockout.values().map(|m| m.points).sum::<u32>();

    ScoreBreakdown { groups, knockout, total }
}

/// Points for one group: 2 per predicted qualifier that qualified, plus 1 if
/// it also finished in the predicted position. Wrong picks cost nothing.
pub fn score_group(predicted: &[String], official: &[String]) -> GroupBreakdown {
    let mut points = 0;
    let picks: Vec<QualifierPick> = predicted
        .iter()
        .enumerate()
        .map(|(index, team)| {
            let qualified = official.contains(team);
            let exact_position = qualified && official.get(index) == Some(team);
            if qualified {
                points += QUALIFIER_POINTS;
            }
            if exact_position {
                points += POSITION_POINTS;
            }
            QualifierPick {
                team: team.clone(),
                qualified,
                exact_position,
            }
        })
        .collect();
    GroupBreakdown { picks, points }
}

/// Points for one knockout slot against its official result.
pub fn score_match(slot: Slot, predicted: &MatchOutcome, official: &MatchOutcome) -> MatchBreakdown {
    let base = slot.base_points();

    // An undecided official result (level score, no penalty winner yet) credits nobody.
    let winner_correct = official.winner.is_some() && predicted.winner == official.winner;
    let score_correct = predicted.score() == official.score();
    let extra_time_correct =
        official.went_to_extra_time && predicted.went_to_extra_time == official.went_to_extra_time;
    let penalties_correct =
        official.penalty_winner.is_some() && predicted.penalty_winner == official.penalty_winner;

    let mut points = 0;
    if winner_correct {
        points += base;
        if slot == Slot::Final {
            points += CHAMPION_BONUS;
        }
    }
    if score_correct {
        points += base / 2;
    }
    if extra_time_correct {
        points += EXTRA_TIME_POINTS;
    }
    if penalties_correct {
        points += PENALTY_POINTS;
    }

    MatchBreakdown {
        predicted_winner: predicted.winner.clone(),
        winner_correct,
        predicted_score: predicted.score(),
        official_score: official.score(),
        score_correct,
        extra_time_correct,
        penalties_correct,
        points,
    }
}

/// Human-readable scoring table.
pub fn rules_summary() -> Vec<String> {
    let mut lines = vec![format!(
        "Group stage: {QUALIFIER_POINTS} points per correct qualifier + {POSITION_POINTS} for the exact position"
    )];
    for phase in Phase::ALL {
        let base = phase.base_points();
        let mut line = format!(
            "{}: {base} points for the winner + {} for the exact score",
            phase.label(),
            base / 2
        );
        if phase == Phase::Final {
            line.push_str(&format!(" + {CHAMPION_BONUS} for the champion"));
        }
        lines.push(line);
    }
    lines.push(format!(
        "Bonus: +{EXTRA_TIME_POINTS} for calling extra time, +{PENALTY_POINTS} for the penalty winner"
    ));
    lines
}
