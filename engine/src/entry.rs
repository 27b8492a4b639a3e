use crate::bracket::{self, Fixture};
use crate::outcome::resolve;
use crate::{GroupId, MatchOutcome, Place, Prediction, Slot, TournamentPhase, TournamentResults};
use log::info;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    InvalidScore(String),
    InvalidPlace(String),
    InvalidPhase(String),
    UnknownGroup(String),
    UnknownSlot(String),
    NotInGroup { group: GroupId, team: String },
    DuplicatePick { group: GroupId, team: String },
    IncompleteGroup(GroupId),
    MissingPlayerName,
    MissingKnockout(Slot),
    FixtureMismatch { slot: Slot, expected: Fixture },
    NotInFixture { slot: Slot, team: String },
    SlotNotReady(Slot),
    PredictionsClosed,
}

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryError::InvalidScore(raw) => {
                write!(f, "invalid score {raw:?}: expected a whole number of goals, 0 or more")
            }
            EntryError::InvalidPlace(raw) => write!(f, "invalid group position {raw:?}: use 1 or 2"),
            EntryError::InvalidPhase(raw) => {
                write!(f, "invalid phase {raw:?}: use groups, knockout or finished")
            }
            EntryError::UnknownGroup(raw) => write!(f, "unknown group {raw:?}: use A to H"),
            EntryError::UnknownSlot(raw) => write!(f, "unknown bracket slot {raw:?}"),
            EntryError::NotInGroup { group, team } => write!(f, "{team} is not in group {group}"),
            EntryError::DuplicatePick { group, team } => {
                write!(f, "{team} is picked twice in group {group}")
            }
            EntryError::IncompleteGroup(group) => {
                write!(f, "group {group} needs exactly two qualifiers")
            }
            EntryError::MissingPlayerName => write!(f, "player name is required"),
            EntryError::MissingKnockout(slot) => write!(f, "no winner predicted for {slot}"),
            EntryError::FixtureMismatch { slot, expected } => write!(
                f,
                "{slot} should be {} v {} according to the earlier picks",
                expected.team1, expected.team2
            ),
            EntryError::NotInFixture { slot, team } => write!(f, "{team} is not playing in {slot}"),
            EntryError::SlotNotReady(slot) => {
                write!(f, "{slot} cannot be played yet: its teams are not known")
            }
            EntryError::PredictionsClosed => write!(f, "predictions are closed"),
        }
    }
}

impl std::error::Error for EntryError {}

// ---------------------------------------------------------------------------
// Participant picks
// ---------------------------------------------------------------------------

/// Click-style group picking: a picked team is unpicked, the first two picks
/// fill winner then runner-up, and a third pick replaces the runner-up.
pub fn toggle_pick(picks: &mut Vec<String>, team: &str) {
    if let Some(pos) = picks.iter().position(|t| t == team) {
        picks.remove(pos);
    } else if picks.len() < 2 {
        picks.push(team.to_owned());
    } else {
        picks.truncate(1);
        picks.push(team.to_owned());
    }
}

/// Check a submission is complete and consistent before it is stored.
///
/// Every group needs two distinct teams from that group, and every slot of
/// the bracket drawn from the participant's own picks needs a winner for the
/// fixture that bracket implies.
pub fn validate_prediction(prediction: &Prediction) -> Result<(), EntryError> {
    if prediction.player_name.trim().is_empty() {
        return Err(EntryError::MissingPlayerName);
    }

    for group in GroupId::ALL {
        let picks = prediction.picks(group);
        if picks.len() != 2 {
            return Err(EntryError::IncompleteGroup(group));
        }
        check_members(group, picks)?;
    }

    let bracket = prediction.bracket();
    for slot in Slot::ALL {
        let expected = bracket
            .get(&slot)
            .ok_or(EntryError::MissingKnockout(slot))?;
        let outcome = prediction
            .knockout_predictions
            .get(&slot)
            .ok_or(EntryError::MissingKnockout(slot))?;
        if outcome.team1 != expected.team1 || outcome.team2 != expected.team2 {
            return Err(EntryError::FixtureMismatch {
                slot,
                expected: expected.clone(),
            });
        }
        if outcome.winner.is_none() {
            return Err(EntryError::MissingKnockout(slot));
        }
    }
    Ok(())
}

fn check_members(group: GroupId, picks: &[String]) -> Result<(), EntryError> {
    for (i, team) in picks.iter().enumerate() {
        if !group.contains(team) {
            return Err(EntryError::NotInGroup {
                group,
                team: team.clone(),
            });
        }
        if picks[..i].contains(team) {
            return Err(EntryError::DuplicatePick {
                group,
                team: team.clone(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Official results
// ---------------------------------------------------------------------------

/// Put `team` in the given finishing position of its group, keeping whoever
/// holds the other position.
pub fn place_qualifier(
    results: &mut TournamentResults,
    group: GroupId,
    team: &str,
    place: Place,
) -> Result<(), EntryError> {
    if !group.contains(team) {
        return Err(EntryError::NotInGroup {
            group,
            team: team.to_owned(),
        });
    }

    let entry = results.group_results.entry(group).or_default();
    let winner = entry.at(Place::Winner).map(str::to_owned);
    let runner_up = entry.at(Place::RunnerUp).map(str::to_owned);
    // The displaced team keeps its place if it can; a team moved between the
    // two places swaps with the other qualifier.
    let other = |a: Option<String>, b: Option<String>| {
        a.filter(|t| t != team).or(b.filter(|t| t != team))
    };
    let (first, second) = match place {
        Place::Winner => (Some(team.to_owned()), other(runner_up, winner)),
        Place::RunnerUp => (other(winner, runner_up), Some(team.to_owned())),
    };
    entry.qualified = first.into_iter().chain(second).collect();

    info!("group {group} qualifiers now {:?}", entry.qualified);
    Ok(())
}

pub fn remove_qualifier(results: &mut TournamentResults, group: GroupId, team: &str) {
    if let Some(entry) = results.group_results.get_mut(&group) {
        entry.qualified.retain(|t| t != team);
        info!("removed {team} from group {group} qualifiers");
    }
}

/// Record an official knockout result for a slot the official bracket has
/// already drawn. Teams come from the drawn fixture.
pub fn record_knockout(
    results: &mut TournamentResults,
    slot: Slot,
    regular_time1: u16,
    regular_time2: u16,
    penalty_winner: Option<&str>,
    went_to_extra_time: bool,
) -> Result<MatchOutcome, EntryError> {
    let bracket = bracket::generate(&results.qualifiers(), &results.knockout_results);
    let fixture = bracket.get(&slot).ok_or(EntryError::SlotNotReady(slot))?;

    if let Some(team) = penalty_winner.filter(|team| !fixture.has(team)) {
        return Err(EntryError::NotInFixture {
            slot,
            team: team.to_owned(),
        });
    }

    let outcome = resolve(
        &fixture.team1,
        &fixture.team2,
        regular_time1,
        regular_time2,
        penalty_winner,
    )
    .with_extra_time(went_to_extra_time);

    results.knockout_results.insert(slot, outcome.clone());
    results.current_phase = advance_phase(results.current_phase, slot, &outcome);

    info!(
        "recorded {slot}: {} {}-{} {} (winner: {})",
        outcome.team1,
        outcome.regular_time1,
        outcome.regular_time2,
        outcome.team2,
        outcome.winner.as_deref().unwrap_or("pending penalties")
    );
    Ok(outcome)
}

fn advance_phase(current: TournamentPhase, slot: Slot, outcome: &MatchOutcome) -> TournamentPhase {
    if slot == Slot::Final && outcome.winner.is_some() {
        TournamentPhase::Finished
    } else if slot == Slot::Final && current == TournamentPhase::Finished {
        // The final was re-recorded without a winner.
        TournamentPhase::Knockout
    } else if current == TournamentPhase::Groups {
        TournamentPhase::Knockout
    } else {
        current
    }
}
