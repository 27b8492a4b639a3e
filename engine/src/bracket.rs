use crate::{Feed, GroupId, GroupPicks, KnockoutPicks, Seed, Slot};
use std::collections::BTreeMap;

/// The two teams meeting in a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub team1: String,
    pub team2: String,
}

impl Fixture {
    pub fn new(team1: impl Into<String>, team2: impl Into<String>) -> Self {
        Self {
            team1: team1.into(),
            team2: team2.into(),
        }
    }

    pub fn has(&self, team: &str) -> bool {
        self.team1 == team || self.team2 == team
    }
}

/// Materialized slots only. A slot whose inputs are unknown is simply absent.
pub type Bracket = BTreeMap<Slot, Fixture>;

/// Draw the knockout bracket from group qualifiers and whatever knockout
/// outcomes are known so far.
///
/// Nothing is drawn until every group has exactly two qualifiers. Later slots
/// appear once both of their feeder slots have a recorded winner; the third
/// place match takes the two semi-final losers instead.
pub fn generate(qualifiers: &GroupPicks, played: &KnockoutPicks) -> Bracket {
    let mut bracket = Bracket::new();
    if !groups_complete(qualifiers) {
        return bracket;
    }

    for slot in Slot::ALL {
        let teams = match slot.feed() {
            Feed::Groups(a, b) => seed_team(qualifiers, a).zip(seed_team(qualifiers, b)),
            Feed::Winners(a, b) => winner_of(played, a).zip(winner_of(played, b)),
            Feed::Losers(a, b) => loser_of(played, a).zip(loser_of(played, b)),
        };
        if let Some((team1, team2)) = teams {
            bracket.insert(slot, Fixture::new(team1, team2));
        }
    }
    bracket
}

/// True when every group has exactly two qualifiers picked.
pub fn groups_complete(qualifiers: &GroupPicks) -> bool {
    GroupId::ALL
        .iter()
        .all(|g| qualifiers.get(g).is_some_and(|q| q.len() == 2))
}

fn seed_team(qualifiers: &GroupPicks, seed: Seed) -> Option<&str> {
    qualifiers
        .get(&seed.group)?
        .get(seed.place.index())
        .map(String::as_str)
}

fn winner_of(played: &KnockoutPicks, slot: Slot) -> Option<&str> {
    played.get(&slot)?.winner.as_deref()
}

fn loser_of(played: &KnockoutPicks, slot: Slot) -> Option<&str> {
    played.get(&slot)?.loser()
}
