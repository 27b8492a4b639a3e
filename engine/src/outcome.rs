use crate::MatchOutcome;
use crate::entry::EntryError;

/// Decide a single knockout match.
///
/// A level score in regular time always means extra time and penalties: the
/// winner is the penalty winner, or unset until one is supplied. Otherwise the
/// higher score wins and any penalty winner is dropped. A penalty winner that
/// is neither of the two teams is ignored.
pub fn resolve(
    team1: &str,
    team2: &str,
    regular_time1: u16,
    regular_time2: u16,
    penalty_winner: Option<&str>,
) -> MatchOutcome {
    let mut outcome = MatchOutcome {
        team1: team1.to_owned(),
        team2: team2.to_owned(),
        regular_time1,
        regular_time2,
        went_to_extra_time: false,
        penalty_winner: None,
        winner: None,
    };

    if regular_time1 == regular_time2 {
        outcome.went_to_extra_time = true;
        outcome.penalty_winner = penalty_winner
            .filter(|team| *team == team1 || *team == team2)
            .map(str::to_owned);
        outcome.winner = outcome.penalty_winner.clone();
    } else if regular_time1 > regular_time2 {
        outcome.winner = Some(team1.to_owned());
    } else {
        outcome.winner = Some(team2.to_owned());
    }
    outcome
}

impl MatchOutcome {
    /// Mark a decided match as having gone to extra time. A draw is always
    /// extra time, so the flag cannot be cleared on one.
    pub fn with_extra_time(mut self, went_to_extra_time: bool) -> Self {
        self.went_to_extra_time = went_to_extra_time || self.is_draw();
        self
    }
}

/// Parse a regular-time score typed by a person. Only non-negative whole
/// numbers are accepted.
pub fn parse_score(raw: &str) -> Result<u16, EntryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EntryError::InvalidScore(raw.to_owned()));
    }
    trimmed
        .parse::<u16>()
        .map_err(|_| EntryError::InvalidScore(raw.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_goes_to_penalties() {
        let outcome = resolve("Benfica", "Chelsea", 2, 2, Some("Benfica"));
        assert!(outcome.went_to_extra_time);
        assert_eq!(outcome.winner.as_deref(), Some("Benfica"));
        assert_eq!(outcome.penalty_winner.as_deref(), Some("Benfica"));
    }

    #[test]
    fn draw_without_penalty_winner_leaves_winner_unset() {
        let outcome = resolve("Benfica", "Chelsea", 2, 2, None);
        assert!(outcome.went_to_extra_time);
        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.penalty_winner, None);
    }

    #[test]
    fn higher_score_wins_regardless_of_penalty_winner() {
        let outcome = resolve("Benfica", "Chelsea", 3, 1, Some("Chelsea"));
        assert_eq!(outcome.winner.as_deref(), Some("Benfica"));
        assert!(!outcome.went_to_extra_time);
        assert_eq!(outcome.penalty_winner, None);

        let outcome = resolve("Benfica", "Chelsea", 0, 4, None);
        assert_eq!(outcome.winner.as_deref(), Some("Chelsea"));
    }

    #[test]
    fn penalty_winner_from_outside_the_match_is_ignored() {
        let outcome = resolve("Benfica", "Chelsea", 1, 1, Some("Porto"));
        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.penalty_winner, None);
    }

    #[test]
    fn two_step_resolution_matches_single_call() {
        let first = resolve("Inter Milan", "Fluminense", 0, 0, None);
        assert_eq!(first.winner, None);
        let second = resolve(&first.team1, &first.team2, 0, 0, Some("Fluminense"));
        assert_eq!(second, resolve("Inter Milan", "Fluminense", 0, 0, Some("Fluminense")));
    }

    #[test]
    fn extra_time_flag_only_sticks_to_decided_matches() {
        let outcome = resolve("Real Madrid", "Juventus", 1, 0, None).with_extra_time(true);
        assert!(outcome.went_to_extra_time);
        assert_eq!(outcome.winner.as_deref(), Some("Real Madrid"));

        let outcome = resolve("Real Madrid", "Juventus", 1, 1, None).with_extra_time(false);
        assert!(outcome.went_to_extra_time);
    }

    #[test]
    fn parse_score_rejects_negative_and_non_numeric() {
        assert_eq!(parse_score("3").unwrap(), 3);
        assert_eq!(parse_score(" 0 ").unwrap(), 0);
        assert!(matches!(parse_score("-1"), Err(EntryError::InvalidScore(_))));
        assert!(matches!(parse_score("two"), Err(EntryError::InvalidScore(_))));
        assert!(matches!(parse_score(""), Err(EntryError::InvalidScore(_))));
        assert!(matches!(parse_score("1.5"), Err(EntryError::InvalidScore(_))));
    }
}
