use cwc_engine::bracket::Bracket;
use cwc_engine::leaderboard::Standing;
use cwc_engine::scoring::{self, ScoreBreakdown};
use cwc_engine::{GroupId, GroupPicks, KnockoutPicks, MatchOutcome, Phase, Prediction, TournamentResults};

// ---------------------------------------------------------------------------
// Leaderboard and rules
// ---------------------------------------------------------------------------

pub fn leaderboard(table: &[Standing<'_>]) -> String {
    if table.is_empty() {
        return "No predictions yet.".to_owned();
    }

    let name_width = table
        .iter()
        .map(|s| s.prediction.player_name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Player".len());

    let mut lines = vec![format!("{:>3}  {:<name_width$}  {:>6}  {}", "#", "Player", "Points", "Id")];
    for s in table {
        lines.push(format!(
            "{:>3}  {:<name_width$}  {:>6}  {}",
            s.position, s.prediction.player_name, s.score, s.prediction.id
        ));
    }
    lines.join("\n")
}

pub fn rules() -> String {
    let mut lines = vec!["Scoring".to_owned()];
    lines.extend(scoring::rules_summary().into_iter().map(|l| format!("  {l}")));
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Bracket
// ---------------------------------------------------------------------------

/// Group picks followed by every slot, drawn or still waiting on its feeders.
pub fn bracket(title: &str, groups: &GroupPicks, drawn: &Bracket, outcomes: &KnockoutPicks) -> String {
    let mut lines = vec![title.to_owned(), String::new(), "Groups".to_owned()];
    for group in GroupId::ALL {
        let picks = groups.get(&group).map(Vec::as_slice).unwrap_or_default();
        lines.push(format!("  {group}  {}", qualifiers(picks)));
    }

    for phase in Phase::ALL {
        lines.push(String::new());
        lines.push(phase.label().to_owned());
        for slot in phase.slots() {
            let line = match (drawn.get(&slot), outcomes.get(&slot)) {
                (Some(_), Some(outcome)) => scoreline(outcome),
                (Some(fixture), None) => format!("{} v {}", fixture.team1, fixture.team2),
                (None, _) => format!("({})", slot.feed()),
            };
            lines.push(format!("  {:<6} {line}", slot.id()));
        }
    }
    lines.join("\n")
}

fn qualifiers(picks: &[String]) -> String {
    match picks {
        [] => "-".to_owned(),
        [winner] => format!("1. {winner}"),
        [winner, runner_up, ..] => format!("1. {winner}  2. {runner_up}"),
    }
}

fn scoreline(outcome: &MatchOutcome) -> String {
    let mut line = format!(
        "{} {}-{} {}",
        outcome.team1, outcome.regular_time1, outcome.regular_time2, outcome.team2
    );
    if outcome.went_to_extra_time {
        line.push_str(" (a.e.t.)");
    }
    match (&outcome.penalty_winner, &outcome.winner) {
        (Some(pens), _) => line.push_str(&format!(", {pens} on penalties")),
        (None, None) => line.push_str(", penalties pending"),
        (None, Some(_)) => {}
    }
    line
}

// ---------------------------------------------------------------------------
// Official results and prediction analysis
// ---------------------------------------------------------------------------

pub fn results(results: &TournamentResults) -> String {
    let mut lines = vec![format!("Phase: {}", results.current_phase.label())];
    lines.push(bracket(
        "Official results",
        &results.qualifiers(),
        &results.bracket(),
        &results.knockout_results,
    ));
    lines.join("\n\n")
}

pub fn analysis(prediction: &Prediction, breakdown: &ScoreBreakdown) -> String {
    let mut lines = vec![
        format!("{} ({})", prediction.player_name, prediction.id),
        format!("Submitted {}", prediction.timestamp.to_rfc3339()),
        String::new(),
        format!("Groups: {} points", breakdown.group_points()),
    ];

    for (group, result) in &breakdown.groups {
        let picks: Vec<String> = result
            .picks
            .iter()
            .map(|p| {
                let mark = match (p.qualified, p.exact_position) {
                    (true, true) => "exact",
                    (true, false) => "qualified",
                    (false, _) => "out",
                };
                format!("{} [{mark}]", p.team)
            })
            .collect();
        let picks = if picks.is_empty() { "-".to_owned() } else { picks.join(", ") };
        lines.push(format!("  {group}  {picks}  +{}", result.points));
    }

    lines.push(String::new());
    lines.push(format!("Knockout: {} points", breakdown.knockout_points()));
    if breakdown.knockout.is_empty() {
        lines.push("  no official knockout results yet".to_owned());
    }
    for (slot, m) in &breakdown.knockout {
        let mut hits = Vec::new();
        if m.winner_correct {
            hits.push("winner");
        }
        if m.score_correct {
            hits.push("score");
        }
        if m.extra_time_correct {
            hits.push("extra time");
        }
        if m.penalties_correct {
            hits.push("penalties");
        }
        let hits = if hits.is_empty() { "-".to_owned() } else { hits.join(", ") };
        lines.push(format!(
            "  {:<6} picked {} {}-{}, official {}-{}  [{hits}]  +{}",
            slot.id(),
            m.predicted_winner.as_deref().unwrap_or("nobody"),
            m.predicted_score.0,
            m.predicted_score.1,
            m.official_score.0,
            m.official_score.1,
            m.points
        ));
    }

    lines.push(String::new());
    lines.push(format!("Total: {} points", breakdown.total));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use cwc_engine::outcome::resolve;
    use cwc_engine::{GROUPS, GroupResult, Slot, leaderboard};

    fn official() -> TournamentResults {
        let mut results = TournamentResults::default();
        for (group, teams) in GROUPS.iter() {
            results.group_results.insert(
                *group,
                GroupResult {
                    qualified: vec![teams[0].to_string(), teams[1].to_string()],
                },
            );
        }
        results
    }

    #[test]
    fn leaderboard_lists_positions_and_points() {
        let at = Utc.with_ymd_and_hms(2025, 6, 14, 9, 0, 0).unwrap();
        let predictions = vec![Prediction::new("Ana", official().qualifiers(), KnockoutPicks::new(), at)];
        let table = leaderboard::rank(&predictions, &official());
        let text = leaderboard(&table);
        let row = text.lines().nth(1).unwrap();
        assert!(row.contains("Ana"));
        assert!(row.contains("48"));
        assert_eq!(leaderboard(&[]), "No predictions yet.");
    }

    #[test]
    fn bracket_shows_feeds_for_undrawn_slots() {
        let mut results = official();
        let r1 = resolve("Porto", "Atletico Madrid", 1, 1, None);
        results.knockout_results.insert(Slot::R1, r1);
        let text = super::results(&results);
        assert!(text.contains("Porto 1-1 Atletico Madrid (a.e.t.), penalties pending"));
        assert!(text.contains("Bayern Munich v Chelsea"));
        assert!(text.contains("(Winner r16_1 v Winner r16_2)"));
        assert!(text.contains("(Loser sf_1 v Loser sf_2)"));
    }

    #[test]
    fn rules_list_every_phase() {
        let text = rules();
        for phase in Phase::ALL {
            assert!(text.contains(phase.label()), "{}", phase.label());
        }
    }

    #[test]
    fn analysis_marks_each_pick() {
        let at = Utc.with_ymd_and_hms(2025, 6, 14, 9, 0, 0).unwrap();
        let mut groups = official().qualifiers();
        groups.insert(GroupId::A, vec!["Palmeiras".into(), "Al-Ahly".into()]);
        let prediction = Prediction::new("Ana", groups, KnockoutPicks::new(), at);
        let breakdown = scoring::analyze(&prediction, &official());
        let text = analysis(&prediction, &breakdown);
        assert!(text.contains("Palmeiras [qualified], Al-Ahly [out]  +2"));
        assert!(text.contains("no official knockout results yet"));
        assert!(text.contains("Total: 44 points"));
    }
}
