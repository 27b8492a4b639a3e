use anyhow::{Context, anyhow, bail};
use cwc_engine::outcome::parse_score;
use cwc_engine::{GroupId, Place, Slot, TournamentPhase};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Leaderboard,
    Rules,
    /// `None` shows the official bracket.
    Bracket(Option<String>),
    Analyze(String),
    Submit(PathBuf),
    Delete(String),
    DeleteAll,
    Results(ResultsCommand),
    Help,
    Version,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultsCommand {
    Show,
    SetGroup {
        group: GroupId,
        team: String,
        place: Place,
    },
    RemoveGroup {
        group: GroupId,
        team: String,
    },
    Record {
        slot: Slot,
        score1: u16,
        score2: u16,
        penalty_winner: Option<String>,
        extra_time: bool,
    },
    Phase(TournamentPhase),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub verbose: bool,
}

/// Parse everything after the program name. No command means `leaderboard`.
pub fn parse(args: &[String]) -> anyhow::Result<Invocation> {
    let verbose = args.iter().any(|a| a == "-v" || a == "--verbose");
    let extra_time = args.iter().any(|a| a == "--extra-time");
    let official = args.iter().any(|a| a == "--official");
    let rest: Vec<&str> = args
        .iter()
        .map(String::as_str)
        .filter(|a| !matches!(*a, "-v" | "--verbose" | "--extra-time" | "--official"))
        .collect();

    let command = match rest.as_slice() {
        [] | ["leaderboard"] => Command::Leaderboard,
        ["-h" | "--help" | "help"] => Command::Help,
        ["-V" | "--version"] => Command::Version,
        ["rules"] => Command::Rules,
        ["bracket"] => Command::Bracket(None),
        ["bracket", id] if !official => Command::Bracket(Some(id.to_string())),
        ["analyze", id] => Command::Analyze(id.to_string()),
        ["submit", path] => Command::Submit(PathBuf::from(path)),
        ["delete", id] => Command::Delete(id.to_string()),
        ["delete-all"] => Command::DeleteAll,
        ["results", tail @ ..] => Command::Results(parse_results(tail, extra_time)?),
        _ => bail!("unrecognized arguments: {}", args.join(" ")),
    };

    if extra_time && !matches!(command, Command::Results(ResultsCommand::Record { .. })) {
        bail!("--extra-time only applies to `results record`");
    }
    if official && command != Command::Bracket(None) {
        bail!("--official only applies to `bracket`");
    }

    Ok(Invocation { command, verbose })
}

fn parse_results(args: &[&str], extra_time: bool) -> anyhow::Result<ResultsCommand> {
    let command = match args {
        [] | ["show"] => ResultsCommand::Show,
        ["set-group", group, team, place] => ResultsCommand::SetGroup {
            group: group.parse()?,
            team: team.to_string(),
            place: place.parse()?,
        },
        ["remove-group", group, team] => ResultsCommand::RemoveGroup {
            group: group.parse()?,
            team: team.to_string(),
        },
        ["record", slot, score1, score2, penalty @ ..] if penalty.len() <= 1 => {
            ResultsCommand::Record {
                slot: slot.parse()?,
                score1: parse_score(score1).context("first team's score")?,
                score2: parse_score(score2).context("second team's score")?,
                penalty_winner: penalty.first().map(|t| t.to_string()),
                extra_time,
            }
        }
        ["phase", phase] => ResultsCommand::Phase(phase.parse()?),
        ["reset"] => ResultsCommand::Reset,
        _ => return Err(anyhow!("unrecognized results command: {}", args.join(" "))),
    };
    Ok(command)
}

pub fn usage_text() -> &'static str {
    "cwc-pool - FIFA Club World Cup 2025 bracket prediction pool

Usage:
  cwc-pool [leaderboard]
  cwc-pool rules
  cwc-pool bracket [--official | <prediction-id>]
  cwc-pool analyze <prediction-id>
  cwc-pool submit <prediction.json>
  cwc-pool delete <prediction-id>
  cwc-pool delete-all
  cwc-pool results [show]
  cwc-pool results set-group <A-H> <team> <1|2>
  cwc-pool results remove-group <A-H> <team>
  cwc-pool results record <slot> <score1> <score2> [penalty-winner] [--extra-time]
  cwc-pool results phase <groups|knockout|finished>
  cwc-pool results reset
  cwc-pool --help
  cwc-pool --version

Options:
  -v, --verbose   Debug logging (RUST_LOG overrides)

Slots:
  r16_1..r16_8, qf_1..qf_4, sf_1, sf_2, third, final

Environment:
  CWC_POOL_STORE             local or hosted (default hosted when URL and key are set)
  CWC_POOL_DATA_DIR          Directory for the local store (default $XDG_CONFIG_HOME/cwc-pool)
  CWC_POOL_SUPABASE_URL      Hosted project URL
  CWC_POOL_SUPABASE_KEY      Hosted project API key
  CWC_POOL_PREDICTIONS_OPEN  true or false (default true)
  CWC_POOL_TIMEOUT_SECS      Hosted request timeout in seconds (default 10)"
}
