use crate::commands::{Command, ResultsCommand};
use crate::render;
use crate::state::app_settings::AppSettings;
use anyhow::{Context, anyhow, bail};
use chrono::Utc;
use cwc_engine::entry::{self, EntryError};
use cwc_engine::outcome::resolve;
use cwc_engine::store::{PredictionStore, ResultsStore, Storage};
use cwc_engine::{GroupPicks, KnockoutPicks, Prediction, TournamentResults, leaderboard, scoring};
use log::{debug, info};
use serde::Deserialize;
use std::path::Path;

/// A prediction as a participant writes it. Ids and timestamps are assigned
/// on submission; an `id` may be given to replace an earlier entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Submission {
    #[serde(default)]
    id: Option<String>,
    player_name: String,
    #[serde(default)]
    group_predictions: GroupPicks,
    #[serde(default)]
    knockout_predictions: KnockoutPicks,
}

impl Submission {
    /// Winners are always recomputed from the scores, never trusted as typed.
    fn into_prediction(self) -> Prediction {
        let knockout = self
            .knockout_predictions
            .into_iter()
            .map(|(slot, o)| {
                let resolved = resolve(
                    &o.team1,
                    &o.team2,
                    o.regular_time1,
                    o.regular_time2,
                    o.penalty_winner.as_deref(),
                )
                .with_extra_time(o.went_to_extra_time);
                (slot, resolved)
            })
            .collect();

        let mut prediction = Prediction::new(&self.player_name, self.group_predictions, knockout, Utc::now());
        if let Some(id) = self.id.filter(|id| !id.trim().is_empty()) {
            prediction.id = id;
        }
        prediction
    }
}

pub struct App {
    pub settings: AppSettings,
    storage: Storage,
}

impl App {
    pub fn new(settings: AppSettings) -> anyhow::Result<Self> {
        let storage = settings.storage()?;
        info!("using the {} store", storage.backend_name());
        Ok(Self { settings, storage })
    }

    /// Run one command and return what should be printed.
    pub async fn run(&self, command: Command) -> anyhow::Result<String> {
        match command {
            Command::Leaderboard => {
                let predictions = self.storage.get_predictions().await?;
                let results = self.results().await?;
                Ok(render::leaderboard(&leaderboard::rank(&predictions, &results)))
            }
            Command::Rules => Ok(render::rules()),
            Command::Bracket(None) => {
                let results = self.results().await?;
                Ok(render::bracket(
                    "Official bracket",
                    &results.qualifiers(),
                    &results.bracket(),
                    &results.knockout_results,
                ))
            }
            Command::Bracket(Some(id)) => {
                let prediction = self.prediction(&id).await?;
                Ok(render::bracket(
                    &format!("Bracket of {}", prediction.player_name),
                    &prediction.group_predictions,
                    &prediction.bracket(),
                    &prediction.knockout_predictions,
                ))
            }
            Command::Analyze(id) => {
                let prediction = self.prediction(&id).await?;
                let results = self.results().await?;
                let breakdown = scoring::analyze(&prediction, &results);
                Ok(render::analysis(&prediction, &breakdown))
            }
            Command::Submit(path) => self.submit(&path).await,
            Command::Delete(id) => {
                let prediction = self.prediction(&id).await?;
                self.storage.delete_prediction(&id).await?;
                info!("deleted prediction {id}");
                Ok(format!("Deleted the prediction of {} ({id}).", prediction.player_name))
            }
            Command::DeleteAll => {
                let count = self.storage.get_predictions().await?.len();
                self.storage.delete_all_predictions().await?;
                info!("deleted all {count} predictions");
                Ok(format!("Deleted {count} predictions."))
            }
            Command::Results(cmd) => self.run_results(cmd).await,
            Command::Help | Command::Version => bail!("help and version are printed before startup"),
        }
    }

    async fn run_results(&self, command: ResultsCommand) -> anyhow::Result<String> {
        let mut results = self.results().await?;
        let message = match command {
            ResultsCommand::Show => return Ok(render::results(&results)),
            ResultsCommand::SetGroup { group, team, place } => {
                entry::place_qualifier(&mut results, group, &team, place)?;
                format!("Group {group}: {}", results.qualified(group).join(", "))
            }
            ResultsCommand::RemoveGroup { group, team } => {
                if !results.qualified(group).contains(&team) {
                    bail!("{team} is not a qualifier of group {group}");
                }
                entry::remove_qualifier(&mut results, group, &team);
                format!("Group {group}: {}", results.qualified(group).join(", "))
            }
            ResultsCommand::Record {
                slot,
                score1,
                score2,
                penalty_winner,
                extra_time,
            } => {
                let outcome = entry::record_knockout(
                    &mut results,
                    slot,
                    score1,
                    score2,
                    penalty_winner.as_deref(),
                    extra_time,
                )?;
                let winner = outcome.winner.as_deref().unwrap_or("undecided, penalty winner needed");
                format!(
                    "{slot}: {} {score1}-{score2} {}, winner: {winner}",
                    outcome.team1, outcome.team2
                )
            }
            ResultsCommand::Phase(phase) => {
                results.current_phase = phase;
                format!("Phase set to {}.", phase.label())
            }
            ResultsCommand::Reset => {
                results = TournamentResults::default();
                "Official results cleared.".to_owned()
            }
        };
        self.storage.save_results(&results).await?;
        Ok(message)
    }

    async fn submit(&self, path: &Path) -> anyhow::Result<String> {
        if !self.settings.predictions_open {
            return Err(EntryError::PredictionsClosed.into());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("could not read {}", path.display()))?;
        let submission: Submission = serde_json::from_str(&content)
            .with_context(|| format!("invalid prediction file {}", path.display()))?;
        let prediction = submission.into_prediction();
        entry::validate_prediction(&prediction)?;

        debug!("submitting {prediction:?}");
        self.storage.save_prediction(&prediction).await?;
        Ok(format!(
            "Saved the prediction of {} with id {}.",
            prediction.player_name, prediction.id
        ))
    }

    async fn results(&self) -> anyhow::Result<TournamentResults> {
        Ok(self.storage.get_results().await?.unwrap_or_default())
    }

    async fn prediction(&self, id: &str) -> anyhow::Result<Prediction> {
        self.storage
            .get_predictions()
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| anyhow!("no prediction with id {id}"))
    }
}
