//! Table rows as the hosted database stores them: snake_case columns, JSON
//! columns for the nested picks, and nullable columns tolerated on read.

use crate::{
    GroupId, GroupPicks, GroupResult, KnockoutPicks, Prediction, TournamentPhase, TournamentResults,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed primary key of the single results row.
pub const RESULTS_ROW_ID: &str = "current";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRow {
    pub id: String,
    pub player_name: String,
    #[serde(default)]
    pub group_predictions: Option<GroupPicks>,
    #[serde(default)]
    pub knockout_predictions: Option<KnockoutPicks>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub score: Option<u32>,
}

impl From<&Prediction> for PredictionRow {
    fn from(p: &Prediction) -> Self {
        Self {
            id: p.id.clone(),
            player_name: p.player_name.clone(),
            group_predictions: Some(p.group_predictions.clone()),
            knockout_predictions: Some(p.knockout_predictions.clone()),
            timestamp: p.timestamp,
            score: Some(p.score),
        }
    }
}

impl From<PredictionRow> for Prediction {
    fn from(row: PredictionRow) -> Self {
        Self {
            id: row.id,
            player_name: row.player_name,
            group_predictions: row.group_predictions.unwrap_or_default(),
            knockout_predictions: row.knockout_predictions.unwrap_or_default(),
            timestamp: row.timestamp,
            score: row.score.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsRow {
    pub id: String,
    #[serde(default)]
    pub group_results: Option<BTreeMap<GroupId, GroupResult>>,
    #[serde(default)]
    pub knockout_results: Option<KnockoutPicks>,
    #[serde(default)]
    pub current_phase: Option<TournamentPhase>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ResultsRow {
    pub fn new(results: &TournamentResults, updated_at: DateTime<Utc>) -> Self {
        Self {
            id: RESULTS_ROW_ID.to_owned(),
            group_results: Some(results.group_results.clone()),
            knockout_results: Some(results.knockout_results.clone()),
            current_phase: Some(results.current_phase),
            updated_at: Some(updated_at),
        }
    }
}

impl From<ResultsRow> for TournamentResults {
    fn from(row: ResultsRow) -> Self {
        Self {
            group_results: row.group_results.unwrap_or_default(),
            knockout_results: row.knockout_results.unwrap_or_default(),
            current_phase: row.current_phase.unwrap_or_default(),
        }
    }
}
