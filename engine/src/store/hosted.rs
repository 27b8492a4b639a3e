use super::rows::{PredictionRow, RESULTS_ROW_ID, ResultsRow};
use super::{PredictionStore, ResultsStore, StoreError, StoreResult};
use crate::{Prediction, TournamentResults};
use chrono::Utc;
use log::{debug, info};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

const PREDICTIONS_TABLE: &str = "predictions";
const RESULTS_TABLE: &str = "tournament_results";
const UPSERT: &str = "resolution=merge-duplicates,return=minimal";

/// Hosted tables reached over the Supabase REST (PostgREST) interface.
#[derive(Debug, Clone)]
pub struct HostedStore {
    client: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl HostedStore {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .user_agent("cwc-pool/0.1")
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            timeout,
        }
    }

    /// `filters` are appended as encoded query pairs, so values can't add terms.
    fn table_url(&self, table: &str, filters: &[(&str, &str)]) -> StoreResult<Url> {
        let raw = format!("{}/rest/v1/{table}", self.base_url);
        let mut url = Url::parse(&raw)
            .map_err(|e| StoreError::NotConfigured(format!("invalid store URL {raw}: {e}")))?;
        if !filters.is_empty() {
            url.query_pairs_mut().extend_pairs(filters);
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", self.api_key.as_str())
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> StoreResult<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| StoreError::Network(e, url.to_owned()))?;
        response
            .error_for_status()
            .map_err(|e| StoreError::Api(e, url.to_owned()))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, &str)],
    ) -> StoreResult<Vec<T>> {
        let url = self.table_url(table, filters)?;
        debug!("GET {url}");
        let response = self.send(self.client.get(url.clone()), url.as_str()).await?;
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Network(e, url.to_string()))?;
        serde_json::from_str(&body).map_err(|e| StoreError::Parsing(e, url.to_string()))
    }

    async fn upsert<T: Serialize>(&self, table: &str, row: &T) -> StoreResult<()> {
        let url = self.table_url(table, &[])?;
        debug!("POST {url}");
        let request = self.client.post(url.clone()).header("Prefer", UPSERT).json(row);
        self.send(request, url.as_str()).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, id_filter: &str) -> StoreResult<()> {
        let url = self.table_url(table, &[("id", id_filter)])?;
        debug!("DELETE {url}");
        self.send(self.client.delete(url.clone()), url.as_str()).await?;
        Ok(())
    }
}

impl ResultsStore for HostedStore {
    async fn get_results(&self) -> StoreResult<Option<TournamentResults>> {
        let id = format!("eq.{RESULTS_ROW_ID}");
        let rows: Vec<ResultsRow> = self
            .select(RESULTS_TABLE, &[("select", "*"), ("id", &id)])
            .await?;
        Ok(rows.into_iter().next().map(TournamentResults::from))
    }

    async fn save_results(&self, results: &TournamentResults) -> StoreResult<()> {
        self.upsert(RESULTS_TABLE, &ResultsRow::new(results, Utc::now()))
            .await?;
        info!("saved official results (phase {})", results.current_phase.label());
        Ok(())
    }
}

impl PredictionStore for HostedStore {
    async fn get_predictions(&self) -> StoreResult<Vec<Prediction>> {
        let rows: Vec<PredictionRow> = self
            .select(PREDICTIONS_TABLE, &[("select", "*"), ("order", "timestamp.desc")])
            .await?;
        Ok(rows.into_iter().map(Prediction::from).collect())
    }

    async fn save_prediction(&self, prediction: &Prediction) -> StoreResult<()> {
        self.upsert(PREDICTIONS_TABLE, &PredictionRow::from(prediction))
            .await?;
        info!("saved prediction {} ({})", prediction.id, prediction.player_name);
        Ok(())
    }

    async fn delete_prediction(&self, id: &str) -> StoreResult<()> {
        self.delete(PREDICTIONS_TABLE, &format!("eq.{id}")).await
    }

    /// PostgREST refuses an unfiltered delete, so match every real id.
    async fn delete_all_predictions(&self) -> StoreResult<()> {
        self.delete(PREDICTIONS_TABLE, "neq.placeholder").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GroupId, GroupPicks, KnockoutPicks, TournamentPhase};
    use chrono::TimeZone;
    use mockito::Matcher;

    fn store(server: &mockito::ServerGuard) -> HostedStore {
        HostedStore::new(&format!("{}/", server.url()), "anon-key", Duration::from_secs(5))
    }

    #[test]
    fn filter_values_cannot_add_query_terms() {
        let store = HostedStore::new("https://pool.supabase.co/", "k", Duration::from_secs(1));
        let url = store.table_url(PREDICTIONS_TABLE, &[("id", "eq.a&b=c")]).unwrap();
        assert_eq!(url.as_str(), "https://pool.supabase.co/rest/v1/predictions?id=eq.a%26b%3Dc");
        assert_eq!(url.query_pairs().count(), 1);

        let bare = store.table_url(RESULTS_TABLE, &[]).unwrap();
        assert_eq!(bare.query(), None);
    }

    #[test]
    fn unparsable_base_url_is_not_configured() {
        let store = HostedStore::new("not a url", "k", Duration::from_secs(1));
        assert!(matches!(
            store.table_url(PREDICTIONS_TABLE, &[]),
            Err(StoreError::NotConfigured(..))
        ));
    }

    #[tokio::test]
    async fn predictions_are_fetched_newest_first_with_auth_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/predictions")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("select".into(), "*".into()),
                Matcher::UrlEncoded("order".into(), "timestamp.desc".into()),
            ]))
            .match_header("apikey", "anon-key")
            .match_header("authorization", "Bearer anon-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"id":"2","player_name":"Leo","group_predictions":{"A":["Porto","Palmeiras"]},
                    "knockout_predictions":{},"timestamp":"2025-06-14T10:00:00Z","score":12},
                   {"id":"1","player_name":"Mia","group_predictions":null,
                    "knockout_predictions":null,"timestamp":"2025-06-13T10:00:00Z","score":null}]"#,
            )
            .create_async()
            .await;

        let predictions = store(&server).get_predictions().await.unwrap();
        mock.assert_async().await;
        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].player_name, "Leo");
        assert_eq!(predictions[0].picks(GroupId::A), ["Porto", "Palmeiras"]);
        assert_eq!(predictions[1].score, 0);
    }

    #[tokio::test]
    async fn missing_results_row_reads_as_none() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/tournament_results")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.current".into()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        assert_eq!(store(&server).get_results().await.unwrap(), None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn saving_results_upserts_the_current_row() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/tournament_results")
            .match_header("prefer", Matcher::Regex("resolution=merge-duplicates".into()))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "id": "current",
                "current_phase": "knockout",
                "group_results": { "H": { "qualified": ["Real Madrid"] } }
            })))
            .with_status(201)
            .create_async()
            .await;

        let mut results = TournamentResults::default();
        crate::entry::place_qualifier(&mut results, GroupId::H, "Real Madrid", crate::Place::Winner)
            .unwrap();
        results.current_phase = TournamentPhase::Knockout;
        store(&server).save_results(&results).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn saving_a_prediction_sends_snake_case_columns() {
        let mut server = mockito::Server::new_async().await;
        let at = Utc.with_ymd_and_hms(2025, 6, 14, 10, 0, 0).unwrap();
        let prediction = Prediction::new("Leo", GroupPicks::new(), KnockoutPicks::new(), at);
        let mock = server
            .mock("POST", "/rest/v1/predictions")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "id": prediction.id,
                "player_name": "Leo",
                "score": 0
            })))
            .with_status(201)
            .create_async()
            .await;

        store(&server).save_prediction(&prediction).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn deletes_use_id_filters() {
        let mut server = mockito::Server::new_async().await;
        let one = server
            .mock("DELETE", "/rest/v1/predictions")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.42".into()))
            .with_status(204)
            .create_async()
            .await;
        let all = server
            .mock("DELETE", "/rest/v1/predictions")
            .match_query(Matcher::UrlEncoded("id".into(), "neq.placeholder".into()))
            .with_status(204)
            .create_async()
            .await;

        let store = store(&server);
        store.delete_prediction("42").await.unwrap();
        store.delete_all_predictions().await.unwrap();
        one.assert_async().await;
        all.assert_async().await;
    }

    #[tokio::test]
    async fn server_errors_surface_as_api_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/v1/predictions")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        assert!(matches!(
            store(&server).get_predictions().await,
            Err(StoreError::Api(..))
        ));
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/v1/predictions")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        assert!(matches!(
            store(&server).get_predictions().await,
            Err(StoreError::Parsing(..))
        ));
    }
}
