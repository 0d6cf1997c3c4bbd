//! Alert Routes

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info};

use crate::{ApiError, SharedState};
use alerting::{deduplicate, Alert, AlertFilter, AlertView, EventSummary};

/// Upper bound on records read per request
const MAX_LIMIT: usize = 10_000;

fn default_limit() -> usize {
    500
}

/// Query parameters for the raw alerts endpoint
#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Query parameters for the critical alerts endpoint
///
/// Id lists are comma separated (`events=1,2,3`).
#[derive(Debug, Deserialize)]
pub struct CriticalAlertQuery {
    pub events: Option<String>,
    pub pos: Option<String>,
    pub platforms: Option<String>,
    pub sources: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Number of most recent matching alerts to consider
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl CriticalAlertQuery {
    fn to_filter(&self) -> Result<AlertFilter, ApiError> {
        Ok(AlertFilter {
            events: parse_ids("events", self.events.as_deref())?,
            pos: parse_ids("pos", self.pos.as_deref())?,
            platforms: parse_ids("platforms", self.platforms.as_deref())?,
            sources: parse_ids("sources", self.sources.as_deref())?,
            from: self.from,
            to: self.to,
        })
    }
}

fn parse_ids<T: FromStr>(field: &str, raw: Option<&str>) -> Result<Vec<T>, ApiError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<T>()
                .map_err(|_| ApiError::BadRequest(format!("invalid {} id: {}", field, s)))
        })
        .collect()
}

/// Response for the raw alerts endpoint
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub data: Vec<Alert>,
    pub count: usize,
}

/// Response for alert ingestion
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub inserted: usize,
    pub total: usize,
}

/// Response for the critical alerts endpoint
#[derive(Debug, Serialize)]
pub struct CriticalAlertResponse {
    pub data: Vec<AlertView>,
    pub count: usize,
    pub by_event: Vec<EventSummary>,
}

/// Response for stateless deduplication
#[derive(Debug, Serialize)]
pub struct DeduplicateResponse {
    pub data: Vec<Alert>,
    pub input_count: usize,
    pub count: usize,
}

/// Get the most recent raw alerts
pub async fn get_alerts(
    State(state): State<SharedState>,
    Query(params): Query<AlertQuery>,
) -> Result<Json<AlertResponse>, ApiError> {
    let state = state.read().await;
    let data = state.repository.get_alerts(params.limit.min(MAX_LIMIT))?;

    Ok(Json(AlertResponse {
        count: data.len(),
        data,
    }))
}

/// Ingest alert records
pub async fn ingest_alerts(
    State(state): State<SharedState>,
    Json(alerts): Json<Vec<Alert>>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    let state = state.read().await;
    let inserted = state.repository.insert_alerts(alerts)?;
    metrics::counter!("alerts_ingested_total").increment(inserted as u64);
    info!("Ingested {} alerts", inserted);

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            inserted,
            total: state.repository.alert_count(),
        }),
    ))
}

/// Get the filtered, deduplicated critical alerts table
pub async fn get_critical_alerts(
    State(state): State<SharedState>,
    Query(params): Query<CriticalAlertQuery>,
) -> Result<Json<CriticalAlertResponse>, ApiError> {
    let filter = params.to_filter()?;
    debug!("Critical alerts query: {:?}", filter);

    let state = state.read().await;
    let alerts = state
        .repository
        .query_alerts(&filter, params.limit.min(MAX_LIMIT))?;
    let table = state.classifier.critical_alerts(&alerts, &filter);
    metrics::counter!("alerts_deduplicated_total")
        .increment((table.matched - table.rows.len()) as u64);

    Ok(Json(CriticalAlertResponse {
        count: table.rows.len(),
        data: table.rows,
        by_event: table.by_event,
    }))
}

/// Deduplicate a posted alert list without storing it
pub async fn deduplicate_alerts(Json(alerts): Json<Vec<Alert>>) -> Json<DeduplicateResponse> {
    let data = deduplicate(&alerts);
    metrics::counter!("alerts_deduplicated_total").increment((alerts.len() - data.len()) as u64);

    Json(DeduplicateResponse {
        input_count: alerts.len(),
        count: data.len(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{app, send};
    use serde_json::json;

    #[test]
    fn test_parse_ids() {
        assert_eq!(parse_ids::<u64>("pos", Some("1, 2,,3")).unwrap(), vec![1, 2, 3]);
        assert!(parse_ids::<u64>("pos", None).unwrap().is_empty());
        assert!(parse_ids::<u64>("pos", Some("1,x")).is_err());
        assert_eq!(parse_ids::<i64>("sources", Some("-1")).unwrap(), vec![-1]);
    }

    #[tokio::test]
    async fn test_deduplicate_endpoint() {
        let (app, _) = app();
        let body = json!([
            {"eventId": 1, "pos": 2, "source": 1, "details": {"metric": "successCount", "status": "200"}},
            {"eventId": 1, "pos": 2, "source": 1, "details": {"metric": "count", "status": 200}}
        ]);

        let (status, value) = send(&app, "POST", "/api/v1/alerts/deduplicate", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["count"], 1);
        assert_eq!(value["input_count"], 2);
        assert_eq!(value["data"][0]["details"]["metric"], "count");
    }

    #[tokio::test]
    async fn test_ingest_then_critical() {
        let (app, state) = app();
        let body = json!([
            {"eventId": 1, "pos": 2, "details": {"metric": "errorRate", "status": "500",
                "currentValue": 30, "expectedValue": 10}},
            {"eventId": 1, "pos": 2, "details": {"metric": "errorRate", "status": "500",
                "currentValue": 11, "expectedValue": 10}},
            {"eventId": 7, "pos": 2, "details": {"metric": "latency"}}
        ]);

        let (status, value) = send(&app, "POST", "/api/v1/alerts", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(value["inserted"], 3);
        assert_eq!(state.read().await.repository.alert_count(), 3);

        let (status, value) = send(&app, "GET", "/api/v1/alerts/critical?events=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["count"], 1);
        assert_eq!(value["data"][0]["variance"], "+200.00%");
        assert_eq!(value["data"][0]["severity"], "critical");
        assert_eq!(value["by_event"][0]["alertCount"], 1);

        let (_, value) = send(&app, "GET", "/api/v1/alerts?limit=2", None).await;
        assert_eq!(value["count"], 2);
    }

    #[tokio::test]
    async fn test_critical_finds_alerts_older_than_limit() {
        let (app, _) = app();
        let target = json!([{"eventId": 1, "pos": 2, "details": {"metric": "errorRate",
            "currentValue": 30, "expectedValue": 10}}]);
        send(&app, "POST", "/api/v1/alerts", Some(target)).await;

        let noise: Vec<_> = (0..600)
            .map(|i| json!({"eventId": 1000 + i, "pos": 2, "details": {"metric": "latency"}}))
            .collect();
        let (_, value) = send(&app, "POST", "/api/v1/alerts", Some(json!(noise))).await;
        assert_eq!(value["total"], 601);

        let (status, value) = send(&app, "GET", "/api/v1/alerts/critical?events=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["count"], 1);
        assert_eq!(value["data"][0]["severity"], "critical");

        let (_, value) = send(&app, "GET", "/api/v1/alerts/critical?limit=10", None).await;
        assert_eq!(value["count"], 10);
    }

    #[tokio::test]
    async fn test_critical_rejects_bad_ids() {
        let (app, _) = app();
        let (status, value) = send(&app, "GET", "/api/v1/alerts/critical?pos=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(value["error"].as_str().unwrap().contains("pos"));
    }
}
