//! Profile Routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{ApiError, SharedState};
use panels::{DateRange, PanelConfig, PanelFilters, Profile};
use storage::ProfileSummary;

/// Body for profile creation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    pub name: String,
    pub default_filters: Option<PanelFilters>,
    pub default_date_range: Option<DateRange>,
}

/// Body for adding a panel
#[derive(Debug, Deserialize)]
pub struct AddPanelRequest {
    pub name: String,
}

/// Body for merging two panels
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePanelsRequest {
    pub source_id: String,
    pub target_id: String,
}

/// Response for the profile listing
#[derive(Debug, Serialize)]
pub struct ProfileListResponse {
    pub data: Vec<ProfileSummary>,
    pub count: usize,
}

/// List stored profiles
pub async fn list_profiles(
    State(state): State<SharedState>,
) -> Result<Json<ProfileListResponse>, ApiError> {
    let state = state.read().await;
    let data = state.repository.list_profiles()?;
    Ok(Json(ProfileListResponse {
        count: data.len(),
        data,
    }))
}

/// Create an empty profile
pub async fn create_profile(
    State(state): State<SharedState>,
    Json(request): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<Profile>), ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("profile name is empty".to_string()));
    }

    let mut profile = Profile::new(name);
    if let Some(mut filters) = request.default_filters {
        filters.normalize();
        profile.default_filters = filters;
    }
    if let Some(range) = request.default_date_range {
        profile.default_date_range = DateRange::new(range.from, range.to)?;
    }

    state.read().await.repository.save_profile(&profile)?;
    info!("Created profile {} ({})", profile.id, profile.name);
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn get_profile(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    let state = state.read().await;
    Ok(Json(state.repository.get_profile(&id)?))
}

/// Replace a stored profile
pub async fn update_profile(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(mut profile): Json<Profile>,
) -> Result<Json<Profile>, ApiError> {
    if profile.id != id {
        return Err(ApiError::BadRequest(format!(
            "profile id {} does not match path {}",
            profile.id, id
        )));
    }
    profile.validate().map_err(|e| {
        warn!("Rejected update of profile {}: {}", id, e);
        e
    })?;

    let state = state.write().await;
    state.repository.get_profile(&id)?;
    state.repository.save_profile(&profile)?;
    Ok(Json(profile))
}

pub async fn delete_profile(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.read().await.repository.delete_profile(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add a panel seeded from the profile defaults
pub async fn add_panel(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<AddPanelRequest>,
) -> Result<(StatusCode, Json<PanelConfig>), ApiError> {
    let state = state.write().await;
    let mut profile = state.repository.get_profile(&id)?;
    let panel = profile.add_panel(request.name).clone();
    state.repository.save_profile(&profile)?;
    Ok((StatusCode::CREATED, Json(panel)))
}

/// Merge one panel of a profile into another and persist the result
pub async fn merge_panels(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(request): Json<MergePanelsRequest>,
) -> Result<Json<Profile>, ApiError> {
    let state = state.write().await;
    let profile = state.repository.get_profile(&id)?;
    let merged = profile.merge_panels(&request.source_id, &request.target_id)?;
    state.repository.save_profile(&merged)?;
    metrics::counter!("panel_merges_total").increment(1);
    Ok(Json(merged))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{app, send};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_profile_lifecycle() {
        let (app, _) = app();

        let (status, profile) = send(
            &app,
            "POST",
            "/api/v1/profiles",
            Some(json!({"name": "Checkout", "defaultFilters": {"pos": [5, 2, 5]}})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(profile["defaultFilters"]["pos"], json!([2, 5]));
        let id = profile["id"].as_str().unwrap().to_string();

        let (status, list) = send(&app, "GET", "/api/v1/profiles", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["count"], 1);

        let (status, panel) = send(
            &app,
            "POST",
            &format!("/api/v1/profiles/{}/panels", id),
            Some(json!({"name": "Errors"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(panel["filters"]["pos"], json!([2, 5]));

        let (status, _) = send(&app, "DELETE", &format!("/api/v1/profiles/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", &format!("/api/v1/profiles/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_merge_panels_endpoint() {
        let (app, _) = app();
        let (_, profile) = send(&app, "POST", "/api/v1/profiles", Some(json!({"name": "p"}))).await;
        let id = profile["id"].as_str().unwrap().to_string();
        let panels_uri = format!("/api/v1/profiles/{}/panels", id);

        let (_, a) = send(&app, "POST", &panels_uri, Some(json!({"name": "A"}))).await;
        let (_, b) = send(&app, "POST", &panels_uri, Some(json!({"name": "B"}))).await;
        let merge_uri = format!("/api/v1/profiles/{}/panels/merge", id);

        let (status, _) = send(
            &app,
            "POST",
            &merge_uri,
            Some(json!({"sourceId": a["id"], "targetId": "missing"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "POST",
            &merge_uri,
            Some(json!({"sourceId": a["id"], "targetId": a["id"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, merged) = send(
            &app,
            "POST",
            &merge_uri,
            Some(json!({"sourceId": a["id"], "targetId": b["id"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(merged["panels"].as_array().unwrap().len(), 1);
        assert_eq!(merged["panels"][0]["name"], "B + A");
        assert_eq!(merged["panels"][0]["type"], "combined");

        let (_, stored) = send(&app, "GET", &format!("/api/v1/profiles/{}", id), None).await;
        assert_eq!(stored, merged);
    }

    #[tokio::test]
    async fn test_update_profile_id_mismatch() {
        let (app, _) = app();
        let (_, mut profile) =
            send(&app, "POST", "/api/v1/profiles", Some(json!({"name": "p"}))).await;
        let id = profile["id"].as_str().unwrap().to_string();

        profile["name"] = json!("renamed");
        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/v1/profiles/{}", id),
            Some(profile.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "renamed");

        let (status, _) = send(&app, "PUT", "/api/v1/profiles/other", Some(profile)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_profile_rejects_invalid_panels() {
        let (app, _) = app();
        let (_, profile) = send(&app, "POST", "/api/v1/profiles", Some(json!({"name": "p"}))).await;
        let id = profile["id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/profiles/{}", id);
        let (_, panel) = send(
            &app,
            "POST",
            &format!("{}/panels", uri),
            Some(json!({"name": "t"})),
        )
        .await;
        let (_, stored) = send(&app, "GET", &uri, None).await;

        let mut inverted = stored.clone();
        inverted["panels"][0]["dateRange"] = json!({"from": "2024-05-09", "to": "2024-05-01"});
        let (status, body) = send(&app, "PUT", &uri, Some(inverted)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("date range"));

        let mut dup_events = stored.clone();
        dup_events["panels"][0]["events"] = json!([
            {"id": 1, "name": "a", "color": "#000"},
            {"id": 1, "name": "a2", "color": "#111"}
        ]);
        let (status, body) = send(&app, "PUT", &uri, Some(dup_events)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Event 1"));

        let mut dup_panels = stored.clone();
        dup_panels["panels"] = json!([panel.clone(), panel.clone()]);
        let (status, body) = send(&app, "PUT", &uri, Some(dup_panels)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Duplicate panel"));

        let (_, after) = send(&app, "GET", &uri, None).await;
        assert_eq!(after, stored);
    }

    #[tokio::test]
    async fn test_update_profile_normalizes_filters() {
        let (app, _) = app();
        let (_, mut profile) =
            send(&app, "POST", "/api/v1/profiles", Some(json!({"name": "p"}))).await;
        let id = profile["id"].as_str().unwrap().to_string();

        profile["defaultFilters"]["sources"] = json!([3, -1, 3]);
        profile["defaultFilters"]["sourceStr"] = json!(["job-b", "job-a", "job-b"]);
        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/v1/profiles/{}", id),
            Some(profile),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["defaultFilters"]["sources"], json!([-1, 3]));
        assert_eq!(updated["defaultFilters"]["sourceStr"], json!(["job-a", "job-b"]));
    }
}
