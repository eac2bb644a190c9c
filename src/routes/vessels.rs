use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, AppResult, MessageResponse};
use crate::models::Vessel;
use crate::repository::StoreError;
use crate::state::AppState;
use crate::utils::json::JsonPayload;
use crate::utils::path::PathId;
use crate::validation::CreateVesselRequest;

#[derive(Debug, Serialize)]
pub struct VesselResponse {
    pub id: i64,
    pub code: String,
}

impl From<Vessel> for VesselResponse {
    fn from(vessel: Vessel) -> Self {
        Self {
            id: vessel.id,
            code: vessel.code,
        }
    }
}

pub async fn list_vessels(State(state): State<AppState>) -> AppResult<Json<Vec<VesselResponse>>> {
    let vessels = state.repo.list_vessels().await?;
    info!(count = vessels.len(), "listed vessels");
    Ok(Json(vessels.into_iter().map(VesselResponse::from).collect()))
}

pub async fn get_vessel(
    State(state): State<AppState>,
    PathId(vessel_id): PathId,
) -> AppResult<Json<VesselResponse>> {
    let vessel = state.repo.get_vessel(vessel_id).await?;
    Ok(Json(vessel.into()))
}

pub async fn create_vessel(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<CreateVesselRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let new_vessel = payload.validate()?;
    let code = new_vessel.code.clone();

    match state.repo.create_vessel(new_vessel).await {
        Ok(vessel) => info!(vessel_id = vessel.id, code = %vessel.code, "vessel created"),
        Err(StoreError::DuplicateKey) => {
            warn!(code = %code, "vessel code already exists");
            return Err(AppError::duplicate_code(&code));
        }
        Err(err) => return Err(err.into()),
    }

    Ok((StatusCode::CREATED, Json(MessageResponse::ok())))
}

pub async fn delete_vessel(
    State(state): State<AppState>,
    PathId(vessel_id): PathId,
) -> AppResult<Json<MessageResponse>> {
    match state.repo.delete_vessel(vessel_id).await {
        Ok(()) => {}
        Err(StoreError::ForeignKeyViolation) => {
            return Err(AppError::conflict(
                "cannot delete vessel that still has equipment",
            ));
        }
        Err(err) => return Err(err.into()),
    }

    info!(vessel_id, "vessel deleted");
    Ok(Json(MessageResponse::ok()))
}

/// One single-entry object per vessel: `{"<vessel code>": <average cost>}`.
pub async fn average_operation_costs(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<BTreeMap<String, f64>>>> {
    let averages = state.repo.average_operation_cost_by_vessel().await?;
    info!(vessels = averages.len(), "computed average operation cost per vessel");

    let response = averages
        .into_iter()
        .map(|(code, average)| BTreeMap::from([(code, average)]))
        .collect();
    Ok(Json(response))
}
