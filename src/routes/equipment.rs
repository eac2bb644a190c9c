use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, AppResult, MessageResponse};
use crate::models::{Equipment, EquipmentFilter};
use crate::repository::StoreError;
use crate::state::AppState;
use crate::utils::json::JsonPayload;
use crate::utils::path::PathId;
use crate::validation::{CreateEquipmentRequest, DeactivateEquipmentRequest};

#[derive(Debug, Serialize)]
pub struct EquipmentResponse {
    pub id: i64,
    pub vessel_id: i64,
    pub name: String,
    pub code: String,
    pub location: String,
    pub active: bool,
}

impl From<Equipment> for EquipmentResponse {
    fn from(equipment: Equipment) -> Self {
        Self {
            id: equipment.id,
            vessel_id: equipment.vessel_id,
            name: equipment.name,
            code: equipment.code,
            location: equipment.location,
            active: equipment.active,
        }
    }
}

pub async fn list_equipment(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<EquipmentResponse>>> {
    load_equipment(&state, EquipmentFilter::All).await
}

pub async fn list_active_equipment(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<EquipmentResponse>>> {
    load_equipment(&state, EquipmentFilter::Active).await
}

async fn load_equipment(
    state: &AppState,
    filter: EquipmentFilter,
) -> AppResult<Json<Vec<EquipmentResponse>>> {
    let equipment = state.repo.list_equipment(filter).await?;
    info!(count = equipment.len(), ?filter, "listed equipment");
    Ok(Json(
        equipment.into_iter().map(EquipmentResponse::from).collect(),
    ))
}

pub async fn get_equipment(
    State(state): State<AppState>,
    PathId(equipment_id): PathId,
) -> AppResult<Json<EquipmentResponse>> {
    let equipment = state.repo.get_equipment(equipment_id).await?;
    Ok(Json(equipment.into()))
}

pub async fn create_equipment(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<CreateEquipmentRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let draft = payload.validate()?;
    let vessel_code = draft.vessel_code.clone();
    let new_equipment = draft.resolve(state.repo.as_ref()).await?;
    let code = new_equipment.code.clone();

    match state.repo.create_equipment(new_equipment).await {
        Ok(equipment) => info!(
            equipment_id = equipment.id,
            code = %equipment.code,
            vessel_id = equipment.vessel_id,
            "equipment created"
        ),
        Err(StoreError::DuplicateKey) => {
            warn!(code = %code, "equipment code already exists");
            return Err(AppError::duplicate_code(&code));
        }
        Err(StoreError::ForeignKeyViolation) => {
            return Err(AppError::reference_not_found(format!(
                "Vessel code {vessel_code} does not exist"
            )));
        }
        Err(err) => return Err(err.into()),
    }

    Ok((StatusCode::CREATED, Json(MessageResponse::ok())))
}

/// Deactivates equipment one code at a time.
///
/// Each update commits on its own and the first unknown code stops the run:
/// codes before it stay deactivated, codes after it are never looked at.
pub async fn deactivate_equipment(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<DeactivateEquipmentRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let codes = payload.validate()?;

    for (processed, code) in codes.iter().enumerate() {
        let equipment = state
            .repo
            .find_equipment_by_code(code)
            .await?
            .ok_or_else(|| unresolved_code(code, processed))?;

        match state.repo.set_equipment_active(equipment.id, false).await {
            Ok(()) => info!(code = %code, equipment_id = equipment.id, "equipment deactivated"),
            Err(StoreError::NotFound) => return Err(unresolved_code(code, processed)),
            Err(err) => return Err(err.into()),
        }
    }

    Ok((StatusCode::CREATED, Json(MessageResponse::ok())))
}

fn unresolved_code(code: &str, processed: usize) -> AppError {
    warn!(code = %code, processed, "stopping deactivation at unknown equipment code");
    AppError::reference_not_found(format!("Equipment code {code} not found"))
}

pub async fn delete_equipment(
    State(state): State<AppState>,
    PathId(equipment_id): PathId,
) -> AppResult<Json<MessageResponse>> {
    match state.repo.delete_equipment(equipment_id).await {
        Ok(()) => {}
        Err(StoreError::ForeignKeyViolation) => {
            return Err(AppError::conflict(
                "cannot delete equipment that still has operations",
            ));
        }
        Err(err) => return Err(err.into()),
    }

    info!(equipment_id, "equipment deleted");
    Ok(Json(MessageResponse::ok()))
}
