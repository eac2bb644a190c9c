use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::info;

use crate::error::{AppError, AppResult, MessageResponse};
use crate::models::Operation;
use crate::repository::StoreError;
use crate::state::AppState;
use crate::utils::json::JsonPayload;
use crate::validation::{CreateOperationRequest, OperationCostRequest};

#[derive(Debug, Serialize)]
pub struct OperationResponse {
    pub id: i64,
    pub equipment_id: i64,
    #[serde(rename = "type")]
    pub operation_type: String,
    pub cost: f64,
}

impl From<Operation> for OperationResponse {
    fn from(operation: Operation) -> Self {
        Self {
            id: operation.id,
            equipment_id: operation.equipment_id,
            operation_type: operation.type_,
            cost: operation.cost,
        }
    }
}

pub async fn list_operations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<OperationResponse>>> {
    let operations = state.repo.list_operations().await?;
    info!(count = operations.len(), "listed operations");
    Ok(Json(
        operations.into_iter().map(OperationResponse::from).collect(),
    ))
}

pub async fn create_operation(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<CreateOperationRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let draft = payload.validate()?;
    let equipment_code = draft.equipment_code.clone();
    let new_operation = draft.resolve(state.repo.as_ref()).await?;

    match state.repo.create_operation(new_operation).await {
        Ok(operation) => info!(
            operation_id = operation.id,
            equipment_id = operation.equipment_id,
            operation_type = %operation.type_,
            "operation created"
        ),
        Err(StoreError::ForeignKeyViolation) => {
            return Err(AppError::reference_not_found(format!(
                "Equipment code {equipment_code} does not exist"
            )));
        }
        Err(err) => return Err(err.into()),
    }

    Ok((StatusCode::CREATED, Json(MessageResponse::ok())))
}

pub async fn total_operation_cost(
    State(state): State<AppState>,
    JsonPayload(payload): JsonPayload<OperationCostRequest>,
) -> AppResult<Json<MessageResponse>> {
    let filter = payload.validate()?;
    let total = state.repo.total_operation_cost(filter.clone()).await?;
    info!(?filter, total, "summed operation costs");

    Ok(Json(MessageResponse {
        message: format_total_cost(total),
    }))
}

fn format_total_cost(total: f64) -> String {
    // -0.0 displays as "-0"
    let total = if total == 0.0 { 0.0 } else { total };
    format!("Total cost: {total}")
}
