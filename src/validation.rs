//! Turns loosely-shaped request bodies into insert records.
//!
//! Every check here runs before the single write a handler issues: missing
//! fields, oversized values and unresolvable natural keys are rejected
//! without touching persisted state. Uniqueness is left to the database.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::models::{CostFilter, NewEquipment, NewOperation, NewVessel};
use crate::repository::FleetRepository;
use crate::utils::json::{classify_numeric, NumericValue};

pub const CODE_MAX_LEN: usize = 8;
pub const NAME_MAX_LEN: usize = 256;
pub const LOCATION_MAX_LEN: usize = 256;
pub const OPERATION_TYPE_MAX_LEN: usize = 32;

#[derive(Debug, Default, Deserialize)]
pub struct CreateVesselRequest {
    pub code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateEquipmentRequest {
    pub vessel_code: Option<String>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeactivateEquipmentRequest {
    pub equipments: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateOperationRequest {
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub operation_type: Option<String>,
    pub cost: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OperationCostRequest {
    pub code: Option<String>,
    pub name: Option<String>,
}

impl CreateVesselRequest {
    pub fn validate(self) -> AppResult<NewVessel> {
        let code = required_text(self.code, "code", CODE_MAX_LEN)?;
        Ok(NewVessel { code })
    }
}

/// Equipment fields that passed the presence and shape checks but still
/// reference their vessel by code.
#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentDraft {
    pub vessel_code: String,
    pub code: String,
    pub name: String,
    pub location: String,
}

impl CreateEquipmentRequest {
    pub fn validate(self) -> AppResult<EquipmentDraft> {
        let vessel_code = required_text(self.vessel_code, "vessel_code", CODE_MAX_LEN)?;
        let code = required_text(self.code, "code", CODE_MAX_LEN)?;
        let name = required_text(self.name, "name", NAME_MAX_LEN)?;
        let location = required_text(self.location, "location", LOCATION_MAX_LEN)?;
        Ok(EquipmentDraft {
            vessel_code,
            code,
            name,
            location,
        })
    }
}

impl EquipmentDraft {
    /// Resolves the vessel code; new equipment always starts active.
    pub async fn resolve(self, repo: &dyn FleetRepository) -> AppResult<NewEquipment> {
        let vessel = repo
            .find_vessel_by_code(&self.vessel_code)
            .await?
            .ok_or_else(|| {
                tracing::warn!(
                    vessel_code = %self.vessel_code,
                    "equipment references an unknown vessel"
                );
                AppError::reference_not_found(format!(
                    "Vessel code {} does not exist",
                    self.vessel_code
                ))
            })?;

        Ok(NewEquipment {
            vessel_id: vessel.id,
            name: self.name,
            code: self.code,
            location: self.location,
            active: true,
        })
    }
}

impl DeactivateEquipmentRequest {
    /// Codes are trimmed like they are on create; order is kept.
    pub fn validate(self) -> AppResult<Vec<String>> {
        let codes = self
            .equipments
            .ok_or_else(|| AppError::missing_parameter("equipments"))?;
        Ok(codes
            .into_iter()
            .map(|code| code.trim().to_string())
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationDraft {
    pub equipment_code: String,
    pub operation_type: String,
    pub cost: f64,
}

impl CreateOperationRequest {
    pub fn validate(self) -> AppResult<OperationDraft> {
        let equipment_code = required_text(self.code, "code", CODE_MAX_LEN)?;
        let operation_type = required_text(self.operation_type, "type", OPERATION_TYPE_MAX_LEN)?;
        let cost = match classify_numeric(self.cost.as_ref()) {
            NumericValue::Omitted => return Err(AppError::missing_parameter("cost")),
            NumericValue::Number(cost) if cost.is_finite() => cost,
            NumericValue::Number(_) | NumericValue::Invalid => {
                return Err(AppError::invalid_parameter("cost must be a finite number"))
            }
        };
        Ok(OperationDraft {
            equipment_code,
            operation_type,
            cost,
        })
    }
}

impl OperationDraft {
    pub async fn resolve(self, repo: &dyn FleetRepository) -> AppResult<NewOperation> {
        let equipment = repo
            .find_equipment_by_code(&self.equipment_code)
            .await?
            .ok_or_else(|| {
                tracing::warn!(
                    code = %self.equipment_code,
                    "operation references an unknown equipment"
                );
                AppError::reference_not_found(format!(
                    "Equipment code {} does not exist",
                    self.equipment_code
                ))
            })?;

        Ok(NewOperation {
            equipment_id: equipment.id,
            type_: self.operation_type,
            cost: self.cost,
        })
    }
}

impl OperationCostRequest {
    /// `code` takes precedence when both keys are sent.
    pub fn validate(self) -> AppResult<CostFilter> {
        match (self.code, self.name) {
            (Some(code), _) => Ok(CostFilter::Code(filter_key(code, "code")?)),
            (None, Some(name)) => Ok(CostFilter::Name(filter_key(name, "name")?)),
            (None, None) => Err(AppError::missing_parameter("code or name")),
        }
    }
}

fn filter_key(value: String, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_parameter(format!(
            "{field} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn required_text(value: Option<String>, field: &str, max_len: usize) -> AppResult<String> {
    let value = value.ok_or_else(|| AppError::missing_parameter(field))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_parameter(format!(
            "{field} must not be empty"
        )));
    }
    if trimmed.chars().count() > max_len {
        return Err(AppError::invalid_parameter(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}
