use async_trait::async_trait;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::models::{
    CostFilter, Equipment, EquipmentFilter, NewEquipment, NewOperation, NewVessel, Operation,
    Vessel,
};

mod postgres;

pub use postgres::PgFleetRepository;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("unique constraint violated")]
    DuplicateKey,
    #[error("foreign key constraint violated")]
    ForeignKeyViolation,
    #[error("database pool error: {0}")]
    Pool(String),
    #[error("database task failed: {0}")]
    Task(String),
    #[error("database error: {0}")]
    Database(DieselError),
}

impl From<DieselError> for StoreError {
    fn from(value: DieselError) -> Self {
        match value {
            DieselError::NotFound => StoreError::NotFound,
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                StoreError::DuplicateKey
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                StoreError::ForeignKeyViolation
            }
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence port for vessels, their equipment and its operations.
///
/// Every write commits on its own: a failed call leaves no partial row
/// behind. Lookups by id report a missing row as [`StoreError::NotFound`],
/// lookups by natural key return `None`.
#[async_trait]
pub trait FleetRepository: Send + Sync + 'static {
    async fn list_vessels(&self) -> StoreResult<Vec<Vessel>>;

    async fn get_vessel(&self, id: i64) -> StoreResult<Vessel>;

    async fn find_vessel_by_code(&self, code: &str) -> StoreResult<Option<Vessel>>;

    async fn create_vessel(&self, vessel: NewVessel) -> StoreResult<Vessel>;

    /// Fails with [`StoreError::ForeignKeyViolation`] while equipment still
    /// references the vessel.
    async fn delete_vessel(&self, id: i64) -> StoreResult<()>;

    async fn list_equipment(&self, filter: EquipmentFilter) -> StoreResult<Vec<Equipment>>;

    async fn get_equipment(&self, id: i64) -> StoreResult<Equipment>;

    async fn find_equipment_by_code(&self, code: &str) -> StoreResult<Option<Equipment>>;

    async fn create_equipment(&self, equipment: NewEquipment) -> StoreResult<Equipment>;

    async fn set_equipment_active(&self, id: i64, active: bool) -> StoreResult<()>;

    /// Fails with [`StoreError::ForeignKeyViolation`] while operations still
    /// reference the equipment.
    async fn delete_equipment(&self, id: i64) -> StoreResult<()>;

    async fn list_operations(&self) -> StoreResult<Vec<Operation>>;

    async fn create_operation(&self, operation: NewOperation) -> StoreResult<Operation>;

    /// Sum of operation costs on the matching equipment, zero when nothing matches.
    async fn total_operation_cost(&self, filter: CostFilter) -> StoreResult<f64>;

    /// Mean operation cost per vessel code, ordered by code. Vessels without
    /// operations are absent.
    async fn average_operation_cost_by_vessel(&self) -> StoreResult<Vec<(String, f64)>>;
}
