use async_trait::async_trait;
use diesel::dsl::{avg, sum};
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::db::PgPool;
use crate::models::{
    CostFilter, Equipment, EquipmentFilter, NewEquipment, NewOperation, NewVessel, Operation,
    Vessel,
};
use crate::schema::{equipments, operations, vessels};

use super::{FleetRepository, StoreError, StoreResult};

/// [`FleetRepository`] backed by PostgreSQL through diesel.
///
/// Diesel connections are blocking, so every call checks a connection out of
/// the pool on the blocking thread pool and hands it back when the closure
/// returns, whatever the outcome.
#[derive(Clone)]
pub struct PgFleetRepository {
    pool: PgPool,
}

impl PgFleetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| StoreError::Pool(err.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|err| StoreError::Task(err.to_string()))?
    }
}

#[async_trait]
impl FleetRepository for PgFleetRepository {
    async fn list_vessels(&self) -> StoreResult<Vec<Vessel>> {
        self.run(|conn| {
            let rows = vessels::table
                .order(vessels::id.asc())
                .select(Vessel::as_select())
                .load(conn)?;
            Ok(rows)
        })
        .await
    }

    async fn get_vessel(&self, id: i64) -> StoreResult<Vessel> {
        self.run(move |conn| {
            let vessel = vessels::table
                .find(id)
                .select(Vessel::as_select())
                .first(conn)?;
            Ok(vessel)
        })
        .await
    }

    async fn find_vessel_by_code(&self, code: &str) -> StoreResult<Option<Vessel>> {
        let code = code.to_string();
        self.run(move |conn| {
            let vessel = vessels::table
                .filter(vessels::code.eq(&code))
                .select(Vessel::as_select())
                .first(conn)
                .optional()?;
            Ok(vessel)
        })
        .await
    }

    async fn create_vessel(&self, vessel: NewVessel) -> StoreResult<Vessel> {
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let created = diesel::insert_into(vessels::table)
                    .values(&vessel)
                    .returning(Vessel::as_returning())
                    .get_result(conn)?;
                Ok(created)
            })
        })
        .await
    }

    async fn delete_vessel(&self, id: i64) -> StoreResult<()> {
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let deleted = diesel::delete(vessels::table.find(id)).execute(conn)?;
                if deleted == 0 {
                    return Err(StoreError::NotFound);
                }
                Ok(())
            })
        })
        .await
    }

    async fn list_equipment(&self, filter: EquipmentFilter) -> StoreResult<Vec<Equipment>> {
        self.run(move |conn| {
            let mut query = equipments::table
                .order(equipments::id.asc())
                .select(Equipment::as_select())
                .into_boxed();
            if filter == EquipmentFilter::Active {
                query = query.filter(equipments::active.eq(true));
            }
            Ok(query.load(conn)?)
        })
        .await
    }

    async fn get_equipment(&self, id: i64) -> StoreResult<Equipment> {
        self.run(move |conn| {
            let equipment = equipments::table
                .find(id)
                .select(Equipment::as_select())
                .first(conn)?;
            Ok(equipment)
        })
        .await
    }

    async fn find_equipment_by_code(&self, code: &str) -> StoreResult<Option<Equipment>> {
        let code = code.to_string();
        self.run(move |conn| {
            let equipment = equipments::table
                .filter(equipments::code.eq(&code))
                .select(Equipment::as_select())
                .first(conn)
                .optional()?;
            Ok(equipment)
        })
        .await
    }

    async fn create_equipment(&self, equipment: NewEquipment) -> StoreResult<Equipment> {
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let created = diesel::insert_into(equipments::table)
                    .values(&equipment)
                    .returning(Equipment::as_returning())
                    .get_result(conn)?;
                Ok(created)
            })
        })
        .await
    }

    async fn set_equipment_active(&self, id: i64, active: bool) -> StoreResult<()> {
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let updated = diesel::update(equipments::table.find(id))
                    .set(equipments::active.eq(active))
                    .execute(conn)?;
                if updated == 0 {
                    return Err(StoreError::NotFound);
                }
                Ok(())
            })
        })
        .await
    }

    async fn delete_equipment(&self, id: i64) -> StoreResult<()> {
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let deleted = diesel::delete(equipments::table.find(id)).execute(conn)?;
                if deleted == 0 {
                    return Err(StoreError::NotFound);
                }
                Ok(())
            })
        })
        .await
    }

    async fn list_operations(&self) -> StoreResult<Vec<Operation>> {
        self.run(|conn| {
            let rows = operations::table
                .order(operations::id.asc())
                .select(Operation::as_select())
                .load(conn)?;
            Ok(rows)
        })
        .await
    }

    async fn create_operation(&self, operation: NewOperation) -> StoreResult<Operation> {
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let created = diesel::insert_into(operations::table)
                    .values(&operation)
                    .returning(Operation::as_returning())
                    .get_result(conn)?;
                Ok(created)
            })
        })
        .await
    }

    async fn total_operation_cost(&self, filter: CostFilter) -> StoreResult<f64> {
        self.run(move |conn| {
            let joined = operations::table.inner_join(equipments::table);
            let total: Option<f64> = match filter {
                CostFilter::Code(code) => joined
                    .filter(equipments::code.eq(code))
                    .select(sum(operations::cost))
                    .get_result(conn)?,
                CostFilter::Name(name) => joined
                    .filter(equipments::name.eq(name))
                    .select(sum(operations::cost))
                    .get_result(conn)?,
            };
            Ok(total.unwrap_or(0.0))
        })
        .await
    }

    async fn average_operation_cost_by_vessel(&self) -> StoreResult<Vec<(String, f64)>> {
        self.run(|conn| {
            let rows: Vec<(String, Option<f64>)> = operations::table
                .inner_join(equipments::table.inner_join(vessels::table))
                .group_by(vessels::code)
                .select((vessels::code, avg(operations::cost)))
                .order(vessels::code.asc())
                .load(conn)?;
            Ok(rows
                .into_iter()
                .filter_map(|(code, average)| average.map(|value| (code, value)))
                .collect())
        })
        .await
    }
}
