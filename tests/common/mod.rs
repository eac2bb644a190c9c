use std::collections::BTreeMap;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use diesel::connection::SimpleConnection;
use diesel::PgConnection;
use fleet_maintenance::config::AppConfig;
use fleet_maintenance::db::{self, PgPool};
use fleet_maintenance::models::{
    CostFilter, Equipment, EquipmentFilter, NewEquipment, NewOperation, NewVessel, Operation,
    Vessel,
};
use fleet_maintenance::repository::{
    FleetRepository, PgFleetRepository, StoreError, StoreResult,
};
use fleet_maintenance::routes;
use fleet_maintenance::state::AppState;
use http_body_util::BodyExt;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tower::util::ServiceExt;

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

#[derive(Default)]
struct FakeTables {
    vessels: Vec<Vessel>,
    equipment: Vec<Equipment>,
    operations: Vec<Operation>,
    last_id: i64,
}

impl FakeTables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// In-memory stand-in for PostgreSQL that enforces the same unique and
/// restrict constraints.
#[derive(Default)]
pub struct FakeRepository {
    tables: Mutex<FakeTables>,
    unavailable: AtomicBool,
}

impl FakeRepository {
    /// Makes every following call fail the way a dropped database would.
    #[allow(dead_code)]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Pool("connection refused".to_string()));
        }
        Ok(())
    }

    #[allow(dead_code)]
    pub async fn vessel_count(&self) -> usize {
        self.tables.lock().await.vessels.len()
    }

    #[allow(dead_code)]
    pub async fn equipment_count(&self) -> usize {
        self.tables.lock().await.equipment.len()
    }

    #[allow(dead_code)]
    pub async fn operation_count(&self) -> usize {
        self.tables.lock().await.operations.len()
    }

    #[allow(dead_code)]
    pub async fn equipment_by_code(&self, code: &str) -> Option<Equipment> {
        self.tables
            .lock()
            .await
            .equipment
            .iter()
            .find(|equipment| equipment.code == code)
            .cloned()
    }
}

#[async_trait]
impl FleetRepository for FakeRepository {
    async fn list_vessels(&self) -> StoreResult<Vec<Vessel>> {
        self.check_available()?;
        Ok(self.tables.lock().await.vessels.clone())
    }

    async fn get_vessel(&self, id: i64) -> StoreResult<Vessel> {
        self.check_available()?;
        let guard = self.tables.lock().await;
        guard
            .vessels
            .iter()
            .find(|vessel| vessel.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_vessel_by_code(&self, code: &str) -> StoreResult<Option<Vessel>> {
        self.check_available()?;
        let guard = self.tables.lock().await;
        Ok(guard.vessels.iter().find(|vessel| vessel.code == code).cloned())
    }

    async fn create_vessel(&self, vessel: NewVessel) -> StoreResult<Vessel> {
        self.check_available()?;
        let mut guard = self.tables.lock().await;
        if guard.vessels.iter().any(|existing| existing.code == vessel.code) {
            return Err(StoreError::DuplicateKey);
        }
        let created = Vessel {
            id: guard.next_id(),
            code: vessel.code,
        };
        guard.vessels.push(created.clone());
        Ok(created)
    }

    async fn delete_vessel(&self, id: i64) -> StoreResult<()> {
        self.check_available()?;
        let mut guard = self.tables.lock().await;
        let index = guard
            .vessels
            .iter()
            .position(|vessel| vessel.id == id)
            .ok_or(StoreError::NotFound)?;
        if guard.equipment.iter().any(|equipment| equipment.vessel_id == id) {
            return Err(StoreError::ForeignKeyViolation);
        }
        guard.vessels.remove(index);
        Ok(())
    }

    async fn list_equipment(&self, filter: EquipmentFilter) -> StoreResult<Vec<Equipment>> {
        self.check_available()?;
        let guard = self.tables.lock().await;
        Ok(guard
            .equipment
            .iter()
            .filter(|equipment| filter == EquipmentFilter::All || equipment.active)
            .cloned()
            .collect())
    }

    async fn get_equipment(&self, id: i64) -> StoreResult<Equipment> {
        self.check_available()?;
        let guard = self.tables.lock().await;
        guard
            .equipment
            .iter()
            .find(|equipment| equipment.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_equipment_by_code(&self, code: &str) -> StoreResult<Option<Equipment>> {
        self.check_available()?;
        let guard = self.tables.lock().await;
        Ok(guard
            .equipment
            .iter()
            .find(|equipment| equipment.code == code)
            .cloned())
    }

    async fn create_equipment(&self, equipment: NewEquipment) -> StoreResult<Equipment> {
        self.check_available()?;
        let mut guard = self.tables.lock().await;
        if !guard.vessels.iter().any(|vessel| vessel.id == equipment.vessel_id) {
            return Err(StoreError::ForeignKeyViolation);
        }
        if guard
            .equipment
            .iter()
            .any(|existing| existing.code == equipment.code)
        {
            return Err(StoreError::DuplicateKey);
        }
        let created = Equipment {
            id: guard.next_id(),
            vessel_id: equipment.vessel_id,
            name: equipment.name,
            code: equipment.code,
            location: equipment.location,
            active: equipment.active,
        };
        guard.equipment.push(created.clone());
        Ok(created)
    }

    async fn set_equipment_active(&self, id: i64, active: bool) -> StoreResult<()> {
        self.check_available()?;
        let mut guard = self.tables.lock().await;
        let equipment = guard
            .equipment
            .iter_mut()
            .find(|equipment| equipment.id == id)
            .ok_or(StoreError::NotFound)?;
        equipment.active = active;
        Ok(())
    }

    async fn delete_equipment(&self, id: i64) -> StoreResult<()> {
        self.check_available()?;
        let mut guard = self.tables.lock().await;
        let index = guard
            .equipment
            .iter()
            .position(|equipment| equipment.id == id)
            .ok_or(StoreError::NotFound)?;
        if guard
            .operations
            .iter()
            .any(|operation| operation.equipment_id == id)
        {
            return Err(StoreError::ForeignKeyViolation);
        }
        guard.equipment.remove(index);
        Ok(())
    }

    async fn list_operations(&self) -> StoreResult<Vec<Operation>> {
        self.check_available()?;
        Ok(self.tables.lock().await.operations.clone())
    }

    async fn create_operation(&self, operation: NewOperation) -> StoreResult<Operation> {
        self.check_available()?;
        let mut guard = self.tables.lock().await;
        if !guard
            .equipment
            .iter()
            .any(|equipment| equipment.id == operation.equipment_id)
        {
            return Err(StoreError::ForeignKeyViolation);
        }
        let created = Operation {
            id: guard.next_id(),
            equipment_id: operation.equipment_id,
            type_: operation.type_,
            cost: operation.cost,
        };
        guard.operations.push(created.clone());
        Ok(created)
    }

    async fn total_operation_cost(&self, filter: CostFilter) -> StoreResult<f64> {
        self.check_available()?;
        let guard = self.tables.lock().await;
        let matches = |equipment: &Equipment| match &filter {
            CostFilter::Code(code) => &equipment.code == code,
            CostFilter::Name(name) => &equipment.name == name,
        };
        let total = guard
            .operations
            .iter()
            .filter(|operation| {
                guard
                    .equipment
                    .iter()
                    .any(|equipment| equipment.id == operation.equipment_id && matches(equipment))
            })
            .fold(0.0, |acc, operation| acc + operation.cost);
        Ok(total)
    }

    async fn average_operation_cost_by_vessel(&self) -> StoreResult<Vec<(String, f64)>> {
        self.check_available()?;
        let guard = self.tables.lock().await;
        let mut groups: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for operation in &guard.operations {
            let vessel = guard
                .equipment
                .iter()
                .find(|equipment| equipment.id == operation.equipment_id)
                .and_then(|equipment| {
                    guard
                        .vessels
                        .iter()
                        .find(|vessel| vessel.id == equipment.vessel_id)
                });
            if let Some(vessel) = vessel {
                let entry = groups.entry(vessel.code.clone()).or_insert((0.0, 0));
                entry.0 += operation.cost;
                entry.1 += 1;
            }
        }
        Ok(groups
            .into_iter()
            .map(|(code, (total, count))| (code, total / count as f64))
            .collect())
    }
}

pub struct TestApp {
    router: Router,
    fake: Option<Arc<FakeRepository>>,
    pool: Option<PgPool>,
}

impl TestApp {
    /// Router wired to a fresh [`FakeRepository`].
    #[allow(dead_code)]
    pub fn in_memory() -> Self {
        let fake = Arc::new(FakeRepository::default());
        let repo: Arc<dyn FleetRepository> = fake.clone();
        let state = AppState::new(test_config("postgres://unused@localhost/unused"), repo);
        Self {
            router: routes::create_router(state),
            fake: Some(fake),
            pool: None,
        }
    }

    /// Router wired to PostgreSQL, or `None` when `TEST_DATABASE_URL` is unset.
    #[allow(dead_code)]
    pub async fn postgres() -> Result<Option<Self>> {
        let database_url = match env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("TEST_DATABASE_URL not set; skipping PostgreSQL test");
                return Ok(None);
            }
        };

        let config = test_config(&database_url);
        let pool = db::init_pool_with_size(&config.database_url, 4)?;
        prepare_database(&pool).await?;

        let repo: Arc<dyn FleetRepository> = Arc::new(PgFleetRepository::new(pool.clone()));
        let state = AppState::new(config, repo);
        Ok(Some(Self {
            router: routes::create_router(state),
            fake: None,
            pool: Some(pool),
        }))
    }

    #[allow(dead_code)]
    pub fn fake(&self) -> Arc<FakeRepository> {
        self.fake
            .clone()
            .expect("fake repository only exists for in-memory apps")
    }

    #[allow(dead_code)]
    pub async fn cleanup(&self) -> Result<()> {
        let Some(pool) = self.pool.clone() else {
            return Ok(());
        };
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get cleanup connection: {err}"))?;
            truncate_all(&mut conn)?;
            Ok(())
        })
        .await
        .context("cleanup task panicked")?
    }

    #[allow(dead_code)]
    pub async fn count_rows(&self, table: &'static str) -> Result<i64> {
        use diesel::dsl::count_star;
        use diesel::prelude::*;
        use fleet_maintenance::schema::{equipments, operations, vessels};

        let pool = self
            .pool
            .clone()
            .context("row counts need a PostgreSQL-backed app")?;
        tokio::task::spawn_blocking(move || -> Result<i64> {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
            let count = match table {
                "vessels" => vessels::table.select(count_star()).first(&mut conn)?,
                "equipments" => equipments::table.select(count_star()).first(&mut conn)?,
                "operations" => operations::table.select(count_star()).first(&mut conn)?,
                other => return Err(anyhow!("unknown table {other}")),
            };
            Ok(count)
        })
        .await
        .context("count task panicked")?
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::POST, path, payload).await
    }

    #[allow(dead_code)]
    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::PUT, path, payload).await
    }

    #[allow(dead_code)]
    pub async fn post_raw(
        &self,
        path: &str,
        content_type: &str,
        body: &'static str,
    ) -> Result<hyper::Response<Body>> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", content_type)
            .body(Body::from(body))?;
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn get(&self, path: &str) -> Result<hyper::Response<Body>> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())?;
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str) -> Result<hyper::Response<Body>> {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri(path)
            .body(Body::empty())?;
        self.send(request).await
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body))?;
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> Result<hyper::Response<Body>> {
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }
}

fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        cors_allowed_origin: None,
    }
}

#[allow(dead_code)]
pub async fn acquire_db_lock() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

pub async fn read_json<T: DeserializeOwned>(response: hyper::Response<Body>) -> Result<T> {
    let body = body_to_vec(response.into_body()).await?;
    serde_json::from_slice(&body).with_context(|| {
        format!(
            "unexpected response body: {}",
            String::from_utf8_lossy(&body)
        )
    })
}

/// Reads the `message` field every non-list response carries.
#[allow(dead_code)]
pub async fn read_message(response: hyper::Response<Body>) -> Result<String> {
    #[derive(serde::Deserialize)]
    struct MessageBody {
        message: String,
    }
    let parsed: MessageBody = read_json(response).await?;
    Ok(parsed.message)
}

async fn prepare_database(pool: &PgPool) -> Result<()> {
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        db::run_migrations(&pool)?;
        let mut conn = pool
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        truncate_all(&mut conn)?;
        Ok(())
    })
    .await
    .context("migration task panicked")?
}

fn truncate_all(conn: &mut PgConnection) -> Result<()> {
    conn.batch_execute("TRUNCATE TABLE operations, equipments, vessels RESTART IDENTITY CASCADE;")
        .context("failed to truncate tables")?;
    Ok(())
}
