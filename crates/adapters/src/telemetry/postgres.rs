//! PostgreSQL telemetry repository
//!
//! Read-only queries over `historical_telemetry` and `maintenance_logs`.
//! Columns are cast on the way out so tables loaded by external tooling with
//! slightly different numeric types still map onto the domain records.

use async_trait::async_trait;
use axle_core::{MaintenanceLog, TelemetryRecord};
use axle_ports::{RepositoryError, TelemetryRepository};
use sqlx::PgPool;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct PostgreSqlTelemetryRepository {
    pool: PgPool,
}

impl PostgreSqlTelemetryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<(), RepositoryError> {
        info!("Initializing telemetry schema");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS historical_telemetry (
                vehicle_vin TEXT NOT NULL,
                timestamp TIMESTAMPTZ NOT NULL,
                odometer BIGINT NOT NULL,
                speed DOUBLE PRECISION NOT NULL,
                rpm DOUBLE PRECISION NOT NULL,
                throttle DOUBLE PRECISION NOT NULL,
                engine_coolant_temp DOUBLE PRECISION NOT NULL,
                engine_load DOUBLE PRECISION NOT NULL,
                fuel_trim DOUBLE PRECISION NOT NULL,
                battery_voltage DOUBLE PRECISION NOT NULL,
                ambient_air_temp DOUBLE PRECISION NOT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to create historical_telemetry table", e))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_historical_telemetry_vin_ts
            ON historical_telemetry(vehicle_vin, timestamp)
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to create telemetry index", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS maintenance_logs (
                vehicle_vin TEXT NOT NULL,
                failure_date TIMESTAMPTZ NOT NULL,
                odometer_at_failure BIGINT NOT NULL,
                failed_component TEXT NOT NULL,
                failure_notes TEXT NULL
            )
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to create maintenance_logs table", e))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_maintenance_logs_vin_date
            ON maintenance_logs(vehicle_vin, failure_date)
        "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to create maintenance_logs index", e))?;

        info!("Telemetry schema initialized successfully");
        Ok(())
    }
}

fn map_sqlx(context: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Unavailable(format!("{}: {}", context, err))
        }
        other => RepositoryError::Query(format!("{}: {}", context, other)),
    }
}

#[async_trait]
impl TelemetryRepository for PostgreSqlTelemetryRepository {
    async fn telemetry_for_vin(&self, vin: &str) -> Result<Vec<TelemetryRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, TelemetryRecord>(
            r#"
            SELECT vehicle_vin,
                   timestamp::TIMESTAMPTZ AS timestamp,
                   odometer::BIGINT AS odometer,
                   speed::DOUBLE PRECISION AS speed,
                   rpm::DOUBLE PRECISION AS rpm,
                   throttle::DOUBLE PRECISION AS throttle,
                   engine_coolant_temp::DOUBLE PRECISION AS engine_coolant_temp,
                   engine_load::DOUBLE PRECISION AS engine_load,
                   fuel_trim::DOUBLE PRECISION AS fuel_trim,
                   battery_voltage::DOUBLE PRECISION AS battery_voltage,
                   ambient_air_temp::DOUBLE PRECISION AS ambient_air_temp
            FROM historical_telemetry
            WHERE vehicle_vin = $1
            ORDER BY timestamp ASC
        "#,
        )
        .bind(vin)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to query telemetry", e))?;

        debug!(vin = vin, rows = rows.len(), "Telemetry query finished");
        Ok(rows)
    }

    async fn maintenance_logs_for_vin(
        &self,
        vin: &str,
    ) -> Result<Vec<MaintenanceLog>, RepositoryError> {
        let rows = sqlx::query_as::<_, MaintenanceLog>(
            r#"
            SELECT vehicle_vin,
                   failure_date::TIMESTAMPTZ AS failure_date,
                   odometer_at_failure::BIGINT AS odometer_at_failure,
                   failed_component,
                   failure_notes
            FROM maintenance_logs
            WHERE vehicle_vin = $1
            ORDER BY failure_date ASC
        "#,
        )
        .bind(vin)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx("Failed to query maintenance logs", e))?;

        debug!(vin = vin, rows = rows.len(), "Maintenance log query finished");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(matches!(
            map_sqlx("ctx", sqlx::Error::PoolTimedOut),
            RepositoryError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx("ctx", sqlx::Error::RowNotFound),
            RepositoryError::Query(_)
        ));
    }

    #[tokio::test]
    async fn test_queries_against_local_postgres() {
        let url = match std::env::var("AXLE_TEST_DB_URL") {
            Ok(url) => url,
            Err(_) => {
                println!("⚠️  AXLE_TEST_DB_URL not set, skipping PostgreSQL test");
                return;
            }
        };
        let pool = match PgPool::connect(&url).await {
            Ok(pool) => pool,
            Err(e) => {
                println!("⚠️  Cannot connect to PostgreSQL in test environment: {:?}", e);
                return;
            }
        };

        let repo = PostgreSqlTelemetryRepository::new(pool);
        repo.init_schema().await.unwrap();

        let rows = repo.telemetry_for_vin("NO-SUCH-VIN-000").await.unwrap();
        assert!(rows.is_empty());
        let logs = repo
            .maintenance_logs_for_vin("NO-SUCH-VIN-000")
            .await
            .unwrap();
        assert!(logs.is_empty());
    }
}
