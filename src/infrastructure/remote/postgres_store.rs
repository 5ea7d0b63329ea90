use crate::application::ports::{RemoteRow, RemoteStore};
use crate::domain::entities::TargetTable;
use crate::domain::value_objects::RecordId;
use crate::shared::config::RemoteConfig;
use crate::shared::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use super::rows::{CustomerColumns, CustomerRow, DeliveryColumns, DeliveryRow};

/// The hosted Postgres behind the dashboard, adapted to the [`RemoteStore`]
/// port. Rows cross the boundary as remote-shape maps; typed columns plus a
/// JSONB spillover keep unrecognized fields intact.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &RemoteConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .map_err(|err| AppError::RemoteUnavailable(err.to_string()))?;
        info!("Connected to remote store");
        Ok(Self { pool })
    }

    /// Creates the two tables when they do not exist yet. The unique
    /// constraint on (`dr_number`, `user_id`) is what turns a DR collision
    /// into a `UniquenessConflict` at insert time.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS deliveries (
                id BIGSERIAL PRIMARY KEY,
                user_id TEXT NOT NULL,
                dr_number TEXT NOT NULL,
                customer_name TEXT,
                vendor_number TEXT,
                origin TEXT,
                destination TEXT,
                truck_type TEXT,
                truck_plate_number TEXT,
                distance TEXT,
                item_number TEXT,
                item_description TEXT,
                serial_number TEXT,
                mobile_number TEXT,
                status TEXT NOT NULL DEFAULT 'On Schedule',
                additional_costs DOUBLE PRECISION NOT NULL DEFAULT 0,
                created_at TIMESTAMPTZ,
                updated_at TIMESTAMPTZ,
                last_modified TIMESTAMPTZ,
                completed_at TIMESTAMPTZ,
                completed_date TEXT,
                completed_date_time TEXT,
                delivery_date TIMESTAMPTZ,
                created_date TIMESTAMPTZ,
                created_by TEXT,
                additional_data TEXT,
                extra JSONB,
                UNIQUE (dr_number, user_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS customers (
                id BIGSERIAL PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                email TEXT,
                phone TEXT,
                mobile_number TEXT,
                address TEXT,
                vendor_number TEXT,
                contact_person TEXT,
                extra JSONB
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_deliveries_user ON deliveries (user_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_customers_user ON customers (user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn insert_delivery(&self, row: RemoteRow) -> Result<RemoteRow> {
        let columns = DeliveryColumns::from_remote_map(&row);
        let stored = sqlx::query_as::<_, DeliveryRow>(
            r#"
            INSERT INTO deliveries (
                user_id, dr_number, customer_name, vendor_number, origin,
                destination, truck_type, truck_plate_number, distance,
                item_number, item_description, serial_number, mobile_number,
                status, additional_costs, created_at, updated_at,
                last_modified, completed_at, completed_date,
                completed_date_time, delivery_date, created_date, created_by,
                additional_data, extra
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26
            )
            RETURNING *
            "#,
        )
        .bind(&columns.user_id)
        .bind(&columns.dr_number)
        .bind(&columns.customer_name)
        .bind(&columns.vendor_number)
        .bind(&columns.origin)
        .bind(&columns.destination)
        .bind(&columns.truck_type)
        .bind(&columns.truck_plate_number)
        .bind(&columns.distance)
        .bind(&columns.item_number)
        .bind(&columns.item_description)
        .bind(&columns.serial_number)
        .bind(&columns.mobile_number)
        .bind(&columns.status)
        .bind(columns.additional_costs)
        .bind(columns.created_at)
        .bind(columns.updated_at)
        .bind(columns.last_modified)
        .bind(columns.completed_at)
        .bind(&columns.completed_date)
        .bind(&columns.completed_date_time)
        .bind(columns.delivery_date)
        .bind(columns.created_date)
        .bind(&columns.created_by)
        .bind(&columns.additional_data)
        .bind(&columns.extra)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored.into_remote_map())
    }

    async fn update_delivery(&self, id: i64, fields: RemoteRow) -> Result<RemoteRow> {
        // Read-merge-write: the store is last-write-wins, so a partial
        // update becomes a whole-row write of the merged state.
        let current = sqlx::query_as::<_, DeliveryRow>("SELECT * FROM deliveries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("delivery row {id}")))?;

        let mut merged = current.into_remote_map();
        for (key, value) in fields {
            merged.insert(key, value);
        }
        let columns = DeliveryColumns::from_remote_map(&merged);

        let stored = sqlx::query_as::<_, DeliveryRow>(
            r#"
            UPDATE deliveries SET
                user_id = $1, dr_number = $2, customer_name = $3,
                vendor_number = $4, origin = $5, destination = $6,
                truck_type = $7, truck_plate_number = $8, distance = $9,
                item_number = $10, item_description = $11, serial_number = $12,
                mobile_number = $13, status = $14, additional_costs = $15,
                created_at = $16, updated_at = $17, last_modified = $18,
                completed_at = $19, completed_date = $20,
                completed_date_time = $21, delivery_date = $22,
                created_date = $23, created_by = $24, additional_data = $25,
                extra = $26
            WHERE id = $27
            RETURNING *
            "#,
        )
        .bind(&columns.user_id)
        .bind(&columns.dr_number)
        .bind(&columns.customer_name)
        .bind(&columns.vendor_number)
        .bind(&columns.origin)
        .bind(&columns.destination)
        .bind(&columns.truck_type)
        .bind(&columns.truck_plate_number)
        .bind(&columns.distance)
        .bind(&columns.item_number)
        .bind(&columns.item_description)
        .bind(&columns.serial_number)
        .bind(&columns.mobile_number)
        .bind(&columns.status)
        .bind(columns.additional_costs)
        .bind(columns.created_at)
        .bind(columns.updated_at)
        .bind(columns.last_modified)
        .bind(columns.completed_at)
        .bind(&columns.completed_date)
        .bind(&columns.completed_date_time)
        .bind(columns.delivery_date)
        .bind(columns.created_date)
        .bind(&columns.created_by)
        .bind(&columns.additional_data)
        .bind(&columns.extra)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored.into_remote_map())
    }

    async fn insert_customer(&self, row: RemoteRow) -> Result<RemoteRow> {
        let columns = CustomerColumns::from_remote_map(&row);
        let stored = sqlx::query_as::<_, CustomerRow>(
            r#"
            INSERT INTO customers (
                user_id, name, email, phone, mobile_number, address,
                vendor_number, contact_person, extra
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&columns.user_id)
        .bind(&columns.name)
        .bind(&columns.email)
        .bind(&columns.phone)
        .bind(&columns.mobile_number)
        .bind(&columns.address)
        .bind(&columns.vendor_number)
        .bind(&columns.contact_person)
        .bind(&columns.extra)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored.into_remote_map())
    }

    async fn update_customer(&self, id: i64, fields: RemoteRow) -> Result<RemoteRow> {
        let current = sqlx::query_as::<_, CustomerRow>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("customer row {id}")))?;

        let mut merged = current.into_remote_map();
        for (key, value) in fields {
            merged.insert(key, value);
        }
        let columns = CustomerColumns::from_remote_map(&merged);

        let stored = sqlx::query_as::<_, CustomerRow>(
            r#"
            UPDATE customers SET
                user_id = $1, name = $2, email = $3, phone = $4,
                mobile_number = $5, address = $6, vendor_number = $7,
                contact_person = $8, extra = $9
            WHERE id = $10
            RETURNING *
            "#,
        )
        .bind(&columns.user_id)
        .bind(&columns.name)
        .bind(&columns.email)
        .bind(&columns.phone)
        .bind(&columns.mobile_number)
        .bind(&columns.address)
        .bind(&columns.vendor_number)
        .bind(&columns.contact_person)
        .bind(&columns.extra)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored.into_remote_map())
    }
}

#[async_trait]
impl RemoteStore for PostgresStore {
    async fn fetch_deliveries(&self, owner: &str) -> Result<Vec<RemoteRow>> {
        let rows = sqlx::query_as::<_, DeliveryRow>(
            "SELECT * FROM deliveries WHERE user_id = $1 ORDER BY created_at DESC NULLS LAST",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DeliveryRow::into_remote_map).collect())
    }

    async fn fetch_customers(&self, owner: &str) -> Result<Vec<RemoteRow>> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            "SELECT * FROM customers WHERE user_id = $1 ORDER BY name ASC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CustomerRow::into_remote_map).collect())
    }

    async fn dr_number_exists(&self, owner: &str, dr_number: &str) -> Result<bool> {
        let found =
            sqlx::query("SELECT 1 FROM deliveries WHERE user_id = $1 AND dr_number = $2 LIMIT 1")
                .bind(owner)
                .bind(dr_number)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    async fn insert(&self, table: TargetTable, row: RemoteRow) -> Result<RemoteRow> {
        match table {
            TargetTable::Deliveries => self.insert_delivery(row).await,
            TargetTable::Customers => self.insert_customer(row).await,
        }
    }

    async fn update(
        &self,
        table: TargetTable,
        id: &RecordId,
        fields: RemoteRow,
    ) -> Result<RemoteRow> {
        let id = row_id(id)?;
        match table {
            TargetTable::Deliveries => self.update_delivery(id, fields).await,
            TargetTable::Customers => self.update_customer(id, fields).await,
        }
    }

    async fn delete(&self, table: TargetTable, id: &RecordId) -> Result<()> {
        let id = row_id(id)?;
        let query = match table {
            TargetTable::Deliveries => "DELETE FROM deliveries WHERE id = $1",
            TargetTable::Customers => "DELETE FROM customers WHERE id = $1",
        };
        let result = sqlx::query(query).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{table} row {id}")));
        }
        Ok(())
    }
}

/// Ids arrive as either numbers or numeric strings; the store keys rows by
/// a bigint either way.
fn row_id(id: &RecordId) -> Result<i64> {
    match id {
        RecordId::Number(n) => Ok(*n),
        RecordId::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::NotFound(format!("no row with id {s}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_id_accepts_both_scalar_forms() {
        assert_eq!(row_id(&RecordId::from(7)).unwrap(), 7);
        assert_eq!(row_id(&RecordId::from("7")).unwrap(), 7);
        assert!(matches!(
            row_id(&RecordId::from("temp-uuid")),
            Err(AppError::NotFound(_))
        ));
    }
}
