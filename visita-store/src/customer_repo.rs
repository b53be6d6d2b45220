use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use visita_core::identity::{CustomerDirectory, CustomerRecord};

pub struct PgCustomerDirectory {
    pool: PgPool,
}

impl PgCustomerDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: sqlx::postgres::PgRow) -> CustomerRecord {
    CustomerRecord {
        id: row.get("id"),
        tenant_id: row.get("tenant_id"),
        name: row.get("name"),
        phone: row.get("phone"),
    }
}

#[async_trait]
impl CustomerDirectory for PgCustomerDirectory {
    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<CustomerRecord>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query("SELECT id, tenant_id, name, phone FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(record_from_row))
    }

    async fn find_by_normalized_phone(
        &self,
        tenant_id: Uuid,
        normalized_phone: &str,
    ) -> Result<Vec<CustomerRecord>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, name, phone FROM customers \
             WHERE tenant_id = $1 AND normalized_phone = $2",
        )
        .bind(tenant_id)
        .bind(normalized_phone)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(record_from_row).collect())
    }
}
