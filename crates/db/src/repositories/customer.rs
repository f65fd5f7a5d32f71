use chrono::NaiveDate;
use sqlx::Row;
use tracing::debug;

use crm_core::domain::customer::{Customer, CustomerId, CustomerPatch};

use super::{CustomerRepository, RepositoryError};
use crate::DbPool;

const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn birth_date_to_str(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(BIRTH_DATE_FORMAT).to_string())
}

fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<Customer, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let first_name: Option<String> =
        row.try_get("first_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let last_name: Option<String> =
        row.try_get("last_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let birth_date_str: Option<String> =
        row.try_get("birth_date").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let birth_date = birth_date_str
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, BIRTH_DATE_FORMAT).map_err(|e| {
                RepositoryError::Decode(format!("customer {id} has invalid birth_date `{raw}`: {e}"))
            })
        })
        .transpose()?;

    Ok(Customer { id: Some(CustomerId(id)), first_name, last_name, birth_date })
}

#[async_trait::async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn save(&self, customer: Customer) -> Result<Customer, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO customer (first_name, last_name, birth_date) VALUES (?, ?, ?)",
        )
        .bind(customer.first_name.as_deref())
        .bind(customer.last_name.as_deref())
        .bind(birth_date_to_str(customer.birth_date))
        .execute(&self.pool)
        .await?;

        let id = CustomerId(result.last_insert_rowid());
        debug!(event_name = "db.customer.inserted", customer_id = %id, "customer inserted");

        Ok(Customer { id: Some(id), ..customer })
    }

    async fn update(
        &self,
        id: CustomerId,
        patch: CustomerPatch,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query(
            "UPDATE customer
             SET first_name = ?, last_name = ?, birth_date = ?
             WHERE id = ?
             RETURNING id, first_name, last_name, birth_date",
        )
        .bind(patch.first_name.as_deref())
        .bind(patch.last_name.as_deref())
        .bind(birth_date_to_str(patch.birth_date))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => {
                debug!(event_name = "db.customer.updated", customer_id = %id, "customer updated");
                row_to_customer(r)
            }
            None => Err(RepositoryError::NotFound(id)),
        }
    }

    async fn delete(&self, id: CustomerId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM customer WHERE id = ?").bind(id.0).execute(&self.pool).await?;

        debug!(
            event_name = "db.customer.deleted",
            customer_id = %id,
            rows_affected = result.rows_affected(),
            "customer delete executed"
        );
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM customer").execute(&self.pool).await?;

        debug!(
            event_name = "db.customer.deleted_all",
            rows_affected = result.rows_affected(),
            "all customers deleted"
        );
        Ok(())
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, first_name, last_name, birth_date FROM customer WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_customer(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_name_contains(&self, text: &str) -> Result<Vec<Customer>, RepositoryError> {
        // instr() is case-sensitive and treats `%`/`_` literally, unlike LIKE.
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, first_name, last_name, birth_date
             FROM customer
             WHERE instr(first_name, ?1) > 0 OR instr(last_name, ?1) > 0
             ORDER BY id ASC",
        )
        .bind(text)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_customer).collect::<Result<Vec<_>, _>>()
    }
}
