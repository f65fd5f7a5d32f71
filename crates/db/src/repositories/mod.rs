use async_trait::async_trait;
use thiserror::Error;

use crm_core::domain::customer::{Customer, CustomerId, CustomerPatch};
use crm_core::errors::ApplicationError;

pub mod customer;
pub mod memory;

pub use customer::SqlCustomerRepository;
pub use memory::InMemoryCustomerRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("customer `{0}` was not found")]
    NotFound(CustomerId),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound(id) => {
                ApplicationError::NotFound { entity: "customer", id: id.to_string() }
            }
            RepositoryError::Database(error) => {
                ApplicationError::StorageUnavailable(error.to_string())
            }
            RepositoryError::Decode(message) => {
                ApplicationError::StorageUnavailable(format!("stored customer is unreadable: {message}"))
            }
        }
    }
}

/// Persistence contract for customer records.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Inserts a new record and returns it carrying the store-assigned id.
    /// Any id already present on `customer` is ignored.
    async fn save(&self, customer: Customer) -> Result<Customer, RepositoryError>;

    /// Overwrites first name, last name and birth date of the record `id`.
    /// Returns [`RepositoryError::NotFound`] when no such record exists.
    async fn update(
        &self,
        id: CustomerId,
        patch: CustomerPatch,
    ) -> Result<Customer, RepositoryError>;

    /// Removes the record `id`. Missing ids are not an error.
    async fn delete(&self, id: CustomerId) -> Result<(), RepositoryError>;

    async fn delete_all(&self) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError>;

    /// Records whose first or last name contains `text` (case-sensitive),
    /// ordered by id.
    async fn find_by_name_contains(&self, text: &str) -> Result<Vec<Customer>, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use crm_core::domain::customer::CustomerId;
    use crm_core::errors::ApplicationError;

    use super::RepositoryError;

    #[test]
    fn not_found_maps_to_application_not_found() {
        let mapped = ApplicationError::from(RepositoryError::NotFound(CustomerId(9)));

        assert_eq!(mapped, ApplicationError::NotFound { entity: "customer", id: "9".to_string() });
    }

    #[test]
    fn database_failure_maps_to_storage_unavailable() {
        let mapped = ApplicationError::from(RepositoryError::Database(sqlx::Error::PoolClosed));

        assert!(matches!(mapped, ApplicationError::StorageUnavailable(_)));
    }

    #[test]
    fn decode_failure_maps_to_storage_unavailable() {
        let mapped = ApplicationError::from(RepositoryError::Decode("bad date".to_string()));

        assert_eq!(
            mapped,
            ApplicationError::StorageUnavailable(
                "stored customer is unreadable: bad date".to_string()
            )
        );
    }
}
