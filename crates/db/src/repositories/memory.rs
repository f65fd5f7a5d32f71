use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use tokio::sync::RwLock;

use crm_core::domain::customer::{Customer, CustomerId, CustomerPatch};

use super::{CustomerRepository, RepositoryError};

/// Process-local customer store with the same contract as the SQL repository.
#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: RwLock<BTreeMap<CustomerId, Customer>>,
    last_id: AtomicI64,
}

#[async_trait::async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn save(&self, customer: Customer) -> Result<Customer, RepositoryError> {
        let id = CustomerId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1);
        let stored = Customer { id: Some(id), ..customer };

        let mut customers = self.customers.write().await;
        customers.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        id: CustomerId,
        patch: CustomerPatch,
    ) -> Result<Customer, RepositoryError> {
        let mut customers = self.customers.write().await;
        let existing = customers.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;
        existing.apply(patch);
        Ok(existing.clone())
    }

    async fn delete(&self, id: CustomerId) -> Result<(), RepositoryError> {
        let mut customers = self.customers.write().await;
        customers.remove(&id);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), RepositoryError> {
        let mut customers = self.customers.write().await;
        customers.clear();
        Ok(())
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers.get(&id).cloned())
    }

    async fn find_by_name_contains(&self, text: &str) -> Result<Vec<Customer>, RepositoryError> {
        let customers = self.customers.read().await;
        Ok(customers.values().filter(|customer| customer.name_contains(text)).cloned().collect())
    }
}
