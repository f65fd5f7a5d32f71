use chrono::NaiveDate;

use crm_core::domain::customer::{Customer, CustomerId};

use crate::connection::DbPool;
use crate::repositories::{CustomerRepository, RepositoryError, SqlCustomerRepository};

struct DemoCustomerContract {
    first_name: &'static str,
    last_name: &'static str,
    birth_date: (i32, u32, u32),
}

/// Demo customers chosen so that "Ortega" matches both and "Ann" only the second.
const DEMO_CUSTOMERS: &[DemoCustomerContract] = &[
    DemoCustomerContract { first_name: "Soliman", last_name: "Ortega", birth_date: (1984, 3, 12) },
    DemoCustomerContract {
        first_name: "Jo-Anne",
        last_name: "Carpio-Ortega",
        birth_date: (1991, 11, 5),
    },
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeededCustomer {
    pub id: CustomerId,
    pub display_name: String,
    pub created: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub customers: Vec<SeededCustomer>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(String, bool)>,
}

pub struct DemoCustomers;

impl DemoCustomers {
    pub fn customers() -> Vec<Customer> {
        DEMO_CUSTOMERS
            .iter()
            .map(|demo| {
                let (year, month, day) = demo.birth_date;
                Customer::new(
                    demo.first_name,
                    demo.last_name,
                    NaiveDate::from_ymd_opt(year, month, day),
                )
            })
            .collect()
    }

    /// Inserts demo customers that are not stored yet. Safe to run repeatedly.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let repo = SqlCustomerRepository::new(pool.clone());
        let mut customers = Vec::with_capacity(DEMO_CUSTOMERS.len());

        for customer in Self::customers() {
            let display_name = display_name(&customer);
            let (id, created) = match existing_id(pool, &customer).await? {
                Some(id) => (id, false),
                None => {
                    let saved = repo.save(customer).await?;
                    let id = saved.id.ok_or_else(|| {
                        RepositoryError::Decode(format!("seeded `{display_name}` has no id"))
                    })?;
                    (id, true)
                }
            };
            customers.push(SeededCustomer { id, display_name, created });
        }

        Ok(SeedResult { customers })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::with_capacity(DEMO_CUSTOMERS.len());
        for customer in Self::customers() {
            let present = existing_id(pool, &customer).await?.is_some();
            checks.push((display_name(&customer), present));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }
}

fn display_name(customer: &Customer) -> String {
    format!(
        "{} {}",
        customer.first_name.as_deref().unwrap_or_default(),
        customer.last_name.as_deref().unwrap_or_default()
    )
}

async fn existing_id(
    pool: &DbPool,
    customer: &Customer,
) -> Result<Option<CustomerId>, RepositoryError> {
    let id: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM customer WHERE first_name = ?1 AND last_name = ?2 ORDER BY id LIMIT 1",
    )
    .bind(customer.first_name.as_deref())
    .bind(customer.last_name.as_deref())
    .fetch_optional(pool)
    .await?;

    Ok(id.map(CustomerId))
}
