use crate::commands::{with_migrated_pool, CommandResult, StepFailure};
use crm_db::{DemoCustomers, SeededCustomer};

pub fn run() -> CommandResult {
    let result = with_migrated_pool("seed", |pool| async move {
        let seed_result = DemoCustomers::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoCustomers::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        if !verification.all_present {
            let missing = verification
                .checks
                .iter()
                .filter_map(|(name, present)| (!present).then_some(name.as_str()))
                .collect::<Vec<_>>();
            return Err(("seed_verification", verification_message(&missing), 6u8));
        }

        Ok::<_, StepFailure>(seed_result.customers)
    });

    match result {
        Ok(customers) => CommandResult::success("seed", seed_message(&customers)),
        Err(failure) => failure,
    }
}

fn seed_message(customers: &[SeededCustomer]) -> String {
    let lines = customers
        .iter()
        .map(|customer| {
            let state = if customer.created { "created" } else { "already present" };
            format!("  - {}: {} ({state})", customer.id, customer.display_name)
        })
        .collect::<Vec<_>>();
    format!("demo customers ready:\n{}", lines.join("\n"))
}

fn verification_message(missing: &[&str]) -> String {
    if missing.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for customers: {}", missing.join(", "))
    }
}
