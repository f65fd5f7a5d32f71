use crate::commands::{with_migrated_pool, CommandResult, StepFailure};

pub fn run() -> CommandResult {
    match with_migrated_pool("migrate", |_pool| async { Ok::<_, StepFailure>(()) }) {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err(failure) => failure,
    }
}
