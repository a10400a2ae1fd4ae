use serde_json::json;
use vitrine_db::{DemoDataset, RepositoryStore, SeedResult, VerificationResult};

use crate::commands::{open_migrated, prepare, CommandFailure, CommandResult};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_migrated(&config).await?;
        let store = RepositoryStore::sql(pool.clone());

        let outcome = async {
            let seeded = DemoDataset::load(&store)
                .await
                .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
            let verification = DemoDataset::verify(&store)
                .await
                .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;
            if !verification.all_present {
                return Err(("seed_verification", verification_failure_message(&verification), 6u8));
            }
            Ok::<SeedResult, CommandFailure>(seeded)
        }
        .await;

        pool.close().await;
        outcome
    });

    match result {
        Ok(seeded) => CommandResult::success_with_data(
            "seed",
            seed_summary(&seeded),
            json!({
                "products": seeded.products,
                "users": seeded.users,
                "purchases": seeded.purchases,
                "demo_users": (0..seeded.users)
                    .map(|index| DemoDataset::user_id(index).to_string())
                    .collect::<Vec<_>>(),
            }),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn seed_summary(seeded: &SeedResult) -> String {
    format!(
        "demo dataset loaded: {} products, {} users, {} purchases",
        seeded.products, seeded.users, seeded.purchases
    )
}

fn verification_failure_message(verification: &VerificationResult) -> String {
    let failed_checks = verification
        .checks
        .iter()
        .filter_map(|(check, passed)| (!passed).then_some(*check))
        .collect::<Vec<_>>();
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
