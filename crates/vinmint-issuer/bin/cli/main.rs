mod cli;

use crate::cli::{Command, StoreArgs, CLI};
use anyhow::{bail, Context};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};
use vinmint_core::{validate_code, Prefix};
use vinmint_issuer::{BatchAllocator, BatchRequest};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = CLI::parse();
    vinmint_telemetry::init(config.log_format)?;

    match config.command {
        Command::Validate { codes } => Ok(validate(&codes)),
        command => {
            run(command, &config.store).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run(command: Command, args: &StoreArgs) -> anyhow::Result<()> {
    let store = args
        .selector()
        .select()
        .await
        .context("failed to open sequence store")?;
    info!(backend = %store.backend(), "sequence store ready");

    match command {
        Command::Generate {
            quantity,
            manufacturer_id,
            descriptor,
            model_year,
            plant_code,
            json,
        } => {
            let request = BatchRequest {
                quantity,
                manufacturer_id,
                descriptor,
                model_year,
                plant_code,
            };
            let deadline =
                Instant::now() + Duration::from_millis(args.allocation_timeout_ms);
            let allocator = BatchAllocator::new(store);

            match allocator.generate_batch_until(&request, deadline).await {
                Ok(batch) if json => println!("{}", serde_json::to_string_pretty(&batch)?),
                Ok(batch) => batch.codes.iter().for_each(|code| println!("{code}")),
                Err(err) => {
                    // codes already issued must still reach the caller
                    if let Some(partial) = err.partial() {
                        partial.codes.iter().for_each(|code| println!("{code}"));
                    }
                    return Err(err.into());
                }
            }
        }
        Command::Current { prefix } => {
            let prefix = Prefix::new(prefix)?;
            println!("{}", store.read_current(&prefix).await?);
        }
        Command::Stats => {
            let stats = store.statistics().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Reset {
            prefix,
            value,
            force,
        } => {
            if !force {
                bail!("reset can reissue existing codes; pass --force to proceed");
            }
            let prefix = Prefix::new(prefix)?;
            warn!(prefix = %prefix, value, "operator requested counter reset");
            store.reset(&prefix, value).await?;
        }
        Command::Validate { codes } => {
            validate(&codes);
        }
    }

    Ok(())
}

fn validate(codes: &[String]) -> ExitCode {
    let mut all_valid = true;
    for code in codes {
        let report = validate_code(code);
        if report.valid {
            println!("{code}: valid");
        } else {
            all_valid = false;
            println!("{code}: invalid");
            for error in &report.errors {
                println!("  - {error}");
            }
        }
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
