//! Cleanup command - delete records created by seeding runs

use crate::output::{banner, progress_bar, Status};
use anyhow::{bail, Result};
use mes_api_client::{Entity, MesClient, Outcome};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Serialize)]
struct Candidate {
    id: Option<i64>,
    code: String,
}

/// JSON output for the cleanup command
#[derive(Debug, Serialize)]
struct JsonCleanupOutput {
    entity: &'static str,
    prefix: String,
    applied: bool,
    candidates: Vec<Candidate>,
    deleted: usize,
    failed: usize,
}

/// Run cleanup command
pub async fn run(
    client: &MesClient,
    entity: Entity,
    code_field: &str,
    apply: bool,
    format: &str,
) -> Result<()> {
    let resource = client.entity(entity);
    let prefix = client.config().test_data_prefix.clone();
    let text = format != "json";

    let records = resource
        .get_test_data(|item| item.get(code_field).and_then(Value::as_str))
        .await
        .into_result()?;

    let candidates: Vec<Candidate> = records
        .iter()
        .map(|item| Candidate {
            id: item.get("id").and_then(Value::as_i64),
            code: item
                .get(code_field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
        .collect();

    if text {
        banner(&format!("🧹 Cleanup: {entity}"));
        println!(
            "  {} records with {} starting with {}",
            candidates.len().bold(),
            code_field.cyan(),
            prefix.yellow()
        );
        println!();
        for candidate in &candidates {
            let id = candidate.id.map_or_else(|| "?".to_string(), |id| id.to_string());
            println!("    {:>8}  {}", id.dimmed(), candidate.code);
        }
        println!();
    }

    let mut deleted = 0;
    let mut failed = 0;

    if apply {
        let pb = progress_bar(candidates.len() as u64, "Deleting", text);
        for candidate in &candidates {
            pb.inc(1);
            let Some(id) = candidate.id else {
                warn!(code = %candidate.code, "Record has no numeric id, skipping");
                failed += 1;
                continue;
            };
            match resource.delete(id).await {
                Outcome::Success(()) => deleted += 1,
                Outcome::Failure(failure) => {
                    pb.suspend(|| Status::error(&format!("{}: {failure}", candidate.code)));
                    failed += 1;
                }
            }
        }
        pb.finish_and_clear();
    }

    if text {
        if !apply {
            Status::info(&format!(
                "Dry run: {} records would be deleted. Re-run with --apply to delete them.",
                candidates.len()
            ));
        } else if failed == 0 {
            Status::success(&format!("Deleted {deleted} records"));
        } else {
            Status::warning(&format!("Deleted {deleted} records, {failed} failed"));
        }
        println!();
    } else {
        let output = JsonCleanupOutput {
            entity: entity.name(),
            prefix,
            applied: apply,
            candidates,
            deleted,
            failed,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    if failed > 0 {
        bail!("{failed} records could not be deleted");
    }
    Ok(())
}
