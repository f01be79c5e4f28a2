//! Probe command - GET collections and report what came back

use crate::output::{banner, format_duration, progress_bar, Status};
use anyhow::{bail, Result};
use mes_api_client::{Entity, MesClient, Outcome};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Result of probing one collection
#[derive(Debug, Serialize)]
struct ProbeResult {
    entity: &'static str,
    path: &'static str,
    status: String,
    count: Option<usize>,
    elapsed_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip)]
    elapsed: Duration,
}

impl ProbeResult {
    fn is_ok(&self) -> bool {
        self.count.is_some()
    }
}

/// JSON output for the probe command
#[derive(Debug, Serialize)]
struct JsonProbeOutput<'a> {
    base_url: &'a str,
    total: usize,
    failed: usize,
    results: &'a [ProbeResult],
}

/// Run probe command
pub async fn run(client: &MesClient, selected: &[Entity], detailed: bool, format: &str) -> Result<()> {
    let entities = if selected.is_empty() {
        Entity::ALL
    } else {
        selected
    };

    let text = format != "json";
    let pb = progress_bar(entities.len() as u64, "Probing", text);

    let mut results = Vec::with_capacity(entities.len());
    for &entity in entities {
        pb.set_message(entity.name());
        results.push(probe(client, entity).await);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let failed = results.iter().filter(|r| !r.is_ok()).count();

    if text {
        print_table(client, &results, detailed);
    } else {
        let output = JsonProbeOutput {
            base_url: client.base_url(),
            total: results.len(),
            failed,
            results: &results,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    if failed > 0 {
        bail!("{failed} of {} endpoints failed", results.len());
    }
    Ok(())
}

async fn probe(client: &MesClient, entity: Entity) -> ProbeResult {
    let start = Instant::now();
    let outcome: Outcome<Vec<Value>> = client.entity(entity).get_all().await;
    let elapsed = start.elapsed();

    let (status, count, message) = match outcome {
        Outcome::Success(items) => ("OK".to_string(), Some(items.len()), None),
        Outcome::Failure(failure) => (failure.code.to_string(), None, Some(failure.message)),
    };

    ProbeResult {
        entity: entity.name(),
        path: entity.base_path(),
        status,
        count,
        elapsed_ms: elapsed.as_millis(),
        message,
        elapsed,
    }
}

fn print_table(client: &MesClient, results: &[ProbeResult], detailed: bool) {
    banner("🔎 Endpoint Probe");
    println!("  {} {}", "Base URL:".dimmed(), client.base_url());
    println!();

    println!(
        "  {:<26} {:<36} {:>7} {:>9}  {}",
        "Entity".dimmed(),
        "Path".dimmed(),
        "Items".dimmed(),
        "Time".dimmed(),
        "Status".dimmed()
    );
    println!("  {}", "─".repeat(96).dimmed());

    for result in results {
        let count = result.count.map_or_else(|| "-".to_string(), |c| c.to_string());
        let status = if result.is_ok() {
            "✓ OK".green().to_string()
        } else {
            format!("✗ {}", result.status).red().to_string()
        };

        println!(
            "  {:<26} {:<36} {:>7} {:>9}  {}",
            result.entity,
            result.path,
            count,
            format_duration(result.elapsed),
            status
        );

        if detailed {
            if let Some(message) = &result.message {
                println!("    └─ {}", message.dimmed());
            }
        }
    }

    let failed = results.iter().filter(|r| !r.is_ok()).count();
    println!();
    if failed == 0 {
        Status::success(&format!("All {} endpoints responded", results.len()));
    } else {
        Status::warning(&format!("{failed} of {} endpoints failed", results.len()));
    }
    println!();
}
