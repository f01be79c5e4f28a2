//! Entities command - list the collection catalog

use crate::output::banner;
use anyhow::Result;
use mes_api_client::Entity;
use owo_colors::OwoColorize;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct EntityDetail {
    name: &'static str,
    group: String,
    base_path: &'static str,
    code_route: &'static str,
    workflow: bool,
}

/// Run entities command
pub fn run(format: &str) -> Result<()> {
    if format == "json" {
        let details: Vec<EntityDetail> = Entity::ALL
            .iter()
            .map(|&entity| EntityDetail {
                name: entity.name(),
                group: entity.group().to_string(),
                base_path: entity.base_path(),
                code_route: entity.code_segment().as_str(),
                workflow: entity.has_workflow(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }

    banner("📚 API Collections");

    println!(
        "  {:<26} {:<12} {:<42} {:<8} {}",
        "Name".dimmed(),
        "Group".dimmed(),
        "Path".dimmed(),
        "Code".dimmed(),
        "Workflow".dimmed()
    );
    println!("  {}", "─".repeat(100).dimmed());

    for &entity in Entity::ALL {
        let workflow = if entity.has_workflow() {
            "✓".green().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<26} {:<12} {:<42} {:<8} {}",
            entity.name(),
            entity.group().to_string(),
            entity.base_path(),
            entity.code_segment().as_str(),
            workflow
        );
    }

    println!();
    println!("  {} collections", Entity::ALL.len().bold());
    println!();

    Ok(())
}
