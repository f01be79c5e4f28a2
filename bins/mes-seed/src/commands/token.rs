//! Token command - acquire a token for the configured service identity

use crate::output::{banner, format_duration, Status};
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use mes_api_client::MesClient;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::time::Instant;

/// JSON output for the token command
#[derive(Debug, Serialize)]
struct JsonTokenOutput {
    user_id: String,
    company_id: Option<i64>,
    token_preview: String,
    expires_at: Option<DateTime<Utc>>,
    elapsed_ms: u128,
}

/// Run token command
pub async fn run(client: &MesClient, format: &str) -> Result<()> {
    let tokens = client.require_tokens()?;
    let company_id = client
        .company_id()
        .or(client.config().auth.default_company_id);

    let start = Instant::now();
    let token = match tokens.get_token(company_id).await {
        Ok(token) => token,
        Err(e) if e.is_unreachable() => {
            bail!("API unreachable at {}: {e}", tokens.token_url())
        }
        Err(e) => return Err(e.into()),
    };
    let elapsed = start.elapsed();
    let expires_at = tokens.cached().map(|cached| cached.expires_at());

    if format == "json" {
        let output = JsonTokenOutput {
            user_id: client.config().auth.seeding_user_id.clone(),
            company_id,
            token_preview: preview(&token),
            expires_at,
            elapsed_ms: elapsed.as_millis(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    banner("🔑 API Token");

    println!("  {:<12} {}", "Endpoint:".dimmed(), tokens.token_url());
    println!("  {:<12} {}", "User:".dimmed(), client.config().auth.seeding_user_id);
    println!(
        "  {:<12} {}",
        "Company:".dimmed(),
        company_id.map_or_else(|| "-".to_string(), |id| id.to_string())
    );
    println!("  {:<12} {}", "Token:".dimmed(), preview(&token));

    if let Some(expires_at) = expires_at {
        let remaining = expires_at - Utc::now();
        println!(
            "  {:<12} {} ({} min left)",
            "Expires:".dimmed(),
            expires_at.format("%Y-%m-%d %H:%M:%S UTC"),
            remaining.num_minutes()
        );
    }

    println!();
    Status::success(&format!("Token acquired in {}", format_duration(elapsed)));
    println!();

    Ok(())
}

/// First characters of a token, enough to tell tokens apart
fn preview(token: &str) -> String {
    let head: String = token.chars().take(12).collect();
    if head.len() < token.len() {
        format!("{head}…")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview("eyJhbGciOiJIUzI1NiJ9.payload"), "eyJhbGciOiJI…");
        assert_eq!(preview("short"), "short");
    }
}
