//! Get command - raw GET through the client pipeline

use anyhow::Result;
use mes_api_client::{MesClient, Outcome};
use serde_json::Value;

/// Run get command
pub async fn run(client: &MesClient, path: &str, format: &str) -> Result<()> {
    let outcome: Outcome<Value> = client.get(path).await;

    match outcome {
        Outcome::Success(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Outcome::Failure(failure) => {
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&failure.to_report())?);
            }
            Err(failure.into())
        }
    }
}
