//! `leadbot tools`: print the function-calling schemas.

use anyhow::Context;
use leadbot_config::AppConfig;
use std::sync::Arc;

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let registry = leadbot_tools::default_registry(
        Arc::new(config.company.clone()),
        &config.storage.data_dir,
    )?;

    let wire: Vec<serde_json::Value> = registry
        .schema_for_all()
        .into_iter()
        .map(|def| serde_json::json!({ "type": "function", "function": def }))
        .collect();

    println!("{}", serde_json::to_string_pretty(&wire)?);
    Ok(())
}
