//! `leadbot submit`: record a lead without going through the model.

use anyhow::{Context, bail};
use leadbot_config::AppConfig;
use leadbot_core::tool::ToolArgs;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum LeadKind {
    /// A service inquiry (name, email, phone, subject, message)
    Inquiry,
    /// A job application (name, email, phone, resume_file)
    Application,
}

impl LeadKind {
    fn tool_name(self) -> &'static str {
        match self {
            LeadKind::Inquiry => "submit_service_inquiry",
            LeadKind::Application => "submit_job_application",
        }
    }
}

pub async fn run(kind: LeadKind, data: &str) -> anyhow::Result<()> {
    let args: ToolArgs = match serde_json::from_str(data).context("--data must be JSON")? {
        serde_json::Value::Object(map) => map,
        other => bail!("--data must be a JSON object, got: {other}"),
    };

    let config = AppConfig::load().context("Failed to load config")?;
    let registry = leadbot_tools::default_registry(
        Arc::new(config.company.clone()),
        &config.storage.data_dir,
    )?;

    let output = registry.dispatch(kind.tool_name(), args).await?;
    match output.as_value() {
        Some(value) => println!("{}", serde_json::to_string_pretty(value)?),
        None => println!("{}", output.to_content()),
    }
    Ok(())
}
