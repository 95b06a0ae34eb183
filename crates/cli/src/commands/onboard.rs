//! `leadbot onboard`: first-time setup.

use anyhow::Context;
use leadbot_config::AppConfig;

pub async fn run() -> anyhow::Result<()> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("Leadbot: first-time setup");
    println!("=========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("creating {}", config_dir.display()))?;
        println!("Created config directory: {}", config_dir.display());
    } else {
        println!("Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\nConfig already exists at: {}", config_path.display());
        println!("Edit it manually or delete it and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())
            .with_context(|| format!("writing {}", config_path.display()))?;
        println!("Created config.toml at: {}", config_path.display());
    }

    let config = AppConfig::load_from(&config_path).context("loading the new config")?;
    let data_dir = &config.storage.data_dir;
    if !data_dir.exists() {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("creating {}", data_dir.display()))?;
        println!("Created data directory: {}", data_dir.display());
    }

    println!("\nNext steps:");
    println!("  1. Set LEADBOT_API_KEY (or GROQ_API_KEY), or add api_key under [provider]");
    println!("  2. Fill in the [company] section of {}", config_path.display());
    println!("  3. Run: leadbot chat\n");

    Ok(())
}
