//! Configuration management.

use std::fs;

use anyhow::{bail, Context as _, Result};
use lila_client::ClientConfig;

use super::{ConfigArgs, ConfigCommand};
use crate::context::{Context, CONFIG_NAMES};

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Init { force } => init(force, ctx),
        ConfigCommand::Validate => validate(ctx),
    }
}

fn show(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    match &ctx.config_path {
        Some(path) => ctx.output.header(&format!("Configuration ({})", path.display())),
        None => ctx.output.header("Configuration (defaults and environment)"),
    }
    println!("{}", ctx.config.to_toml_string()?);
    Ok(())
}

fn init(force: bool, ctx: &Context) -> Result<()> {
    let path = ctx.cwd.join(CONFIG_NAMES[0]);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let content = ClientConfig::default().to_toml_string()?;
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    ctx.output.success(&format!("Created {}", path.display()));
    Ok(())
}

fn validate(ctx: &Context) -> Result<()> {
    // Loading already validated the file; re-check in case env overrides changed it.
    ctx.config.validate()?;
    let clock = ctx.config.clock()?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "valid": true,
            "path": ctx.config_path,
            "baseUrl": ctx.config.api.base_url,
        }));
        return Ok(());
    }

    match &ctx.config_path {
        Some(path) => ctx.output.success(&format!("{} is valid", path.display())),
        None => ctx.output.success("No config file found; defaults are valid"),
    }
    ctx.output.kv("API", &ctx.config.api.base_url);
    ctx.output.kv("Store day offset", &clock.offset().to_string());
    ctx.output.kv(
        "Chat polling",
        &format!(
            "messages {}s, unread {}s, conversations {}s",
            ctx.config.chat.message_poll_secs,
            ctx.config.chat.unread_poll_secs,
            ctx.config.chat.conversation_poll_secs
        ),
    );
    Ok(())
}
