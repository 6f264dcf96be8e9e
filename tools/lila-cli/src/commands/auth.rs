//! Session management.

use anyhow::{Context as _, Result};
use dialoguer::Password;

use super::LoginArgs;
use crate::context::Context;

/// Run the login command.
pub async fn login(args: LoginArgs, ctx: &Context) -> Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => Password::new()
            .with_prompt(format!("Password for {}", args.email))
            .interact()
            .context("Failed to read password")?,
    };

    let api = ctx.api()?;
    let spinner = ctx.output.spinner("Signing in...");
    let result = api.auth().login(&args.email, &password).await;
    spinner.finish_and_clear();
    let profile = result.context("Login failed")?;

    if ctx.output.is_json() {
        ctx.output.json(&profile);
        return Ok(());
    }

    ctx.output.success(&format!("Signed in as {}", profile.display_name()));
    ctx.output.kv("Role", profile.role.as_str());
    ctx.output
        .kv("Session", &ctx.config.storage.resolved_path().display().to_string());
    Ok(())
}

/// Run the logout command.
pub async fn logout(ctx: &Context) -> Result<()> {
    let api = ctx.api()?;
    if !api.is_signed_in() {
        ctx.output.info("Not signed in");
        return Ok(());
    }

    api.auth().logout().await.context("Logout failed")?;
    ctx.output.success("Signed out");
    Ok(())
}
