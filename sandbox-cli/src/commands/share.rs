//! Publish, load and permalink commands.

use anyhow::{Context as _, Result};
use sandbox_client::{Navigation, PageLocation, FILES_KEY, LINKER_KEY};
use sandbox_core::codec;
use sandbox_types::{salvage_value, Linker, ShareHandle};
use serde_json::{json, Value};
use url::Url;

use super::{CliSession, Context};

/// Publish the project and print the issued handle.
pub async fn publish(ctx: &Context) -> Result<()> {
    let session = ctx.open().await?;
    let result = session.publish().await;
    ctx.close(&session).await?;

    let handle = result.context("Publish failed")?;
    println!("Published: {}", handle);
    println!("Path:      {}", handle.to_path());
    if let Ok(url) = Url::parse(&ctx.config.page_url).and_then(|base| base.join(&handle.to_path())) {
        println!("URL:       {}", url);
    }
    Ok(())
}

/// What a `load` target resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    /// A share to fetch.
    Share(String),
    /// A permalink carrying project tokens.
    Tokens(PageLocation),
}

fn resolve_target(target: &str) -> Result<Target> {
    let target = target.trim();
    if let Ok(handle) = ShareHandle::parse(target) {
        return Ok(Target::Share(handle.to_path()));
    }

    let location = PageLocation::parse(target)
        .with_context(|| format!("Not a URL, path or share handle: {:?}", target))?;
    if let Some(handle) = location.handle() {
        return Ok(Target::Share(handle.to_path()));
    }
    if location.token(FILES_KEY).is_some() || location.token(LINKER_KEY).is_some() {
        return Ok(Target::Tokens(location));
    }
    anyhow::bail!("{:?} names no share and carries no project", target)
}

/// Load a share (URL, `/s/<handle>` path or bare handle) or a permalink.
pub async fn load(ctx: &Context, target: &str) -> Result<()> {
    let target = resolve_target(target)?;
    let session = ctx.open().await?;

    let result = match &target {
        Target::Share(path) => session.visit(path).await.map_err(anyhow::Error::from),
        Target::Tokens(location) => import_tokens(&session, location).await,
    };
    ctx.close(&session).await?;

    match result.context("Load failed")? {
        Navigation::Loaded(handle) => println!("Loaded {}", handle),
        Navigation::Cleared => println!("Loaded project from link"),
        Navigation::Superseded => {}
    }
    let project = session.snapshot().await;
    println!(
        "{} file(s), linker {}",
        project.files().len(),
        project.linker().as_str()
    );
    Ok(())
}

/// Replace the project with what a permalink's tokens describe.
///
/// Tokens that are absent or unreadable keep the current value, so a link
/// that only carries `files` leaves the linker and options alone.
async fn import_tokens(session: &CliSession, location: &PageLocation) -> Result<Navigation> {
    let current = session.snapshot().await;

    let files = location
        .token(FILES_KEY)
        .and_then(|token| decode_token(FILES_KEY, token))
        .unwrap_or_else(|| json!(current.files()));

    let linker = location
        .token(LINKER_KEY)
        .and_then(|token| decode_token(LINKER_KEY, token))
        .and_then(|value| value.as_str().and_then(Linker::parse))
        .unwrap_or(current.linker());

    let options = location
        .token(linker.options_key())
        .and_then(|token| decode_token(linker.options_key(), token))
        .unwrap_or_else(|| current.options_value(linker));

    let loaded = salvage_value(json!({
        "files": files,
        "linker": linker.as_str(),
        "options": options,
    }))
    .context("Link carries no usable files")?;

    session.mutate(|p| p.apply_loaded(loaded)).await;
    Ok(Navigation::Cleared)
}

fn decode_token(key: &str, token: &str) -> Option<Value> {
    match codec::decode_json(token) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring link token");
            None
        }
    }
}

/// Print a permalink that reproduces the project.
pub async fn link(ctx: &Context, base: Option<&str>) -> Result<()> {
    let base = base.unwrap_or(&ctx.config.page_url);
    let base = Url::parse(base).with_context(|| format!("Invalid base URL {:?}", base))?;

    let session = ctx.open().await?;
    let url = session.permalink(&base).await;
    ctx.close(&session).await?;

    println!("{}", url.context("Failed to build link")?);
    Ok(())
}
