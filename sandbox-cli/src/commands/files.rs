//! File list commands.

use anyhow::{Context as _, Result};

use super::{CliSession, Context};

/// Print the file list, marking the selected file.
pub async fn list(ctx: &Context) -> Result<()> {
    let session = ctx.open().await?;
    let project = session.snapshot().await;

    for (index, file) in project.files().iter().enumerate() {
        let marker = if index == project.current_index() { "*" } else { " " };
        println!(
            "{} {:>2}  {:<24} {:>6} bytes",
            marker,
            index,
            file.name,
            file.source.len()
        );
    }

    ctx.close(&session).await
}

/// Print the source of `name`, or of the selected file.
pub async fn show(ctx: &Context, name: Option<&str>) -> Result<()> {
    let session = ctx.open().await?;
    let project = session.snapshot().await;

    let file = match name {
        Some(name) => project
            .file(name)
            .with_context(|| format!("No file named {:?}", name))?,
        None => project.current_file(),
    };
    print!("{}", file.source);
    if !file.source.ends_with('\n') {
        println!();
    }

    ctx.close(&session).await
}

/// Add a file and select it. Without a name, the next `untitled-N.wgsl`.
pub async fn add(ctx: &Context, name: Option<&str>, source: Option<String>) -> Result<()> {
    let session = ctx.open().await?;

    let result = session
        .mutate(|p| match name {
            Some(name) => p.add_file(name, source.unwrap_or_default()),
            None => {
                let index = p.new_file();
                if let Some(source) = source {
                    p.set_source(index, source)?;
                }
                Ok(index)
            }
        })
        .await;
    ctx.close(&session).await?;

    let index = result.context("Failed to add file")?;
    let project = session.snapshot().await;
    println!("Added {}", project.files()[index].name);
    Ok(())
}

/// Remove a file.
pub async fn remove(ctx: &Context, name: &str) -> Result<()> {
    let session = ctx.open().await?;

    let result = session
        .mutate(|p| {
            let index = p
                .position(name)
                .ok_or_else(|| sandbox_core::ProjectError::NoSuchFile(name.to_string()))?;
            p.remove_file(index)
        })
        .await;
    ctx.close(&session).await?;

    let removed = result.context("Failed to remove file")?;
    println!("Removed {}", removed.name);
    Ok(())
}

/// Rename a file.
pub async fn rename(ctx: &Context, from: &str, to: &str) -> Result<()> {
    let session = ctx.open().await?;

    let result = session
        .mutate(|p| {
            let index = p
                .position(from)
                .ok_or_else(|| sandbox_core::ProjectError::NoSuchFile(from.to_string()))?;
            p.rename_file(index, to)
        })
        .await;
    ctx.close(&session).await?;

    result.context("Failed to rename file")?;
    println!("Renamed {} -> {}", from, to);
    Ok(())
}

/// Replace the source of `name`, or of the selected file.
pub async fn edit(ctx: &Context, name: Option<&str>, source: String) -> Result<()> {
    let session = ctx.open().await?;
    let result = set_source(&session, name, source).await;
    ctx.close(&session).await?;
    result
}

async fn set_source(session: &CliSession, name: Option<&str>, source: String) -> Result<()> {
    session
        .mutate(|p| {
            let index = match name {
                Some(name) => p
                    .position(name)
                    .ok_or_else(|| sandbox_core::ProjectError::NoSuchFile(name.to_string()))?,
                None => p.current_index(),
            };
            p.set_source(index, source)
        })
        .await
        .context("Failed to edit file")
}

/// Select a file by name.
pub async fn select(ctx: &Context, name: &str) -> Result<()> {
    let session = ctx.open().await?;
    let result = session.mutate(|p| p.select_name(name)).await;
    ctx.close(&session).await?;

    result.context("Failed to select file")?;
    println!("Selected {}", name);
    Ok(())
}
