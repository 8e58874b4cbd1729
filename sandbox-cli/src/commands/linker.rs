//! Linker and options commands.

use anyhow::{Context as _, Result};
use sandbox_types::Linker;

use super::Context;

/// Show the active linker, or switch to `name`.
pub async fn run(ctx: &Context, name: Option<&str>) -> Result<()> {
    let session = ctx.open().await?;

    let result = match name {
        None => {
            let active = session.snapshot().await.linker();
            for linker in Linker::ALL {
                let marker = if linker == active { "*" } else { " " };
                println!("{} {}", marker, linker.as_str());
            }
            Ok(())
        }
        Some(name) => match Linker::parse(name) {
            Some(linker) => {
                session.mutate(|p| p.set_linker(linker)).await;
                println!("Linker: {}", linker.as_str());
                Ok(())
            }
            None => Err(anyhow::anyhow!(
                "Unknown linker {:?} (expected one of: {})",
                name,
                linker_names()
            )),
        },
    };

    ctx.close(&session).await?;
    result
}

/// Set one option of `linker`, or of the active linker.
pub async fn set_option(ctx: &Context, linker: Option<&str>, key: &str, value: &str) -> Result<()> {
    let linker = parse_linker(linker)?;
    let session = ctx.open().await?;

    let result = session
        .mutate(|p| {
            let linker = linker.unwrap_or(p.linker());
            p.set_option(linker, key, value).map(|()| linker)
        })
        .await;
    ctx.close(&session).await?;

    let linker = result.context("Failed to set option")?;
    let project = session.snapshot().await;
    println!("{}.{} = {}", linker.as_str(), key, project.options_value(linker)[key]);
    Ok(())
}

/// Print the options record of `linker`, or of the active linker.
pub async fn show_options(ctx: &Context, linker: Option<&str>) -> Result<()> {
    let linker = parse_linker(linker)?;
    let session = ctx.open().await?;
    let project = session.snapshot().await;

    let linker = linker.unwrap_or(project.linker());
    let pretty = serde_json::to_string_pretty(&project.options_value(linker))?;
    println!("{}", pretty);

    ctx.close(&session).await
}

fn parse_linker(name: Option<&str>) -> Result<Option<Linker>> {
    name.map(|name| {
        Linker::parse(name).with_context(|| {
            format!(
                "Unknown linker {:?} (expected one of: {})",
                name,
                linker_names()
            )
        })
    })
    .transpose()
}

fn linker_names() -> String {
    Linker::ALL
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
