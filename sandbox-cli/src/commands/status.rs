//! Show sandbox status.

use anyhow::Result;
use sandbox_client::Navigator;

use super::{Context, STORE_DIR};

/// Run the status command.
pub async fn run(ctx: &Context) -> Result<()> {
    println!("=== sandbox-cli status ===");
    println!();

    println!("Data:");
    println!("  Directory: {}", ctx.data_dir.display());
    println!("  Store:     {}", ctx.data_dir.join(STORE_DIR).display());
    println!();

    println!("Share service:");
    if ctx.mock {
        println!("  URL:     (mock, in-process)");
    } else {
        println!("  URL:     {}", ctx.config.share_url);
    }
    println!("  Timeout: {}s", ctx.config.timeout_secs);
    println!();

    let session = ctx.open().await?;
    let project = session.snapshot().await;

    println!("Project:");
    println!("  Linker:   {}", project.linker().as_str());
    println!("  Files:    {}", project.files().len());
    println!("  Selected: {}", project.current_file().name);
    match session.active_handle().await {
        Some(handle) => println!("  Shared:   {} ({})", handle, handle.to_path()),
        None => println!("  Shared:   no"),
    }
    println!("  Location: {}", session.navigator().current());

    ctx.close(&session).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;

    #[tokio::test]
    async fn status_runs_on_fresh_directory() {
        let (dir, ctx) = context();
        run(&ctx).await.unwrap();
        assert!(dir.path().join(crate::config::STATE_FILE).exists());
    }
}
