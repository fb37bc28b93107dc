use anyhow::Result;

use feedsweep_core::{cleanup::run_cleanup, run::RunOptions, save::run_save, AppConfig};

use super::Session;

pub async fn run(config: &AppConfig, options: &RunOptions) -> Result<()> {
    let session = Session::open(config).await?;
    let ctx = session.context();

    let cleanup = run_cleanup(&ctx, options).await;
    tracing::debug!("Cleanup finished: {:?}", cleanup);

    println!();

    let save = run_save(&ctx, options).await;
    tracing::debug!("Save finished: {:?}", save);
    Ok(())
}
