use anyhow::Result;

use feedsweep_core::{cleanup::run_cleanup, run::RunOptions, AppConfig};

use super::Session;

pub async fn run(config: &AppConfig, options: &RunOptions) -> Result<()> {
    let session = Session::open(config).await?;
    let outcome = run_cleanup(&session.context(), options).await;
    tracing::debug!("Cleanup finished: {:?}", outcome);
    Ok(())
}
