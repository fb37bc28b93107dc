use anyhow::Result;

use feedsweep_core::{run::RunOptions, save::run_save, AppConfig};

use super::Session;

pub async fn run(config: &AppConfig, options: &RunOptions) -> Result<()> {
    let session = Session::open(config).await?;
    let outcome = run_save(&session.context(), options).await;
    tracing::debug!("Save finished: {:?}", outcome);
    Ok(())
}
