use anyhow::Result;

use feedsweep_core::{
    filter::{load_filters, FilterSource},
    report::ConsoleReporter,
    AppConfig,
};

pub async fn run(config: &AppConfig) -> Result<()> {
    let source = FilterSource::from_config(&config.filters);
    match &source {
        FilterSource::File(path) => eprintln!("Filters from {}", path.display()),
        FilterSource::Gist { id, .. } => eprintln!("Filters from gist {}", id),
    }

    let filters = load_filters(&source, &ConsoleReporter::new()).await;
    println!("{}", serde_json::to_string_pretty(&filters)?);

    if !filters.has_cleanup_filters() && !filters.has_save_filters() {
        eprintln!("No active filters.");
    }
    Ok(())
}
