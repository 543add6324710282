use catalog_mirror::{CatalogMirror, RunOutcome};
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    init_logging();
    info!("Starting catalog mirror");

    let mirror = match CatalogMirror::builder().build() {
        Ok(mirror) => mirror,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return;
        }
    };
    info!("{mirror}");

    let summary = mirror.run();
    match &summary.outcome {
        RunOutcome::Done => info!(
            pages = summary.pages,
            products = summary.products,
            "Catalog mirror updated"
        ),
        RunOutcome::Aborted(reason) => warn!(
            pages = summary.pages,
            products = summary.products,
            url = %summary.last_url,
            %reason,
            "Stopped early; the next run resumes from the checkpoint"
        ),
    }
}

fn init_logging() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {e}");
    }
}
