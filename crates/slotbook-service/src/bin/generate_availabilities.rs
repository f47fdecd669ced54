use slotbook_core::config::load_config;
use slotbook_db::db::connection::build_pool;
use slotbook_db::db::migrate::run_migrations;
use slotbook_db::repository::PgStore;
use slotbook_service::scheduling::SchedulingService;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting availability generation");

    let config = load_config()?;

    tracing::info!(scheduling = ?config.scheduling, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    run_migrations(&config.database.url).await?;

    let pool = build_pool(
        &config.database.url,
        u32::from(config.database.max_connections),
    )
    .await?;

    let service = SchedulingService::new(PgStore::new(pool), config.scheduling);
    let result = service.extend_active_schedules().await?;

    tracing::info!(
        schedules = result.schedules,
        failed = result.failed,
        generated = result.generated_count,
        skipped = result.skipped_count,
        "Availability generation finished"
    );

    if result.failed > 0 {
        anyhow::bail!("{} of {} schedules failed to extend", result.failed, result.schedules);
    }

    Ok(())
}
