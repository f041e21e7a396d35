use xtra_core::app::App;
use xtra_core::config::AppConfig;
use xtra_core::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let (logging_config, _guard) = logging::init_logging(&config.log_dir)?;
    if let Some(filter) = &config.log_filter {
        logging_config.set_filter(filter)?;
    }
    logging_config.cleanup_expired_logs().await;

    let app = App::init(config).await?;
    let resumed = app.downloads.resume_pending().await?;

    let videos = app.offline_videos.snapshot();
    let downloaded = videos.iter().filter(|v| v.downloaded).count();
    tracing::info!(
        videos = videos.len(),
        downloaded,
        pending = videos.len() - downloaded,
        resumed,
        bookmarks = app.bookmarks.snapshot().len(),
        api_pref = %String::from(app.config.api_prefs.default.clone()),
        "xtra initialized successfully"
    );

    Ok(())
}
