use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    anyhow::Context,
    clap::Parser,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    cloudtune_media::{TranscodeJob, YtdlpSource, workdir},
    cloudtune_pipeline::Orchestrator,
    cloudtune_store::{PcloudStore, RemoteStore},
    cloudtune_telegram::BotContext,
};

#[derive(Parser)]
#[command(name = "cloudtune", about = "YouTube to MP3 relay into pCloud")]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Load environment variables from this file instead of `./.env`.
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("loading env file {}", path.display()))?;
        },
        None => {
            dotenvy::dotenv().ok();
        },
    }

    init_logging(&cli);

    let config = cloudtune_config::from_env().context("reading configuration")?;

    workdir::ensure_workdir(&config.media.temp_dir).with_context(|| {
        format!("creating temp directory {}", config.media.temp_dir.display())
    })?;

    // Provision the remote base folder up front; a misconfigured store
    // should abort startup, not surface on the first request.
    let store = Arc::new(PcloudStore::new(
        config.pcloud.username.clone(),
        config.pcloud.password.clone(),
    ));
    let base_segments: Vec<&str> = config.pcloud.base_folder.split('/').collect();
    store
        .ensure_path(&base_segments)
        .await
        .context("provisioning pCloud base folder")?;
    info!(base_folder = %config.pcloud.base_folder, "pCloud base folder ready");

    let source = Arc::new(YtdlpSource::new(
        &config.media.ytdlp_path,
        &config.media.ffmpeg_path,
    ));
    let orchestrator = Arc::new(Orchestrator::new(
        config.telegram.allowed_user_ids.clone(),
        config.pcloud.base_folder.clone(),
        source,
        Arc::clone(&store) as Arc<dyn RemoteStore>,
        TranscodeJob::new(&config.media.temp_dir),
    ));

    let ctx = Arc::new(BotContext {
        orchestrator,
        allow_list: config.telegram.allowed_user_ids.clone(),
        temp_dir: config.media.temp_dir.clone(),
        cleanup_max_age: Duration::from_secs(config.media.cleanup_older_than_hours * 3600),
    });

    let cancel = cloudtune_telegram::start_polling(&config.telegram.token, ctx)
        .await
        .context("starting telegram polling")?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
            cancel.cancel();
        },
        () = cancel.cancelled() => {
            warn!("polling loop stopped on its own, exiting");
        },
    }

    Ok(())
}

fn init_logging(cli: &Cli) {
    // RUST_LOG wins when set; --log-level covers the common case.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}
