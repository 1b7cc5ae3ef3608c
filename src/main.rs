use anyhow::Context;
use artisan_sync::config::settings::{DataPaths, StoreSettings};
use artisan_sync::config::toml_config::SyncConfig;
use artisan_sync::config::LogFormat;
use artisan_sync::utils::{logger, validation::Validate};
use artisan_sync::{
    load_datasets, CliConfig, Command, FirestoreStore, InMemoryStore, LocalStorage, SyncEngine,
    SyncError,
};
use clap::Parser;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    match config.log_format {
        LogFormat::Text => logger::init_cli_logger(config.verbose),
        LogFormat::Json => logger::init_json_logger(config.verbose),
    }

    tracing::info!("Starting artisan-sync");
    tracing::debug!(
        "Command token: {:?}, config file: {:?}, dry run: {}",
        config.command,
        config.config,
        config.dry_run
    );

    let command = Command::from_token(config.command.as_deref());

    if let Err(e) = run(&config, command).await {
        tracing::error!("❌ {:#}", e);
        match e.downcast_ref::<SyncError>() {
            Some(sync_error) => {
                eprintln!("❌ {}", sync_error.user_friendly_message());
                eprintln!("💡 {}", sync_error.recovery_suggestion());
            }
            None => eprintln!("❌ {:#}", e),
        }
        std::process::exit(1);
    }

    // Per-record and per-phase failures were already logged; they never
    // change the exit status.
    std::process::exit(0);
}

async fn run(config: &CliConfig, command: Command) -> anyhow::Result<()> {
    let file = match &config.config {
        Some(path) => {
            tracing::info!("📁 Loading settings from {}", path);
            let file = SyncConfig::from_file(path)
                .with_context(|| format!("failed to load settings file '{}'", path))?;
            file.validate()?;
            Some(file)
        }
        None => None,
    };

    let overrides = config.overrides();
    let paths = DataPaths::resolve(&overrides, file.as_ref())?;

    // Datasets are read before dispatch, so a missing file stops every command.
    let storage = LocalStorage::new(".".to_string());
    let datasets = load_datasets(&storage, &paths).await?;

    let mut stdout = std::io::stdout().lock();

    if config.dry_run || !command.touches_store() {
        if config.dry_run {
            tracing::warn!("🧪 Dry run: using an in-memory store, nothing is sent to Firestore");
        }
        let engine = SyncEngine::new(InMemoryStore::new(), datasets);
        engine.run(command, &mut stdout).await;
        return Ok(());
    }

    let settings = StoreSettings::resolve(&overrides, file.as_ref())?;
    tracing::info!(
        "🔗 Using project '{}' database '{}' at {}{}",
        settings.project_id,
        settings.database,
        settings.endpoint,
        if settings.emulator { " (emulator)" } else { "" }
    );

    let store = FirestoreStore::new(&settings)?;
    let engine = SyncEngine::new(store, datasets);
    engine.run(command, &mut stdout).await;
    Ok(())
}
