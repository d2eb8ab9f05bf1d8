use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

use gameport_engine::storage::{DocumentStore, FileStore, MemoryStore, PersistSink};
use gameport_engine::{Config, Engine};

type SharedEngine = Arc<Mutex<Engine>>;

fn init_tracing(format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let mut config = Config::from_env();
    if std::env::args().skip(1).any(|a| a == "--ephemeral") {
        config.storage.ephemeral = true;
    }
    init_tracing(&config.log_format);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(Arc::new(config)))
}

async fn run(config: Arc<Config>) -> Result<(), Box<dyn std::error::Error>> {
    let store: Arc<dyn DocumentStore> = if config.storage.ephemeral {
        tracing::warn!("ephemeral mode: nothing will survive a restart");
        Arc::new(MemoryStore::new())
    } else {
        let store = FileStore::open(&config.storage.data_dir)?;
        tracing::info!(dir = %store.dir().display(), "using file storage");
        Arc::new(store)
    };

    let (sink, writer) = PersistSink::write_behind(store.clone());
    let mut engine = Engine::open(config.clone(), store.as_ref(), sink);
    if let Some(user) = engine.restore_session(Utc::now()) {
        tracing::info!(user_id = %user.id, name = %user.name, "auto-login");
        if let Some(popup) = engine.take_popup() {
            tracing::info!(title = %popup.title, message = %popup.message, "announcement");
        }
    }
    let availability = engine.availability();
    tracing::info!(
        status = ?availability.status,
        next_opening = ?availability.next_opening,
        "GamePort engine initialized"
    );

    let engine: SharedEngine = Arc::new(Mutex::new(engine));
    let backup = tokio::spawn(backup_loop(
        engine.clone(),
        Duration::from_secs(config.timers.backup_interval_secs.max(1)),
    ));
    let schedule = tokio::spawn(schedule_loop(
        engine.clone(),
        Duration::from_secs(config.timers.scheduler_interval_secs.max(1)),
    ));

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");

    backup.abort();
    schedule.abort();
    let _ = backup.await;
    let _ = schedule.await;

    {
        let engine = engine.lock().await;
        engine.snapshot_backup();
    }
    // last handle: dropping the engine closes the write queue
    drop(engine);
    writer.await?;
    tracing::info!("all writes flushed");
    Ok(())
}

async fn backup_loop(engine: SharedEngine, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        engine.lock().await.snapshot_backup();
    }
}

async fn schedule_loop(engine: SharedEngine, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let mut engine = engine.lock().await;
        if engine.refresh_availability(Utc::now()) {
            let stats = engine.stats();
            tracing::info!(
                open = engine.is_access_open(),
                users = stats.users,
                online = stats.online_users,
                "availability changed"
            );
        }
    }
}
