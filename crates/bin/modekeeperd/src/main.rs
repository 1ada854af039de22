//! # modekeeperd — modekeeper daemon
//!
//! Composition root that wires all adapters together and runs the engines.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Install the `tracing` subscriber
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the stores, the signal bus and the virtual subsystems (adapters)
//! - Construct the override engine and the scheduled automation, injecting
//!   adapters via port traits
//! - Resume a session left active by a previous run
//! - Read console commands from stdin
//! - Handle graceful shutdown (Ctrl-C is delivered as a shutdown signal)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod command;
mod config;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use modekeeper_adapter_storage_sqlite_sqlx::SqliteKeyValueStore;
use modekeeper_adapter_virtual::{FixedTwilight, TracingNotificationSink, VirtualSubsystems};
use modekeeper_app::override_engine::OverrideEngine;
use modekeeper_app::ports::{BinarySetting, SystemClock};
use modekeeper_app::scheduled_automation::ScheduledAutomation;
use modekeeper_app::settings::{SettingKeys, StoredBinarySetting};
use modekeeper_app::signal_bus::SignalBus;
use modekeeper_domain::signal::Signal;

use crate::command::{Command, Usage};
use crate::config::Config;

type Engine = OverrideEngine<SqliteKeyValueStore, Arc<SignalBus>, Arc<TracingNotificationSink>>;
type Automation =
    ScheduledAutomation<StoredBinarySetting<SqliteKeyValueStore>, Arc<SignalBus>, SystemClock>;

/// Everything the console operates on.
struct Daemon {
    bus: Arc<SignalBus>,
    sink: Arc<TracingNotificationSink>,
    subsystems: VirtualSubsystems,
    engine: Arc<Engine>,
    automation: Arc<Automation>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = modekeeper_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;

    // Bus and adapters
    let bus = Arc::new(SignalBus::new());
    let sink = Arc::new(TracingNotificationSink::new());
    let subsystems = VirtualSubsystems::standard()?;

    // Override engine
    let mut builder = OverrideEngine::builder(
        config.mode.name.as_str(),
        SqliteKeyValueStore::try_new(db.pool().clone(), config.mode.namespace.as_str())?,
        Arc::clone(&bus),
        Arc::clone(&sink),
    )
    .triggers(config.triggers());
    for toggle in config.toggles()? {
        let capability = subsystems.capability(&toggle.id)?;
        builder = builder.toggle(toggle, capability);
    }
    let engine = Arc::new(builder.build()?);

    // Scheduled automation
    let keys = SettingKeys {
        mode: config.automation.mode_key.clone(),
        window: config.automation.window_key.clone(),
        active: config.automation.active_key.clone(),
    };
    let setting = StoredBinarySetting::new(
        SqliteKeyValueStore::try_new(db.pool().clone(), config.automation.namespace.as_str())?,
        keys,
    )
    .notify(Arc::clone(&bus));
    let (sunset, sunrise) = config.twilight()?;
    let automation = Arc::new(
        ScheduledAutomation::new(setting, Arc::clone(&bus), SystemClock)
            .with_twilight(FixedTwilight::new(sunset, sunrise)),
    );

    // Startup
    let state = engine.resume().await?;
    tracing::info!(mode = %engine.name(), ?state, "override engine ready");
    automation.subscribe();

    let engine_loop = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.run().await }
    });
    let automation_loop = tokio::spawn({
        let automation = Arc::clone(&automation);
        async move { automation.run().await }
    });

    let daemon = Daemon {
        bus,
        sink,
        subsystems,
        engine,
        automation,
    };
    daemon.console().await;
    daemon.shutdown().await;

    automation_loop.abort();
    engine_loop.abort();
    Ok(())
}

impl Daemon {
    /// Read commands until stdin closes, `quit`, or Ctrl-C.
    async fn console(&self) {
        eprintln!("modekeeperd ready, type `help` for commands");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => match line.parse::<Command>() {
                        Ok(Command::Quit) => break,
                        Ok(command) => self.execute(command).await,
                        Err(err) => eprintln!("{err}"),
                    },
                    Ok(None) => break,
                    Err(err) => {
                        tracing::error!(%err, "failed to read stdin");
                        break;
                    }
                },
                result = tokio::signal::ctrl_c() => {
                    if let Err(err) = result {
                        tracing::error!(%err, "failed to listen for ctrl-c");
                    }
                    break;
                }
            }
        }
    }

    async fn execute(&self, command: Command) {
        match command {
            Command::Activate => match self.engine.activate().await {
                Ok(report) if report.was_noop() => eprintln!("already active"),
                Ok(report) => eprintln!(
                    "active: {} applied, {} skipped, {} failed",
                    report.applied.len(),
                    report.skipped.len(),
                    report.failed.len()
                ),
                Err(err) => eprintln!("activate failed: {err}"),
            },
            Command::Deactivate => match self.engine.deactivate().await {
                Ok(report) if report.was_noop() => eprintln!("already inactive"),
                Ok(report) => eprintln!(
                    "inactive: {} restored, {} failed",
                    report.restored.len(),
                    report.failed.len()
                ),
                Err(err) => eprintln!("deactivate failed: {err}"),
            },
            Command::Toggle => match self.engine.toggle().await {
                Ok(state) => eprintln!("{state:?}"),
                Err(err) => eprintln!("toggle failed: {err}"),
            },
            Command::Status => self.status().await,
            Command::Stop => {
                if !self.sink.press_stop() {
                    eprintln!("no indicator shown");
                }
            }
            Command::Signal(signal) => {
                let delivered = self.bus.emit(&signal);
                eprintln!("{signal} delivered to {delivered} subscriber(s)");
            }
            Command::AutoMode(mode) => match self.automation.set_mode(mode).await {
                Ok(evaluation) => eprintln!("{evaluation:?}"),
                Err(err) => eprintln!("auto mode failed: {err}"),
            },
            Command::AutoWindow(window) => match self.automation.set_window_str(&window).await {
                Ok(evaluation) => eprintln!("{evaluation:?}"),
                Err(err) => eprintln!("auto window failed: {err}"),
            },
            Command::Help => eprintln!("{}", Usage),
            Command::Quit => {}
        }
    }

    async fn status(&self) {
        eprintln!("mode {:?}: {:?}", self.engine.name(), self.engine.state());
        for toggle in self.engine.toggles().await {
            eprintln!(
                "  {} [{}] -> {:?}",
                toggle.label,
                if toggle.enabled_by_user { "x" } else { " " },
                toggle.override_value
            );
        }
        for (id, reading) in self.subsystems.readings() {
            match reading {
                Ok(value) => eprintln!("  {id} = {value:?}"),
                Err(err) => eprintln!("  {id} unreadable: {err}"),
            }
        }
        match self.automation.setting().load().await {
            Ok(setting) => eprintln!(
                "automation {}: active={} next wake {:?}",
                setting.mode,
                setting.active,
                self.automation.next_wake()
            ),
            Err(err) => eprintln!("automation unreadable: {err}"),
        }
    }

    /// Deliver shutdown to every subscriber, then make sure the mode ended.
    async fn shutdown(&self) {
        tracing::info!("shutting down");
        self.bus.emit(&Signal::ShutdownInitiated);
        self.automation.unsubscribe();
        match self.engine.deactivate().await {
            Ok(report) if !report.was_noop() => {
                tracing::info!(restored = report.restored.len(), "mode reverted on shutdown");
            }
            Ok(_) => {}
            Err(err) => tracing::error!(%err, "failed to revert mode on shutdown"),
        }
    }
}
