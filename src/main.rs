//! Headless ThreatLens sync session.
//!
//! Usage: `threatlens-sync [config.json]`. Frames are written to the log;
//! Ctrl-C ends the session.

use std::path::PathBuf;

use anyhow::Context;

use threatlens_sync::notify::TerminalBell;
use threatlens_sync::render::LogBackend;
use threatlens_sync::{init_logger, Driver, SyncConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = SyncConfig::load(path.as_deref()).context("loading configuration")?;

    let driver = Driver::new(
        &config,
        Box::new(LogBackend::default()),
        Box::new(TerminalBell),
    )
    .context("starting session")?;

    let dashboard = driver
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    let stats = dashboard.dispatch_stats();
    log::info!(
        "SESSION_ENDED session={} uptime_s={} handled={} dropped={}",
        dashboard.session().session_id,
        dashboard.session().uptime().num_seconds(),
        stats.handled,
        stats.dropped
    );
    Ok(())
}
