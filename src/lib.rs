pub mod analysis;
pub mod api;
pub mod auth;
pub mod capture;
pub mod db;
pub mod http;
pub mod models;
pub mod sampling;
pub mod session;
pub mod settings;
pub mod state;
mod utils;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use log::{info, warn};

use analysis::{EmotionClient, HttpEmotionClient, HttpFocusClient};
use api::HttpSessionApi;
use auth::{IdentityHandle, Principal};
use capture::FrameFileSource;
use db::Database;
use sampling::Pipeline;
use session::{recover_unfinished, SessionConfig, SessionController};
use settings::SettingsStore;

fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("STUDYSYNC_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|dir| dir.join("studysync"))
        .context("no data directory available; set STUDYSYNC_DATA_DIR")
}

fn init_logging() {
    let debug = std::env::var("STUDYSYNC_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // RUST_LOG still wins for anything it names.
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Runs one study session from the command line until Ctrl-C or the
/// configured time limit.
pub async fn run() -> Result<()> {
    init_logging();
    info!("StudySync starting up...");

    let data_dir = data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;

    let settings = SettingsStore::new(data_dir.join("settings.json"))?.current();
    let journal = Database::new(data_dir.join("journal.sqlite3"))?;
    let session_api = Arc::new(HttpSessionApi::new(
        &settings.focus_base_url,
        settings.request_timeout(),
    ));

    // Close whatever a previous run left open before opening anything new.
    match recover_unfinished(&journal, session_api.as_ref()).await {
        Ok(report) if report.closed + report.still_pending > 0 => info!(
            "Journal recovery: {} closed, {} still pending",
            report.closed, report.still_pending
        ),
        Ok(_) => {}
        Err(err) => warn!("Journal recovery failed: {err:#}"),
    }

    let emotion = Arc::new(HttpEmotionClient::new(
        &settings.emotion_base_url,
        settings.request_timeout(),
    ));
    if let Err(err) = emotion.health().await {
        warn!("Emotion service at {} not healthy: {err}", settings.emotion_base_url);
    }

    let frame_path = settings
        .frame_path
        .clone()
        .unwrap_or_else(|| data_dir.join("frame.jpg"));
    if !frame_path.exists() {
        warn!(
            "No frame at {} yet; ticks are skipped until one appears",
            frame_path.display()
        );
    }

    let pipeline = Pipeline {
        capture: Arc::new(FrameFileSource::new(frame_path).with_jpeg_quality(settings.jpeg_quality)),
        focus: Arc::new(HttpFocusClient::new(
            &settings.focus_base_url,
            settings.request_timeout(),
        )),
        emotion,
    };

    let identity = match settings.principal.as_deref() {
        Some(uid) => IdentityHandle::signed_in(Principal::new(uid)),
        None => IdentityHandle::default(),
    };

    let controller = SessionController::new(
        session_api,
        Arc::new(identity),
        pipeline,
        SessionConfig::from_settings(&settings),
    )
    .with_journal(journal);
    let identity_watch = controller.watch_identity();

    let session = controller.start().await?;
    info!("Sampling session {} every {}ms", session.id, settings.sample_period_ms);

    let mut live_rx = controller.subscribe();
    let render = tokio::spawn(async move {
        while live_rx.changed().await.is_ok() {
            let Some(state) = live_rx.borrow_and_update().clone() else {
                continue;
            };
            info!(
                "[{}] focused={} emotion={} ({:.0}%) -> {}",
                state.observed_at.format("%H:%M:%S"),
                state
                    .focused
                    .map(|focused| if focused { "yes" } else { "no" })
                    .unwrap_or("?"),
                state.emotion.map(|e| e.as_str()).unwrap_or("?"),
                state.confidence * 100.0,
                state.derived_label
            );
        }
    });

    match settings.max_session_secs {
        Some(secs) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Interrupted"),
                _ = tokio::time::sleep(Duration::from_secs(secs)) => info!("Time limit reached"),
            }
        }
        None => {
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for Ctrl-C")?;
            info!("Interrupted");
        }
    }

    identity_watch.abort();
    let result = controller.stop().await;
    render.abort();

    for entry in controller.history() {
        println!(
            "{}  {:<22} {:>5.2}  focused={:?}",
            entry.timestamp.format("%H:%M:%S"),
            entry.state.derived_label.to_string(),
            entry.state.confidence,
            entry.state.focused
        );
    }

    let report = result?;
    println!(
        "Session {} ended: {:.1} min, attention {:.1}, take a {} min break",
        report.session.id,
        report.summary.total_duration.unwrap_or_default(),
        report.summary.average_attention_score.unwrap_or_default(),
        report.summary.recommended_break_duration.unwrap_or(5)
    );
    Ok(())
}
