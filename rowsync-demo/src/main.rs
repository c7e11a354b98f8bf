//! rowsync demo host — entry point.
//!
//! ```text
//! rowsync-demo                    Connect with defaults
//! rowsync-demo --config <path>    Use custom config TOML
//! rowsync-demo --editor <addr>    Override the editor address
//! rowsync-demo --gen-config       Dump default config and exit
//! ```
//!
//! Connects to a running Rocket-style editor, registers a few tracks,
//! and runs a frame loop that advances the playback row and logs the
//! sampled track values. Stands in for a real render/audio loop.

mod config;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use rowsync_core::{EditorConnection, SessionHandler, SyncSession};

use config::DemoConfig;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rowsync-demo", about = "rowsync demo host")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "rowsync-demo.toml")]
    config: PathBuf,

    /// Editor address (overrides config). Example: 127.0.0.1:1338
    #[arg(short, long)]
    editor: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Playback state shared with the session handler ───────────────

#[derive(Debug, Default)]
struct Playback {
    row: f64,
    playing: bool,
}

type Shared = Arc<Mutex<Playback>>;

fn locked(shared: &Shared) -> std::sync::MutexGuard<'_, Playback> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Routes editor events into the shared playback state.
struct DemoHandler {
    playback: Shared,
}

impl SessionHandler for DemoHandler {
    fn on_ready(&mut self) {
        info!("editor handshake complete");
    }

    fn on_row_changed(&mut self, row: i32) {
        debug!(row, "editor seeked");
        locked(&self.playback).row = row as f64;
    }

    fn on_pause(&mut self) {
        info!("paused by editor");
        locked(&self.playback).playing = false;
    }

    fn on_play(&mut self) {
        info!("resumed by editor");
        locked(&self.playback).playing = true;
    }

    fn on_save_requested(&mut self) {
        // Track persistence is the editor's job in this setup.
        info!("editor requested a track save; nothing to do here");
    }

    fn on_update(&mut self) {
        debug!("track data changed");
    }

    fn on_disconnect(&mut self) {
        warn!("editor connection lost");
        locked(&self.playback).playing = false;
    }
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&DemoConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = DemoConfig::load(&cli.config);
    if let Some(addr) = cli.editor {
        config.network.editor_address = addr;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("rowsync-demo v{}", env!("CARGO_PKG_VERSION"));

    let editor = config.editor()?;
    info!(%editor, "connecting");
    let mut conn = EditorConnection::connect(&editor).await?;

    let playback: Shared = Arc::new(Mutex::new(Playback::default()));
    let mut session = SyncSession::new(
        conn.sender(),
        DemoHandler {
            playback: playback.clone(),
        },
    );
    session.handle_open()?;

    let clear_r = session.get_or_create_track("clear.r")?;
    let clear_g = session.get_or_create_track("clear.g")?;
    let camera_x = session.get_or_create_track("camera.x")?;

    let rows_per_frame = config.playback.rows_per_frame();
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(
        1.0 / config.playback.fps as f64,
    ));

    loop {
        tokio::select! {
            inbound = conn.recv() => match inbound {
                Some(cmd) => session.handle_command(cmd),
                None => {
                    session.handle_close();
                    break;
                }
            },
            _ = ticker.tick() => {
                let row = {
                    let mut playback = locked(&playback);
                    if playback.playing {
                        playback.row += rows_per_frame;
                    }
                    playback.row
                };
                session.advance(row as f32)?;
                debug!(
                    row,
                    clear_r = clear_r.value_at(row as f32),
                    clear_g = clear_g.value_at(row as f32),
                    camera_x = camera_x.value_at(row as f32),
                    "frame"
                );
            }
        }
    }

    info!("editor went away, shutting down");
    Ok(())
}
