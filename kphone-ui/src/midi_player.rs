//! MIDI playback backend
//!
//! Each `play` downloads the MIDI payload from the server into the download
//! directory and, when a player command is configured, runs it on the file.
//! The work runs as a spawned task; `stop` aborts it, which also kills a
//! running player process.

use std::path::PathBuf;

use kphone_common::config::TomlConfig;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{Result, UiError};
use crate::events::UiEvent;
use crate::player::{PlaybackSession, Player};

pub struct MidiPlayer {
    http_client: reqwest::Client,
    base_url: String,
    download_dir: PathBuf,
    command: Vec<String>,
    events: UnboundedSender<UiEvent>,
    current: Option<JoinHandle<()>>,
    last_session: PlaybackSession,
}

impl MidiPlayer {
    /// Build a player for `config`. Completion of every session is sent to
    /// `events` as [`UiEvent::PlaybackEnded`].
    pub fn new(config: &TomlConfig, events: UnboundedSender<UiEvent>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| UiError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.server_url.trim_end_matches('/').to_string(),
            download_dir: config.download_dir(),
            command: config.player_command.clone(),
            events,
            current: None,
            last_session: 0,
        })
    }

    /// File a session's payload is written to
    pub fn session_file(&self, session: PlaybackSession) -> PathBuf {
        self.download_dir.join(format!("keplerphone-{}.mid", session))
    }
}

impl Player for MidiPlayer {
    fn play(&mut self, path: &str) -> Result<PlaybackSession> {
        self.stop();

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| UiError::Playback(format!("no async runtime: {}", e)))?;

        self.last_session += 1;
        let session = self.last_session;
        let job = PlaybackJob {
            http_client: self.http_client.clone(),
            url: format!("{}{}", self.base_url, path),
            file: self.session_file(session),
            command: self.command.clone(),
        };
        let events = self.events.clone();

        self.current = Some(runtime.spawn(async move {
            let error = job.run().await.err().map(|e| e.to_string());
            if events.send(UiEvent::PlaybackEnded { session, error }).is_err() {
                debug!(session, "Event loop closed before playback ended");
            }
        }));
        Ok(session)
    }

    fn stop(&mut self) {
        if let Some(handle) = self.current.take() {
            if !handle.is_finished() {
                debug!(session = self.last_session, "Aborting playback task");
            }
            handle.abort();
        }
    }
}

impl Drop for MidiPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

struct PlaybackJob {
    http_client: reqwest::Client,
    url: String,
    file: PathBuf,
    command: Vec<String>,
}

impl PlaybackJob {
    async fn run(self) -> Result<()> {
        debug!(url = %self.url, "Requesting MIDI");

        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| UiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(UiError::Status(status.as_u16(), error_text));
        }

        let payload = response
            .bytes()
            .await
            .map_err(|e| UiError::Network(e.to_string()))?;
        if let Some(dir) = self.file.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&self.file, &payload).await?;
        info!(file = %self.file.display(), bytes = payload.len(), "MIDI saved");

        let Some((program, args)) = self.command.split_first() else {
            return Ok(());
        };

        let status = tokio::process::Command::new(program)
            .args(args)
            .arg(&self.file)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| UiError::Playback(format!("failed to run {}: {}", program, e)))?;

        if !status.success() {
            return Err(UiError::Playback(format!("{} exited with {}", program, status)));
        }
        Ok(())
    }
}
