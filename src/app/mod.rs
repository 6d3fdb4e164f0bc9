pub mod activation;
pub mod cli;

use anyhow::Result;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::engine::{Engine, SessionSummary};
use crate::settings::Config;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Cloneable handle for stopping the current session or the whole app.
#[derive(Clone)]
pub struct AppControls {
    shutdown: CancellationToken,
    session: Arc<Mutex<Option<CancellationToken>>>,
}

impl AppControls {
    /// Ends the running session, if any; the app goes back to waiting for activation.
    pub fn stop_session(&self) {
        if let Ok(guard) = self.session.lock() {
            if let Some(token) = guard.as_ref() {
                token.cancel();
            }
        }
    }

    /// Ends the running session and the app.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Activation and shutdown policy wrapped around a single [`Engine`].
pub struct VirtualMouseApp {
    config: Config,
    engine: Engine,
    shutdown: CancellationToken,
    session: Arc<Mutex<Option<CancellationToken>>>,
    sessions: Vec<SessionSummary>,
}

impl VirtualMouseApp {
    pub fn new(config: Config, engine: Engine) -> Self {
        Self {
            config,
            engine,
            shutdown: CancellationToken::new(),
            session: Arc::new(Mutex::new(None)),
            sessions: Vec::new(),
        }
    }

    pub fn controls(&self) -> AppControls {
        AppControls {
            shutdown: self.shutdown.clone(),
            session: Arc::clone(&self.session),
        }
    }

    /// Summaries of every finished session, oldest first.
    pub fn sessions(&self) -> &[SessionSummary] {
        &self.sessions
    }

    /// Runs sessions until shutdown or until the activation source closes.
    ///
    /// With `auto_start` the first session begins immediately; every later
    /// session waits for a message on `activation`.
    pub async fn run(&mut self, mut activation: mpsc::UnboundedReceiver<()>) -> Result<()> {
        let mut start_now = self.config.app.auto_start;

        let result = loop {
            if !start_now {
                log_info!(
                    "Virtual mouse idle. Press ENTER to activate or use hotkey {}.",
                    self.config.app.activation_hotkey
                );
                tokio::select! {
                    _ = self.shutdown.cancelled() => break Ok(()),
                    signal = activation.recv() => {
                        if signal.is_none() {
                            log_info!("activation source closed");
                            break Ok(());
                        }
                    }
                }
            }
            start_now = false;

            if self.shutdown.is_cancelled() {
                break Ok(());
            }

            let stop = self.shutdown.child_token();
            self.set_session(Some(stop.clone()));
            let outcome = self.engine.run(stop).await;
            self.set_session(None);

            match outcome {
                Ok(summary) => {
                    log_info!(
                        "Engine exited ({}). Waiting for the next activation.",
                        summary.reason
                    );
                    self.sessions.push(summary);
                }
                Err(err) => {
                    log_error!("engine session failed: {err:?}");
                    break Err(err);
                }
            }
        };

        self.engine.shutdown();
        result
    }

    fn set_session(&self, token: Option<CancellationToken>) {
        if let Ok(mut guard) = self.session.lock() {
            *guard = token;
        }
    }
}
