//! Browser session lifecycle
//!
//! Launches and tears down the Chromium instance behind a sync. The
//! chromiumoxide event handler runs on its own task and MUST be
//! aborted when the session ends, or it outlives the browser process.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use crate::error::SyncError;

/// A live browser process scoped to one sync.
///
/// Dropping the session aborts the event handler and removes the temp
/// profile directory as a fallback; [`BrowserSession::shutdown`] does
/// the same after closing the browser cleanly and is what the happy
/// path should call.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl BrowserSession {
    /// Launch a browser configured to look as little like automation
    /// as flags allow.
    ///
    /// Fails with [`SyncError::SessionStart`] when the binary cannot
    /// be started; that is fatal for the calling sync and not retried.
    pub async fn launch(config: &SessionConfig) -> Result<Self, SyncError> {
        launch_inner(config).await.map_err(SyncError::SessionStart)
    }

    /// Open a blank page in this session.
    pub async fn new_page(&self) -> Result<Page> {
        self.browser
            .new_page("about:blank")
            .await
            .context("failed to open a new page")
    }

    /// Close the browser process and release everything it held.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("failed to close browser cleanly: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            warn!("failed to wait for browser exit: {e}");
        }
        self.cleanup_profile_dir();
    }

    /// Remove the temp profile. Only safe once the process has exited;
    /// Chrome holds locks on files inside it until then.
    fn cleanup_profile_dir(&mut self) {
        if let Some(dir) = self.user_data_dir.take() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                warn!("failed to remove profile dir {}: {e}", dir.display());
            }
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
        // Browser::drop kills the Chrome process; the profile dir only
        // needs removing here when shutdown() was skipped.
        if self.user_data_dir.is_some() {
            debug!("session dropped without shutdown, removing profile dir");
            self.cleanup_profile_dir();
        }
    }
}

async fn launch_inner(config: &SessionConfig) -> Result<BrowserSession> {
    let user_data_dir =
        std::env::temp_dir().join(format!("bilitrack_chrome_{}", std::process::id()));
    std::fs::create_dir_all(&user_data_dir).context("failed to create profile directory")?;

    let headless_mode = if config.headless {
        HeadlessMode::default()
    } else {
        HeadlessMode::False
    };

    let mut builder = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(30))
        .window_size(config.window_width, config.window_height)
        .user_data_dir(&user_data_dir)
        .headless_mode(headless_mode)
        .arg(format!("--user-agent={}", config.user_agent))
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg("--disable-setuid-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-extensions")
        .arg("--disable-infobars")
        .arg("--disable-notifications")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--mute-audio")
        .arg("--hide-scrollbars");
    if let Some(path) = &config.chrome_executable {
        builder = builder.chrome_executable(path);
    }
    let browser_config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

    info!(headless = config.headless, "launching browser");
    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("failed to launch browser")?;

    // The handler must be polled for the lifetime of the browser; its
    // JoinHandle is aborted when the session goes away.
    let handler_task = task::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("browser handler event error: {e:?}");
            }
        }
        debug!("browser event handler finished");
    });

    Ok(BrowserSession {
        browser,
        handler: handler_task,
        user_data_dir: Some(user_data_dir),
    })
}
