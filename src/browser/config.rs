//! Session configuration

use std::path::PathBuf;

/// Desktop Chrome user agent presented to the platform instead of the
/// automation default.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Configuration for one browser session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Run without a visible window.
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: String,
    /// Explicit Chrome/Chromium binary to launch. `None` resolves one
    /// from the system.
    pub chrome_executable: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chrome_executable: None,
        }
    }
}
