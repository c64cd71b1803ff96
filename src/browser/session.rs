//! Browser session management
//!
//! Handles launching and controlling one isolated Chrome instance per
//! account check. Sessions never share cookies or profile data: each one
//! gets a throwaway user data directory and is killed on close.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chromiumoxide::browser::HeadlessMode;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tracing::{debug, info, warn};

use super::BrowserError;

/// Global counter for sequential session naming (Check-1, Check-2, ...)
static SESSION_COUNTER: AtomicU32 = AtomicU32::new(1);

/// Desktop user-agent presented to the target site.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Find Chrome/Chromium executable on the system
fn find_chrome() -> Option<PathBuf> {
    let candidates: Vec<PathBuf> = if cfg!(target_os = "windows") {
        let mut paths = vec![
            PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
            PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
        ];
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            paths.push(PathBuf::from(format!(
                r"{}\Google\Chrome\Application\chrome.exe",
                local
            )));
        }
        paths
    } else if cfg!(target_os = "macos") {
        vec![PathBuf::from(
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        )]
    } else {
        vec![
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/chromium"),
            PathBuf::from("/usr/bin/chromium-browser"),
        ]
    };

    candidates.into_iter().find(|p| p.exists())
}

/// Configuration for a browser session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Path to Chrome/Chromium executable
    pub chrome_path: Option<String>,
    /// Run in headless mode
    pub headless: bool,
    /// User data directory (throwaway, per session)
    pub user_data_dir: Option<PathBuf>,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            user_data_dir: None,
            window_width: 1280,
            window_height: 800,
        }
    }
}

impl SessionConfig {
    /// Create config with a fresh throwaway data directory.
    pub fn isolated() -> Self {
        let dir = std::env::temp_dir()
            .join("webhost-sentinel")
            .join("browser_data")
            .join(uuid::Uuid::new_v4().to_string());

        Self {
            user_data_dir: Some(dir),
            ..Default::default()
        }
    }

    /// Set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set Chrome path
    pub fn chrome_path(mut self, path: Option<String>) -> Self {
        self.chrome_path = path;
        self
    }
}

/// An isolated browser session for one login check
pub struct BrowserSession {
    /// Display name, e.g. "Check-1"
    id: String,
    browser: Option<Browser>,
    page: Option<Page>,
    /// Throwaway profile directory, removed on close
    user_data_dir: Option<PathBuf>,
}

impl BrowserSession {
    /// Launch a fresh Chrome instance with the given config.
    pub async fn launch(config: &SessionConfig) -> Result<Self, BrowserError> {
        let session_id = format!("Check-{}", SESSION_COUNTER.fetch_add(1, Ordering::Relaxed));

        info!(
            "Launching browser session {} (headless: {})",
            session_id, config.headless
        );

        // Check if Chrome is available before attempting launch
        if config.chrome_path.is_none() && find_chrome().is_none() {
            return Err(BrowserError::LaunchFailed(
                "Chrome not found. Install Chrome/Chromium or set CHROME_PATH.".to_string(),
            ));
        }

        let mut builder = BrowserConfig::builder();

        builder = if config.headless {
            // Modern Chrome requires --headless=new for proper headless
            builder.headless_mode(HeadlessMode::New)
        } else {
            builder.with_head()
        };

        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        } else if let Some(chrome_path) = find_chrome() {
            debug!("Auto-detected Chrome at: {}", chrome_path.display());
            builder = builder.chrome_executable(chrome_path);
        }

        if let Some(ref dir) = config.user_data_dir {
            let _ = std::fs::create_dir_all(dir);
            builder = builder.user_data_dir(dir);
        }

        builder = builder
            .window_size(config.window_width, config.window_height)
            // Required when running as root (CI runners, containers)
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage");

        let browser_config = builder
            .build()
            .map_err(BrowserError::LaunchFailed)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        // Drive CDP events in the background; the handler ending means
        // Chrome disconnected or crashed.
        let session_id_clone = session_id.clone();
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
            debug!("Session {} Chrome disconnected (event handler ended)", session_id_clone);
        });

        // Chrome opens with a blank tab; take it as our page and close extras.
        let page = {
            let mut pages = browser
                .pages()
                .await
                .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

            let main_page = if !pages.is_empty() {
                pages.remove(0)
            } else {
                browser
                    .new_page("about:blank")
                    .await
                    .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?
            };

            for extra_page in pages {
                debug!("Closing extra blank tab");
                let _ = extra_page.close().await;
            }

            main_page
        };

        // Spoof the user-agent at the protocol level before first navigation
        page.execute(SetUserAgentOverrideParams::new(USER_AGENT))
            .await
            .map_err(|e| BrowserError::LaunchFailed(format!("Failed to set UA override: {}", e)))?;

        info!("Browser session {} created", session_id);

        Ok(Self {
            id: session_id,
            browser: Some(browser),
            page: Some(page),
            user_data_dir: config.user_data_dir.clone(),
        })
    }

    /// Get session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    fn page(&self) -> Result<&Page, BrowserError> {
        self.page
            .as_ref()
            .ok_or_else(|| BrowserError::ConnectionLost("No active page".into()))
    }

    /// Navigate to a URL and wait for the load to settle, bounded by a timeout.
    pub async fn navigate(&self, url: &str, timeout_secs: u64) -> Result<(), BrowserError> {
        let page = self.page()?;

        debug!("Session {} navigating to: {}", self.id, url);
        tokio::time::timeout(Duration::from_secs(timeout_secs), async {
            page.goto(url)
                .await
                .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;
            Ok::<(), BrowserError>(())
        })
        .await
        .map_err(|_| BrowserError::Timeout(format!("Page load timed out after {}s", timeout_secs)))??;

        Ok(())
    }

    /// Wait for an in-flight navigation (e.g. after form submit), bounded by a timeout.
    pub async fn wait_for_navigation(&self, timeout_secs: u64) -> Result<(), BrowserError> {
        let page = self.page()?;

        tokio::time::timeout(Duration::from_secs(timeout_secs), page.wait_for_navigation())
            .await
            .map_err(|_| BrowserError::Timeout("Navigation timeout".into()))?
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;

        Ok(())
    }

    /// Execute JavaScript on the page with a custom timeout (in seconds).
    pub async fn execute_js_with_timeout(
        &self,
        script: &str,
        timeout_secs: u64,
    ) -> Result<serde_json::Value, BrowserError> {
        let page = self.page()?;

        let result = tokio::time::timeout(Duration::from_secs(timeout_secs), page.evaluate(script))
            .await
            .map_err(|_| {
                BrowserError::Timeout(format!(
                    "JavaScript execution timed out after {}s",
                    timeout_secs
                ))
            })?
            .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;

        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    /// Get current URL
    pub async fn current_url(&self) -> Result<String, BrowserError> {
        let page = self.page()?;

        page.url()
            .await
            .map_err(|e| BrowserError::ConnectionLost(e.to_string()))?
            .ok_or_else(|| BrowserError::ConnectionLost("No URL".into()))
    }

    /// Click an element and type text into it.
    pub async fn fill(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let page = self.page()?;

        let element = page
            .find_element(selector)
            .await
            .map_err(|e| BrowserError::ElementNotFound(format!("{}: {}", selector, e)))?;

        element
            .click()
            .await
            .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;
        element
            .type_str(text)
            .await
            .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;

        Ok(())
    }

    /// Close the browser session. Runs on every exit path of a check;
    /// never errors so it cannot mask the outcome of the attempt.
    pub async fn close(&mut self) {
        // 1. Close page first (stops navigation/JS execution)
        if let Some(page) = self.page.take() {
            let _ = page.close().await;
        }

        // 2. Close browser - try graceful close, give it a moment, then force kill
        if let Some(mut browser) = self.browser.take() {
            let _ = browser.close().await;
            // Brief grace period for Chrome child processes to exit
            tokio::time::sleep(Duration::from_millis(500)).await;
            let _ = browser.kill().await;
        }

        // 3. Remove the throwaway profile directory
        if let Some(dir) = self.user_data_dir.take() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                warn!("Session {} failed to remove data dir {}: {}", self.id, dir.display(), e);
            }
        }

        info!("Browser session {} closed", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_headless() {
        let config = SessionConfig::default();
        assert!(config.headless);
        assert_eq!(config.window_width, 1280);
        assert_eq!(config.window_height, 800);
        assert!(config.user_data_dir.is_none());
    }

    #[test]
    fn test_isolated_configs_get_distinct_data_dirs() {
        let a = SessionConfig::isolated();
        let b = SessionConfig::isolated();
        assert!(a.user_data_dir.is_some());
        assert_ne!(a.user_data_dir, b.user_data_dir);
    }

    #[test]
    fn test_builder_style_setters() {
        let config = SessionConfig::isolated()
            .headless(false)
            .chrome_path(Some("/opt/chrome".to_string()));
        assert!(!config.headless);
        assert_eq!(config.chrome_path.as_deref(), Some("/opt/chrome"));
    }
}
