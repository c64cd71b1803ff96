//! webhost-sentinel
//!
//! Automated login checks against the x10hosting control panel with
//! per-account Chrome sessions and a Telegram summary report.

pub mod accounts;
pub mod browser;
pub mod notify;
pub mod outcome;
pub mod runner;

use std::path::PathBuf;

/// Default delay between accounts, in seconds.
const DEFAULT_ACCOUNT_DELAY_SECS: u64 = 5;

/// Site-specific heuristics for the login page.
///
/// Everything the target site can silently change lives here: the login
/// URL, the placeholder texts used to locate the form inputs, the accessible
/// name of the submit control, the URL markers that signal an authenticated
/// area, and the selector of the inline error banner. Defaults match
/// x10hosting as of the last time the page was inspected.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteProfile {
    /// Login page URL
    pub login_url: String,
    /// Placeholder text of the email input
    pub email_placeholder: String,
    /// Placeholder text of the password input
    pub password_placeholder: String,
    /// Accessible name of the submit control (role "button")
    pub submit_label: String,
    /// Substrings of the post-login URL that signal an authenticated area
    pub success_markers: Vec<String>,
    /// Selector of the inline error banner
    pub error_banner_selector: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            login_url: "https://x10hosting.com/login".to_string(),
            email_placeholder: "Email Address".to_string(),
            password_placeholder: "Password".to_string(),
            submit_label: "Login".to_string(),
            success_markers: vec!["panel".to_string(), "dashboard".to_string()],
            error_banner_selector: ".MuiAlert-message".to_string(),
        }
    }
}

/// Application configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct SentinelConfig {
    /// Raw WEBHOST value: whitespace-separated `email:password` tokens.
    /// `None` means the variable was absent or empty (not configured).
    pub accounts_raw: Option<String>,
    /// Telegram bot token (required for delivery)
    pub bot_token: Option<String>,
    /// Telegram chat id (required for delivery)
    pub chat_id: Option<String>,
    /// Run Chrome headless. Set HEADLESS=false for local debugging.
    pub headless: bool,
    /// Explicit Chrome binary path (auto-detected when unset)
    pub chrome_path: Option<String>,
    /// Delay between accounts in seconds
    pub account_delay_secs: u64,
    /// Target site heuristics
    pub site: SiteProfile,
}

impl SentinelConfig {
    /// Read configuration from the environment.
    pub fn from_env() -> Self {
        let accounts_raw = std::env::var("WEBHOST")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|v| !v.is_empty());
        let chat_id = std::env::var("TELEGRAM_CHAT_ID")
            .ok()
            .filter(|v| !v.is_empty());

        // Headless unless explicitly disabled (local debugging)
        let headless = std::env::var("HEADLESS")
            .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);

        let chrome_path = std::env::var("CHROME_PATH")
            .ok()
            .filter(|v| !v.is_empty());

        let account_delay_secs = std::env::var("ACCOUNT_DELAY_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_ACCOUNT_DELAY_SECS);

        let mut site = SiteProfile::default();
        if let Ok(url) = std::env::var("LOGIN_URL") {
            if !url.is_empty() {
                site.login_url = url;
            }
        }

        Self {
            accounts_raw,
            bot_token,
            chat_id,
            headless,
            chrome_path,
            account_delay_secs,
            site,
        }
    }
}

/// Get log directory path (shared across modules)
pub fn log_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("webhost-sentinel").join("logs"))
}

/// Truncate a string to at most `max` characters without splitting a
/// multi-byte character. Used for error details in the report.
pub fn safe_truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Initialize logging: console layer plus a daily rolling file layer.
pub fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false);

    if let Some(log_dir) = log_dir() {
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "webhost-sentinel.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(non_blocking);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_profile_default() {
        let site = SiteProfile::default();
        assert_eq!(site.login_url, "https://x10hosting.com/login");
        assert_eq!(site.email_placeholder, "Email Address");
        assert_eq!(site.submit_label, "Login");
        assert!(site.success_markers.contains(&"panel".to_string()));
        assert!(site.success_markers.contains(&"dashboard".to_string()));
    }

    #[test]
    fn test_safe_truncate_ascii() {
        assert_eq!(safe_truncate("hello", 50), "hello");
        assert_eq!(safe_truncate("hello", 3), "hel");
    }

    #[test]
    fn test_safe_truncate_multibyte() {
        // must not split inside a multi-byte character
        assert_eq!(safe_truncate("验证码required", 3), "验证码");
    }
}
