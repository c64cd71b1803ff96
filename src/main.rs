//! webhost-sentinel - x10hosting login checker
//!
//! Checks each configured account against the x10hosting login page in one
//! isolated browser session at a time and reports the results to Telegram.
//!
//! Environment variables:
//! - `WEBHOST` - whitespace-separated `email:password` tokens (required)
//! - `TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_ID` - report delivery credentials
//! - `HEADLESS` - set to `false` to watch the browser locally
//! - `CHROME_PATH` - explicit browser binary (auto-detected otherwise)
//! - `LOGIN_URL` - override the target login page

use tracing::info;

use webhost_sentinel::{init_logging, log_dir, runner, SentinelConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = init_logging();

    info!("{}", "=".repeat(50));
    info!("x10hosting auto login check");
    info!("{}", "=".repeat(50));

    if let Some(dir) = log_dir() {
        info!("Log files saved to: {}", dir.display());
    }

    let config = SentinelConfig::from_env();
    runner::run(config).await
}
