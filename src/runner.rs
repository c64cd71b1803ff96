//! Sequential run orchestration.
//!
//! Parses the account list, checks each account in order with one isolated
//! browser session at a time, and delivers a single aggregated report.
//! Configuration problems end the run early with a notification; nothing in
//! the per-account path is allowed to terminate it.

use tracing::{info, warn};

use crate::accounts::parse_accounts;
use crate::browser::{LoginCheck, SessionConfig};
use crate::notify::TelegramNotifier;
use crate::outcome::Outcome;
use crate::SentinelConfig;

/// Report title header
const REPORT_HEADER: &str = "📊 *x10hosting 登录结果*";

/// Jitter added to the inter-account delay, in milliseconds
const ACCOUNT_DELAY_JITTER_MS: u64 = 1000;

/// Assemble the final report from rendered outcome lines.
pub fn build_report(outcomes: &[Outcome]) -> String {
    let lines: Vec<String> = outcomes.iter().map(Outcome::render).collect();
    format!("{}\n\n{}", REPORT_HEADER, lines.join("\n"))
}

/// Run the full check: parse, check each account, notify once.
pub async fn run(config: SentinelConfig) -> anyhow::Result<()> {
    let notifier = TelegramNotifier::new(config.bot_token.clone(), config.chat_id.clone());

    let raw = match config.accounts_raw.as_deref() {
        Some(raw) => raw,
        None => {
            warn!("WEBHOST is not configured");
            notifier.send("⚠️ 未配置任何账户").await;
            return Ok(());
        }
    };

    let accounts = parse_accounts(raw);
    if accounts.is_empty() {
        warn!("No valid accounts in WEBHOST");
        notifier.send("❌ 没有有效的账户").await;
        return Ok(());
    }

    let total = accounts.len();
    let mut outcomes = Vec::with_capacity(total);

    for (i, account) in accounts.iter().enumerate() {
        info!("Checking account {}/{}: {}", i + 1, total, account.email);

        let session_config = SessionConfig::isolated()
            .headless(config.headless)
            .chrome_path(config.chrome_path.clone());

        let outcome = LoginCheck::run(
            &config.site,
            &session_config,
            &account.email,
            &account.password,
        )
        .await;

        info!("Result: {}", outcome.render());
        outcomes.push(outcome);

        // Pause between accounts, not after the last one
        if i + 1 < total {
            LoginCheck::human_delay(config.account_delay_secs * 1000, ACCOUNT_DELAY_JITTER_MS)
                .await;
        }
    }

    let report = build_report(&outcomes);
    if notifier.send(&report).await {
        info!("Report delivered");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_contains_header_and_all_lines() {
        let outcomes = vec![
            Outcome::success("a@x.com"),
            Outcome::failure("b@y.com", "错误: boom"),
            Outcome::failure("c@z.com", "Invalid credentials"),
        ];
        let report = build_report(&outcomes);

        assert!(report.starts_with("📊 *x10hosting 登录结果*\n\n"));
        assert!(report.contains("✅ a@x.com - 登录成功"));
        assert!(report.contains("❌ b@y.com - 错误: boom"));
        assert!(report.contains("❌ c@z.com - Invalid credentials"));
        assert_eq!(report.lines().count(), 5);
    }

    #[test]
    fn test_report_preserves_account_order() {
        let outcomes = vec![
            Outcome::success("first@x.com"),
            Outcome::captcha_blocked("second@x.com"),
        ];
        let report = build_report(&outcomes);
        let first = report.find("first@x.com").unwrap();
        let second = report.find("second@x.com").unwrap();
        assert!(first < second);
    }
}
