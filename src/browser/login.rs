//! Scripted login interaction.
//!
//! Drives one isolated session through the login form and captures the
//! resulting page state. Any failure along the way collapses into a
//! Failure outcome; nothing here may abort the run.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::outcome::{classify, Outcome, PageState};
use crate::SiteProfile;

use super::{BrowserError, BrowserSession, SessionConfig};

/// Page load timeout in seconds
const PAGE_LOAD_TIMEOUT_SECS: u64 = 30;
/// Post-submit settle timeout in seconds
const SUBMIT_SETTLE_TIMEOUT_SECS: u64 = 10;
/// CAPTCHA visibility probe timeout in seconds
const CAPTCHA_PROBE_TIMEOUT_SECS: u64 = 2;
/// Fixed settle delay after load/submit, in milliseconds
const SETTLE_DELAY_MS: u64 = 2000;

/// One full login check against the target site.
pub struct LoginCheck;

impl LoginCheck {
    /// Run a login check for one account. Always returns an outcome; the
    /// browser is closed on every path, including errors.
    pub async fn run(
        site: &SiteProfile,
        session_config: &SessionConfig,
        email: &str,
        password: &str,
    ) -> Outcome {
        info!("Starting login check for: {}", email);

        let mut session = match BrowserSession::launch(session_config).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Login check for {} failed to launch browser: {}", email, e);
                return Outcome::from_error(email, &e);
            }
        };

        let result = Self::attempt(&session, site, email, password).await;

        // Cleanup always runs; it cannot mask the attempt result.
        session.close().await;

        match result {
            Ok(state) => classify(email, &state, site),
            Err(e) => {
                warn!("Login check for {} errored: {}", email, e);
                Outcome::from_error(email, &e)
            }
        }
    }

    /// The fallible part of the check: navigate, probe, fill, submit, capture.
    async fn attempt(
        session: &BrowserSession,
        site: &SiteProfile,
        email: &str,
        password: &str,
    ) -> Result<PageState, BrowserError> {
        info!("Session {} opening login page", session.id());
        session.navigate(&site.login_url, PAGE_LOAD_TIMEOUT_SECS).await?;
        tokio::time::sleep(Duration::from_millis(SETTLE_DELAY_MS)).await;

        // CAPTCHA short-circuits before the form is touched
        if Self::check_captcha(session).await {
            warn!("Session {} CAPTCHA detected, skipping form fill", session.id());
            return Ok(PageState {
                captcha: true,
                ..Default::default()
            });
        }

        session
            .fill(&placeholder_selector(&site.email_placeholder), email)
            .await?;
        Self::human_delay(500, 200).await;

        session
            .fill(&placeholder_selector(&site.password_placeholder), password)
            .await?;
        Self::human_delay(500, 200).await;

        Self::click_submit(session, &site.submit_label).await?;

        // Post-submit settle. Some rejections never navigate, so a timeout
        // here is not an error: the classifier reads the page as-is.
        if let Err(e) = session.wait_for_navigation(SUBMIT_SETTLE_TIMEOUT_SECS).await {
            debug!("Session {} post-submit wait: {}", session.id(), e);
        }
        tokio::time::sleep(Duration::from_millis(SETTLE_DELAY_MS)).await;

        let url = session.current_url().await?;
        let banner = Self::read_error_banner(session, &site.error_banner_selector).await;

        Ok(PageState {
            captcha: false,
            url,
            banner,
        })
    }

    /// Check whether a CAPTCHA challenge is visible on the page.
    /// Probe errors count as "not present" and are never propagated.
    pub async fn check_captcha(session: &BrowserSession) -> bool {
        let result = session
            .execute_js_with_timeout(
                r#"
            (function() {
                const visible = (el) => !!el && el.offsetParent !== null;
                if (visible(document.querySelector('.g-recaptcha'))) {
                    return { blocked: true, marker: 'g-recaptcha' };
                }
                if (visible(document.querySelector('iframe[src*="recaptcha"]'))) {
                    return { blocked: true, marker: 'recaptcha_iframe' };
                }
                const text = document.body ? document.body.innerText : '';
                if (text.includes('reCAPTCHA')) {
                    return { blocked: true, marker: 'recaptcha_text' };
                }
                if (text.includes('验证码') || text.includes('人机验证')) {
                    return { blocked: true, marker: 'verification_text' };
                }
                return { blocked: false };
            })()
        "#,
                CAPTCHA_PROBE_TIMEOUT_SECS,
            )
            .await;

        match result {
            Ok(value) => {
                let blocked = value
                    .get("blocked")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                if blocked {
                    let marker = value
                        .get("marker")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unknown");
                    warn!("Session {} CAPTCHA marker: {}", session.id(), marker);
                }
                blocked
            }
            Err(e) => {
                debug!("Session {} CAPTCHA probe failed, assuming absent: {}", session.id(), e);
                false
            }
        }
    }

    /// Click the submit control by its accessible role and name.
    async fn click_submit(session: &BrowserSession, label: &str) -> Result<(), BrowserError> {
        let script = format!(
            r#"
            (function() {{
                const name = (el) =>
                    (el.innerText || el.value || el.getAttribute('aria-label') || '').trim();
                const controls = Array.from(
                    document.querySelectorAll("button, input[type='submit'], [role='button']")
                );
                const target = controls.find((el) => name(el) === "{}");
                if (!target) return false;
                target.click();
                return true;
            }})()
        "#,
            js_escape(label)
        );

        let clicked = session
            .execute_js_with_timeout(&script, SUBMIT_SETTLE_TIMEOUT_SECS)
            .await?;

        if clicked.as_bool() != Some(true) {
            return Err(BrowserError::ElementNotFound(format!(
                "button \"{}\"",
                label
            )));
        }

        debug!("Session {} submitted login form", session.id());
        Ok(())
    }

    /// Read the inline error banner, if present and visible.
    /// Probe errors count as "no banner".
    async fn read_error_banner(session: &BrowserSession, selector: &str) -> Option<String> {
        let script = format!(
            r#"
            (function() {{
                const el = document.querySelector("{}");
                if (!el || el.offsetParent === null) return {{ present: false }};
                return {{ present: true, text: el.innerText.trim() }};
            }})()
        "#,
            js_escape(selector)
        );

        let result = session
            .execute_js_with_timeout(&script, CAPTCHA_PROBE_TIMEOUT_SECS)
            .await
            .ok()?;

        if result.get("present").and_then(|v| v.as_bool()) != Some(true) {
            return None;
        }

        result
            .get("text")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    /// Pause with a small random jitter to emulate human timing.
    pub async fn human_delay(base_ms: u64, variance_ms: u64) {
        let delay = base_ms + rand::thread_rng().gen_range(0..=variance_ms);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

/// CSS selector for an input located by its placeholder text.
fn placeholder_selector(placeholder: &str) -> String {
    format!("input[placeholder=\"{}\"]", placeholder)
}

/// Escape a string for embedding in a double-quoted JS literal.
fn js_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_selector() {
        assert_eq!(
            placeholder_selector("Email Address"),
            "input[placeholder=\"Email Address\"]"
        );
    }

    #[test]
    fn test_js_escape() {
        assert_eq!(js_escape("plain"), "plain");
        assert_eq!(js_escape("a\"b"), "a\\\"b");
        assert_eq!(js_escape("a\\b"), "a\\\\b");
    }
}
