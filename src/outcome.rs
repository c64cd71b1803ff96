//! Login outcome classification and report rendering.

use crate::{safe_truncate, SiteProfile};

/// Max characters of an error message carried into the report.
const DETAIL_MAX_CHARS: usize = 50;

/// Classified result of one login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStatus {
    /// Redirected into the authenticated area
    Success,
    /// A CAPTCHA challenge blocked the attempt before form fill
    CaptchaBlocked,
    /// Login rejected or attempt errored
    Failure { detail: String },
}

/// Outcome of one account check: status plus the originating email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub email: String,
    pub status: LoginStatus,
}

impl Outcome {
    pub fn success(email: &str) -> Self {
        Self {
            email: email.to_string(),
            status: LoginStatus::Success,
        }
    }

    pub fn captcha_blocked(email: &str) -> Self {
        Self {
            email: email.to_string(),
            status: LoginStatus::CaptchaBlocked,
        }
    }

    pub fn failure(email: &str, detail: &str) -> Self {
        Self {
            email: email.to_string(),
            status: LoginStatus::Failure {
                detail: detail.to_string(),
            },
        }
    }

    /// Outcome for an attempt that died with an error (launch failure,
    /// timeout, missing element). The message is truncated for the report.
    pub fn from_error(email: &str, err: &dyn std::fmt::Display) -> Self {
        Self::failure(email, &format!("错误: {}", safe_truncate(&err.to_string(), DETAIL_MAX_CHARS)))
    }

    /// Render as one report line: status glyph, email, reason.
    pub fn render(&self) -> String {
        match &self.status {
            LoginStatus::Success => format!("✅ {} - 登录成功", self.email),
            LoginStatus::CaptchaBlocked => format!("❌ {} - 需要手动处理验证码", self.email),
            LoginStatus::Failure { detail } => format!("❌ {} - {}", self.email, detail),
        }
    }
}

/// Page state captured after the login attempt, fed to the classifier.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    /// A CAPTCHA marker was visible on the login page
    pub captcha: bool,
    /// URL after submission settled
    pub url: String,
    /// Visible error banner text, if any
    pub banner: Option<String>,
}

/// Map captured page state to an outcome. First match wins:
/// CAPTCHA, authenticated-area URL marker, error banner, generic failure.
pub fn classify(email: &str, state: &PageState, site: &SiteProfile) -> Outcome {
    if state.captcha {
        return Outcome::captcha_blocked(email);
    }

    if site.success_markers.iter().any(|m| state.url.contains(m.as_str())) {
        return Outcome::success(email);
    }

    if let Some(text) = state.banner.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        return Outcome::failure(email, text);
    }

    Outcome::failure(email, "登录失败")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteProfile {
        SiteProfile::default()
    }

    #[test]
    fn test_captcha_wins_over_everything() {
        // captcha short-circuits even if the URL looks authenticated
        let state = PageState {
            captcha: true,
            url: "https://x10hosting.com/panel".to_string(),
            banner: Some("Invalid credentials".to_string()),
        };
        let outcome = classify("a@x.com", &state, &site());
        assert_eq!(outcome.status, LoginStatus::CaptchaBlocked);
    }

    #[test]
    fn test_dashboard_url_is_success() {
        let state = PageState {
            captcha: false,
            url: "https://x10hosting.com/dashboard/home".to_string(),
            banner: None,
        };
        let outcome = classify("a@x.com", &state, &site());
        assert_eq!(outcome.status, LoginStatus::Success);
    }

    #[test]
    fn test_panel_url_is_success() {
        let state = PageState {
            url: "https://x10hosting.com/panel".to_string(),
            ..Default::default()
        };
        assert_eq!(classify("a@x.com", &state, &site()).status, LoginStatus::Success);
    }

    #[test]
    fn test_banner_text_becomes_detail() {
        let state = PageState {
            captcha: false,
            url: "https://x10hosting.com/login".to_string(),
            banner: Some("Invalid credentials".to_string()),
        };
        let outcome = classify("a@x.com", &state, &site());
        assert_eq!(
            outcome.status,
            LoginStatus::Failure {
                detail: "Invalid credentials".to_string()
            }
        );
    }

    #[test]
    fn test_no_banner_no_redirect_is_generic_failure() {
        let state = PageState {
            url: "https://x10hosting.com/login".to_string(),
            ..Default::default()
        };
        let outcome = classify("a@x.com", &state, &site());
        assert_eq!(
            outcome.status,
            LoginStatus::Failure {
                detail: "登录失败".to_string()
            }
        );
    }

    #[test]
    fn test_blank_banner_is_generic_failure() {
        let state = PageState {
            url: "https://x10hosting.com/login".to_string(),
            banner: Some("   ".to_string()),
            ..Default::default()
        };
        let outcome = classify("a@x.com", &state, &site());
        assert_eq!(
            outcome.status,
            LoginStatus::Failure {
                detail: "登录失败".to_string()
            }
        );
    }

    #[test]
    fn test_render_lines() {
        assert_eq!(Outcome::success("a@x.com").render(), "✅ a@x.com - 登录成功");
        assert_eq!(
            Outcome::captcha_blocked("a@x.com").render(),
            "❌ a@x.com - 需要手动处理验证码"
        );
        assert_eq!(
            Outcome::failure("a@x.com", "Invalid credentials").render(),
            "❌ a@x.com - Invalid credentials"
        );
    }

    #[test]
    fn test_error_detail_truncated() {
        let long = "x".repeat(200);
        let err = std::io::Error::new(std::io::ErrorKind::Other, long);
        let outcome = Outcome::from_error("a@x.com", &err);
        match outcome.status {
            LoginStatus::Failure { detail } => {
                assert!(detail.starts_with("错误: "));
                assert_eq!(detail.chars().count(), "错误: ".chars().count() + 50);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
