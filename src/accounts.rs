//! Account list parsing.
//!
//! WEBHOST holds whitespace-separated `email:password` tokens. Passwords
//! may contain `:` so the split happens on the first separator only.

use tracing::{info, warn};

/// One set of panel credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub email: String,
    pub password: String,
}

/// Parse whitespace-separated `email:password` tokens, order preserved.
///
/// Malformed tokens (no `:`, empty email or empty password) are logged and
/// skipped, never fatal.
pub fn parse_accounts(raw: &str) -> Vec<Account> {
    let mut accounts = Vec::new();

    for token in raw.split_whitespace() {
        match token.split_once(':') {
            Some((email, password)) if !email.is_empty() && !password.is_empty() => {
                info!("Parsed account: {}", email);
                accounts.push(Account {
                    email: email.to_string(),
                    password: password.to_string(),
                });
            }
            _ => {
                warn!("Malformed account token: {}", token);
            }
        }
    }

    accounts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_accounts_order_preserved() {
        let accounts = parse_accounts("a@x.com:p1 b@y.com:p2");
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].email, "a@x.com");
        assert_eq!(accounts[0].password, "p1");
        assert_eq!(accounts[1].email, "b@y.com");
        assert_eq!(accounts[1].password, "p2");
    }

    #[test]
    fn test_token_without_separator_dropped() {
        let accounts = parse_accounts("badtoken a@x.com:p1");
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].email, "a@x.com");
    }

    #[test]
    fn test_empty_input_yields_empty_list() {
        assert!(parse_accounts("").is_empty());
        assert!(parse_accounts("   \n\t ").is_empty());
    }

    #[test]
    fn test_password_may_contain_separator() {
        let accounts = parse_accounts("a@x.com:p:1");
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].password, "p:1");
    }

    #[test]
    fn test_empty_sides_dropped() {
        assert!(parse_accounts(":p1").is_empty());
        assert!(parse_accounts("a@x.com:").is_empty());
        assert!(parse_accounts(":").is_empty());
    }

    #[test]
    fn test_mixed_whitespace_separators() {
        let accounts = parse_accounts("a@x.com:p1\nb@y.com:p2\tc@z.com:p3");
        assert_eq!(accounts.len(), 3);
        assert_eq!(accounts[2].email, "c@z.com");
    }
}
