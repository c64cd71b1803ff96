//! Browser automation
//!
//! One isolated Chrome session per account, driven over the Chrome
//! DevTools Protocol, plus the scripted login interaction.

mod errors;
mod login;
mod session;

pub use errors::BrowserError;
pub use login::LoginCheck;
pub use session::{BrowserSession, SessionConfig};
