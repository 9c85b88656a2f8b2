//! Notification relay for costwarden
//!
//! Turns push-delivered alert messages into outbound email.

mod mailer;
mod template;

pub use mailer::{build_mailer, ApiMailer, EmailSender, SmtpMailer};
pub use template::render_alert_email;
