//! Outbound notification contract. Delivery mechanics live behind the
//! trait; the server only cares that a send either happened or failed.

use crate::error::DomainError;
use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DomainError>;
}

/// Records sends in the log instead of delivering them. Stands in until a
/// real transport is wired up.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DomainError> {
        info!(
            "Mail to {}: subject \"{}\" ({} byte body)",
            to,
            subject,
            body.len()
        );
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Captures sends so tests can assert on them.
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<(String, String, String)>>,
        pub fail: bool,
    }

    impl RecordingMailer {
        pub fn new() -> Self {
            Self {
                sent: Mutex::new(vec![]),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DomainError> {
            if self.fail {
                return Err(DomainError::Notification("transport down".to_string()));
            }
            self.sent.lock().unwrap().push((
                to.to_string(),
                subject.to_string(),
                body.to_string(),
            ));
            Ok(())
        }
    }
}
