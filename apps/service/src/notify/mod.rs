//! Delivery of change and error reports to the messaging sink.
//!
//! Sending is fire-and-forget for callers: delivery problems are logged by the
//! notifier and never reach the polling cycle.

pub mod message;
pub mod telegram;

pub use telegram::TelegramNotifier;

/// Sink for human readable reports
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message` once. Failures are logged, not returned or retried.
    async fn send(&self, message: &str);
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::Notifier;

    /// Keeps every message it is asked to send
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }

        pub fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.messages.lock().unwrap())
        }
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }
}
