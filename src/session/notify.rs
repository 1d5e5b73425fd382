use crate::config::Config;
use log::{error, info};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Error,
}

/// Short message shown to the user for a limited time.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub ttl: Duration,
}

/// Sending side of the toast queue. Messages are also logged so nothing is
/// lost when no one is draining the queue.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Toast>,
    info_ttl: Duration,
    error_ttl: Duration,
}

impl Notifier {
    pub fn new(config: &Config) -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = Notifier {
            tx,
            info_ttl: config.info_toast,
            error_ttl: config.error_toast,
        };
        (notifier, rx)
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        let _ = self.tx.send(Toast {
            kind: ToastKind::Info,
            message,
            ttl: self.info_ttl,
        });
    }

    /// The one place failures are reported.
    pub fn error(&self, err: impl std::fmt::Display) {
        let message = err.to_string();
        error!("{}", message);
        let _ = self.tx.send(Toast {
            kind: ToastKind::Error,
            message,
            ttl: self.error_ttl,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_durations() {
        let (notifier, mut rx) = Notifier::new(&Config::default());
        notifier.info("saved");
        notifier.error("status: boom");

        let first = rx.try_recv().unwrap();
        assert_eq!(first.kind, ToastKind::Info);
        assert_eq!(first.ttl, Duration::from_secs(5));

        let second = rx.try_recv().unwrap();
        assert_eq!(second.kind, ToastKind::Error);
        assert_eq!(second.message, "status: boom");
        assert_eq!(second.ttl, Duration::from_secs(10));
    }

    #[test]
    fn test_closed_queue_is_fine() {
        let (notifier, rx) = Notifier::new(&Config::default());
        drop(rx);
        notifier.error("nobody listens");
    }
}
