//! Notifications pushed from the core to whatever frontend is attached.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Message emitted by the store, the provider client or the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Informational message for the user.
    Info(String),
    /// Error the user should see, distinct from informational notices.
    Error(String),
    /// The record list changed and views should be refreshed.
    RecordsChanged {
        /// Number of stored records after the change, hidden ones included.
        total: usize,
    },
}

/// Per-call notification setting.
///
/// With `notify: false` messages are still logged, but they are not
/// pushed to the frontend. Persistence is never affected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyOptions {
    /// Whether user-facing notices should be emitted.
    pub notify: bool,
}

impl NotifyOptions {
    /// Emit user-facing notices.
    pub const LOUD: Self = Self { notify: true };
    /// Log only.
    pub const SILENT: Self = Self { notify: false };
}

impl Default for NotifyOptions {
    fn default() -> Self {
        Self::LOUD
    }
}

/// Cloneable handle for pushing [`Notice`]s to an optional subscriber.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    sender: Option<UnboundedSender<Notice>>,
}

impl Notifier {
    /// Wrap an existing sender.
    pub fn new(sender: UnboundedSender<Notice>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// A notifier without subscriber; notices are only logged.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Create a notifier together with the receiving end of its channel.
    pub fn channel() -> (Self, UnboundedReceiver<Notice>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }

    /// Log and, when allowed, emit an informational notice.
    pub fn info(&self, options: NotifyOptions, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        if options.notify {
            self.push(Notice::Info(message));
        }
    }

    /// Log and, when allowed, emit an error notice.
    pub fn error(&self, options: NotifyOptions, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        if options.notify {
            self.push(Notice::Error(message));
        }
    }

    /// Signal that the record list changed. Always emitted.
    pub fn records_changed(&self, total: usize) {
        self.push(Notice::RecordsChanged { total });
    }

    fn push(&self, notice: Notice) {
        if let Some(sender) = &self.sender {
            if sender.send(notice).is_err() {
                debug!("notice receiver dropped");
            }
        }
    }
}
