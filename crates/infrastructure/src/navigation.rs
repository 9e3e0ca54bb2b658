//! Navigation adapter.

use lyceum_application::ports::Navigator;
use tokio::sync::mpsc;

/// Navigator that forwards redirect targets over a channel.
///
/// The receiving side owns the view: a UI switches screens, a CLI prints a
/// prompt to sign in again.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    sender: mpsc::UnboundedSender<String>,
}

impl ChannelNavigator {
    /// Creates the navigator and the receiver of its redirects.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Navigator for ChannelNavigator {
    fn redirect(&self, path: &str) {
        tracing::info!(path, "redirecting");
        if self.sender.send(path.to_string()).is_err() {
            tracing::warn!(path, "redirect dropped, no view is listening");
        }
    }
}
