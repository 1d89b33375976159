//! WebSocket-based hot reload.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Messages sent to clients for hot reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HmrMessage {
    /// Full page reload
    Reload,

    /// The content graph was rebuilt
    ContentUpdated {
        /// Records in the new graph
        records: usize,
    },

    /// A rebuild failed; the previous graph is still being served
    BuildFailed {
        /// Why the rebuild failed
        message: String,
    },

    /// Connection established
    Connected,
}

/// Hub for broadcasting HMR messages to all connected clients.
#[derive(Debug, Clone)]
pub struct HmrHub {
    sender: broadcast::Sender<HmrMessage>,
}

impl HmrHub {
    /// Create a new HMR hub.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a message to all connected clients.
    pub fn send(&self, msg: HmrMessage) {
        // No receivers is fine
        let _ = self.sender.send(msg);
    }

    /// Subscribe to HMR messages.
    pub fn subscribe(&self) -> broadcast::Receiver<HmrMessage> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for HmrHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate the client-side HMR script.
///
/// The socket URL is derived from the page's own host, so the script works
/// whatever address the server is bound to. On `content_updated` the script
/// dispatches a cancelable `lattice:content-updated` event on `window`; pages
/// that re-query content themselves call `preventDefault()`, otherwise the page
/// reloads.
pub fn hmr_client_script(ws_path: &str) -> String {
    format!(
        r#"
(function() {{
  'use strict';

  const scheme = location.protocol === 'https:' ? 'wss://' : 'ws://';
  const ws = new WebSocket(scheme + location.host + '{}');
  let reconnectAttempts = 0;
  const maxReconnectAttempts = 10;

  ws.onopen = function() {{
    console.log('[HMR] Connected');
    reconnectAttempts = 0;
  }};

  ws.onmessage = function(event) {{
    const msg = JSON.parse(event.data);
    console.log('[HMR]', msg.type);

    switch (msg.type) {{
      case 'reload':
        location.reload();
        break;

      case 'content_updated':
        const update = new CustomEvent('lattice:content-updated', {{
          detail: {{ records: msg.records }},
          cancelable: true,
        }});
        if (window.dispatchEvent(update)) {{
          location.reload();
        }}
        break;

      case 'build_failed':
        console.error('[HMR] Content rebuild failed:', msg.message);
        break;

      case 'connected':
        console.log('[HMR] Server acknowledged connection');
        break;
    }}
  }};

  ws.onclose = function() {{
    console.log('[HMR] Disconnected');
    if (reconnectAttempts < maxReconnectAttempts) {{
      reconnectAttempts++;
      setTimeout(function() {{
        console.log('[HMR] Reconnecting...');
        location.reload();
      }}, 1000 * reconnectAttempts);
    }}
  }};

  ws.onerror = function(e) {{
    console.error('[HMR] WebSocket error:', e);
  }};
}})();
"#,
        ws_path
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hub_broadcasts_messages() {
        let hub = HmrHub::new();
        let mut rx = hub.subscribe();

        hub.send(HmrMessage::ContentUpdated { records: 3 });

        match rx.try_recv() {
            Ok(HmrMessage::ContentUpdated { records: 3 }) => {}
            other => panic!("Expected ContentUpdated message, got {:?}", other),
        }
    }

    #[test]
    fn send_without_subscribers_is_silent() {
        let hub = HmrHub::new();
        assert_eq!(hub.subscriber_count(), 0);

        hub.send(HmrMessage::Reload);
    }

    #[test]
    fn serializes_messages() {
        let json = serde_json::to_string(&HmrMessage::ContentUpdated { records: 2 }).unwrap();
        assert_eq!(json, r#"{"type":"content_updated","records":2}"#);

        let json = serde_json::to_string(&HmrMessage::Reload).unwrap();
        assert_eq!(json, r#"{"type":"reload"}"#);
    }

    #[test]
    fn script_targets_the_given_path() {
        let script = hmr_client_script("/__hmr");

        assert!(script.contains("location.host + '/__hmr'"));
        assert!(script.contains("lattice:content-updated"));
    }
}
