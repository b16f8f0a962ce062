//! Interactive chat client.
//!
//! [`Client`] runs the keyboard loop and owns the unsent input. The transcript
//! and the peer roster are shared with the node through a [`ClientHandle`],
//! which the node receives at construction and calls from its own threads.
//! Both sides go through the same mutex, and the screen is drawn while that
//! mutex is held, so a draw never sees a half-applied update.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ratatui::backend::Backend;
use ratatui::Terminal;
use thiserror::Error;
use tracing::{debug, info};

use crate::input::{InputBuffer, KeyInput, KeySource};
use crate::roster::PeerRoster;
use crate::tui;
use crate::wire::{Chat, Peer};

/// How long one key read may block before the stop flag is checked again.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Callbacks the node uses to push inbound events into the client.
pub trait ChatObserver: Send + Sync {
    /// Append a received chat to the transcript.
    fn add_message(&self, chat: Chat);
    fn add_peer(&self, peer: Peer);
    fn remove_peer(&self, peer: &Peer);
    /// Ask the input loop to finish.
    fn stop(&self);
}

/// Outbound half of the node, called when the user submits a line.
pub trait Node {
    /// Send `text` to `to`. `None` means no peer was selected; what happens
    /// then is up to the node.
    fn deliver_chat(&self, text: String, to: Option<Peer>);
}

/// Client loop errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Reading keys or drawing failed.
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Default)]
struct Shared {
    transcript: Vec<String>,
    roster: PeerRoster,
}

/// Cloneable handle to the client's shared state.
#[derive(Debug, Clone, Default)]
pub struct ClientHandle {
    shared: Arc<Mutex<Shared>>,
    stopped: Arc<AtomicBool>,
}

impl ClientHandle {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the transcript lines.
    pub fn transcript(&self) -> Vec<String> {
        self.lock().transcript.clone()
    }

    pub fn peers(&self) -> Vec<Peer> {
        self.lock().roster.peers().to_vec()
    }

    pub fn selected(&self) -> Option<Peer> {
        self.lock().roster.selected().cloned()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl ChatObserver for ClientHandle {
    fn add_message(&self, chat: Chat) {
        debug!(from = %chat.address, "chat received");
        self.lock().transcript.push(format!("<{}> {}", chat.address, chat.text));
    }

    fn add_peer(&self, peer: Peer) {
        info!(address = %peer.address, host = %peer.host, port = peer.port, "peer joined");
        self.lock().roster.add(peer);
    }

    fn remove_peer(&self, peer: &Peer) {
        info!(address = %peer.address, "peer left");
        self.lock().roster.remove(peer);
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// The interactive client.
#[derive(Debug, Default)]
pub struct Client {
    handle: ClientHandle,
    input: InputBuffer,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to give to the node.
    pub fn handle(&self) -> ClientHandle {
        self.handle.clone()
    }

    /// Text typed but not yet sent.
    pub fn input(&self) -> &str {
        self.input.as_str()
    }

    /// Run the input loop until [`ChatObserver::stop`] is called.
    ///
    /// Keys are read with a [`POLL_INTERVAL`] timeout and the stop flag is
    /// checked between reads, so stopping does not wait for a keypress. A key
    /// that is already being handled when the stop arrives is finished first.
    /// The screen is redrawn after every read, which also picks up whatever
    /// the node added in the meantime.
    pub fn run<N, K, B>(&mut self, node: &N, keys: &mut K, terminal: &mut Terminal<B>) -> Result<(), ClientError>
    where
        N: Node + ?Sized,
        K: KeySource + ?Sized,
        B: Backend,
    {
        self.render(terminal)?;
        while !self.handle.is_stopped() {
            if let Some(key) = keys.next_key(POLL_INTERVAL)? {
                self.handle_key(key, node);
            }
            self.render(terminal)?;
        }
        debug!("input loop stopped");
        Ok(())
    }

    /// Apply one key.
    pub fn handle_key<N: Node + ?Sized>(&mut self, key: KeyInput, node: &N) {
        match key {
            KeyInput::Up => self.handle.lock().roster.select_previous(),
            KeyInput::Down => self.handle.lock().roster.select_next(),
            KeyInput::Backspace => self.input.backspace(),
            KeyInput::Char(c) => self.input.push(c),
            KeyInput::Enter => {
                let text = self.input.take();
                // released before calling out: the node may call back in
                let to = self.handle.lock().roster.selected().cloned();
                debug!(to = to.as_ref().map(|p| p.address.as_str()), "submitting chat");
                node.deliver_chat(text, to);
            }
            KeyInput::Quit => self.handle.stop(),
        }
    }

    fn render<B: Backend>(&self, terminal: &mut Terminal<B>) -> Result<(), ClientError> {
        let shared = self.handle.lock();
        terminal.draw(|f| tui::draw(f, &shared.transcript, &shared.roster, self.input.as_str()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Outbox {
        sent: RefCell<Vec<(String, Option<Peer>)>>,
    }

    impl Node for Outbox {
        fn deliver_chat(&self, text: String, to: Option<Peer>) {
            self.sent.borrow_mut().push((text, to));
        }
    }

    fn peer(address: &str) -> Peer {
        Peer::new(address, "127.0.0.1", 6667)
    }

    fn press(client: &mut Client, node: &Outbox, keys: &[KeyInput]) {
        for key in keys {
            client.handle_key(*key, node);
        }
    }

    #[test]
    fn typing_and_backspace_edit_the_buffer() {
        let mut client = Client::new();
        let node = Outbox::default();
        press(&mut client, &node, &[KeyInput::Char('h'), KeyInput::Char('i'), KeyInput::Backspace, KeyInput::Char('o')]);
        assert_eq!(client.input(), "ho");
        assert!(node.sent.borrow().is_empty());
    }

    #[test]
    fn enter_sends_once_to_selected_peer_and_clears() {
        let mut client = Client::new();
        let handle = client.handle();
        handle.add_peer(peer("p1"));
        handle.add_peer(peer("p2"));
        let node = Outbox::default();

        press(&mut client, &node, &[KeyInput::Down, KeyInput::Char('y'), KeyInput::Char('o'), KeyInput::Enter]);

        assert_eq!(client.input(), "");
        assert_eq!(*node.sent.borrow(), vec![("yo".to_string(), Some(peer("p2")))]);
    }

    #[test]
    fn enter_with_nothing_typed_and_no_peer_still_sends() {
        let mut client = Client::new();
        let node = Outbox::default();
        press(&mut client, &node, &[KeyInput::Enter]);
        assert_eq!(*node.sent.borrow(), vec![(String::new(), None)]);
    }

    #[test]
    fn arrows_move_the_selection() {
        let mut client = Client::new();
        let handle = client.handle();
        for address in ["p1", "p2", "p3"] {
            handle.add_peer(peer(address));
        }
        let node = Outbox::default();

        press(&mut client, &node, &[KeyInput::Down, KeyInput::Down, KeyInput::Down]);
        assert_eq!(handle.selected(), Some(peer("p3")));
        press(&mut client, &node, &[KeyInput::Up]);
        assert_eq!(handle.selected(), Some(peer("p2")));
    }

    #[test]
    fn quit_sets_the_stop_flag() {
        let mut client = Client::new();
        press(&mut client, &Outbox::default(), &[KeyInput::Quit]);
        assert!(client.handle().is_stopped());
    }

    #[test]
    fn messages_are_formatted_with_sender() {
        let handle = Client::new().handle();
        handle.add_message(Chat::new("alice", "bob", "hello"));
        handle.add_message(Chat::new("alice", "bob", "again"));
        assert_eq!(handle.transcript(), ["<alice> hello", "<alice> again"]);
    }

    #[test]
    fn peers_leave_the_roster() {
        let handle = Client::new().handle();
        handle.add_peer(peer("p1"));
        handle.add_peer(peer("p2"));
        handle.remove_peer(&peer("p1"));
        assert_eq!(handle.peers(), [peer("p2")]);
        assert_eq!(handle.selected(), Some(peer("p2")));
    }
}
