//! TCP node.
//!
//! Responsibilities:
//! - accept TCP connections and dial bootstrap peers
//! - announce our own [`Peer`] record first on every connection
//! - spawn one reader thread per connection and feed decoded envelopes to
//!   the [`ChatObserver`]
//! - deliver outgoing chats to the connection of the addressed peer
//!
//! Delivery is best effort: a chat for a peer we are not connected to is
//! logged and dropped.

use std::collections::HashMap;
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{ChatObserver, Node};
use crate::net::{self, FrameError};
use crate::types::{PeerLink, SharedConnections, SharedStream};
use crate::wire::{self, Chat, Message, Peer};

/// Node errors.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("framing error: {0}")]
    Frame(#[from] FrameError),
}

/// Startup settings for [`TcpNode`].
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Our address, announced to every peer.
    pub address: String,
    /// Socket address to listen on.
    pub listen: String,
    /// Host advertised in our announcement.
    pub host: String,
    /// Peers to dial at startup.
    pub bootstrap: Vec<String>,
}

/// A node speaking length-prefixed envelopes over TCP.
pub struct TcpNode {
    me: Peer,
    connections: SharedConnections,
    observer: Arc<dyn ChatObserver>,
}

impl TcpNode {
    /// Bind the listener, dial the bootstrap peers and start accepting.
    ///
    /// Only binding can fail; an unreachable bootstrap peer is logged and
    /// skipped.
    pub fn start(config: NodeConfig, observer: impl ChatObserver + 'static) -> Result<Arc<Self>, NodeError> {
        let listener = TcpListener::bind(&config.listen)?;
        let port = listener.local_addr()?.port();
        info!(address = %config.address, listen = %config.listen, port, "node listening");

        let node = Arc::new(Self {
            me: Peer::new(config.address, config.host, i32::from(port)),
            connections: Arc::new(Mutex::new(HashMap::new())),
            observer: Arc::new(observer),
        });

        let acceptor = Arc::clone(&node);
        thread::spawn(move || acceptor.accept_loop(listener));

        for addr in &config.bootstrap {
            if let Err(e) = node.connect(addr) {
                warn!(%addr, error = %e, "bootstrap peer unreachable");
            }
        }
        Ok(node)
    }

    /// Dial `addr` and start talking to whoever answers.
    pub fn connect(self: &Arc<Self>, addr: &str) -> Result<(), NodeError> {
        let stream = TcpStream::connect(addr)?;
        Arc::clone(self).attach(stream, true)
    }

    /// Our own announcement record.
    pub fn local_peer(&self) -> &Peer {
        &self.me
    }

    /// Addresses of the peers with a live connection.
    pub fn connected_peers(&self) -> Vec<String> {
        let mut addresses: Vec<_> = self.connections().keys().cloned().collect();
        addresses.sort();
        addresses
    }

    /// Close every peer connection. Reader threads notice and report the
    /// peers as gone.
    pub fn shutdown(&self) {
        for link in self.connections().values() {
            close(&link.writer);
        }
    }

    fn connections(&self) -> MutexGuard<'_, HashMap<String, PeerLink>> {
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(e) = Arc::clone(&self).attach(stream, false) {
                        warn!(error = %e, "failed to set up incoming connection");
                    }
                }
                Err(e) => warn!(error = %e, "error accepting connection"),
            }
        }
    }

    /// Announce ourselves on `stream` and start its reader thread.
    fn attach(self: Arc<Self>, stream: TcpStream, dialed: bool) -> Result<(), NodeError> {
        let remote = stream.peer_addr()?;
        debug!(%remote, "connection established");

        let mut writer = stream.try_clone()?;
        net::write_frame(&mut writer, &wire::encode(self.me.clone()))?;
        let link = PeerLink { writer: Arc::new(Mutex::new(writer)), dialed };

        thread::spawn(move || self.read_loop(stream, link));
        Ok(())
    }

    fn read_loop(&self, mut reader: TcpStream, link: PeerLink) {
        let mut remote: Option<Peer> = None;
        loop {
            let bytes = match net::read_frame(&mut reader) {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(error = %e, "connection closed");
                    break;
                }
            };
            match wire::decode(&bytes) {
                Ok(Message::Peer(peer)) => {
                    if remote.is_some() {
                        debug!(address = %peer.address, "ignoring repeated announcement");
                    } else if peer.address == self.me.address {
                        debug!("connected to ourselves, closing");
                        let _ = reader.shutdown(Shutdown::Both);
                        return;
                    } else if self.register(&peer, &link) {
                        remote = Some(peer);
                    } else {
                        debug!(address = %peer.address, "peer already connected, closing duplicate");
                        let _ = reader.shutdown(Shutdown::Both);
                        return;
                    }
                }
                Ok(Message::Chat(chat)) => self.observer.add_message(chat),
                Err(e) => warn!(error = %e, "dropping undecodable frame"),
            }
        }

        if let Some(peer) = remote {
            self.unregister(&peer, &link.writer);
        }
    }

    /// Record the connection for `peer`. Returns `false` if the connection
    /// should be dropped in favour of one already registered.
    ///
    /// When both nodes dial each other, each ends up with two connections.
    /// Both sides keep the one dialed by the lower address, so they agree.
    fn register(&self, peer: &Peer, link: &PeerLink) -> bool {
        let replaced = {
            let mut connections = self.connections();
            let replaced = match connections.get(&peer.address) {
                None => None,
                Some(existing) if prefer_new_link(&self.me.address, &peer.address, existing.dialed, link.dialed) => {
                    Some(Arc::clone(&existing.writer))
                }
                Some(_) => return false,
            };
            connections.insert(peer.address.clone(), link.clone());
            replaced
        };
        match replaced {
            // the old reader finds itself no longer registered and stays quiet
            Some(old) => {
                debug!(address = %peer.address, "replacing duplicate connection");
                close(&old);
            }
            None => self.observer.add_peer(peer.clone()),
        }
        true
    }

    fn unregister(&self, peer: &Peer, writer: &SharedStream) {
        {
            let mut connections = self.connections();
            // a newer connection for the same address is left alone
            let owned = connections.get(&peer.address).is_some_and(|current| Arc::ptr_eq(&current.writer, writer));
            if !owned {
                return;
            }
            connections.remove(&peer.address);
        }
        self.observer.remove_peer(peer);
    }
}

impl Node for TcpNode {
    fn deliver_chat(&self, text: String, to: Option<Peer>) {
        let Some(peer) = to else {
            warn!("no peer selected, dropping chat");
            return;
        };
        let Some(stream) = self.connections().get(&peer.address).map(|link| Arc::clone(&link.writer)) else {
            warn!(address = %peer.address, "peer not connected, dropping chat");
            return;
        };

        let chat = Chat::new(self.me.address.clone(), peer.address, text);
        let bytes = wire::encode(chat.clone());
        let result = net::write_frame(&mut *lock_stream(&stream), &bytes);
        match result {
            Ok(()) => self.observer.add_message(chat),
            Err(e) => warn!(recipient = %chat.recipient, error = %e, "failed to deliver chat"),
        }
    }
}

fn lock_stream(stream: &SharedStream) -> MutexGuard<'_, TcpStream> {
    stream.lock().unwrap_or_else(PoisonError::into_inner)
}

fn close(stream: &SharedStream) {
    let _ = lock_stream(stream).shutdown(Shutdown::Both);
}

/// Whether a second connection to the same peer should replace the first.
///
/// The winner is the connection dialed by whichever address sorts lower;
/// two connections opened the same way keep the older one.
fn prefer_new_link(me: &str, peer: &str, existing_dialed: bool, new_dialed: bool) -> bool {
    let we_should_dial = me < peer;
    existing_dialed != new_dialed && new_dialed == we_should_dial
}
