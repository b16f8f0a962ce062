//! Ordered list of known peers with a selection cursor.

use crate::wire::Peer;

/// Known peers in arrival order plus the peer currently targeted for
/// outgoing chats.
///
/// The cursor is `None` exactly when the roster is empty. Navigation clamps
/// at both ends, it never wraps.
#[derive(Debug, Clone, Default)]
pub struct PeerRoster {
    peers: Vec<Peer>,
    selected: Option<usize>,
}

impl PeerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `peer`. The first peer added to an empty roster becomes
    /// selected; later additions leave the cursor alone.
    pub fn add(&mut self, peer: Peer) {
        self.peers.push(peer);
        if self.selected.is_none() {
            self.selected = Some(self.peers.len() - 1);
        }
    }

    /// Remove the first entry with the same address as `peer`.
    ///
    /// Absent peers are ignored. The cursor keeps pointing at the same entry
    /// when an earlier one goes away; when the selected entry itself goes
    /// away the cursor stays on its index (now the next peer) and falls back
    /// to the last peer, or to `None` once the roster is empty.
    pub fn remove(&mut self, peer: &Peer) {
        let Some(index) = self.peers.iter().position(|p| p.address == peer.address) else {
            return;
        };
        self.peers.remove(index);

        self.selected = match self.selected {
            _ if self.peers.is_empty() => None,
            Some(selected) if selected > index => Some(selected - 1),
            Some(selected) => Some(selected.min(self.peers.len() - 1)),
            None => None,
        };
    }

    pub fn select_next(&mut self) {
        if let Some(selected) = self.selected {
            self.selected = Some((selected + 1).min(self.peers.len() - 1));
        }
    }

    pub fn select_previous(&mut self) {
        if let Some(selected) = self.selected {
            self.selected = Some(selected.saturating_sub(1));
        }
    }

    /// The peer under the cursor.
    pub fn selected(&self) -> Option<&Peer> {
        self.selected.and_then(|i| self.peers.get(i))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
