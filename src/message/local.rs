use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::error::{Error, Result};
use super::comm::{Communicator, Tag};
use super::mailbox::{Envelope, Mailbox};

/// A communicator for ranks that are threads of one process, connected by
/// channels. Useful for running a multi-rank job on a single node, and for
/// tests.
pub struct LocalCommunicator {
    rank: usize,
    peers: Vec<Sender<Envelope>>,
    inbox: Receiver<Envelope>,
    mailbox: Mailbox,
}

impl LocalCommunicator {
    /// Create a fully connected group of `size` communicators. Move one into
    /// each rank's thread.
    pub fn group(size: usize) -> Vec<Self> {
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| unbounded()).unzip();

        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| Self {
                rank,
                peers: senders.clone(),
                inbox,
                mailbox: Mailbox::new(),
            })
            .collect()
    }

    /// Why a send to `rank` found nobody listening: the abort notice of
    /// whichever peer gave up, if one is already in the inbox.
    fn departure(&self, rank: usize) -> Error {
        for envelope in self.inbox.try_iter() {
            if let Err(e) = self.mailbox.park(envelope) {
                return e;
            }
        }
        Error::Disconnected { rank }
    }
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.peers.len()
    }

    fn send(&self, rank: usize, tag: Tag, message: Vec<u8>) -> Result<()> {
        let envelope = Envelope::Data { source: self.rank, tag, payload: message };
        self.peers
            .get(rank)
            .ok_or(Error::Disconnected { rank })?
            .send(envelope)
            .map_err(|_| self.departure(rank))
    }

    fn recv(&self, rank: usize, tag: Tag) -> Result<Vec<u8>> {
        self.mailbox.recv(rank, tag, || self.inbox.recv().map_err(|_| Error::Disconnected { rank }))
    }

    fn abort(&self, reason: &str) {
        for (rank, peer) in self.peers.iter().enumerate() {
            if rank != self.rank {
                let _ = peer.send(Envelope::Abort { source: self.rank, reason: reason.to_string() });
            }
        }
    }
}
