use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use super::comm::Tag;

/// What travels between ranks: either a tagged payload, or notice that the
/// sender has given up and the job is over.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Envelope {
    Data {
        source: usize,
        tag: Tag,
        payload: Vec<u8>,
    },
    Abort {
        source: usize,
        reason: String,
    },
}

/// Keeps messages which arrived before anyone asked for them. Receives name
/// a specific peer and tag, but the transport delivers everything through
/// one inbound queue, so anything else that turns up in the meantime is
/// parked here, in arrival order per `(source, tag)`.
#[derive(Default)]
pub struct Mailbox {
    pending: RefCell<HashMap<(usize, Tag), VecDeque<Vec<u8>>>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive the next message from `source` with `tag`, pulling envelopes
    /// from `next` until it shows up. An abort from any peer ends the wait.
    pub fn recv<F>(&self, source: usize, tag: Tag, mut next: F) -> Result<Vec<u8>>
    where
        F: FnMut() -> Result<Envelope>,
    {
        if let Some(payload) = self.take(source, tag) {
            return Ok(payload);
        }
        loop {
            match next()? {
                Envelope::Data { source: s, tag: t, payload } if s == source && t == tag => {
                    return Ok(payload);
                }
                envelope => self.park(envelope)?,
            }
        }
    }

    /// Keep a data envelope for a later receive. An abort notice is returned
    /// as `Error::Aborted` instead.
    pub fn park(&self, envelope: Envelope) -> Result<()> {
        match envelope {
            Envelope::Data { source, tag, payload } => {
                debug!("parking message from rank {} with tag {}", source, tag);
                self.pending.borrow_mut().entry((source, tag)).or_default().push_back(payload);
                Ok(())
            }
            Envelope::Abort { source, reason } => Err(Error::Aborted { rank: source, reason }),
        }
    }

    fn take(&self, source: usize, tag: Tag) -> Option<Vec<u8>> {
        self.pending.borrow_mut().get_mut(&(source, tag)).and_then(VecDeque::pop_front)
    }
}
