use crate::error::{Error, Result};
use super::util;

/// Message tag. Halo traffic uses the small tags returned by
/// [`crate::decompose::Side::tag`]; collectives use the reserved tags below.
pub type Tag = u32;

const REDUCE_TAG: Tag = 1 << 16;
const BROADCAST_TAG: Tag = (1 << 16) + 1;

/// Interface for a group of processes that can exchange messages over a
/// network. The underlying transport can in principle be TCP, in-process
/// channels, or a higher level abstraction like MPI.
///
pub trait Communicator {
    /// Must be implemented to return the rank of this process within the
    /// communicator.
    fn rank(&self) -> usize;

    /// Must be implemented to return the number of peer processes in this
    /// communicator.
    fn size(&self) -> usize;

    /// Must be implemented to send a tagged message to a peer. This method
    /// must return immediately, in other words it is not allowed to block
    /// until a matching receive is posted.
    fn send(&self, rank: usize, tag: Tag, message: Vec<u8>) -> Result<()>;

    /// Must be implemented to receive the next message with the given tag
    /// from the given peer. Messages from the same peer with the same tag
    /// arrive in the order they were sent. This method blocks until the
    /// message is ready, and fails if the peer is lost or the job is aborted.
    fn recv(&self, rank: usize, tag: Tag) -> Result<Vec<u8>>;

    /// Must be implemented to notify every peer that this process is giving
    /// up. Peers blocked in `recv` then fail with [`Error::Aborted`]. This
    /// is best effort and never fails.
    fn abort(&self, reason: &str);

    /// Return true on the rank that does the reporting.
    fn is_boss(&self) -> bool {
        self.rank() == 0
    }

    /// Implements a binomial tree broadcast from rank 0. The message buffer
    /// must be `Some` if this is the root, and it must be `None` otherwise.
    ///
    fn broadcast(&self, value: Option<Vec<u8>>) -> Result<Vec<u8>> {
        let r = self.rank();
        let p = self.size();
        let mut value = value;

        for level in (0..util::ceil_log2(p)).rev() {
            let one = 1 << level;
            let two = 1 << (level + 1);

            if r % two == 0 {
                if r + one < p {
                    let message = value.clone().ok_or_else(|| Error::Malformed("broadcast reached a rank with no value".into()))?;
                    self.send(r + one, BROADCAST_TAG, message)?;
                }
            } else if r % two == one {
                value = Some(self.recv(r - one, BROADCAST_TAG)?);
            }
        }
        value.ok_or_else(|| Error::Malformed("broadcast root was given no value".into()))
    }

    /// Implements a binomial tree reduce to rank 0. All ranks return `None`
    /// except for the root.
    ///
    fn reduce<F>(&self, f: F, mut value: Vec<u8>) -> Result<Option<Vec<u8>>>
    where
        F: Fn(Vec<u8>, Vec<u8>) -> Result<Vec<u8>>,
    {
        let r = self.rank();
        let p = self.size();

        for level in 0..util::ceil_log2(p) {
            let one = 1 << level;
            let two = 1 << (level + 1);

            if r % two == 0 {
                if r + one < p {
                    value = f(value, self.recv(r + one, REDUCE_TAG)?)?
                }
            } else {
                self.send(r - one, REDUCE_TAG, value)?;
                return Ok(None);
            }
        }
        Ok(Some(value))
    }

    /// Implements an all-reduce (symmetric fold) operation over a commutative
    /// binary operator.
    ///
    fn all_reduce<F>(&self, f: F, value: Vec<u8>) -> Result<Vec<u8>>
    where
        F: Fn(Vec<u8>, Vec<u8>) -> Result<Vec<u8>>,
    {
        let reduced = self.reduce(f, value)?;
        self.broadcast(reduced)
    }

    /// Element-wise all-reduce of a vector of floats. Every rank must pass
    /// the same number of values.
    ///
    fn all_reduce_f64<F>(&self, f: F, values: &[f64]) -> Result<Vec<f64>>
    where
        F: Fn(f64, f64) -> f64,
    {
        let combine = |a: Vec<u8>, b: Vec<u8>| {
            let a = util::decode_f64s(&a)?;
            let b = util::decode_f64s(&b)?;

            if a.len() != b.len() {
                return Err(Error::Malformed(format!("cannot combine {} values with {}", a.len(), b.len())))
            }
            Ok(util::encode_f64s(a.iter().zip(&b).map(|(&x, &y)| f(x, y))))
        };
        let bytes = self.all_reduce(combine, util::encode_f64s(values.iter().cloned()))?;
        util::decode_f64s(&bytes)
    }

    /// Sum one value over all ranks; every rank gets the result.
    fn all_reduce_sum(&self, value: f64) -> Result<f64> {
        Ok(self.all_reduce_f64(|a, b| a + b, &[value])?[0])
    }

    /// Minimum of one value over all ranks; every rank gets the result.
    fn all_reduce_min(&self, value: f64) -> Result<f64> {
        Ok(self.all_reduce_f64(f64::min, &[value])?[0])
    }

    /// Block until every rank has reached this point.
    fn barrier(&self) -> Result<()> {
        self.all_reduce(|a, _| Ok(a), Vec::new()).map(|_| ())
    }
}
