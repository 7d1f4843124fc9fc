use std::{iter::Take, time::Duration};

/// An endless sequence of waits between connection attempts, growing by a
/// constant factor until it saturates at a maximum. Ranks in a TCP group come
/// up in no particular order, so the first connections to a peer usually
/// fail and have to be retried.
///
/// Use `take` to bound the number of attempts.
pub struct ExponentialBackoff {
    curr: Duration,
    max: Duration,
    factor: u32,
}

impl ExponentialBackoff {
    pub fn new(start: Duration, max: Duration, factor: u32) -> ExponentialBackoff {
        ExponentialBackoff {
            curr: start,
            max,
            factor,
        }
    }
}

impl Iterator for ExponentialBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        let this = self.curr;
        self.curr = (self.curr * self.factor).min(self.max);
        Some(this)
    }
}

/// Retry a fallible operation once per item of an iterator of delays.
pub trait Retry {
    /// Call `f` until it returns [Ok]. After each failure except the last,
    /// `sleep` is handed the error and the next delay; it is expected to log
    /// and then wait. Returns the last error if every attempt fails, or
    /// `None` if the iterator was empty to begin with.
    fn retry<F, S, T, E>(&mut self, mut f: F, sleep: S) -> Option<Result<T, E>>
    where
        F: FnMut() -> Result<T, E>,
        S: Fn(&E, Duration),
        Self: Iterator<Item = Duration>,
    {
        let mut last_err = None;
        let mut iter = self.peekable();

        while let Some(delay) = iter.next() {
            match f() {
                Ok(v) => return Some(Ok(v)),
                Err(e) => {
                    if iter.peek().is_some() {
                        sleep(&e, delay);
                    }
                    last_err = Some(Err(e));
                }
            }
        }
        last_err
    }
}

impl Retry for ExponentialBackoff {}

impl Retry for Take<ExponentialBackoff> {}
