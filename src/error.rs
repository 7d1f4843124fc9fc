use std::error;
use std::fmt;
use std::io;
use crate::decompose::Side;




/**
 * Error to represent a failed setup, a broken communication channel, or an
 * unrecoverable numerical condition. Every variant is fatal for the whole
 * job: the driver reports it and then aborts all ranks.
 */
#[derive(Debug)]
pub enum Error {
    Config(String),
    Decomposition { count: usize, cells: (usize, usize) },
    Io(io::Error),
    Disconnected { rank: usize },
    Malformed(String),
    BufferSize { side: Side, expected: usize, received: usize },
    Aborted { rank: usize, reason: String },
    NegativeVolume { cell: (i64, i64), volume: f64 },
    Interrupted,
}

pub type Result<T> = std::result::Result<T, Error>;




// ============================================================================
impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;

        match self {
            Config(message) => write!(fmt, "invalid configuration: {}", message),
            Decomposition { count, cells } => write!(
                fmt,
                "cannot split {} x {} cells into {} non-empty blocks",
                cells.0, cells.1, count),
            Io(e) => write!(fmt, "i/o error: {}", e),
            Disconnected { rank } => write!(fmt, "lost connection to rank {}", rank),
            Malformed(message) => write!(fmt, "malformed message: {}", message),
            BufferSize { side, expected, received } => write!(
                fmt,
                "halo message from {:?} neighbor has {} values, expected {}",
                side, received, expected),
            Aborted { rank, reason } => write!(fmt, "job aborted by rank {}: {}", rank, reason),
            NegativeVolume { cell, volume } => write!(
                fmt,
                "negative cell volume {:e} at ({}, {})",
                volume, cell.0, cell.1),
            Interrupted => write!(fmt, "interrupted by signal"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
