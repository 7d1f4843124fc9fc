use std::collections::HashMap;
use std::io::prelude::*;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, info, warn};

use crate::error::{Error, Result};
use super::backoff::{ExponentialBackoff, Retry};
use super::comm::{Communicator, Tag};
use super::mailbox::{Envelope, Mailbox};
use super::util;

const RETRY_WAIT: Duration = Duration::from_millis(250);
const RETRY_MAX_WAIT: Duration = Duration::from_millis(5000);
const CONNECT_ATTEMPTS: usize = 40;

type Outbound = (usize, Envelope);
type Inbound = Result<Envelope>;

/// Background threads moving frames on and off the wire. A frame is the
/// length of an `rmp-serde` encoded [`Envelope`] as a little-endian usize,
/// followed by the bytes; the receiver acknowledges each frame by echoing
/// the length back.
struct TcpHost {
    send_thread: Option<JoinHandle<()>>,
}

impl TcpHost {
    fn start(
        rank: usize,
        peers: Vec<SocketAddr>,
        outbound: Receiver<Outbound>,
        inbound: Sender<Inbound>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(peers[rank])?;
        info!("rank {} listening on {}", rank, peers[rank]);

        Self::start_listener(listener, inbound.clone());
        let send_thread = Self::start_serial_sender(peers, outbound, inbound);

        Ok(TcpHost {
            send_thread: Some(send_thread),
        })
    }

    fn start_serial_sender(
        peers: Vec<SocketAddr>,
        outbound: Receiver<Outbound>,
        inbound: Sender<Inbound>,
    ) -> JoinHandle<()> {
        thread::spawn(move || {
            let mut table: HashMap<usize, TcpStream> = HashMap::new();

            for (rank, envelope) in outbound {
                if let Err(e) = Self::deliver(&mut table, &peers, rank, &envelope) {
                    error!("failed to send message to rank {} at {}: {}", rank, peers[rank], e);
                    table.remove(&rank);

                    if let Envelope::Data { .. } = envelope {
                        let _ = inbound.send(Err(Error::Disconnected { rank }));
                    }
                }
            }
            debug!("outbound queue closed");
        })
    }

    fn deliver(
        table: &mut HashMap<usize, TcpStream>,
        peers: &[SocketAddr],
        rank: usize,
        envelope: &Envelope,
    ) -> Result<()> {
        let message = rmp_serde::to_vec(envelope).map_err(|e| Error::Malformed(e.to_string()))?;

        if !table.contains_key(&rank) {
            table.insert(rank, Self::connect_with_retry(peers[rank])?);
        }
        let client = table.get_mut(&rank).ok_or(Error::Disconnected { rank })?;

        client.write_all(&message.len().to_le_bytes())?;
        client.write_all(&message)?;
        let ack = util::read_usize(client)?;

        if ack != message.len() {
            return Err(Error::Malformed(format!(
                "rank {} acknowledged {} bytes of a {} byte frame",
                rank, ack, message.len())))
        }
        Ok(())
    }

    fn start_listener(listener: TcpListener, inbound: Sender<Inbound>) {
        thread::spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => Self::handle_connection(stream, inbound.clone()),
                    Err(e) => warn!("failed to accept connection: {}", e),
                }
            }
        });
    }

    fn handle_connection(mut stream: TcpStream, inbound: Sender<Inbound>) {
        let remote = stream.peer_addr().map(|a| a.to_string()).unwrap_or_default();
        debug!("accepted connection from {}", remote);

        thread::spawn(move || loop {
            let frame = util::read_usize(&mut stream)
                .and_then(|size| util::read_bytes_vec(&mut stream, size));

            let bytes = match frame {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!("connection from {} closed: {}", remote, e);
                    break;
                }
            };
            let envelope = rmp_serde::from_slice::<Envelope>(&bytes)
                .map_err(|e| Error::Malformed(format!("frame from {}: {}", remote, e)));

            if inbound.send(envelope).is_err() || stream.write_all(&bytes.len().to_le_bytes()).is_err() {
                break;
            }
        });
    }

    fn connect_with_retry(addr: SocketAddr) -> Result<TcpStream> {
        let attempt = ExponentialBackoff::new(RETRY_WAIT, RETRY_MAX_WAIT, 2)
            .take(CONNECT_ATTEMPTS)
            .retry(
                || TcpStream::connect(addr),
                |e, delay| {
                    debug!("connect to {} failed ({}), retrying in {:?}", addr, e, delay);
                    thread::sleep(delay)
                });

        match attempt {
            Some(Ok(stream)) => {
                stream.set_nodelay(true)?;
                Ok(stream)
            }
            Some(Err(e)) => Err(e.into()),
            None => Err(Error::Config(format!("no attempts made to connect to {}", addr))),
        }
    }
}

/// A communicator whose ranks are separate processes, listening on the
/// socket address at their own index in a shared peer list.
pub struct TcpCommunicator {
    rank: usize,
    num_peers: usize,
    outbound: Option<Sender<Outbound>>,
    inbound: Receiver<Inbound>,
    mailbox: Mailbox,
    host: TcpHost,
}

impl TcpCommunicator {
    pub fn new(rank: usize, peers: Vec<SocketAddr>) -> Result<Self> {
        if rank >= peers.len() {
            return Err(Error::Config(format!("rank {} has no address among {} peers", rank, peers.len())))
        }
        let num_peers = peers.len();
        let (outbound_sink, outbound_src) = crossbeam_channel::unbounded();
        let (inbound_sink, inbound_src) = crossbeam_channel::unbounded();
        let host = TcpHost::start(rank, peers, outbound_src, inbound_sink)?;

        Ok(Self {
            rank,
            num_peers,
            outbound: Some(outbound_sink),
            inbound: inbound_src,
            mailbox: Mailbox::new(),
            host,
        })
    }

    fn post(&self, rank: usize, envelope: Envelope) -> Result<()> {
        self.outbound
            .as_ref()
            .ok_or(Error::Disconnected { rank })?
            .send((rank, envelope))
            .map_err(|_| Error::Disconnected { rank })
    }
}

impl Communicator for TcpCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.num_peers
    }

    fn send(&self, rank: usize, tag: Tag, message: Vec<u8>) -> Result<()> {
        self.post(rank, Envelope::Data { source: self.rank, tag, payload: message })
    }

    fn recv(&self, rank: usize, tag: Tag) -> Result<Vec<u8>> {
        self.mailbox.recv(rank, tag, || {
            self.inbound.recv().map_err(|_| Error::Disconnected { rank })?
        })
    }

    fn abort(&self, reason: &str) {
        for rank in (0..self.num_peers).filter(|&r| r != self.rank) {
            let _ = self.post(rank, Envelope::Abort { source: self.rank, reason: reason.to_string() });
        }
    }
}

impl Drop for TcpCommunicator {
    fn drop(&mut self) {
        // Closing the queue lets the sender drain and exit.
        self.outbound.take();

        if let Some(handle) = self.host.send_thread.take() {
            if handle.join().is_err() {
                error!("tcp sender thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::thread;

    /// Loopback addresses on ports the OS has just handed out.
    fn loopback_peers(size: usize) -> Vec<SocketAddr> {
        let listeners: Vec<_> = (0..size).map(|_| TcpListener::bind("127.0.0.1:0").unwrap()).collect();
        listeners.iter().map(|l| l.local_addr().unwrap()).collect()
    }

    fn run_group<F, T>(size: usize, f: F) -> Vec<T>
    where
        F: Fn(TcpCommunicator) -> T + Send + Copy + 'static,
        T: Send + 'static,
    {
        let peers = loopback_peers(size);
        let handles: Vec<_> = (0..size)
            .map(|rank| {
                let peers = peers.clone();
                thread::spawn(move || f(TcpCommunicator::new(rank, peers).unwrap()))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    }

    #[test]
    fn all_reduce_crosses_the_wire() {
        let sums = run_group(2, |comm| comm.all_reduce_sum(comm.rank() as f64 + 1.0).unwrap());
        assert_eq!(sums, vec![3.0, 3.0]);
    }

    #[test]
    fn tagged_messages_match_regardless_of_arrival_order() {
        let results = run_group(2, |comm| {
            if comm.rank() == 0 {
                comm.send(1, 1, vec![1]).unwrap();
                comm.send(1, 2, vec![2]).unwrap();
                comm.barrier().unwrap();
                Vec::new()
            } else {
                let second = comm.recv(0, 2).unwrap();
                let first = comm.recv(0, 1).unwrap();
                comm.barrier().unwrap();
                vec![first[0], second[0]]
            }
        });
        assert_eq!(results[1], vec![1, 2]);
    }

    #[test]
    fn abort_reaches_a_blocked_receive() {
        let results = run_group(2, |comm| {
            if comm.rank() == 0 {
                comm.abort("giving up");
                None
            } else {
                match comm.recv(0, 9) {
                    Err(Error::Aborted { rank, reason }) => Some((rank, reason)),
                    other => panic!("unexpected {:?}", other),
                }
            }
        });
        assert_eq!(results[1], Some((0, "giving up".to_string())));
    }

    #[test]
    fn a_rank_needs_its_own_address() {
        assert!(matches!(TcpCommunicator::new(2, loopback_peers(2)), Err(Error::Config(_))));
    }
}
