//! Store Client
//!
//! Client side of the wire protocol, and the `ProcedureExecutor` that runs
//! leadership procedures on a remote store.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};

use crate::config::Config;
use crate::context::Context;
use crate::error::{LeaderError, Result};
use crate::leader::{Procedure, ProcedureExecutor};
use crate::protocol::{decode_response, encode_command, payload_len, Command, Reply, HEADER_SIZE};

/// Longest single wait on the socket before re-checking cancellation
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Smallest timeout handed to the socket (zero would mean "block forever")
const MIN_IO_TIMEOUT: Duration = Duration::from_millis(1);

/// A single connection to a store server
pub struct Client {
    stream: TcpStream,
    peer_addr: String,
}

impl Client {
    /// Connect to `addr`, trying each resolved address in turn
    pub fn connect(addr: &str, timeout: Duration) -> Result<Self> {
        let timeout = timeout.max(MIN_IO_TIMEOUT);
        let addrs = addr.to_socket_addrs().map_err(LeaderError::StoreUnavailable)?;

        let mut last_err = None;
        for candidate in addrs {
            match TcpStream::connect_timeout(&candidate, timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true).map_err(LeaderError::StoreUnavailable)?;
                    tracing::debug!("Connected to store at {}", candidate);
                    return Ok(Self {
                        stream,
                        peer_addr: candidate.to_string(),
                    });
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(LeaderError::StoreUnavailable(last_err.unwrap_or_else(|| {
            io::Error::new(ErrorKind::InvalidInput, format!("no address resolved for {}", addr))
        })))
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Send `command` and wait for its reply (one round-trip)
    ///
    /// Waits at most until the earlier of the context deadline and
    /// `io_timeout` from now, and gives up promptly once `ctx` is cancelled.
    pub fn call(&mut self, ctx: &Context, command: &Command, io_timeout: Duration) -> Result<Reply> {
        ctx.check()?;

        let deadline = ctx.child_with_timeout(io_timeout).deadline();
        let deadline = deadline.unwrap_or_else(|| Instant::now() + io_timeout);

        self.send(ctx, command, deadline)?;
        let frame = self.receive(ctx, deadline)?;
        decode_response(&frame)?.into_reply()
    }

    fn send(&mut self, ctx: &Context, command: &Command, deadline: Instant) -> Result<()> {
        let wait = deadline
            .saturating_duration_since(Instant::now())
            .max(MIN_IO_TIMEOUT);
        self.stream
            .set_write_timeout(Some(wait))
            .map_err(LeaderError::StoreUnavailable)?;

        let bytes = encode_command(command);
        self.stream
            .write_all(&bytes)
            .and_then(|_| self.stream.flush())
            .map_err(|e| Self::transport_error(ctx, e))
    }

    fn receive(&mut self, ctx: &Context, deadline: Instant) -> Result<Vec<u8>> {
        let mut frame = Vec::with_capacity(64);
        let mut expected = HEADER_SIZE;
        let mut chunk = [0u8; 4096];

        while frame.len() < expected {
            if ctx.is_cancelled() {
                return Err(LeaderError::Cancelled);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(Self::transport_error(
                    ctx,
                    io::Error::new(ErrorKind::TimedOut, "timed out waiting for store reply"),
                ));
            }

            let wait = (deadline - now).min(CANCEL_POLL_INTERVAL).max(MIN_IO_TIMEOUT);
            self.stream
                .set_read_timeout(Some(wait))
                .map_err(LeaderError::StoreUnavailable)?;

            let want = (expected - frame.len()).min(chunk.len());
            match self.stream.read(&mut chunk[..want]) {
                Ok(0) => {
                    return Err(LeaderError::StoreUnavailable(io::Error::new(
                        ErrorKind::UnexpectedEof,
                        "store closed the connection",
                    )))
                }
                Ok(n) => {
                    frame.extend_from_slice(&chunk[..n]);
                    if expected == HEADER_SIZE && frame.len() == HEADER_SIZE {
                        let mut header = [0u8; HEADER_SIZE];
                        header.copy_from_slice(&frame);
                        expected = HEADER_SIZE + payload_len(&header)?;
                    }
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                    ) => {}
                Err(e) => return Err(LeaderError::StoreUnavailable(e)),
            }
        }

        Ok(frame)
    }

    fn transport_error(ctx: &Context, err: io::Error) -> LeaderError {
        if ctx.is_cancelled() {
            LeaderError::Cancelled
        } else if ctx.is_expired() {
            LeaderError::DeadlineExceeded
        } else {
            LeaderError::StoreUnavailable(err)
        }
    }
}

/// `ProcedureExecutor` talking to a store server over TCP
///
/// Keeps one connection and reuses it; calls through the same executor are
/// serialized on it, and a queued call still honours its own context while
/// it waits. After any failure other than an error reply from the store, the
/// connection is dropped and the next call reconnects.
pub struct RemoteExecutor {
    addr: String,
    connect_timeout: Duration,
    io_timeout: Duration,
    conn: Mutex<Option<Client>>,
}

impl RemoteExecutor {
    pub fn new(addr: impl Into<String>, connect_timeout: Duration, io_timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout,
            io_timeout,
            conn: Mutex::new(None),
        }
    }

    /// Executor for `config.store_addr` with the configured timeouts
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.store_addr.clone(),
            Duration::from_millis(config.connect_timeout_ms),
            Duration::from_millis(config.io_timeout_ms),
        )
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Send any command to the store
    pub fn call(&self, ctx: &Context, command: &Command) -> Result<Reply> {
        let mut slot = self.lock_slot(ctx)?;
        let mut client = match slot.take() {
            Some(client) => client,
            None => {
                let timeout = ctx
                    .remaining()
                    .map_or(self.connect_timeout, |left| left.min(self.connect_timeout));
                Client::connect(&self.addr, timeout)?
            }
        };

        let result = client.call(ctx, command, self.io_timeout);
        match &result {
            Ok(_) | Err(LeaderError::StoreRejected(_)) => *slot = Some(client),
            Err(e) => {
                tracing::debug!("Dropping store connection to {}: {}", client.peer_addr(), e);
            }
        }
        result
    }

    /// Wait for the pooled connection slot while another call holds it,
    /// giving up as soon as `ctx` is cancelled or past its deadline
    fn lock_slot(&self, ctx: &Context) -> Result<MutexGuard<'_, Option<Client>>> {
        loop {
            ctx.check()?;
            let wait = ctx
                .remaining()
                .map_or(CANCEL_POLL_INTERVAL, |left| left.min(CANCEL_POLL_INTERVAL));
            if let Some(slot) = self.conn.try_lock_for(wait) {
                return Ok(slot);
            }
        }
    }

    /// Health check; true if the store answered PONG
    pub fn ping(&self, ctx: &Context) -> Result<bool> {
        let reply = self.call(ctx, &Command::Ping)?;
        Ok(reply == Reply::Status("PONG".to_string()))
    }
}

impl ProcedureExecutor for RemoteExecutor {
    fn execute(&self, ctx: &Context, key: &[u8], procedure: &Procedure) -> Result<Reply> {
        self.call(ctx, &procedure.to_command(key)?)
    }

    fn read(&self, ctx: &Context, key: &[u8]) -> Result<Reply> {
        self.call(ctx, &Command::Read { key: key.to_vec() })
    }
}
