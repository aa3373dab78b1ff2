//! TCP transport: one connection per message, both for the RPC fan-out
//! (outbound) and for the per-destination client half of a proposal round
//! trip. Connect and read timeouts are always enforced; no socket wait is
//! ever unbounded.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::config::PeerTable;
use crate::message::Message;
use crate::profile::Profile;

pub const CONNECT_TIMEOUT_MS: u64 = 800;
pub const RPC_TIMEOUT_MS: u64 = 2000;

/// Connects to `addr`, consults the outbound fault-injection hooks, writes
/// `msg` and reads one reply line, in this order: connect, then
/// `should_drop`, then `delay`, then write+read.
pub fn send_recv(
    addr: SocketAddr,
    msg: &Message,
    profile: &Profile,
    connect_timeout: Duration,
    io_timeout: Duration,
) -> Option<Message> {
    let stream = match TcpStream::connect_timeout(&addr, connect_timeout) {
        Ok(s) => s,
        Err(e) => {
            debug!("connect to {} failed: {}", addr, e);
            return None;
        }
    };

    if profile.should_drop() {
        trace!("outbound drop to {}", addr);
        return None;
    }
    profile.delay();

    stream.set_write_timeout(Some(io_timeout)).ok()?;
    stream.set_read_timeout(Some(io_timeout)).ok()?;

    {
        let mut writer = &stream;
        if writeln!(writer, "{}", msg.serialize()).is_err() {
            return None;
        }
    }

    let mut reader = BufReader::new(&stream);
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Message::parse(line.trim_end_matches(['\n', '\r'])).ok(),
        Err(e) => {
            debug!("read from {} timed out or failed: {}", addr, e);
            None
        }
    }
}

/// Broadcasts `msg` to every peer in `table` except `self_id`, in parallel,
/// and returns whatever replies arrive before `RPC_TIMEOUT_MS` elapses.
/// Order is unspecified; callers must count by message type, never rely on
/// positional correspondence.
pub fn rpc_all(
    table: &PeerTable,
    self_id: &str,
    msg: &Message,
    profile: &Arc<Profile>,
) -> Vec<Message> {
    let deadline = Instant::now() + Duration::from_millis(RPC_TIMEOUT_MS);
    let (tx, rx) = mpsc::channel();

    let mut spawned = 0usize;
    for (id, addr) in table.iter() {
        if id == self_id {
            continue;
        }
        let addr = *addr;
        let msg = msg.clone();
        let profile = profile.clone();
        let tx = tx.clone();
        spawned += 1;
        thread::spawn(move || {
            let reply = send_recv(
                addr,
                &msg,
                &profile,
                Duration::from_millis(CONNECT_TIMEOUT_MS),
                Duration::from_millis(RPC_TIMEOUT_MS),
            );
            let _ = tx.send(reply);
        });
    }
    drop(tx);

    let mut replies = Vec::with_capacity(spawned);
    let mut received = 0usize;
    loop {
        if received == spawned {
            break;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match rx.recv_timeout(remaining) {
            Ok(Some(reply)) => {
                replies.push(reply);
                received += 1;
            }
            Ok(None) => {
                received += 1;
            }
            Err(_) => break,
        }
    }

    replies
}
