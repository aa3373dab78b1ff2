//! Accepts inbound connections, reads one framed message per connection,
//! dispatches it to the acceptor/learner, and writes at most one reply.
//! The listener never holds a connection across requests.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use log::{trace, warn};

use crate::message::Message;
use crate::peer::Peer;

pub fn run(peer: Arc<Peer>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr)?;
    serve(peer, listener);
    Ok(())
}

/// Same accept loop as `run`, but over a socket the caller already bound.
/// Lets tests reserve an ephemeral port and hand the same, still-open
/// listener straight to the peer, instead of racing a bind/rebind.
pub fn serve(peer: Arc<Peer>, listener: TcpListener) {
    log::info!(
        "[{}] listening on {}",
        peer.id(),
        listener.local_addr().map(|a| a.to_string()).unwrap_or_default()
    );

    for incoming in listener.incoming() {
        match incoming {
            Ok(stream) => {
                let peer = peer.clone();
                thread::spawn(move || handle_connection(&peer, stream));
            }
            Err(e) => warn!("[{}] accept error: {}", peer.id(), e),
        }
    }
}

fn handle_connection(peer: &Arc<Peer>, stream: TcpStream) {
    let mut reader = BufReader::new(&stream);
    let mut line = String::new();

    match reader.read_line(&mut line) {
        Ok(0) => return, // peer closed the connection without sending anything
        Ok(_) => {}
        Err(e) => {
            trace!("[{}] read error: {}", peer.id(), e);
            return;
        }
    }

    if peer.profile().should_drop() {
        trace!("[{}] inbound drop", peer.id());
        return;
    }
    peer.profile().delay();

    let line = line.trim_end_matches(['\n', '\r']);
    let reply = match Message::parse(line) {
        Ok(msg) => peer.dispatch(msg),
        Err(e) => {
            warn!("[{}] dropping malformed frame {:?}: {}", peer.id(), line, e);
            return;
        }
    };

    let mut writer = &stream;
    if writeln!(writer, "{}", reply.serialize()).is_err() {
        return;
    }
    let _ = writer.flush();
}
