//! A peer: the process that simultaneously plays proposer, acceptor and
//! learner over the static nine-member table. Resolves other peers by
//! identifier through the table rather than holding references between
//! peer objects, so no cycle exists in the object graph.

use std::sync::Arc;

use crate::acceptor::Acceptor;
use crate::config::PeerTable;
use crate::learner::Learner;
use crate::message::{Message, Value};
use crate::profile::Profile;
use crate::proposal_number::member_index;
use crate::proposer::{ProposeOutcome, Proposer};

pub struct Peer {
    id: String,
    table: PeerTable,
    profile: Arc<Profile>,
    acceptor: Acceptor,
    learner: Learner,
    proposer: Proposer,
}

impl Peer {
    pub fn new(id: impl Into<String>, table: PeerTable, profile: Arc<Profile>) -> Self {
        let id = id.into();
        let idx = member_index(&id).unwrap_or(0);
        Peer {
            acceptor: Acceptor::new(id.clone()),
            learner: Learner::new(id.clone()),
            proposer: Proposer::new(id.clone(), idx),
            id,
            table,
            profile,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn table(&self) -> &PeerTable {
        &self.table
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Routes one inbound request to the acceptor or learner. Any other
    /// message shape reaching a listener (a reply type, or something
    /// malformed the codec otherwise accepted) gets an `ERROR` reply and
    /// causes no state change.
    pub fn dispatch(&self, msg: Message) -> Message {
        match msg {
            Message::Prepare { n, .. } => self.acceptor.handle_prepare(n),
            Message::AcceptRequest { n, value, .. } => self.acceptor.handle_accept_request(n, value),
            Message::Decide { value, .. } => self.learner.handle_decide(value),
            other => Message::Error {
                from: self.id.clone(),
                reason: format!("unexpected message type from {}", other.from()),
            },
        }
    }

    /// Drives one proposal attempt for `candidate`, and, on success, also
    /// routes the `DECIDE` through this peer's own learner, so the
    /// proposing peer announces consensus locally exactly like every
    /// other peer that receives the broadcast.
    pub fn propose(&self, candidate: &str) -> ProposeOutcome {
        let outcome = self.proposer.propose(candidate, &self.table, &self.profile);
        if let ProposeOutcome::Decided(ref value) = outcome {
            self.learner.handle_decide(value.clone());
        }
        outcome
    }

    pub fn decided_value(&self) -> Option<Value> {
        self.learner.decided_value()
    }

    /// Bounded-retry convenience wrapper: not used by `propose`, and not
    /// wired into the baseline CLI, which calls `propose` exactly once.
    pub fn propose_with_retries(&self, candidate: &str, max_attempts: usize) -> ProposeOutcome {
        let outcome = self
            .proposer
            .propose_with_retries(candidate, &self.table, &self.profile, max_attempts);
        if let ProposeOutcome::Decided(ref value) = outcome {
            self.learner.handle_decide(value.clone());
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::rpc_all;
    use crate::profile::ProfileKind;
    use std::net::SocketAddr;

    fn loopback_table(n: usize) -> (PeerTable, Vec<std::net::TcpListener>) {
        let mut table = PeerTable::new();
        let mut listeners = Vec::new();
        for i in 1..=n {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = listener.local_addr().unwrap();
            table.push((format!("M{}", i), addr));
            listeners.push(listener);
        }
        (table, listeners)
    }

    #[test]
    fn unexpected_message_type_is_answered_with_error() {
        let (table, _listeners) = loopback_table(1);
        let profile = Arc::new(Profile::with_seed(ProfileKind::Reliable, 1));
        let peer = Peer::new("M1", table, profile);

        let reply = peer.dispatch(Message::Ack {
            from: "M2".to_string(),
        });
        assert!(matches!(reply, Message::Error { .. }));
    }

    #[test]
    fn dispatch_routes_decide_through_the_local_learner() {
        let (table, _listeners) = loopback_table(1);
        let profile = Arc::new(Profile::with_seed(ProfileKind::Reliable, 1));
        let peer = Peer::new("M1", table, profile);

        peer.dispatch(Message::Decide {
            from: "M4".to_string(),
            value: "M5".to_string(),
        });
        assert_eq!(peer.decided_value(), Some("M5".to_string()));
    }

    // Exercises the fan-out against real loopback sockets that simply echo
    // back a canned ACCEPTED, to pin down that replies are counted by type,
    // not by position.
    #[test]
    fn rpc_all_ignores_unresponsive_peers_and_collects_the_rest() {
        let self_addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let listener = std::net::TcpListener::bind(self_addr).unwrap();
        let responsive_addr = listener.local_addr().unwrap();

        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = &stream;
            use std::io::Write;
            writeln!(writer, "ACCEPTED|M2|1.1|M5||").unwrap();
        });

        let unreachable_addr: SocketAddr = "127.0.0.1:1".parse().unwrap();

        let table: PeerTable = vec![
            ("M1".to_string(), self_addr), // self, skipped
            ("M2".to_string(), responsive_addr),
            ("M3".to_string(), unreachable_addr),
        ];

        let profile = Arc::new(Profile::with_seed(ProfileKind::Reliable, 3));
        let msg = Message::AcceptRequest {
            from: "M1".to_string(),
            n: crate::proposal_number::ProposalNumber::new(1, 1),
            value: "M5".to_string(),
        };
        let replies = rpc_all(&table, "M1", &msg, &profile);

        assert_eq!(replies.len(), 1);
        assert!(matches!(replies[0], Message::Accepted { .. }));

        handle.join().unwrap();
    }
}
