//! The acceptor state machine: the single source of safety in this engine.
//! Handling of PREPARE and ACCEPT_REQUEST is serialized behind one coarse
//! lock around the three fields, since they must move together on every
//! accept and fine-grained per-field locking would let them drift apart.

use std::sync::Mutex;

use crate::message::{Message, Value};
use crate::proposal_number::ProposalNumber;

#[derive(Debug, Clone, PartialEq)]
struct AcceptorState {
    promised_n: ProposalNumber,
    accepted_n: ProposalNumber,
    accepted_v: Option<Value>,
}

impl Default for AcceptorState {
    fn default() -> Self {
        AcceptorState {
            promised_n: ProposalNumber::MIN,
            accepted_n: ProposalNumber::MIN,
            accepted_v: None,
        }
    }
}

pub struct Acceptor {
    id: String,
    state: Mutex<AcceptorState>,
}

impl Acceptor {
    pub fn new(id: impl Into<String>) -> Self {
        Acceptor {
            id: id.into(),
            state: Mutex::new(AcceptorState::default()),
        }
    }

    /// `PREPARE(n)`: promises not to accept anything lower-numbered than
    /// `n` if `n > promisedN`, replying with this acceptor's last accepted
    /// pair (if any) so the proposer can carry it forward. Otherwise
    /// rejects, with no state change.
    pub fn handle_prepare(&self, n: ProposalNumber) -> Message {
        let mut state = self.state.lock().expect("acceptor state poisoned");

        if n > state.promised_n {
            state.promised_n = n;
            Message::Promise {
                from: self.id.clone(),
                n,
                accepted_n: state.accepted_n,
                accepted_v: state.accepted_v.clone(),
            }
        } else {
            Message::Reject {
                from: self.id.clone(),
                n,
                reason: format!("promised={}", state.promised_n),
            }
        }
    }

    /// `ACCEPT_REQUEST(n, v)`: accepts if `n >= promisedN`, updating all
    /// three fields atomically. Otherwise rejects, with no state change.
    pub fn handle_accept_request(&self, n: ProposalNumber, value: Value) -> Message {
        let mut state = self.state.lock().expect("acceptor state poisoned");

        if n >= state.promised_n {
            state.promised_n = n;
            state.accepted_n = n;
            state.accepted_v = Some(value.clone());
            Message::Accepted {
                from: self.id.clone(),
                n,
                value,
            }
        } else {
            Message::Reject {
                from: self.id.clone(),
                n,
                reason: format!("promised={}", state.promised_n),
            }
        }
    }

    /// Seeds this acceptor as though it had already accepted `(n, v)` in an
    /// earlier round. Used by tests to exercise value carry-forward; never
    /// called from the running engine, since acceptor state is otherwise
    /// created empty at process start.
    #[cfg(test)]
    pub fn seed_accepted(&self, n: ProposalNumber, value: Value) {
        let mut state = self.state.lock().expect("acceptor state poisoned");
        state.promised_n = n;
        state.accepted_n = n;
        state.accepted_v = Some(value);
    }

    #[cfg(test)]
    fn promised_n(&self) -> ProposalNumber {
        self.state.lock().expect("acceptor state poisoned").promised_n
    }

    #[cfg(test)]
    fn accepted_n(&self) -> ProposalNumber {
        self.state.lock().expect("acceptor state poisoned").accepted_n
    }
}
