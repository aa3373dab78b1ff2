//! A single-decree Paxos engine for a fixed nine-peer cluster electing one
//! value (a "president" identifier) drawn from the member set. Each peer
//! plays proposer, acceptor and learner simultaneously over a
//! one-connection-per-message TCP transport.

extern crate env_logger;
#[macro_use]
extern crate log;
extern crate rand;

pub mod acceptor;
pub mod config;
pub mod error;
pub mod learner;
pub mod listener;
pub mod message;
pub mod node;
pub mod peer;
pub mod profile;
pub mod proposal_number;
pub mod proposer;

pub use message::Message;
pub use peer::Peer;
pub use profile::{Profile, ProfileKind};
pub use proposal_number::ProposalNumber;
pub use proposer::ProposeOutcome;
