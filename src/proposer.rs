//! The two-phase proposer protocol: phase 1 (prepare/promise) picks up any
//! previously accepted value via carry-forward, phase 2 (accept/accepted)
//! drives it to a majority, and a successful phase 2 broadcasts `DECIDE`.
//! Modelled as a straight-line state machine with explicit abort outcomes
//! (tagged results), not exceptions for control flow.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use log::{info, warn};

use crate::config::PeerTable;
use crate::message::{Message, Value};
use crate::node::rpc_all;
use crate::profile::Profile;
use crate::proposal_number::ProposalNumber;

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Phase1,
    Phase2,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProposeOutcome {
    Decided(Value),
    NoQuorum { phase: Phase, n: ProposalNumber },
}

pub fn majority(cluster_size: usize) -> usize {
    cluster_size / 2 + 1
}

pub struct Proposer {
    id: String,
    member_index: i64,
    local_counter: AtomicI64,
}

impl Proposer {
    pub fn new(id: impl Into<String>, member_index: i64) -> Self {
        Proposer {
            id: id.into(),
            member_index,
            local_counter: AtomicI64::new(0),
        }
    }

    fn mint_proposal_number(&self) -> ProposalNumber {
        let counter = self.local_counter.fetch_add(1, Ordering::SeqCst) + 1;
        ProposalNumber::new(counter, self.member_index)
    }

    /// Drives one attempt at proposing `candidate`. Never retries
    /// automatically on quorum shortfall, per the baseline's no-auto-retry
    /// rule; the caller decides whether and how to retry.
    pub fn propose(
        &self,
        candidate: &str,
        table: &PeerTable,
        profile: &Arc<Profile>,
    ) -> ProposeOutcome {
        let n = self.mint_proposal_number();
        info!("[{}] phase 1: PREPARE({})", self.id, n);

        let prepare = Message::Prepare {
            from: self.id.clone(),
            n,
        };
        let replies = rpc_all(table, &self.id, &prepare, profile);

        let majority_needed = majority(table.len());
        let mut promise_count = 0usize;
        let mut best_accepted_n = ProposalNumber::MIN;
        let mut carried_value: Option<Value> = None;

        for reply in &replies {
            if let Message::Promise {
                n: promised_n,
                accepted_n,
                accepted_v,
                ..
            } = reply
            {
                if *promised_n != n {
                    continue;
                }
                promise_count += 1;
                if *accepted_n != ProposalNumber::MIN && *accepted_n > best_accepted_n {
                    best_accepted_n = *accepted_n;
                    carried_value = accepted_v.clone();
                }
            }
        }

        if promise_count < majority_needed {
            warn!(
                "[{}] phase 1 quorum shortfall for {}: {}/{}",
                self.id, n, promise_count, majority_needed
            );
            return ProposeOutcome::NoQuorum {
                phase: Phase::Phase1,
                n,
            };
        }

        let value = carried_value.unwrap_or_else(|| candidate.to_string());
        info!("[{}] phase 2: ACCEPT_REQUEST({}, {})", self.id, n, value);

        let accept_request = Message::AcceptRequest {
            from: self.id.clone(),
            n,
            value: value.clone(),
        };
        let replies = rpc_all(table, &self.id, &accept_request, profile);

        let accepted_count = replies
            .iter()
            .filter(|r| matches!(r, Message::Accepted { n: accepted_n, .. } if *accepted_n == n))
            .count();

        if accepted_count < majority_needed {
            warn!(
                "[{}] phase 2 quorum shortfall for {}: {}/{}",
                self.id, n, accepted_count, majority_needed
            );
            return ProposeOutcome::NoQuorum {
                phase: Phase::Phase2,
                n,
            };
        }

        info!("[{}] broadcasting DECIDE({})", self.id, value);
        let decide = Message::Decide {
            from: self.id.clone(),
            value: value.clone(),
        };
        let _ = rpc_all(table, &self.id, &decide, profile);

        ProposeOutcome::Decided(value)
    }

    /// A bounded-retry convenience wrapper around `propose`: re-attempts
    /// with a freshly minted (and therefore higher) proposal number on each
    /// quorum shortfall, up to `max_attempts` times. The core `propose`
    /// operation itself never retries automatically; this wrapper exists
    /// only for callers (such as the CLI's `--propose` flag) that want
    /// bounded retrying without baking it into the engine's safety-critical
    /// path.
    pub fn propose_with_retries(
        &self,
        candidate: &str,
        table: &PeerTable,
        profile: &Arc<Profile>,
        max_attempts: usize,
    ) -> ProposeOutcome {
        let mut last = ProposeOutcome::NoQuorum {
            phase: Phase::Phase1,
            n: ProposalNumber::MIN,
        };
        for attempt in 1..=max_attempts.max(1) {
            last = self.propose(candidate, table, profile);
            if let ProposeOutcome::Decided(_) = last {
                return last;
            }
            warn!(
                "[{}] propose_with_retries: attempt {}/{} failed to reach quorum",
                self.id, attempt, max_attempts
            );
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn majority_of_nine_is_five() {
        assert_eq!(majority(9), 5);
    }

    #[test]
    fn mint_proposal_number_is_monotonically_increasing_and_tagged_with_member_index() {
        let p = Proposer::new("M4", 4);
        let n1 = p.mint_proposal_number();
        let n2 = p.mint_proposal_number();
        assert!(n2 > n1);
        assert_eq!(n1.member_index, 4);
        assert_eq!(n2.member_index, 4);
    }

    #[test]
    fn propose_with_retries_gives_up_after_max_attempts_against_an_unreachable_cluster() {
        use crate::profile::ProfileKind;

        // Every other member points at a port nothing listens on, so every
        // attempt comes back as a phase-1 quorum shortfall; this pins down
        // that the wrapper stops after `max_attempts` rather than looping
        // forever, and that each attempt minted a strictly higher number.
        let table: PeerTable = (2..=9)
            .map(|i| (format!("M{}", i), "127.0.0.1:1".parse().unwrap()))
            .collect();
        let profile = Arc::new(Profile::with_seed(ProfileKind::Reliable, 9));
        let p = Proposer::new("M1", 1);

        let outcome = p.propose_with_retries("M1", &table, &profile, 3);
        match outcome {
            ProposeOutcome::NoQuorum { phase, n } => {
                assert_eq!(phase, Phase::Phase1);
                assert_eq!(n, ProposalNumber::new(3, 1));
            }
            ProposeOutcome::Decided(_) => panic!("expected no quorum against an unreachable cluster"),
        }
    }

    #[test]
    fn proposal_numbers_from_distinct_proposers_never_collide() {
        let p1 = Proposer::new("M1", 1);
        let p2 = Proposer::new("M2", 2);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            assert!(seen.insert(p1.mint_proposal_number()));
            assert!(seen.insert(p2.mint_proposal_number()));
        }
    }
}
