//! The totally ordered, globally unique tag that acceptors use to order
//! promises and acceptances: a pair (counter, memberIndex).

use std::fmt;
use std::str::FromStr;

/// A Paxos proposal number: (counter, memberIndex), ordered lexicographically
/// by counter first, then by memberIndex, so that ties at the counter level
/// resolve in favour of the higher member index.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProposalNumber {
    pub counter: i64,
    pub member_index: i64,
}

impl ProposalNumber {
    /// The sentinel representing "no proposal number", strictly lower than
    /// every real proposal number minted by a proposer.
    pub const MIN: ProposalNumber = ProposalNumber {
        counter: -1,
        member_index: -1,
    };

    pub fn new(counter: i64, member_index: i64) -> Self {
        ProposalNumber {
            counter,
            member_index,
        }
    }

    pub fn is_none(&self) -> bool {
        *self == ProposalNumber::MIN
    }
}

impl Default for ProposalNumber {
    fn default() -> Self {
        ProposalNumber::MIN
    }
}

impl fmt::Display for ProposalNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.counter, self.member_index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseProposalNumberError(pub String);

impl fmt::Display for ParseProposalNumberError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "malformed proposal number: {:?}", self.0)
    }
}

impl std::error::Error for ParseProposalNumberError {}

impl FromStr for ProposalNumber {
    type Err = ParseProposalNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, '.');
        let counter = parts
            .next()
            .ok_or_else(|| ParseProposalNumberError(s.to_string()))?;
        let member_index = parts
            .next()
            .ok_or_else(|| ParseProposalNumberError(s.to_string()))?;

        let counter: i64 = counter
            .parse()
            .map_err(|_| ParseProposalNumberError(s.to_string()))?;
        let member_index: i64 = member_index
            .parse()
            .map_err(|_| ParseProposalNumberError(s.to_string()))?;

        Ok(ProposalNumber::new(counter, member_index))
    }
}

/// Derives the numeric tie-break index from a member identifier, e.g.
/// `M3` -> `3`. The index is the run of ASCII digits at the end of the id.
pub fn member_index(member_id: &str) -> Option<i64> {
    let digits: String = member_id
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .chars()
        .rev()
        .collect();

    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}
