//! The six-field text wire frame: `TYPE|from|n|value|acceptedN|acceptedV`,
//! one line per message, newline terminated. The codec is pure and total
//! modulo malformed input.

use std::fmt;

use crate::error::CodecError;
use crate::proposal_number::ProposalNumber;

pub type MemberId = String;
pub type Value = String;

/// Every variant the acceptor, learner and proposer can send or receive.
/// Every variant carries `from`; fields a variant does not use are simply
/// absent from its shape (and therefore encoded as an empty wire column).
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Prepare {
        from: MemberId,
        n: ProposalNumber,
    },
    Promise {
        from: MemberId,
        n: ProposalNumber,
        accepted_n: ProposalNumber,
        accepted_v: Option<Value>,
    },
    AcceptRequest {
        from: MemberId,
        n: ProposalNumber,
        value: Value,
    },
    Accepted {
        from: MemberId,
        n: ProposalNumber,
        value: Value,
    },
    Decide {
        from: MemberId,
        value: Value,
    },
    Reject {
        from: MemberId,
        n: ProposalNumber,
        reason: String,
    },
    Ack {
        from: MemberId,
    },
    Error {
        from: MemberId,
        reason: String,
    },
}

impl Message {
    pub fn from(&self) -> &str {
        match self {
            Message::Prepare { from, .. }
            | Message::Promise { from, .. }
            | Message::AcceptRequest { from, .. }
            | Message::Accepted { from, .. }
            | Message::Decide { from, .. }
            | Message::Reject { from, .. }
            | Message::Ack { from }
            | Message::Error { from, .. } => from,
        }
    }

    fn type_tag(&self) -> &'static str {
        match self {
            Message::Prepare { .. } => "PREPARE",
            Message::Promise { .. } => "PROMISE",
            Message::AcceptRequest { .. } => "ACCEPT_REQUEST",
            Message::Accepted { .. } => "ACCEPTED",
            Message::Decide { .. } => "DECIDE",
            Message::Reject { .. } => "REJECT",
            Message::Ack { .. } => "ACK",
            Message::Error { .. } => "ERROR",
        }
    }

    /// Serializes this message into its six pipe-delimited columns, in the
    /// fixed order `TYPE|from|n|value|acceptedN|acceptedV`.
    pub fn serialize(&self) -> String {
        let (n, value, accepted_n, accepted_v) = match self {
            Message::Prepare { n, .. } => (Some(*n), None, None, None),
            Message::Promise {
                n,
                accepted_n,
                accepted_v,
                ..
            } => (Some(*n), None, Some(*accepted_n), accepted_v.as_deref()),
            Message::AcceptRequest { n, value, .. } => (Some(*n), Some(value.as_str()), None, None),
            Message::Accepted { n, value, .. } => (Some(*n), Some(value.as_str()), None, None),
            Message::Decide { value, .. } => (None, Some(value.as_str()), None, None),
            Message::Reject { n, reason, .. } => (Some(*n), Some(reason.as_str()), None, None),
            Message::Ack { .. } => (None, None, None, None),
            Message::Error { reason, .. } => (None, Some(reason.as_str()), None, None),
        };

        format!(
            "{}|{}|{}|{}|{}|{}",
            self.type_tag(),
            self.from(),
            n.map(|n| n.to_string()).unwrap_or_default(),
            value.unwrap_or(""),
            accepted_n.map(|n| n.to_string()).unwrap_or_default(),
            accepted_v.unwrap_or(""),
        )
    }

    /// Parses one wire line (without its trailing newline) into a `Message`.
    /// Fails with `CodecError` when the field count is not exactly six, the
    /// type tag is unknown, or a proposal-number column is non-empty but
    /// not a valid `<counter>.<memberIdx>` pair.
    pub fn parse(line: &str) -> Result<Message, CodecError> {
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() != 6 {
            return Err(CodecError::WrongFieldCount {
                found: fields.len(),
            });
        }

        let msg_type = fields[0];
        let from = fields[1];
        let n = parse_proposal_number(fields[2])?;
        let value = non_empty(fields[3]);
        let accepted_n = parse_proposal_number(fields[4])?;
        let accepted_v = non_empty(fields[5]);

        if from.is_empty() {
            return Err(CodecError::MissingFrom);
        }
        let from = from.to_string();

        match msg_type {
            "PREPARE" => Ok(Message::Prepare {
                from,
                n: n.unwrap_or(ProposalNumber::MIN),
            }),
            "PROMISE" => Ok(Message::Promise {
                from,
                n: n.unwrap_or(ProposalNumber::MIN),
                accepted_n: accepted_n.unwrap_or(ProposalNumber::MIN),
                accepted_v: accepted_v.map(|s| s.to_string()),
            }),
            "ACCEPT_REQUEST" => Ok(Message::AcceptRequest {
                from,
                n: n.unwrap_or(ProposalNumber::MIN),
                value: value.unwrap_or("").to_string(),
            }),
            "ACCEPTED" => Ok(Message::Accepted {
                from,
                n: n.unwrap_or(ProposalNumber::MIN),
                value: value.unwrap_or("").to_string(),
            }),
            "DECIDE" => Ok(Message::Decide {
                from,
                value: value.unwrap_or("").to_string(),
            }),
            "REJECT" => Ok(Message::Reject {
                from,
                n: n.unwrap_or(ProposalNumber::MIN),
                reason: value.unwrap_or("").to_string(),
            }),
            "ACK" => Ok(Message::Ack { from }),
            "ERROR" => Ok(Message::Error {
                from,
                reason: value.unwrap_or("").to_string(),
            }),
            other => Err(CodecError::UnknownMessageType(other.to_string())),
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn parse_proposal_number(s: &str) -> Result<Option<ProposalNumber>, CodecError> {
    if s.is_empty() {
        return Ok(None);
    }
    s.parse::<ProposalNumber>()
        .map(Some)
        .map_err(|_| CodecError::MalformedProposalNumber(s.to_string()))
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.serialize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(counter: i64, idx: i64) -> ProposalNumber {
        ProposalNumber::new(counter, idx)
    }

    #[test]
    fn prepare_round_trips() {
        let m = Message::Prepare {
            from: "M4".to_string(),
            n: n(1, 4),
        };
        assert_eq!(m.serialize(), "PREPARE|M4|1.4|||");
        assert_eq!(Message::parse(&m.serialize()).unwrap(), m);
    }

    #[test]
    fn promise_with_no_prior_accept_round_trips() {
        let m = Message::Promise {
            from: "M2".to_string(),
            n: n(1, 4),
            accepted_n: ProposalNumber::MIN,
            accepted_v: None,
        };
        assert_eq!(m.serialize(), "PROMISE|M2|1.4||-1.-1|");
        assert_eq!(Message::parse(&m.serialize()).unwrap(), m);
    }

    #[test]
    fn promise_carrying_a_prior_accept_round_trips() {
        let m = Message::Promise {
            from: "M2".to_string(),
            n: n(2, 5),
            accepted_n: n(1, 3),
            accepted_v: Some("M3".to_string()),
        };
        assert_eq!(Message::parse(&m.serialize()).unwrap(), m);
    }

    #[test]
    fn accept_request_round_trips() {
        let m = Message::AcceptRequest {
            from: "M4".to_string(),
            n: n(1, 4),
            value: "M5".to_string(),
        };
        assert_eq!(m.serialize(), "ACCEPT_REQUEST|M4|1.4|M5||");
        assert_eq!(Message::parse(&m.serialize()).unwrap(), m);
    }

    #[test]
    fn accepted_round_trips() {
        let m = Message::Accepted {
            from: "M7".to_string(),
            n: n(1, 4),
            value: "M5".to_string(),
        };
        assert_eq!(m.serialize(), "ACCEPTED|M7|1.4|M5||");
        assert_eq!(Message::parse(&m.serialize()).unwrap(), m);
    }

    #[test]
    fn decide_round_trips() {
        let m = Message::Decide {
            from: "M4".to_string(),
            value: "M5".to_string(),
        };
        assert_eq!(m.serialize(), "DECIDE|M4||M5||");
        assert_eq!(Message::parse(&m.serialize()).unwrap(), m);
    }

    #[test]
    fn ack_round_trips() {
        let m = Message::Ack {
            from: "M7".to_string(),
        };
        assert_eq!(m.serialize(), "ACK|M7||||");
        assert_eq!(Message::parse(&m.serialize()).unwrap(), m);
    }

    #[test]
    fn reject_round_trips() {
        let m = Message::Reject {
            from: "M5".to_string(),
            n: n(1, 4),
            reason: "promised=2.8".to_string(),
        };
        assert_eq!(m.serialize(), "REJECT|M5|1.4|promised=2.8||");
        assert_eq!(Message::parse(&m.serialize()).unwrap(), m);
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        assert_eq!(
            Message::parse("PREPARE|M4|1.4||"),
            Err(CodecError::WrongFieldCount { found: 5 })
        );
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        assert_eq!(
            Message::parse("BOGUS|M4|1.4|||"),
            Err(CodecError::UnknownMessageType("BOGUS".to_string()))
        );
    }

    #[test]
    fn malformed_proposal_number_is_rejected() {
        assert!(Message::parse("PREPARE|M4|not-a-number|||").is_err());
    }

    #[test]
    fn empty_from_is_rejected() {
        assert_eq!(Message::parse("ACK|||||"), Err(CodecError::MissingFrom));
    }
}
