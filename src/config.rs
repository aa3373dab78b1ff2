//! Parses the static peer table, `network.config`: one `<memberId>,<host>,
//! <port>` entry per non-blank, non-comment (`#`) line, in file order.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "network.config";

/// The static peer table: member id to socket address, preserving the
/// order entries appeared in the file.
pub type PeerTable = Vec<(String, SocketAddr)>;

pub fn load_peer_table(path: impl AsRef<Path>) -> Result<PeerTable, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    parse_peer_table(&contents)
}

fn parse_peer_table(contents: &str) -> Result<PeerTable, ConfigError> {
    let mut table = PeerTable::new();

    for (line_no, raw_line) in contents.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        if parts.len() != 3 || parts[0].is_empty() || parts[1].is_empty() || parts[2].is_empty() {
            return Err(ConfigError::MalformedLine {
                line_no: line_no + 1,
                line: raw_line.to_string(),
            });
        }

        let member_id = parts[0].to_string();
        let host_port = format!("{}:{}", parts[1], parts[2]);
        let addr = host_port
            .to_socket_addrs()
            .map_err(|_| ConfigError::MalformedLine {
                line_no: line_no + 1,
                line: raw_line.to_string(),
            })?
            .next()
            .ok_or_else(|| ConfigError::MalformedLine {
                line_no: line_no + 1,
                line: raw_line.to_string(),
            })?;

        if table.iter().any(|(id, _)| id == &member_id) {
            return Err(ConfigError::DuplicateMember(member_id));
        }

        table.push((member_id, addr));
    }

    Ok(table)
}

/// Looks up a member's address, failing with `UnknownMember` rather than
/// panicking, since a malformed reply naming an unrecognized peer must not
/// bring a handler down.
pub fn address_of<'a>(table: &'a PeerTable, member_id: &str) -> Result<&'a SocketAddr, ConfigError> {
    table
        .iter()
        .find(|(id, _)| id == member_id)
        .map(|(_, addr)| addr)
        .ok_or_else(|| ConfigError::UnknownMember(member_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_in_order_skipping_blanks_and_comments() {
        let text = "\
# this is the cluster's static address table
M1,127.0.0.1,9001

M2,127.0.0.1,9002
# M3 is intentionally offline in this scenario
M3,127.0.0.1,9003
";
        let table = parse_peer_table(text).unwrap();
        let ids: Vec<&str> = table.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["M1", "M2", "M3"]);
        assert_eq!(table[0].1.port(), 9001);
        assert_eq!(table[2].1.port(), 9003);
    }

    #[test]
    fn rejects_malformed_lines() {
        let text = "M1,127.0.0.1\n";
        assert!(parse_peer_table(text).is_err());
    }

    #[test]
    fn rejects_duplicate_member_ids() {
        let text = "M1,127.0.0.1,9001\nM1,127.0.0.1,9002\n";
        assert!(matches!(
            parse_peer_table(text),
            Err(ConfigError::DuplicateMember(_))
        ));
    }

    #[test]
    fn address_of_reports_unknown_members() {
        let table = parse_peer_table("M1,127.0.0.1,9001\n").unwrap();
        assert!(address_of(&table, "M1").is_ok());
        assert!(matches!(
            address_of(&table, "M9"),
            Err(ConfigError::UnknownMember(_))
        ));
    }
}
