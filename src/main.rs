//! The peer binary: `<memberId> --profile <profile> [--propose <value>]
//! [--propose-delay <ms>]`. Binds the listener from the static peer table,
//! and, if `--propose` is given, proposes that value after the configured
//! delay so the listener has time to come up first.

#[macro_use]
extern crate log;
extern crate env_logger;

use std::io::Write as _;
use std::process;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use council_paxos::config::{self, DEFAULT_CONFIG_PATH};
use council_paxos::error::UsageError;
use council_paxos::listener;
use council_paxos::peer::Peer;
use council_paxos::profile::{Profile, ProfileKind};
use council_paxos::proposer::ProposeOutcome;

const DEFAULT_PROPOSE_DELAY_MS: u64 = 300;

struct Args {
    member_id: String,
    profile: ProfileKind,
    propose: Option<String>,
    propose_delay_ms: u64,
}

fn parse_args(raw: &[String]) -> Result<Args, UsageError> {
    let mut iter = raw.iter();
    let member_id = iter
        .next()
        .ok_or_else(|| UsageError("missing required <memberId> argument".to_string()))?
        .clone();

    let mut profile = ProfileKind::Standard;
    let mut propose = None;
    let mut propose_delay_ms = DEFAULT_PROPOSE_DELAY_MS;

    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--profile" => {
                let value = iter
                    .next()
                    .ok_or_else(|| UsageError("--profile requires a value".to_string()))?;
                profile = value.parse().unwrap_or(ProfileKind::Standard);
            }
            "--propose" => {
                let value = iter
                    .next()
                    .ok_or_else(|| UsageError("--propose requires a value".to_string()))?;
                propose = Some(value.clone());
            }
            "--propose-delay" => {
                let value = iter
                    .next()
                    .ok_or_else(|| UsageError("--propose-delay requires a value".to_string()))?;
                propose_delay_ms = value
                    .parse()
                    .map_err(|_| UsageError(format!("--propose-delay value {:?} is not a number", value)))?;
            }
            other => {
                return Err(UsageError(format!("unrecognized argument {:?}", other)));
            }
        }
    }

    Ok(Args {
        member_id,
        profile,
        propose,
        propose_delay_ms,
    })
}

fn hh_mm_ss(now: SystemTime) -> String {
    let secs = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let secs_today = secs % 86_400;
    format!(
        "{:02}:{:02}:{:02}",
        secs_today / 3600,
        (secs_today % 3600) / 60,
        secs_today % 60
    )
}

fn init_logging(member_id: String) {
    env_logger::Builder::from_default_env()
        .format(move |buf, record| {
            writeln!(
                buf,
                "[{}][{}] {}",
                member_id,
                hh_mm_ss(SystemTime::now()),
                record.args()
            )
        })
        .init();
}

fn main() {
    let raw_args: Vec<String> = std::env::args().skip(1).collect();

    let args = match parse_args(&raw_args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!(
                "usage: <memberId> --profile <reliable|standard|latent|failing> [--propose <value>] [--propose-delay <ms>]"
            );
            process::exit(2);
        }
    };

    init_logging(args.member_id.clone());

    let table = match config::load_peer_table(DEFAULT_CONFIG_PATH) {
        Ok(table) => table,
        Err(e) => {
            error!("could not load peer table: {}", e);
            process::exit(1);
        }
    };

    let addr = match config::address_of(&table, &args.member_id) {
        Ok(addr) => *addr,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let profile = Arc::new(Profile::new(args.profile));
    let peer = Arc::new(Peer::new(args.member_id.clone(), table, profile));

    if let Some(candidate) = args.propose {
        let peer = peer.clone();
        let delay = Duration::from_millis(args.propose_delay_ms);
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            match peer.propose(&candidate) {
                ProposeOutcome::Decided(value) => {
                    info!("proposal decided: {}", value);
                }
                ProposeOutcome::NoQuorum { phase, n } => {
                    warn!("proposal {:?} for {} failed to reach quorum in {:?}", n, candidate, phase);
                }
            }
        });
    }

    if let Err(e) = listener::run(peer, addr) {
        error!("listener failed: {}", e);
        process::exit(1);
    }
}
