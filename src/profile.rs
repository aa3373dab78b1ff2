//! Per-peer fault-injection policy consulted by both the listener (inbound)
//! and the RPC fan-out (outbound): added latency and probabilistic drops.
//! Each peer owns one `Profile`, which in turn owns a single PRNG reused
//! across calls rather than a fresh generator per call, since reseeding on
//! every draw would be wasteful and would correlate consecutive draws.

use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProfileKind {
    Reliable,
    Standard,
    Latent,
    Failing,
}

impl FromStr for ProfileKind {
    type Err = ();

    /// Unknown profile names fall back to `Standard`, per the CLI surface.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "reliable" => ProfileKind::Reliable,
            "latent" => ProfileKind::Latent,
            "failing" => ProfileKind::Failing,
            _ => ProfileKind::Standard,
        })
    }
}

/// A fault-injection policy plus the PRNG state it needs to draw from its
/// distributions. Safe to share across the listener's worker threads and
/// the fan-out's per-destination threads behind a `Mutex`.
pub struct Profile {
    kind: ProfileKind,
    rng: Mutex<StdRng>,
}

impl Profile {
    pub fn new(kind: ProfileKind) -> Self {
        Profile {
            kind,
            rng: Mutex::new(StdRng::from_rng(rand::thread_rng()).expect("could not seed RNG")),
        }
    }

    #[cfg(test)]
    pub fn with_seed(kind: ProfileKind, seed: u64) -> Self {
        Profile {
            kind,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn kind(&self) -> ProfileKind {
        self.kind
    }

    /// Sleeps for a duration drawn from this profile's latency distribution.
    pub fn delay(&self) {
        let d = match self.kind {
            ProfileKind::Reliable => Duration::from_millis(0),
            ProfileKind::Standard => Duration::from_millis(self.uniform(20, 59)),
            ProfileKind::Latent => Duration::from_millis(self.uniform(200, 599)),
            ProfileKind::Failing => Duration::from_millis(10),
        };
        if !d.is_zero() {
            std::thread::sleep(d);
        }
    }

    /// Returns true with this profile's drop probability. Independently
    /// drawn on each call, so a `Failing` peer can drop the inbound and
    /// outbound hop of the same round trip independently, as two separate
    /// coin flips rather than one shared decision.
    pub fn should_drop(&self) -> bool {
        let p = match self.kind {
            ProfileKind::Reliable | ProfileKind::Standard | ProfileKind::Latent => 0.0,
            ProfileKind::Failing => 0.35,
        };
        if p == 0.0 {
            return false;
        }
        let mut rng = self.rng.lock().expect("profile RNG poisoned");
        rng.gen_bool(p)
    }

    fn uniform(&self, low: u64, high: u64) -> u64 {
        let mut rng = self.rng.lock().expect("profile RNG poisoned");
        rng.gen_range(low, high + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_profile_defaults_to_standard() {
        assert_eq!("bogus".parse::<ProfileKind>().unwrap(), ProfileKind::Standard);
        assert_eq!("".parse::<ProfileKind>().unwrap(), ProfileKind::Standard);
    }

    #[test]
    fn profile_names_are_case_insensitive() {
        assert_eq!("RELIABLE".parse::<ProfileKind>().unwrap(), ProfileKind::Reliable);
        assert_eq!("Failing".parse::<ProfileKind>().unwrap(), ProfileKind::Failing);
    }

    #[test]
    fn reliable_never_drops() {
        let p = Profile::with_seed(ProfileKind::Reliable, 42);
        for _ in 0..1000 {
            assert!(!p.should_drop());
        }
    }

    #[test]
    fn failing_drops_sometimes_but_not_always() {
        let p = Profile::with_seed(ProfileKind::Failing, 7);
        let drops = (0..2000).filter(|_| p.should_drop()).count();
        assert!(drops > 0, "expected at least some drops over 2000 draws");
        assert!(drops < 2000, "expected at least some non-drops over 2000 draws");
    }
}
