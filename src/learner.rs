//! The learner: applies `DECIDE` idempotently and emits the canonical
//! consensus announcement exactly once per peer per process lifetime.

use std::sync::Mutex;

use log::info;

use crate::message::{Message, Value};

#[derive(Debug, Default)]
struct LearnerState {
    decided: bool,
    decided_value: Option<Value>,
}

pub struct Learner {
    id: String,
    state: Mutex<LearnerState>,
}

impl Learner {
    pub fn new(id: impl Into<String>) -> Self {
        Learner {
            id: id.into(),
            state: Mutex::new(LearnerState::default()),
        }
    }

    /// `DECIDE(v)`: records the first decided value and prints the
    /// canonical announcement exactly once. Subsequent decides (even for a
    /// different value, which would indicate a safety violation upstream)
    /// are acknowledged without re-emitting the announcement.
    pub fn handle_decide(&self, value: Value) -> Message {
        let mut state = self.state.lock().expect("learner state poisoned");

        if !state.decided {
            state.decided = true;
            state.decided_value = Some(value.clone());
            info!("[{}] learner decided {:?}", self.id, value);
            println!("CONSENSUS: {} has been elected Council President!", value);
        }

        Message::Ack {
            from: self.id.clone(),
        }
    }

    pub fn decided_value(&self) -> Option<Value> {
        self.state.lock().expect("learner state poisoned").decided_value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_decide_is_recorded_and_acknowledged() {
        let l = Learner::new("M1");
        let reply = l.handle_decide("M5".to_string());
        assert_eq!(reply, Message::Ack { from: "M1".to_string() });
        assert_eq!(l.decided_value(), Some("M5".to_string()));
    }

    #[test]
    fn decided_value_never_changes_after_the_first_decide() {
        let l = Learner::new("M1");
        l.handle_decide("M5".to_string());
        l.handle_decide("M5".to_string());
        l.handle_decide("M9".to_string());
        assert_eq!(l.decided_value(), Some("M5".to_string()));
    }

    #[test]
    fn every_decide_is_acknowledged_even_after_deciding() {
        let l = Learner::new("M1");
        l.handle_decide("M5".to_string());
        let reply = l.handle_decide("M5".to_string());
        assert_eq!(reply, Message::Ack { from: "M1".to_string() });
    }
}
