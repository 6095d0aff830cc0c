//! Latency state machine.
//!
//! Four states, five events, and no knowledge of futures: the owner drives it
//! with explicit events. Unlisted (state, event) pairs are ignored.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyState {
    Idle,
    Pending,
    Fulfilled,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatencyEvent<T, E> {
    Watch,
    Resolve(T),
    Reject(E),
    Abort,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencyContext<T, E> {
    pub data: Option<T>,
    pub error: Option<E>,
}

impl<T, E> Default for LatencyContext<T, E> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
        }
    }
}

impl<T, E> LatencyContext<T, E> {
    fn clear(&mut self) {
        self.data = None;
        self.error = None;
    }
}

#[derive(Debug, Clone)]
pub struct LatencyMachine<T, E> {
    state: LatencyState,
    context: LatencyContext<T, E>,
}

impl<T, E> Default for LatencyMachine<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> LatencyMachine<T, E> {
    pub fn new() -> Self {
        Self {
            state: LatencyState::Idle,
            context: LatencyContext::default(),
        }
    }

    pub fn state(&self) -> LatencyState {
        self.state
    }

    pub fn context(&self) -> &LatencyContext<T, E> {
        &self.context
    }

    pub fn matches(&self, state: LatencyState) -> bool {
        self.state == state
    }

    /// Apply `event`. Returns whether it was accepted.
    ///
    /// A `Watch` while pending re-enters `Pending` and leaves the previous
    /// settlement's data/error visible until the new operation settles.
    pub fn send(&mut self, event: LatencyEvent<T, E>) -> bool {
        use LatencyEvent as Ev;
        use LatencyState as St;

        let next = match (self.state, event) {
            (St::Idle, Ev::Watch) => St::Pending,
            (St::Pending, Ev::Watch) => St::Pending,
            (St::Pending, Ev::Resolve(data)) => {
                self.context.data = Some(data);
                self.context.error = None;
                St::Fulfilled
            }
            (St::Pending, Ev::Reject(error)) => {
                self.context.data = None;
                self.context.error = Some(error);
                St::Rejected
            }
            (St::Pending, Ev::Abort) => {
                self.context.clear();
                St::Idle
            }
            (St::Fulfilled | St::Rejected, Ev::Watch) => St::Pending,
            (St::Fulfilled | St::Rejected, Ev::Reset) => {
                self.context.clear();
                St::Idle
            }
            _ => return false,
        };

        self.state = next;
        true
    }
}
