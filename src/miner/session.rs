// BMX Miner - Free and Open Source Software Statement
//
// This project, bmx-miner, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/miner/session.rs
// Version: 1.0.0
//
// This file holds the session state machine (Idle -> Running -> Succeeded or
// Stopped) and the cloneable handle used to observe it and request a stop
// from another thread.

use log::{debug, info};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

const LOG_TARGET: &str = "bmx::miner::session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Running = 1,
    Succeeded = 2,
    Stopped = 3,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Idle,
            1 => SessionState::Running,
            2 => SessionState::Succeeded,
            _ => SessionState::Stopped,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Succeeded | SessionState::Stopped)
    }

    /// Allowed edges of the state machine
    pub fn can_transition_to(self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (SessionState::Idle, SessionState::Running)
                | (SessionState::Running, SessionState::Succeeded)
                | (SessionState::Running, SessionState::Stopped)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Succeeded => "succeeded",
            SessionState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

struct HandleInner {
    stop_requested: AtomicBool,
    state: AtomicU8,
}

/// Shared view of one mining session
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<HandleInner>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HandleInner {
                stop_requested: AtomicBool::new(false),
                state: AtomicU8::new(SessionState::Idle as u8),
            }),
        }
    }

    /// Ask the session to stop. Workers notice before their next attempt.
    pub fn stop(&self) {
        if !self.inner.stop_requested.swap(true, Ordering::SeqCst) {
            let state = self.state();
            if state.is_terminal() {
                debug!(target: LOG_TARGET, "Stop requested after the session {}", state);
            } else {
                info!(target: LOG_TARGET, "🛑 Stop requested (state: {})", state);
            }
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        self.inner.stop_requested.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.inner.state.load(Ordering::SeqCst))
    }

    pub(crate) fn stop_flag(&self) -> &AtomicBool {
        &self.inner.stop_requested
    }

    /// Move to `next` if the edge exists. Returns whether the move happened.
    pub(crate) fn transition(&self, next: SessionState) -> bool {
        let mut current = self.inner.state.load(Ordering::SeqCst);
        loop {
            let from = SessionState::from_u8(current);
            if !from.can_transition_to(next) {
                debug!(target: LOG_TARGET, "Ignoring transition {} -> {}", from, next);
                return false;
            }
            match self.inner.state.compare_exchange(
                current,
                next as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    debug!(target: LOG_TARGET, "Session {} -> {}", from, next);
                    return true;
                }
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("state", &self.state())
            .field("stop_requested", &self.is_stop_requested())
            .finish()
    }
}
