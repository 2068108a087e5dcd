// Countdown that drives automatic sale/unsold resolution.

use serde::{Deserialize, Serialize};

/// Observable phase of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    WaitingForBid,
    Running,
    Paused,
}

/// What a single scheduler tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, or paused. Nothing changed.
    Idle,
    /// One second elapsed.
    Counting { remaining: u32 },
    /// Reached zero; the caller resolves the current player.
    Expired,
}

/// Countdown state. Pausing freezes `timer`; it is never reset by a pause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerController {
    pub timer: u32,
    pub timer_limit: u32,
    pub is_running: bool,
    pub is_paused: bool,
}

impl TimerController {
    pub fn new(timer_limit: u32) -> Self {
        TimerController {
            timer: timer_limit,
            timer_limit,
            is_running: false,
            is_paused: false,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        if self.is_paused {
            TimerPhase::Paused
        } else if self.is_running {
            TimerPhase::Running
        } else {
            TimerPhase::WaitingForBid
        }
    }

    /// Start counting from the current value, or from the full limit if the
    /// countdown already ran out.
    pub fn start(&mut self) {
        if self.timer == 0 {
            self.timer = self.timer_limit;
        }
        self.is_running = true;
        self.is_paused = false;
    }

    pub fn pause(&mut self) {
        self.is_paused = true;
    }

    pub fn resume(&mut self) {
        self.is_paused = false;
    }

    /// Stopped, unpaused, full duration.
    pub fn reset(&mut self) {
        self.timer = self.timer_limit;
        self.is_running = false;
        self.is_paused = false;
    }

    /// Change the configured duration. A countdown that is not running is
    /// reset to the new limit; a running one keeps its value, capped.
    pub fn set_limit(&mut self, timer_limit: u32) {
        self.timer_limit = timer_limit;
        if self.is_running {
            self.timer = self.timer.min(timer_limit);
        } else {
            self.timer = timer_limit;
        }
    }

    /// Restart the countdown at `seconds` after an accepted bid. An admin
    /// pause stays in effect.
    pub fn restart_at(&mut self, seconds: u32) {
        self.timer = seconds;
        self.is_running = true;
    }

    /// Advance one second.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running || self.is_paused {
            return TickOutcome::Idle;
        }
        self.timer = self.timer.saturating_sub(1);
        if self.timer == 0 {
            self.is_running = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Counting {
                remaining: self.timer,
            }
        }
    }
}
