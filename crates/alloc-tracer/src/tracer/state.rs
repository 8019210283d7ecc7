//! Tracer lifecycle states.

use std::fmt;

/// Where the tracer is in its lifecycle
///
/// `Idle -> Running -> {Paused <-> Running} -> Idle`. A stopped tracer is idle;
/// the next `start` reinitializes its tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TracerState {
    #[default]
    Idle,
    Running,
    Paused,
}

impl TracerState {
    /// A trace exists (running or paused)
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for TracerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_active() {
        assert!(!TracerState::Idle.is_active());
        assert!(TracerState::Running.is_active());
        assert!(TracerState::Paused.is_active());
    }
}
