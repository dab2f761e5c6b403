/// Crawl lifecycle states
///
/// A crawl moves `Idle → Running → Completed`, or `Running → Cancelled` when
/// its cancellation token fires.
use serde::Serialize;
use std::fmt;

/// Represents where a crawl is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlState {
    /// Configured but not started
    #[default]
    Idle,

    /// Main loop is dispatching pages
    Running,

    /// Frontier exhausted or page cap reached
    Completed,

    /// Stopped early by cancellation
    Cancelled,
}

impl CrawlState {
    /// Returns true if the crawl can not make further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
