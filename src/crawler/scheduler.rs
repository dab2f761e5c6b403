//! Request pacing for the crawl
//!
//! This module handles:
//! - Sampling the delay before each request (fixed or randomized)
//! - A single politeness gate in front of all fetch workers
//!
//! Every dispatch passes through the gate, so no matter how many workers are
//! configured, requests start at least one sampled delay apart.

use crate::config::CrawlerConfig;
use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;

/// Stand-in deadline for delays too large to add to the clock
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// How long to wait between requests
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DelayPolicy {
    /// Always the same interval
    Fixed(Duration),

    /// Uniformly random in `[base, 3 × base]`, resampled for every request
    Jittered { base: Duration },
}

impl DelayPolicy {
    /// Stealth crawls get jittered delays, everything else a fixed one
    pub fn from_config(config: &CrawlerConfig) -> Self {
        let base = config.base_delay();
        if config.stealth {
            Self::Jittered { base }
        } else {
            Self::Fixed(base)
        }
    }

    /// Samples the delay for the next request
    pub fn next_delay(&self) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Jittered { base } => {
                if base.is_zero() {
                    return Duration::ZERO;
                }
                let low = base.as_secs_f64();
                let sampled = rand::rng().random_range(low..=low * 3.0);
                Duration::try_from_secs_f64(sampled).unwrap_or(Duration::MAX)
            }
        }
    }
}

/// Global admission point for requests
///
/// The gate tracks the earliest instant the next request may start. Both a
/// dispatch and a completed fetch push that instant out by a freshly sampled
/// delay; the later of the two wins. With one worker this reproduces a plain
/// "fetch, sleep, fetch" loop.
#[derive(Debug)]
pub struct PolitenessGate {
    policy: DelayPolicy,
    next_ready: Option<Instant>,
}

impl PolitenessGate {
    pub fn new(policy: DelayPolicy) -> Self {
        Self {
            policy,
            next_ready: None,
        }
    }

    /// Time left before the next dispatch is allowed, if any
    pub fn remaining(&self) -> Option<Duration> {
        let next_ready = self.next_ready?;
        let now = Instant::now();
        (next_ready > now).then(|| next_ready - now)
    }

    /// Resolves once the next dispatch is allowed
    ///
    /// Cancel-safe: dropping the future loses nothing.
    pub async fn ready(&self) {
        if let Some(next_ready) = self.next_ready {
            tokio::time::sleep_until(next_ready).await;
        }
    }

    /// Records a dispatch or a completion and pushes the gate out
    ///
    /// # Returns
    ///
    /// The delay sampled for this event
    pub fn hold(&mut self) -> Duration {
        let delay = self.policy.next_delay();
        let now = Instant::now();
        // Saturate far in the future rather than overflow the clock
        let candidate = now
            .checked_add(delay)
            .unwrap_or_else(|| now + FAR_FUTURE);
        self.next_ready = Some(match self.next_ready {
            Some(existing) if existing > candidate => existing,
            _ => candidate,
        });
        delay
    }
}
