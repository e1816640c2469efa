//! Duplicate suppression.
//!
//! Two layers: a per-request set so one entity is handled at most once while
//! the host processes a single request, and a time-based cooldown per path
//! that spans requests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::domain::entities::EntityRef;
use crate::domain::paths::RevalidationPath;
use crate::util::lock::mutex_lock;

use super::config::RevalidationConfig;
use super::keys::{CooldownKey, cooldown_key};

const SOURCE: &str = "revalidation::dedup";
/// Expired markers are swept once the map grows past this many entries.
const PURGE_THRESHOLD: usize = 1024;

/// Result of asking for permission to dispatch a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownDecision {
    /// No live marker; one has been recorded now.
    Acquired,
    /// The caller forced the dispatch or cooldown is switched off.
    Bypassed,
    /// A dispatch for the path happened within the window.
    Active { remaining: Duration },
}

impl CooldownDecision {
    pub fn permits_dispatch(self) -> bool {
        !matches!(self, Self::Active { .. })
    }
}

pub struct Deduplicator {
    seen: Mutex<HashSet<EntityRef>>,
    cooldowns: DashMap<CooldownKey, Instant>,
    window: Duration,
    enabled: bool,
}

impl Deduplicator {
    pub fn new(window: Duration, enabled: bool) -> Self {
        Self {
            seen: Mutex::new(HashSet::new()),
            cooldowns: DashMap::new(),
            window,
            enabled,
        }
    }

    pub fn from_config(config: &RevalidationConfig) -> Self {
        Self::new(config.cooldown_window, config.cooldown_enabled)
    }

    pub fn cooldown_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns `true` the first time `entity` is offered within the current
    /// request scope and `false` afterwards.
    pub fn first_in_request(&self, entity: EntityRef) -> bool {
        mutex_lock(&self.seen, SOURCE, "first_in_request").insert(entity)
    }

    /// Check-and-set the cooldown marker for `path`.
    ///
    /// The check and the stamp happen under one shard lock, so concurrent
    /// callers racing on the same path see exactly one `Acquired`. A bypass
    /// still stamps the marker so automatic events right after a forced
    /// dispatch are suppressed.
    pub fn acquire(&self, path: &RevalidationPath, bypass: bool) -> CooldownDecision {
        if !self.enabled {
            return CooldownDecision::Bypassed;
        }

        let now = Instant::now();
        if self.cooldowns.len() > PURGE_THRESHOLD {
            self.purge_expired(now);
        }

        let key = cooldown_key(path);
        if bypass {
            self.cooldowns.insert(key, now);
            return CooldownDecision::Bypassed;
        }

        match self.cooldowns.entry(key) {
            Entry::Occupied(mut entry) => {
                let elapsed = now.saturating_duration_since(*entry.get());
                if elapsed < self.window {
                    return CooldownDecision::Active {
                        remaining: self.window - elapsed,
                    };
                }
                entry.insert(now);
                CooldownDecision::Acquired
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                CooldownDecision::Acquired
            }
        }
    }

    /// Forget which entities were handled in the current request.
    pub fn reset_request_scope(&self) {
        mutex_lock(&self.seen, SOURCE, "reset_request_scope").clear();
    }

    /// Forget all request and cooldown state.
    pub fn reset(&self) {
        self.reset_request_scope();
        self.cooldowns.clear();
    }

    /// Number of cooldown markers currently held, live or expired.
    pub fn cooldown_len(&self) -> usize {
        self.cooldowns.len()
    }

    fn purge_expired(&self, now: Instant) {
        let before = self.cooldowns.len();
        self.cooldowns
            .retain(|_, stamped| now.saturating_duration_since(*stamped) < self.window);
        debug!(
            source = SOURCE,
            purged = before.saturating_sub(self.cooldowns.len()),
            "Purged expired cooldown markers"
        );
    }
}
