//! Round-robin polling across several identities
//!
//! A feed that tracks many accounts against a strict rate limit polls at most
//! one account per interval. The rotation is an explicit [`PollingState`]
//! record: loaded from the cache at the start of an invocation, advanced by
//! [`RoundRobinScheduler::tick`], and written back at the end.

use std::collections::BTreeMap;
use std::future::Future;

use calfeed_domain::{CalendarEvent, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{CacheBackedFetch, CacheReadPolicy, CacheTtl};
use crate::cache_key::CacheKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    /// Built for the current identity set, nothing polled yet
    #[default]
    Initialized,
    /// At least one poll has happened
    Polling,
}

/// Persisted rotation state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingState {
    pub identities: Vec<String>,
    pub rotation_index: usize,
    pub last_poll_epoch: i64,
    pub phase: PollPhase,
    /// Latest events per identity
    pub data: BTreeMap<String, Vec<CalendarEvent>>,
}

impl PollingState {
    /// Fresh state with an empty record per identity
    pub fn new(identities: &[String]) -> Self {
        let identities = dedup(identities);
        let data = identities.iter().map(|id| (id.clone(), Vec::new())).collect();
        Self {
            identities,
            rotation_index: 0,
            last_poll_epoch: 0,
            phase: PollPhase::Initialized,
            data,
        }
    }

    /// Bring the state in line with the configured identities
    ///
    /// Any change to the list (membership or order) restarts the rotation at
    /// index 0 with the poll timer cleared, drops data for removed identities
    /// and adds empty records for new ones. Returns whether a reset happened.
    pub fn reconcile(&mut self, configured: &[String]) -> bool {
        let configured = dedup(configured);
        if configured == self.identities {
            return false;
        }

        self.data.retain(|id, _| configured.contains(id));
        for id in &configured {
            self.data.entry(id.clone()).or_default();
        }
        self.identities = configured;
        self.rotation_index = 0;
        self.last_poll_epoch = 0;
        self.phase = PollPhase::Initialized;
        true
    }

    /// All stored events, in identity order
    pub fn events(&self) -> Vec<CalendarEvent> {
        self.identities
            .iter()
            .filter_map(|id| self.data.get(id))
            .flat_map(|events| events.iter().cloned())
            .collect()
    }
}

fn dedup(identities: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(identities.len());
    for id in identities {
        if !seen.contains(id) {
            seen.push(id.clone());
        }
    }
    seen
}

/// Polls one identity per interval, in index order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundRobinScheduler {
    interval_secs: i64,
}

impl RoundRobinScheduler {
    pub fn new(interval_secs: i64) -> Self {
        Self { interval_secs: interval_secs.max(0) }
    }

    pub fn from_minutes(minutes: u32) -> Self {
        Self::new(i64::from(minutes) * 60)
    }

    /// Identity due for polling at `now_epoch`, if any
    pub fn due<'a>(&self, state: &'a PollingState, now_epoch: i64) -> Option<&'a str> {
        if state.identities.is_empty() || now_epoch - state.last_poll_epoch < self.interval_secs {
            return None;
        }
        let index = state.rotation_index % state.identities.len();
        state.identities.get(index).map(String::as_str)
    }

    /// Poll the due identity, if any, and advance the rotation
    ///
    /// A successful poll replaces that identity's events; a failed one keeps
    /// them. Either way the index moves on and the poll time is recorded.
    pub async fn tick<F, Fut>(
        &self,
        state: &mut PollingState,
        now_epoch: i64,
        poll: F,
    ) -> Option<String>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Vec<CalendarEvent>>>,
    {
        let identity = self.due(state, now_epoch)?.to_string();
        debug!(identity = %identity, index = state.rotation_index, "polling identity");

        match poll(identity.clone()).await {
            Ok(events) => {
                info!(identity = %identity, events = events.len(), "identity refreshed");
                state.data.insert(identity.clone(), events);
            }
            Err(err) => {
                warn!(identity = %identity, error = %err, "poll failed, keeping previous data");
            }
        }

        state.rotation_index = (state.rotation_index + 1) % state.identities.len();
        state.last_poll_epoch = now_epoch;
        state.phase = PollPhase::Polling;
        Some(identity)
    }

    /// Load the state stored under `key`, reconcile, tick and store it back
    ///
    /// The state is kept until the end of the local day; a new day starts
    /// from a fresh state when `key` embeds the date.
    pub async fn run<F, Fut>(
        &self,
        cache: &CacheBackedFetch,
        key: &CacheKey,
        identities: &[String],
        now_epoch: i64,
        poll: F,
    ) -> PollingState
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Vec<CalendarEvent>>>,
    {
        let mut state = match cache.lookup::<PollingState>(key).await {
            Some(state) => state,
            None => {
                info!(key = %key, identities = identities.len(), "starting new polling state");
                PollingState::new(identities)
            }
        };

        if state.reconcile(identities) {
            info!(key = %key, "identity set changed, rotation reset");
        }

        self.tick(&mut state, now_epoch, poll).await;
        cache.store(key, CacheTtl::UntilEndOfDay, CacheReadPolicy::Structured, &state).await;
        state
    }
}

#[cfg(test)]
mod tests {
    use calfeed_domain::CalFeedError;

    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|id| id.to_string()).collect()
    }

    fn event(title: &str) -> CalendarEvent {
        CalendarEvent::builder(title).start("2024-05-01 09:00").build().unwrap()
    }

    #[tokio::test]
    async fn each_identity_polled_once_per_rotation_in_order() {
        let interval_minutes = 10;
        let scheduler = RoundRobinScheduler::from_minutes(interval_minutes);
        let identities = ids(&["a", "b", "c"]);
        let mut state = PollingState::new(&identities);
        let start = 1_714_550_400;

        let mut polled = Vec::new();
        for minute in 0..(interval_minutes as i64 * 3) {
            let now = start + minute * 60;
            state.reconcile(&identities);
            if let Some(id) = scheduler.tick(&mut state, now, |_| async { Ok(Vec::new()) }).await {
                polled.push((minute, id));
            }
        }

        assert_eq!(
            polled,
            vec![(0, "a".to_string()), (10, "b".to_string()), (20, "c".to_string())]
        );
    }

    #[tokio::test]
    async fn failed_poll_keeps_data_and_still_advances() {
        let scheduler = RoundRobinScheduler::new(60);
        let mut state = PollingState::new(&ids(&["a", "b"]));
        state.data.insert("a".into(), vec![event("old")]);

        let polled = scheduler
            .tick(&mut state, 1_000, |_| async { Err(CalFeedError::Network("down".into())) })
            .await;

        assert_eq!(polled.as_deref(), Some("a"));
        assert_eq!(state.data["a"], vec![event("old")]);
        assert_eq!(state.rotation_index, 1);
        assert_eq!(state.last_poll_epoch, 1_000);
        assert_eq!(state.phase, PollPhase::Polling);
    }

    #[tokio::test]
    async fn successful_poll_replaces_only_that_identity() {
        let scheduler = RoundRobinScheduler::new(60);
        let mut state = PollingState::new(&ids(&["a", "b"]));
        state.data.insert("b".into(), vec![event("b-old")]);

        scheduler.tick(&mut state, 1_000, |_| async { Ok(vec![event("a-new")]) }).await;

        assert_eq!(state.data["a"], vec![event("a-new")]);
        assert_eq!(state.data["b"], vec![event("b-old")]);
        assert_eq!(state.events(), vec![event("a-new"), event("b-old")]);
    }

    #[test]
    fn nothing_due_before_interval_elapses() {
        let scheduler = RoundRobinScheduler::new(600);
        let mut state = PollingState::new(&ids(&["a"]));
        state.last_poll_epoch = 1_000;
        assert_eq!(scheduler.due(&state, 1_599), None);
        assert_eq!(scheduler.due(&state, 1_600), Some("a"));
    }

    #[test]
    fn reconfiguration_resets_rotation_and_drops_removed_identities() {
        let mut state = PollingState::new(&ids(&["a", "b", "c"]));
        state.rotation_index = 2;
        state.last_poll_epoch = 5_000;
        state.phase = PollPhase::Polling;
        state.data.insert("a".into(), vec![event("a")]);
        state.data.insert("b".into(), vec![event("b")]);

        assert!(state.reconcile(&ids(&["a", "d"])));

        assert_eq!(state.identities, ids(&["a", "d"]));
        assert_eq!(state.rotation_index, 0);
        assert_eq!(state.last_poll_epoch, 0);
        assert!(!state.data.contains_key("b"));
        assert!(!state.data.contains_key("c"));
        assert_eq!(state.data["a"], vec![event("a")]);
        assert!(state.data["d"].is_empty());
    }

    #[test]
    fn unchanged_identities_do_not_reset() {
        let mut state = PollingState::new(&ids(&["a", "b"]));
        state.rotation_index = 1;
        assert!(!state.reconcile(&ids(&["a", "b", "a"])));
        assert_eq!(state.rotation_index, 1);
    }
}
