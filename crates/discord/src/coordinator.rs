//! Debounce/cooldown coordinator for thread tag updates.
//!
//! Tag edits arrive in bursts: a user toggling several tags produces a
//! stream of thread-updated events within a second or two. The coordinator
//! keeps one pending record per thread, slides a debounce timer on every
//! further edit, and evaluates the *whole* burst once the channel quiets
//! down — diffing against the snapshot taken before the first edit, never
//! an intermediate one. A per-action cooldown then suppresses repeat
//! announcements from independent near-simultaneous edits.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::Utc;
use tracing::{debug, info, warn};

use herald_core::{highest_priority_added_action, same_tags, StatusAction, TagVocabulary};

use crate::api::{ChannelKind, DiscordApi};
use crate::messages::{
    mention_directive, pick_first_image_url, status_update_message, thread_embed,
};

pub type ScheduledTask = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Cancellation handle for a scheduled evaluation. Cancelling an already
/// fired or cancelled timer is a no-op.
pub struct TimerHandle {
    cancel: Box<dyn Fn() + Send + Sync>,
}

impl TimerHandle {
    pub fn new(cancel: impl Fn() + Send + Sync + 'static) -> Self {
        Self { cancel: Box::new(cancel) }
    }

    pub fn cancel(&self) {
        (self.cancel)();
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle").finish_non_exhaustive()
    }
}

/// Delayed-execution seam. The coordinator never touches a concrete timer
/// primitive, so tests can drive evaluations deterministically.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> TimerHandle;
}

pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> TimerHandle {
        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        let abort = join.abort_handle();
        TimerHandle::new(move || abort.abort())
    }
}

/// Monotonic-enough time source for the cooldown gate.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// One burst of tag edits awaiting evaluation. `base_tags` is fixed at
/// first-edit time and never changes while the record lives.
#[derive(Debug)]
struct PendingBurst {
    base_tags: Vec<String>,
    #[allow(dead_code)]
    latest_tags: Vec<String>,
    /// Arm-time sequence number; an evaluation only consumes the burst if
    /// its generation still matches, so a cancelled timer whose abort
    /// lost the race cannot fire a re-armed burst early.
    generation: u64,
    timer: TimerHandle,
}

#[derive(Clone, Copy, Debug)]
struct LastSent {
    action: StatusAction,
    at_ms: u64,
}

#[derive(Debug, Default)]
struct ThreadState {
    pending: Option<PendingBurst>,
    last_sent: Option<LastSent>,
    timer_generation: u64,
}

#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    pub announce_channel_id: String,
    pub debounce: Duration,
    pub cooldown: Duration,
}

pub struct TagUpdateCoordinator {
    api: Arc<dyn DiscordApi>,
    vocab: Arc<TagVocabulary>,
    scheduler: Arc<dyn Scheduler>,
    clock: Arc<dyn Clock>,
    config: CoordinatorConfig,
    states: Mutex<HashMap<String, ThreadState>>,
}

impl TagUpdateCoordinator {
    pub fn new(
        api: Arc<dyn DiscordApi>,
        vocab: Arc<TagVocabulary>,
        scheduler: Arc<dyn Scheduler>,
        clock: Arc<dyn Clock>,
        config: CoordinatorConfig,
    ) -> Self {
        Self { api, vocab, scheduler, clock, config, states: Mutex::new(HashMap::new()) }
    }

    /// Feeds one thread-updated event into the state machine. Equal
    /// snapshots are ignored; otherwise the thread's debounce timer is
    /// (re)armed for the full window while the original base snapshot is
    /// preserved, so the eventual diff spans the entire burst.
    pub fn observe_tag_update(
        self: &Arc<Self>,
        thread_id: &str,
        old_tags: &[String],
        new_tags: &[String],
    ) {
        if same_tags(old_tags, new_tags) {
            return;
        }

        let mut states = self.states();
        let entry = states.entry(thread_id.to_string()).or_default();

        let base_tags = match entry.pending.take() {
            Some(previous) => {
                // Cancel before re-arming; two live timers for one thread
                // would evaluate the same burst twice.
                previous.timer.cancel();
                previous.base_tags
            }
            None => old_tags.to_vec(),
        };

        entry.timer_generation += 1;
        let generation = entry.timer_generation;

        let coordinator = Arc::clone(self);
        let id = thread_id.to_string();
        let timer = self.scheduler.schedule(
            self.config.debounce,
            Box::pin(async move { coordinator.evaluate(&id, generation).await }),
        );

        debug!(
            event_name = "forum.tag_update.armed",
            thread_id,
            base_tags = base_tags.len(),
            latest_tags = new_tags.len(),
            "debounce window armed for tag burst"
        );

        entry.pending =
            Some(PendingBurst { base_tags, latest_tags: new_tags.to_vec(), generation, timer });
    }

    /// Fired when a thread's debounce window elapses with no further edits.
    async fn evaluate(self: &Arc<Self>, thread_id: &str, generation: u64) {
        let Some(burst) = self.take_pending(thread_id, generation) else {
            return;
        };

        let channel = match self.api.fetch_channel(&self.config.announce_channel_id).await {
            Ok(Some(channel)) if channel.kind == ChannelKind::Text => channel,
            Ok(Some(channel)) => {
                warn!(
                    event_name = "forum.tag_update.bad_destination",
                    channel_id = %self.config.announce_channel_id,
                    kind = ?channel.kind,
                    "announce channel is not a text channel"
                );
                return;
            }
            Ok(None) => {
                warn!(
                    event_name = "forum.tag_update.bad_destination",
                    channel_id = %self.config.announce_channel_id,
                    "announce channel could not be found"
                );
                return;
            }
            Err(error) => {
                warn!(
                    event_name = "forum.tag_update.fetch_failed",
                    channel_id = %self.config.announce_channel_id,
                    error = %error,
                    "announce channel fetch failed; skipping evaluation"
                );
                return;
            }
        };

        // Re-fetch authoritative state: a further edit, or the thread's
        // deletion, may have raced the timer.
        let thread = match self.api.fetch_thread(thread_id).await {
            Ok(Some(thread)) => thread,
            Ok(None) => {
                debug!(
                    event_name = "forum.tag_update.thread_gone",
                    thread_id,
                    "thread vanished before evaluation"
                );
                return;
            }
            Err(error) => {
                warn!(
                    event_name = "forum.tag_update.fetch_failed",
                    thread_id,
                    error = %error,
                    "thread re-fetch failed; skipping evaluation"
                );
                return;
            }
        };

        if same_tags(&burst.base_tags, &thread.applied_tags) {
            debug!(
                event_name = "forum.tag_update.no_net_change",
                thread_id,
                "tag burst cancelled itself out"
            );
            return;
        }

        let Some(action) =
            highest_priority_added_action(&self.vocab, &burst.base_tags, &thread.applied_tags)
        else {
            return;
        };

        let now_ms = self.clock.now_ms();
        if self.cooldown_active(thread_id, action, now_ms) {
            debug!(
                event_name = "forum.tag_update.cooldown_suppressed",
                thread_id,
                action = action.label(),
                "same action already announced within the cooldown window"
            );
            return;
        }

        let starter = match self.api.first_thread_message(thread_id).await {
            Ok(message) => message.unwrap_or_default(),
            Err(error) => {
                warn!(
                    event_name = "forum.tag_update.fetch_failed",
                    thread_id,
                    error = %error,
                    "starter message fetch failed; skipping evaluation"
                );
                return;
            }
        };

        let image = pick_first_image_url(&starter.attachments);
        let embed = thread_embed(&thread, &starter.content, image, Utc::now());
        let content = status_update_message(&thread, &self.vocab, action);
        let message = crate::embeds::OutboundMessage {
            content,
            embeds: vec![embed],
            allowed_mentions: mention_directive(action),
        };

        if let Err(error) = self.api.send_message(&channel.id, &message).await {
            warn!(
                event_name = "forum.tag_update.send_failed",
                thread_id,
                action = action.label(),
                error = %error,
                "status update delivery failed"
            );
            return;
        }

        self.record_last_sent(thread_id, action, now_ms);

        // The record is only consulted within the cooldown window, so it
        // is evicted once that window passes instead of living forever.
        let coordinator = Arc::clone(self);
        let id = thread_id.to_string();
        self.scheduler.schedule(
            self.config.cooldown,
            Box::pin(async move { coordinator.evict_last_sent(&id, now_ms) }),
        );

        info!(
            event_name = "forum.tag_update.sent",
            thread_id,
            action = action.label(),
            "status update announced"
        );
    }

    /// Count of threads with an armed debounce timer.
    pub fn pending_update_count(&self) -> usize {
        self.states().values().filter(|state| state.pending.is_some()).count()
    }

    /// Count of threads holding any state at all, armed or remembered.
    pub fn tracked_thread_count(&self) -> usize {
        self.states().len()
    }

    fn take_pending(&self, thread_id: &str, generation: u64) -> Option<PendingBurst> {
        let mut states = self.states();
        let state = states.get_mut(thread_id)?;
        // A superseded timer whose abort lost the race must not consume
        // the re-armed burst.
        if state.pending.as_ref().map_or(true, |burst| burst.generation != generation) {
            return None;
        }
        let burst = state.pending.take();
        // Last-sent memory outlives the record; drop the entry only when
        // nothing is left to remember.
        if state.last_sent.is_none() {
            states.remove(thread_id);
        }
        burst
    }

    fn cooldown_active(&self, thread_id: &str, action: StatusAction, now_ms: u64) -> bool {
        let states = self.states();
        let Some(last) = states.get(thread_id).and_then(|state| state.last_sent) else {
            return false;
        };
        last.action == action
            && now_ms.saturating_sub(last.at_ms) < self.config.cooldown.as_millis() as u64
    }

    fn record_last_sent(&self, thread_id: &str, action: StatusAction, at_ms: u64) {
        let mut states = self.states();
        let entry = states.entry(thread_id.to_string()).or_default();
        entry.last_sent = Some(LastSent { action, at_ms });
    }

    fn evict_last_sent(&self, thread_id: &str, sent_at_ms: u64) {
        let cooldown_ms = self.config.cooldown.as_millis() as u64;
        let mut states = self.states();
        let stale = states.get(thread_id).is_some_and(|state| {
            state.pending.is_none()
                && state.last_sent.is_some_and(|last| last.at_ms == sent_at_ms)
                && self.clock.now_ms().saturating_sub(sent_at_ms) >= cooldown_ms
        });
        if stale {
            states.remove(thread_id);
        }
    }

    fn states(&self) -> MutexGuard<'_, HashMap<String, ThreadState>> {
        // Never held across an await; poisoning only happens if a holder
        // panicked mid-update, in which case the map is still usable.
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
