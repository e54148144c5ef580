//! One-shot delayed actions.
//!
//! The controller never sleeps. It hands a [`Deferred`] to a [`Scheduler`],
//! keeps the returned [`Timer`] so it can cancel it, and is called back with
//! the action once the delay has elapsed. Every action also carries enough
//! identity (selection generation, handle id) to be recognised as stale if it
//! fires after the state it was armed for has moved on.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::player::HandleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Create the player for the current station, if `generation` is still
    /// the latest selection.
    CreatePlayer { generation: u64 },
    /// Issue the delayed play after readiness, if `handle` is still live.
    SettlePlay { handle: HandleId },
}

pub trait Timer {
    /// Disarm the timer. A timer that already fired is unaffected.
    fn cancel(self);
}

pub trait Scheduler {
    type Timer: Timer;

    fn schedule(&mut self, delay: Duration, action: Deferred) -> Self::Timer;
}

/// Cancel the timer in `slot`, if any.
pub fn disarm<T: Timer>(slot: &mut Option<T>) {
    if let Some(timer) = slot.take() {
        timer.cancel();
    }
}

// ── tokio ─────────────────────────────────────────────────────────────────────

impl Timer for AbortHandle {
    fn cancel(self) {
        self.abort();
    }
}

/// Sleeps on the tokio timer and posts the action into the owner's event
/// channel, wrapped into the owner's message type.
pub struct TokioScheduler<M> {
    tx: mpsc::Sender<M>,
    wrap: fn(Deferred) -> M,
}

impl<M> TokioScheduler<M> {
    pub fn new(tx: mpsc::Sender<M>, wrap: fn(Deferred) -> M) -> Self {
        Self { tx, wrap }
    }
}

impl<M: Send + 'static> Scheduler for TokioScheduler<M> {
    type Timer = AbortHandle;

    fn schedule(&mut self, delay: Duration, action: Deferred) -> AbortHandle {
        let tx = self.tx.clone();
        let msg = (self.wrap)(action);
        debug!("timer: {:?} in {:?}", action, delay);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(msg).await;
        })
        .abort_handle()
    }
}

// ── manual clock ──────────────────────────────────────────────────────────────

/// Virtual-clock scheduler. Nothing fires until [`ManualScheduler::advance`]
/// is called; clones share one queue.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<ManualQueue>>,
}

#[derive(Default)]
struct ManualQueue {
    now: Duration,
    next_id: u64,
    pending: Vec<Scheduled>,
}

struct Scheduled {
    id: u64,
    due: Duration,
    action: Deferred,
}

pub struct ManualTimer {
    id: u64,
    queue: Weak<RefCell<ManualQueue>>,
}

impl Timer for ManualTimer {
    fn cancel(self) {
        if let Some(queue) = self.queue.upgrade() {
            queue.borrow_mut().pending.retain(|s| s.id != self.id);
        }
    }
}

impl Scheduler for ManualScheduler {
    type Timer = ManualTimer;

    fn schedule(&mut self, delay: Duration, action: Deferred) -> ManualTimer {
        let mut queue = self.queue.borrow_mut();
        let id = queue.next_id;
        queue.next_id += 1;
        let due = queue.now + delay;
        queue.pending.push(Scheduled { id, due, action });
        ManualTimer {
            id,
            queue: Rc::downgrade(&self.queue),
        }
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.queue.borrow().now
    }

    /// Armed actions in firing order.
    pub fn pending(&self) -> Vec<Deferred> {
        let queue = self.queue.borrow();
        let mut armed: Vec<&Scheduled> = queue.pending.iter().collect();
        armed.sort_by_key(|s| (s.due, s.id));
        armed.into_iter().map(|s| s.action).collect()
    }

    /// Move the clock forward and return every action that came due.
    pub fn advance(&self, by: Duration) -> Vec<Deferred> {
        let mut queue = self.queue.borrow_mut();
        queue.now += by;
        let now = queue.now;
        let (mut due, rest): (Vec<Scheduled>, Vec<Scheduled>) =
            queue.pending.drain(..).partition(|s| s.due <= now);
        queue.pending = rest;
        due.sort_by_key(|s| (s.due, s.id));
        due.into_iter().map(|s| s.action).collect()
    }
}
