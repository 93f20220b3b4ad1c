//! Frame scheduling. Hosts own the real tick source (a widget tick callback);
//! the controller only records which animation kinds want frames and hands
//! out handles so a new animation of a kind replaces the old one.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use strum::Display as StrumDisplay;

pub const FRAME: Duration = Duration::from_micros(16_667);

pub trait TickSource {
    fn now(&self) -> Duration;
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for MonotonicClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Deterministic clock for tests and headless simulation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualClock {
    now: Duration,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, by: Duration) -> Duration {
        self.now += by;
        self.now
    }

    pub fn frame(&mut self) -> Duration {
        self.advance(FRAME)
    }
}

impl TickSource for ManualClock {
    fn now(&self) -> Duration {
        self.now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay)]
pub enum AnimationKind {
    /// Momentum and snapping of the card strip.
    Carousel,
    /// Spring-back of an over-scrolled pan.
    Pan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    active: HashMap<AnimationKind, TaskHandle>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a task of `kind`, cancelling whatever task of that kind was live.
    pub fn start(&mut self, kind: AnimationKind) -> TaskHandle {
        self.next_id += 1;
        let handle = TaskHandle(self.next_id);
        if let Some(old) = self.active.insert(kind, handle) {
            log::trace!("{} animation {:?} replaced by {:?}", kind, old, handle);
        } else {
            log::trace!("{} animation {:?} started", kind, handle);
        }
        handle
    }

    pub fn cancel(&mut self, kind: AnimationKind) -> Option<TaskHandle> {
        let handle = self.active.remove(&kind);
        if let Some(h) = handle {
            log::trace!("{} animation {:?} cancelled", kind, h);
        }
        handle
    }

    /// Ends `handle` if it is still the live task of `kind`.
    pub fn finish(&mut self, kind: AnimationKind, handle: TaskHandle) {
        if self.is_current(kind, handle) {
            self.active.remove(&kind);
        }
    }

    pub fn is_current(&self, kind: AnimationKind, handle: TaskHandle) -> bool {
        self.active.get(&kind) == Some(&handle)
    }

    pub fn is_active(&self, kind: AnimationKind) -> bool {
        self.active.contains_key(&kind)
    }

    pub fn has_pending(&self) -> bool {
        !self.active.is_empty()
    }
}

pub trait Animated {
    fn tick(&mut self, now: Duration);
    fn is_animating(&self) -> bool;
}

/// Feeds frames from `clock` until `target` stops animating. Returns the
/// number of frames consumed, capped at `max_frames`.
pub fn run_until_idle<A: Animated>(
    target: &mut A,
    clock: &mut ManualClock,
    max_frames: usize,
) -> usize {
    let mut frames = 0;
    while target.is_animating() && frames < max_frames {
        let now = clock.frame();
        target.tick(now);
        frames += 1;
    }
    frames
}
