//! The carousel controller: which card is active, how drags and flicks move
//! the strip, and how the active card's image is zoomed and panned.
//!
//! Every mutation comes through a method here, from input handlers or from
//! [`Animated::tick`]. Inputs carry a timestamp from the host's tick source so
//! the whole machine can be driven frame by frame in tests.

use crate::command::RemoteCommand;
use crate::easing::Tween;
use crate::events::{CarouselEvent, CarouselState};
use crate::gallery::{self, Card, GalleryError, ImageEntry};
use crate::geometry::{Point, Rect, Size, circular_distance, wrap_index};
use crate::layout::{self, CARD_SPACING, CardVisual};
use crate::scheduler::{AnimationKind, Animated, FRAME, Scheduler, TaskHandle};
use crate::settings::{CarouselSettings, SettingsError};
use crate::zoom::{ZoomLimits, ZoomModel};
use std::mem;
use std::time::Duration;
use thiserror::Error;

/// Weight of the newest sample in the release velocity estimate.
const VELOCITY_SMOOTHING: f64 = 0.8;
/// A pointer resting this long before release throws nothing.
const RELEASE_HOLD: Duration = Duration::from_millis(100);
const DOUBLE_TAP_DISTANCE: f64 = 30.0;

#[derive(Error, Debug, PartialEq)]
pub enum CarouselError {
    #[error(transparent)]
    Gallery(#[from] GalleryError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Escape,
}

#[derive(Debug, Clone, Copy)]
struct Swipe {
    origin: Point,
    start_offset: f64,
    last_x: f64,
    last_at: Duration,
}

#[derive(Debug, Clone, Copy, Default)]
enum Gesture {
    #[default]
    None,
    Swipe(Swipe),
    Pan {
        origin: Point,
        raw_start: Point,
    },
    /// Press on a visible side card; becomes navigation if released in place.
    Tap {
        index: usize,
        origin: Point,
    },
    Pinch {
        initial_distance: f64,
        initial_scale: f64,
    },
}

#[derive(Debug, Clone, Copy)]
enum Motion {
    Rest,
    Momentum(TaskHandle),
    Snap {
        task: TaskHandle,
        tween: Tween<f64>,
    },
}

#[derive(Debug, Clone, Copy)]
struct TapRecord {
    at: Duration,
    point: Point,
}

#[derive(Debug)]
pub struct Carousel {
    cards: Vec<Card>,
    settings: CarouselSettings,
    viewport: Size,
    current_index: usize,
    drag_offset: f64,
    velocity: f64,
    gesture: Gesture,
    motion: Motion,
    zoom: ZoomModel,
    pan_task: Option<TaskHandle>,
    scheduler: Scheduler,
    effects_enabled: bool,
    hovering: bool,
    last_tap: Option<TapRecord>,
    state: CarouselState,
    events: Vec<CarouselEvent>,
}

impl Carousel {
    pub fn new(entries: &[ImageEntry], settings: CarouselSettings) -> Result<Self, CarouselError> {
        settings.validate()?;
        let cards = gallery::build_cards(entries)?;
        let zoom = ZoomModel::new(ZoomLimits::from(&settings));

        let mut carousel = Self {
            cards,
            viewport: settings.card_size(),
            settings,
            current_index: 0,
            drag_offset: 0.0,
            velocity: 0.0,
            gesture: Gesture::None,
            motion: Motion::Rest,
            zoom,
            pan_task: None,
            scheduler: Scheduler::new(),
            effects_enabled: true,
            hovering: false,
            last_tap: None,
            state: CarouselState::Idle,
            events: Vec::new(),
        };
        carousel.refresh_zoom_frame();
        log::debug!("Carousel created with {} cards", carousel.cards.len());
        Ok(carousel)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_card(&self) -> &Card {
        &self.cards[self.current_index]
    }

    pub fn drag_offset(&self) -> f64 {
        self.drag_offset
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn settings(&self) -> &CarouselSettings {
        &self.settings
    }

    pub fn zoom(&self) -> &ZoomModel {
        &self.zoom
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn effects_enabled(&self) -> bool {
        self.effects_enabled
    }

    /// Fractional index shown at the center of the stage, in `[0, len)`.
    pub fn position(&self) -> f64 {
        self.raw_position().rem_euclid(self.len() as f64)
    }

    fn raw_position(&self) -> f64 {
        self.current_index as f64 - self.drag_offset / CARD_SPACING
    }

    pub fn state(&self) -> CarouselState {
        match self.gesture {
            Gesture::Pinch { .. } => CarouselState::Pinching,
            Gesture::Swipe(_) | Gesture::Pan { .. } => CarouselState::Dragging,
            Gesture::None | Gesture::Tap { .. } => match self.motion {
                Motion::Momentum(_) => CarouselState::Momentum,
                Motion::Snap { .. } => CarouselState::Snapping,
                Motion::Rest if self.zoom.is_zoomed() => CarouselState::Zoomed,
                Motion::Rest => CarouselState::Idle,
            },
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::Swipe(_) | Gesture::Pan { .. })
    }

    pub fn is_pinching(&self) -> bool {
        matches!(self.gesture, Gesture::Pinch { .. })
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoom.is_zoomed()
    }

    pub fn drain_events(&mut self) -> Vec<CarouselEvent> {
        mem::take(&mut self.events)
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.refresh_zoom_frame();
    }

    pub fn set_natural_size(&mut self, index: usize, size: Size) {
        if let Some(card) = self.cards.get_mut(index) {
            card.natural_size = Some(size);
            if index == self.current_index {
                self.refresh_zoom_frame();
            }
        }
    }

    pub fn set_settings(&mut self, settings: CarouselSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.zoom.set_limits(ZoomLimits::from(&settings));
        self.settings = settings;
        self.refresh_zoom_frame();
        self.sync_state();
        Ok(())
    }

    /// With effects off every animation lands on its end state immediately.
    pub fn set_effects_enabled(&mut self, enabled: bool) {
        self.effects_enabled = enabled;
        if enabled {
            return;
        }
        match self.motion {
            Motion::Rest => {}
            Motion::Snap { .. } => {
                self.stop_motion();
                self.drag_offset = 0.0;
                self.velocity = 0.0;
            }
            Motion::Momentum(_) => {
                let target = self.nearest_index();
                self.stop_motion();
                self.settle_to(target, Duration::ZERO);
            }
        }
        if self.zoom.is_springing() {
            self.zoom.release(Duration::ZERO, false);
            self.stop_pan_animation();
        }
        self.sync_state();
    }

    /// Per-card visuals for the current frame.
    pub fn visuals(&self) -> Vec<CardVisual> {
        layout::layout(self.len(), self.raw_position())
    }

    /// Where card `index` is drawn, given its visual. The active card includes
    /// its zoom and pan.
    pub fn card_rect(&self, index: usize, visual: &CardVisual) -> Rect {
        let mut center = self.viewport.center() + Point::new(visual.translate_x, 0.0);
        let mut size = self.settings.card_size().scaled(visual.scale);
        if index == self.current_index && self.zoom.is_zoomed() {
            center = center + self.zoom.pan();
            size = size.scaled(self.zoom.scale());
        }
        Rect::centered(center, size)
    }

    /// Topmost visible card under `point`.
    pub fn hit_test(&self, point: Point) -> Option<usize> {
        self.visuals()
            .iter()
            .enumerate()
            .filter(|(i, v)| v.is_visible() && self.card_rect(*i, v).contains(point))
            .max_by_key(|(_, v)| v.z_index)
            .map(|(i, _)| i)
    }

    /// Unzoomed layout box of the active image at rest.
    pub fn image_rect(&self) -> Rect {
        Rect::centered(self.viewport.center(), self.zoom.image())
    }

    fn focal_point(&self, point: Point) -> Point {
        point - self.image_rect().origin
    }

    pub fn pointer_down(&mut self, point: Point, now: Duration) {
        if !matches!(self.gesture, Gesture::None) {
            return;
        }
        let target = self.hit_test(point);
        let at_rest = matches!(self.motion, Motion::Rest);

        if at_rest && target == Some(self.current_index) && self.is_double_tap(point, now) {
            self.last_tap = None;
            self.toggle_zoom(point);
            self.sync_state();
            return;
        }

        self.stop_pan_animation();

        if self.zoom.is_zoomed() {
            self.gesture = Gesture::Pan {
                origin: point,
                raw_start: self.zoom.raw_pan(),
            };
        } else if !at_rest {
            // catch the strip where it is
            self.stop_motion();
            self.start_swipe(point, now);
        } else {
            match target {
                Some(i) if i == self.current_index => self.start_swipe(point, now),
                Some(index) => {
                    self.gesture = Gesture::Tap {
                        index,
                        origin: point,
                    }
                }
                None => {}
            }
        }
        self.sync_state();
    }

    fn start_swipe(&mut self, point: Point, now: Duration) {
        self.velocity = 0.0;
        self.gesture = Gesture::Swipe(Swipe {
            origin: point,
            start_offset: self.drag_offset,
            last_x: point.x,
            last_at: now,
        });
    }

    pub fn pointer_move(&mut self, point: Point, now: Duration) {
        if matches!(self.gesture, Gesture::None) {
            let hovering = matches!(self.motion, Motion::Rest)
                && self.hit_test(point) == Some(self.current_index);
            self.set_hovering(hovering);
            return;
        }

        match &mut self.gesture {
            Gesture::Swipe(swipe) => {
                let elapsed = now.saturating_sub(swipe.last_at);
                if !elapsed.is_zero() {
                    let frames = elapsed.as_secs_f64() / FRAME.as_secs_f64();
                    let sample = (point.x - swipe.last_x) / frames;
                    self.velocity =
                        sample * VELOCITY_SMOOTHING + self.velocity * (1.0 - VELOCITY_SMOOTHING);
                    swipe.last_x = point.x;
                    swipe.last_at = now;
                }
                self.drag_offset = swipe.start_offset + (point.x - swipe.origin.x);
            }
            Gesture::Pan { origin, raw_start } => {
                let raw = *raw_start + (point - *origin);
                self.zoom.drag_pan(raw);
            }
            Gesture::None | Gesture::Tap { .. } | Gesture::Pinch { .. } => {}
        }
    }

    /// Moves the pointer gesture in progress onto another contact at `point`
    /// without disturbing the strip or the pan. A pending tap is dropped.
    pub fn pointer_handoff(&mut self, point: Point, now: Duration) {
        match &mut self.gesture {
            Gesture::Swipe(swipe) => {
                swipe.origin = point;
                swipe.start_offset = self.drag_offset;
                swipe.last_x = point.x;
                swipe.last_at = now;
                self.velocity = 0.0;
            }
            Gesture::Pan { origin, raw_start } => {
                *origin = point;
                *raw_start = self.zoom.raw_pan();
            }
            Gesture::Tap { .. } => self.gesture = Gesture::None,
            Gesture::None | Gesture::Pinch { .. } => {}
        }
        self.sync_state();
    }

    pub fn pointer_up(&mut self, point: Point, now: Duration) {
        match mem::take(&mut self.gesture) {
            Gesture::Swipe(swipe) => {
                if now.saturating_sub(swipe.last_at) > RELEASE_HOLD {
                    self.velocity = 0.0;
                }
                self.record_tap(swipe.origin, point, now);
                self.release_swipe(now);
            }
            Gesture::Pan { origin, .. } => {
                self.record_tap(origin, point, now);
                if self.zoom.release(now, self.effects_enabled) {
                    self.pan_task = Some(self.scheduler.start(AnimationKind::Pan));
                }
            }
            Gesture::Tap { index, origin } => {
                if origin.distance(point) <= self.settings.tap_slop {
                    self.navigate(index, now);
                }
            }
            pinch @ Gesture::Pinch { .. } => self.gesture = pinch,
            Gesture::None => {}
        }
        self.sync_state();
    }

    pub fn pointer_leave(&mut self) {
        self.set_hovering(false);
    }

    fn record_tap(&mut self, origin: Point, point: Point, now: Duration) {
        self.last_tap = (origin.distance(point) <= self.settings.tap_slop)
            .then_some(TapRecord { at: now, point });
    }

    fn is_double_tap(&self, point: Point, now: Duration) -> bool {
        self.last_tap.is_some_and(|tap| {
            now.saturating_sub(tap.at) <= self.settings.double_tap_window()
                && tap.point.distance(point) <= DOUBLE_TAP_DISTANCE
        })
    }

    fn toggle_zoom(&mut self, point: Point) {
        if self.zoom.is_zoomed() {
            self.reset_zoom();
        } else if self
            .zoom
            .zoom_to(self.settings.double_tap_scale, self.focal_point(point))
        {
            self.emit_zoom();
        }
    }

    fn release_swipe(&mut self, now: Duration) {
        if self.velocity.abs() > self.settings.min_velocity && self.effects_enabled {
            log::debug!("Momentum from velocity {:.2}", self.velocity);
            self.motion = Motion::Momentum(self.scheduler.start(AnimationKind::Carousel));
        } else {
            let target = self.nearest_index();
            self.settle_to(target, now);
        }
    }

    /// Index closest to the current position. Scans upward so the lower index
    /// wins an exact tie.
    fn nearest_index(&self) -> usize {
        let position = self.raw_position();
        let count = self.len();
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for i in 0..count {
            let d = circular_distance(i as f64, position, count).abs();
            if d < best_distance {
                best = i;
                best_distance = d;
            }
        }
        best
    }

    /// Makes `target` current and animates the strip from where it is drawn
    /// now to rest on it.
    fn settle_to(&mut self, target: usize, now: Duration) {
        let shift = circular_distance(target as f64, self.raw_position(), self.len());
        self.set_current(target);
        self.drag_offset = shift * CARD_SPACING;
        self.velocity = 0.0;

        if !self.effects_enabled || self.drag_offset.abs() < 0.5 {
            self.stop_motion();
            self.drag_offset = 0.0;
            return;
        }

        let task = self.scheduler.start(AnimationKind::Carousel);
        self.motion = Motion::Snap {
            task,
            tween: Tween::new(
                self.drag_offset,
                0.0,
                now,
                self.settings.snap_duration(),
                self.settings.snap_easing,
            ),
        };
    }

    fn set_current(&mut self, index: usize) {
        if index == self.current_index {
            return;
        }
        self.current_index = index;
        self.last_tap = None;
        self.refresh_zoom_frame();
        log::debug!("Active card is now {}", index);
        self.events.push(CarouselEvent::ActiveChanged { index });
    }

    fn stop_motion(&mut self) {
        self.scheduler.cancel(AnimationKind::Carousel);
        self.motion = Motion::Rest;
    }

    fn stop_pan_animation(&mut self) {
        self.scheduler.cancel(AnimationKind::Pan);
        self.pan_task = None;
        self.zoom.cancel_spring();
    }

    fn refresh_zoom_frame(&mut self) {
        let image = self.current_card().image_size(self.settings.card_size());
        self.zoom.set_frame(image, self.viewport);
    }

    pub fn next(&mut self, now: Duration) {
        let target = wrap_index(self.current_index as isize + 1, self.len());
        self.navigate(target, now);
    }

    pub fn previous(&mut self, now: Duration) {
        let target = wrap_index(self.current_index as isize - 1, self.len());
        self.navigate(target, now);
    }

    pub fn go_to(&mut self, index: usize, now: Duration) -> Result<(), GalleryError> {
        if index >= self.len() {
            return Err(GalleryError::OutOfRange {
                index,
                count: self.len(),
            });
        }
        self.navigate(index, now);
        Ok(())
    }

    fn navigate(&mut self, index: usize, now: Duration) {
        if matches!(
            self.gesture,
            Gesture::Swipe(_) | Gesture::Pan { .. } | Gesture::Pinch { .. }
        ) {
            log::debug!("Ignoring navigation to {} during {}", index, self.state());
            return;
        }
        self.gesture = Gesture::None;
        self.reset_zoom();
        self.stop_motion();
        self.settle_to(index, now);
        self.sync_state();
    }

    pub fn reset_zoom(&mut self) {
        if self.zoom.is_zoomed() || self.zoom.pan() != Point::ZERO {
            self.stop_pan_animation();
            self.zoom.reset();
            self.emit_zoom();
        }
        self.sync_state();
    }

    pub fn key(&mut self, key: Key, now: Duration) -> bool {
        match key {
            Key::ArrowRight => self.next(now),
            Key::ArrowLeft => self.previous(now),
            Key::Escape => {
                if !self.zoom.is_zoomed() {
                    return false;
                }
                self.reset_zoom();
            }
        }
        true
    }

    pub fn apply(&mut self, command: RemoteCommand, now: Duration) -> Result<(), GalleryError> {
        match command {
            RemoteCommand::Next => self.next(now),
            RemoteCommand::Previous => self.previous(now),
            RemoteCommand::ResetZoom => self.reset_zoom(),
            RemoteCommand::Goto(index) => self.go_to(index, now)?,
        }
        Ok(())
    }

    /// Wheel over the active card zooms around the pointer; negative delta
    /// zooms in. Returns whether the scale changed.
    pub fn wheel(&mut self, point: Point, delta_y: f64, _now: Duration) -> bool {
        if delta_y == 0.0
            || !matches!(self.gesture, Gesture::None)
            || !matches!(self.motion, Motion::Rest)
        {
            return false;
        }
        if !self.zoom.is_zoomed() && self.hit_test(point) != Some(self.current_index) {
            return false;
        }

        let step = self.settings.wheel_zoom_step;
        let factor = if delta_y < 0.0 { 1.0 + step } else { 1.0 - step };
        self.stop_pan_animation();
        let changed = self.zoom.zoom_by(factor, self.focal_point(point));
        if changed {
            self.emit_zoom();
        }
        self.sync_state();
        changed
    }

    /// A second contact point landed. `distance` is the finger spread and
    /// `center` their midpoint.
    pub fn pinch_begin(&mut self, center: Point, distance: f64, now: Duration) {
        if self.is_pinching() {
            return;
        }
        if !self.zoom.is_zoomed() && self.hit_test(center) != Some(self.current_index) {
            return;
        }

        // the strip glides back under the pinch
        match self.motion {
            Motion::Momentum(_) => {
                let target = self.nearest_index();
                self.settle_to(target, now);
            }
            Motion::Rest if matches!(self.gesture, Gesture::Swipe(_)) => {
                self.settle_to(self.current_index, now);
            }
            Motion::Rest | Motion::Snap { .. } => {}
        }
        self.stop_pan_animation();
        self.gesture = Gesture::Pinch {
            initial_distance: distance,
            initial_scale: self.zoom.scale(),
        };
        self.sync_state();
    }

    pub fn pinch_update(&mut self, center: Point, distance: f64) {
        let Gesture::Pinch {
            initial_distance,
            initial_scale,
        } = self.gesture
        else {
            return;
        };
        if initial_distance <= f64::EPSILON {
            return;
        }
        let target = initial_scale * distance / initial_distance;
        if self.zoom.zoom_to(target, self.focal_point(center)) {
            self.emit_zoom();
        }
    }

    pub fn pinch_end(&mut self, now: Duration) {
        if !self.is_pinching() {
            return;
        }
        self.gesture = Gesture::None;
        if !self.zoom.is_zoomed() {
            self.zoom.reset();
        } else if self.zoom.release(now, self.effects_enabled) {
            self.pan_task = Some(self.scheduler.start(AnimationKind::Pan));
        }
        self.sync_state();
    }

    fn advance_motion(&mut self, now: Duration) {
        match self.motion {
            Motion::Rest => {}
            Motion::Momentum(task) if self.scheduler.is_current(AnimationKind::Carousel, task) => {
                self.velocity *= self.settings.friction;
                self.drag_offset += self.velocity;
                if self.velocity.abs() <= self.settings.min_velocity {
                    let target = self.nearest_index();
                    self.scheduler.finish(AnimationKind::Carousel, task);
                    self.motion = Motion::Rest;
                    self.settle_to(target, now);
                }
            }
            Motion::Snap { task, tween } if self.scheduler.is_current(AnimationKind::Carousel, task) => {
                let (offset, done) = tween.sample(now);
                self.drag_offset = offset;
                if done {
                    self.drag_offset = 0.0;
                    self.velocity = 0.0;
                    self.scheduler.finish(AnimationKind::Carousel, task);
                    self.motion = Motion::Rest;
                }
            }
            Motion::Momentum(_) | Motion::Snap { .. } => self.motion = Motion::Rest,
        }
    }

    fn advance_pan(&mut self, now: Duration) {
        let Some(task) = self.pan_task else {
            return;
        };
        if !self.scheduler.is_current(AnimationKind::Pan, task) || !self.zoom.tick(now) {
            self.scheduler.finish(AnimationKind::Pan, task);
            self.pan_task = None;
        }
    }

    fn set_hovering(&mut self, hovering: bool) {
        if self.hovering != hovering {
            self.hovering = hovering;
            self.events.push(CarouselEvent::HoverChanged { hovering });
        }
    }

    fn emit_zoom(&mut self) {
        self.events.push(CarouselEvent::ZoomChanged {
            scale: self.zoom.scale(),
        });
    }

    fn sync_state(&mut self) {
        let state = self.state();
        if state != self.state {
            log::debug!("Carousel {} -> {}", self.state, state);
            self.events.push(CarouselEvent::StateChanged {
                from: self.state,
                to: state,
            });
            self.state = state;
        }
    }
}

impl Animated for Carousel {
    fn tick(&mut self, now: Duration) {
        self.advance_motion(now);
        self.advance_pan(now);
        self.sync_state();
    }

    fn is_animating(&self) -> bool {
        self.scheduler.has_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{ManualClock, TickSource, run_until_idle};

    const MAX_FRAMES: usize = 2_000;

    fn entries(n: usize) -> Vec<ImageEntry> {
        (0..n)
            .map(|i| ImageEntry::new(format!("{i}.jpg"), format!("image {i}")))
            .collect()
    }

    fn carousel(n: usize, viewport: Size) -> Carousel {
        let mut c = Carousel::new(&entries(n), CarouselSettings::default()).unwrap();
        c.set_viewport(viewport);
        c
    }

    fn wide(n: usize) -> Carousel {
        carousel(n, Size::new(1200.0, 900.0))
    }

    /// Viewport small enough that a 2x zoom leaves room to pan.
    fn tight() -> Carousel {
        carousel(5, Size::new(400.0, 500.0))
    }

    fn ms(clock: &mut ManualClock, millis: u64) -> Duration {
        clock.advance(Duration::from_millis(millis))
    }

    fn settle(c: &mut Carousel, clock: &mut ManualClock) {
        run_until_idle(c, clock, MAX_FRAMES);
        assert!(!c.is_animating());
    }

    #[test]
    fn test_empty_gallery_is_rejected() {
        let err = Carousel::new(&[], CarouselSettings::default()).unwrap_err();
        assert_eq!(err, CarouselError::Gallery(GalleryError::Empty));
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let settings = CarouselSettings {
            friction: 0.0,
            ..Default::default()
        };
        let err = Carousel::new(&entries(3), settings).unwrap_err();
        assert_eq!(err, CarouselError::Settings(SettingsError::Friction(0.0)));
    }

    #[test]
    fn test_navigation_stays_in_range() {
        for n in 1..=7 {
            let mut c = wide(n);
            let mut clock = ManualClock::new();
            for step in 0..40 {
                if step % 3 == 0 {
                    c.previous(clock.now());
                } else {
                    c.next(clock.now());
                }
                assert!(c.current_index() < n);
                if step % 5 == 0 {
                    settle(&mut c, &mut clock);
                }
            }
            settle(&mut c, &mut clock);
            assert!(c.current_index() < n);
            assert_eq!(c.drag_offset(), 0.0);
        }
    }

    #[test]
    fn test_five_nexts_return_home() {
        let mut c = wide(5);
        let mut clock = ManualClock::new();
        let initial = c.visuals();

        for expected in [1, 2, 3, 4, 0] {
            c.next(clock.now());
            settle(&mut c, &mut clock);
            assert_eq!(c.current_index(), expected);
        }
        assert_eq!(c.visuals(), initial);
        assert_eq!(c.state(), CarouselState::Idle);
    }

    #[test]
    fn test_next_animates_from_old_position() {
        let mut c = wide(5);
        let mut clock = ManualClock::new();
        c.next(clock.now());
        assert_eq!(c.current_index(), 1);
        assert_eq!(c.drag_offset(), CARD_SPACING);
        assert_eq!(c.position(), 0.0);
        assert_eq!(c.state(), CarouselState::Snapping);

        c.tick(clock.frame());
        assert!(c.drag_offset() > 0.0 && c.drag_offset() < CARD_SPACING);
        settle(&mut c, &mut clock);
        assert_eq!(c.position(), 1.0);
    }

    #[test]
    fn test_slow_drag_past_one_card_snaps_to_previous() {
        let mut c = wide(5);
        let mut clock = ManualClock::new();
        let center = Point::new(600.0, 450.0);

        c.pointer_down(center, clock.now());
        assert_eq!(c.state(), CarouselState::Dragging);
        for step in 1..=8 {
            c.pointer_move(Point::new(600.0 + 50.0 * step as f64, 450.0), clock.frame());
        }
        assert_eq!(c.drag_offset(), 400.0);

        let release = ms(&mut clock, 500);
        c.pointer_up(Point::new(1000.0, 450.0), release);
        assert_eq!(c.velocity(), 0.0);
        assert_eq!(c.current_index(), 4);

        settle(&mut c, &mut clock);
        assert_eq!(c.current_index(), 4);
        assert_eq!(c.drag_offset(), 0.0);
        assert_eq!(c.state(), CarouselState::Idle);
    }

    #[test]
    fn test_short_drag_snaps_back() {
        let mut c = wide(5);
        let mut clock = ManualClock::new();
        c.pointer_down(Point::new(600.0, 450.0), clock.now());
        c.pointer_move(Point::new(500.0, 450.0), clock.frame());
        c.pointer_up(Point::new(500.0, 450.0), ms(&mut clock, 300));
        assert_eq!(c.state(), CarouselState::Snapping);
        settle(&mut c, &mut clock);
        assert_eq!(c.current_index(), 0);
        assert!(c.drain_events().iter().all(|e| !matches!(e, CarouselEvent::ActiveChanged { .. })));
    }

    #[test]
    fn test_flick_carries_momentum_then_settles() {
        let mut c = wide(5);
        let mut clock = ManualClock::new();
        c.pointer_down(Point::new(600.0, 450.0), clock.now());
        c.pointer_move(Point::new(650.0, 450.0), clock.frame());
        c.pointer_move(Point::new(700.0, 450.0), clock.frame());
        c.pointer_up(Point::new(700.0, 450.0), ms(&mut clock, 5));

        assert!(c.velocity() > c.settings().min_velocity);
        assert_eq!(c.state(), CarouselState::Momentum);

        let before = c.drag_offset();
        c.tick(clock.frame());
        assert!(c.drag_offset() > before);

        settle(&mut c, &mut clock);
        assert_eq!(c.state(), CarouselState::Idle);
        assert_eq!(c.drag_offset(), 0.0);
        assert_eq!(c.velocity(), 0.0);
        assert_ne!(c.current_index(), 0);
        assert!(c.current_index() < 5);
    }

    #[test]
    fn test_momentum_decays_geometrically() {
        let mut c = wide(5);
        let mut clock = ManualClock::new();
        c.pointer_down(Point::new(600.0, 450.0), clock.now());
        c.pointer_move(Point::new(620.0, 450.0), clock.frame());
        c.pointer_up(Point::new(620.0, 450.0), clock.now());

        let v0 = c.velocity();
        c.tick(clock.frame());
        assert!((c.velocity() - v0 * 0.94).abs() < 1e-9);
    }

    #[test]
    fn test_pointer_down_catches_momentum() {
        let mut c = wide(5);
        let mut clock = ManualClock::new();
        c.pointer_down(Point::new(600.0, 450.0), clock.now());
        c.pointer_move(Point::new(700.0, 450.0), clock.frame());
        c.pointer_up(Point::new(700.0, 450.0), clock.now());
        c.tick(clock.frame());
        assert_eq!(c.state(), CarouselState::Momentum);

        let offset = c.drag_offset();
        c.pointer_down(Point::new(100.0, 450.0), clock.frame());
        assert_eq!(c.state(), CarouselState::Dragging);
        assert!(!c.is_animating());
        assert_eq!(c.drag_offset(), offset);
    }

    #[test]
    fn test_halfway_tie_picks_lower_index() {
        let mut c = wide(5);
        c.drag_offset = CARD_SPACING / 2.0;
        assert_eq!(c.nearest_index(), 0);
        c.drag_offset = -CARD_SPACING / 2.0;
        assert_eq!(c.nearest_index(), 0);

        c.current_index = 2;
        c.drag_offset = -CARD_SPACING / 2.0;
        assert_eq!(c.nearest_index(), 2);
        c.drag_offset = CARD_SPACING * 0.49;
        assert_eq!(c.nearest_index(), 2);
        c.drag_offset = CARD_SPACING * 0.51;
        assert_eq!(c.nearest_index(), 1);
    }

    #[test]
    fn test_tap_on_side_card_navigates() {
        let mut c = wide(5);
        let mut clock = ManualClock::new();
        let side = Point::new(980.0, 450.0);
        assert_eq!(c.hit_test(side), Some(1));

        c.pointer_down(side, clock.now());
        assert_eq!(c.state(), CarouselState::Idle);
        c.pointer_up(Point::new(982.0, 451.0), ms(&mut clock, 80));
        assert_eq!(c.current_index(), 1);
        settle(&mut c, &mut clock);
        assert!(c.drain_events().contains(&CarouselEvent::ActiveChanged { index: 1 }));
    }

    #[test]
    fn test_hover_is_reported_through_events() {
        let mut c = wide(3);
        c.pointer_move(Point::new(600.0, 450.0), Duration::ZERO);
        c.pointer_move(Point::new(610.0, 450.0), Duration::ZERO);
        c.pointer_leave();
        assert_eq!(
            c.drain_events(),
            vec![
                CarouselEvent::HoverChanged { hovering: true },
                CarouselEvent::HoverChanged { hovering: false },
            ]
        );
    }

    #[test]
    fn test_wheel_zoom_is_clamped_and_recenters() {
        let mut c = tight();
        let mut clock = ManualClock::new();
        let p = Point::new(100.0, 100.0);

        for _ in 0..20 {
            c.wheel(p, -1.0, clock.frame());
            assert!(c.zoom().scale() <= 4.0);
        }
        assert_eq!(c.zoom().scale(), 4.0);
        assert_eq!(c.state(), CarouselState::Zoomed);

        for _ in 0..30 {
            c.wheel(p, 1.0, clock.frame());
            assert!(c.zoom().scale() >= 1.0);
        }
        assert_eq!(c.zoom().scale(), 1.0);
        assert_eq!(c.zoom().pan(), Point::ZERO);
        assert_eq!(c.state(), CarouselState::Idle);
    }

    #[test]
    fn test_wheel_outside_active_card_is_ignored() {
        let mut c = wide(5);
        assert!(!c.wheel(Point::new(5.0, 5.0), -1.0, Duration::ZERO));
        assert!(!c.is_zoomed());
    }

    #[test]
    fn test_pinch_focal_zoom_and_full_zoom_out() {
        let mut c = tight();
        let mut clock = ManualClock::new();
        let origin = c.image_rect().origin;
        let focal = origin + Point::new(50.0, 50.0);

        c.pinch_begin(focal, 100.0, clock.now());
        assert_eq!(c.state(), CarouselState::Pinching);
        c.pinch_update(focal, 200.0);
        assert_eq!(c.zoom().scale(), 2.0);
        assert!((c.zoom().pan().x - 110.0).abs() < 1e-9);
        assert!((c.zoom().pan().y - 160.0).abs() < 1e-9);

        c.pinch_update(focal, 1_000.0);
        assert_eq!(c.zoom().scale(), 4.0);

        c.pinch_update(focal, 10.0);
        assert_eq!(c.zoom().scale(), 1.0);
        assert_eq!(c.zoom().pan(), Point::ZERO);

        c.pinch_end(clock.frame());
        assert_eq!(c.state(), CarouselState::Idle);
    }

    #[test]
    fn test_pinch_during_momentum_glides_strip_home() {
        let mut c = wide(5);
        let mut clock = ManualClock::new();
        c.pointer_down(Point::new(600.0, 450.0), clock.now());
        c.pointer_move(Point::new(650.0, 450.0), clock.frame());
        c.pointer_move(Point::new(700.0, 450.0), clock.frame());
        c.pointer_up(Point::new(700.0, 450.0), ms(&mut clock, 5));
        assert_eq!(c.state(), CarouselState::Momentum);

        let before = c.drag_offset();
        c.pinch_begin(c.viewport().center(), 100.0, clock.now());
        assert_eq!(c.state(), CarouselState::Pinching);
        assert!((c.drag_offset() - before).abs() < 1e-9);

        settle(&mut c, &mut clock);
        assert_eq!(c.drag_offset(), 0.0);
        assert_eq!(c.current_index(), 0);
        assert!(c.is_pinching());

        c.pinch_end(clock.now());
        assert_eq!(c.state(), CarouselState::Idle);
    }

    #[test]
    fn test_pinch_end_while_zoomed_stays_zoomed() {
        let mut c = tight();
        let center = c.viewport().center();
        c.pinch_begin(center, 100.0, Duration::ZERO);
        c.pinch_update(center, 250.0);
        c.pinch_end(Duration::ZERO);
        assert_eq!(c.state(), CarouselState::Zoomed);
        assert_eq!(c.zoom().scale(), 2.5);
    }

    #[test]
    fn test_double_tap_toggles_zoom() {
        let mut c = tight();
        let mut clock = ManualClock::new();
        let center = c.viewport().center();

        c.pointer_down(center, clock.now());
        c.pointer_up(center, ms(&mut clock, 40));
        c.pointer_down(center, ms(&mut clock, 120));
        assert_eq!(c.zoom().scale(), 2.0);
        assert_eq!(c.zoom().pan(), Point::ZERO);
        c.pointer_up(center, ms(&mut clock, 40));
        assert_eq!(c.state(), CarouselState::Zoomed);

        assert!(c.key(Key::Escape, clock.now()));
        assert_eq!(c.state(), CarouselState::Idle);
        assert!(!c.key(Key::Escape, clock.now()));
    }

    #[test]
    fn test_slow_taps_do_not_zoom() {
        let mut c = tight();
        let mut clock = ManualClock::new();
        let center = c.viewport().center();
        c.pointer_down(center, clock.now());
        c.pointer_up(center, ms(&mut clock, 40));
        c.pointer_down(center, ms(&mut clock, 600));
        assert!(!c.is_zoomed());
    }

    fn zoom_in_twice(c: &mut Carousel, clock: &mut ManualClock) {
        let center = c.viewport().center();
        c.pointer_down(center, clock.now());
        c.pointer_up(center, ms(clock, 40));
        c.pointer_down(center, ms(clock, 100));
        c.pointer_up(center, ms(clock, 40));
        assert_eq!(c.zoom().scale(), 2.0);
        ms(clock, 1_000);
    }

    #[test]
    fn test_pan_rubber_bands_and_springs_back() {
        let mut c = tight();
        let mut clock = ManualClock::new();
        zoom_in_twice(&mut c, &mut clock);
        let max = c.zoom().max_pan();
        assert_eq!(max, Point::new(240.0, 680.0));

        let start = c.viewport().center();
        c.pointer_down(start, clock.now());
        assert_eq!(c.state(), CarouselState::Dragging);
        c.pointer_move(start + Point::new(500.0, 0.0), clock.frame());
        assert!((c.zoom().pan().x - (240.0 + 260.0 * 0.3)).abs() < 1e-9);
        assert_eq!(c.current_index(), 0);
        assert_eq!(c.drag_offset(), 0.0);

        c.pointer_up(start + Point::new(500.0, 0.0), clock.frame());
        assert!(c.is_animating());
        assert_eq!(c.state(), CarouselState::Zoomed);
        settle(&mut c, &mut clock);
        assert_eq!(c.zoom().pan(), Point::new(240.0, 0.0));
        assert!(c.zoom().is_within_bounds());
    }

    #[test]
    fn test_new_drag_cancels_spring_back() {
        let mut c = tight();
        let mut clock = ManualClock::new();
        zoom_in_twice(&mut c, &mut clock);

        let start = c.viewport().center();
        c.pointer_down(start, clock.now());
        c.pointer_move(start + Point::new(0.0, -2_000.0), clock.frame());
        c.pointer_up(start + Point::new(0.0, -2_000.0), clock.frame());
        assert!(c.is_animating());
        c.tick(clock.frame());

        let pan = c.zoom().pan();
        c.pointer_down(start, clock.frame());
        assert!(!c.is_animating());
        assert_eq!(c.zoom().pan(), pan);

        c.pointer_up(start, clock.frame());
        settle(&mut c, &mut clock);
        assert!(c.zoom().is_within_bounds());
    }

    #[test]
    fn test_navigation_resets_zoom() {
        let mut c = tight();
        let mut clock = ManualClock::new();
        zoom_in_twice(&mut c, &mut clock);
        assert!(c.key(Key::ArrowRight, clock.now()));
        assert!(!c.is_zoomed());
        assert_eq!(c.current_index(), 1);
    }

    #[test]
    fn test_navigation_ignored_mid_drag() {
        let mut c = wide(5);
        c.pointer_down(Point::new(600.0, 450.0), Duration::ZERO);
        c.next(Duration::ZERO);
        assert_eq!(c.current_index(), 0);
        assert_eq!(c.state(), CarouselState::Dragging);
    }

    #[test]
    fn test_remote_commands() {
        let mut c = wide(4);
        c.apply(RemoteCommand::Goto(3), Duration::ZERO).unwrap();
        assert_eq!(c.current_index(), 3);
        c.apply(RemoteCommand::Next, Duration::ZERO).unwrap();
        assert_eq!(c.current_index(), 0);
        assert_eq!(
            c.apply(RemoteCommand::Goto(9), Duration::ZERO),
            Err(GalleryError::OutOfRange { index: 9, count: 4 })
        );
    }

    #[test]
    fn test_effects_disabled_skips_animation() {
        let mut c = wide(5);
        c.set_effects_enabled(false);
        c.next(Duration::ZERO);
        assert_eq!(c.current_index(), 1);
        assert_eq!(c.drag_offset(), 0.0);
        assert!(!c.is_animating());
    }

    #[test]
    fn test_disabling_effects_finishes_running_snap() {
        let mut c = wide(5);
        let mut clock = ManualClock::new();
        c.next(clock.now());
        c.tick(clock.frame());
        assert!(c.is_animating());
        c.set_effects_enabled(false);
        assert!(!c.is_animating());
        assert_eq!(c.current_index(), 1);
        assert_eq!(c.drag_offset(), 0.0);
    }

    #[test]
    fn test_state_changes_are_published() {
        let mut c = wide(5);
        let mut clock = ManualClock::new();
        c.next(clock.now());
        settle(&mut c, &mut clock);
        let states: Vec<_> = c
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                CarouselEvent::StateChanged { to, .. } => Some(to),
                _ => None,
            })
            .collect();
        assert_eq!(states, vec![CarouselState::Snapping, CarouselState::Idle]);
    }

    #[test]
    fn test_single_card_ring() {
        let mut c = wide(1);
        let mut clock = ManualClock::new();
        c.next(clock.now());
        assert_eq!(c.current_index(), 0);
        assert!(!c.is_animating());
        c.pointer_down(Point::new(600.0, 450.0), clock.now());
        c.pointer_move(Point::new(900.0, 450.0), clock.frame());
        c.pointer_up(Point::new(900.0, 450.0), ms(&mut clock, 400));
        settle(&mut c, &mut clock);
        assert_eq!(c.current_index(), 0);
        assert_eq!(c.drag_offset(), 0.0);
    }
}
