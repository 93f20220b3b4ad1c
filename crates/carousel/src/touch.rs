//! Routes raw touch points onto the carousel: one finger drives the pointer
//! path, a second finger turns the gesture into a pinch.

use crate::controller::Carousel;
use crate::geometry::Point;
use std::time::Duration;

pub type TouchId = u64;

/// Returns `(midpoint, distance)` for a pair of contact points.
pub fn two_finger_geometry(a: Point, b: Point) -> (Point, f64) {
    (a.midpoint(b), a.distance(b))
}

#[derive(Debug, Default)]
pub struct TouchRouter {
    touches: Vec<(TouchId, Point)>,
}

impl TouchRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> usize {
        self.touches.len()
    }

    fn pair(&self) -> Option<(Point, f64)> {
        match self.touches.as_slice() {
            [(_, a), (_, b), ..] => Some(two_finger_geometry(*a, *b)),
            _ => None,
        }
    }

    pub fn start(&mut self, carousel: &mut Carousel, id: TouchId, point: Point, now: Duration) {
        if self.touches.iter().any(|(t, _)| *t == id) {
            return;
        }
        self.touches.push((id, point));

        match self.touches.len() {
            1 => carousel.pointer_down(point, now),
            2 => {
                if let Some((center, distance)) = self.pair() {
                    carousel.pinch_begin(center, distance, now);
                }
            }
            _ => {}
        }
    }

    pub fn update(&mut self, carousel: &mut Carousel, id: TouchId, point: Point, now: Duration) {
        let Some(slot) = self.touches.iter_mut().find(|(t, _)| *t == id) else {
            return;
        };
        slot.1 = point;

        if carousel.is_pinching() {
            if let Some((center, distance)) = self.pair() {
                carousel.pinch_update(center, distance);
            }
        } else if self.touches.first().is_some_and(|(t, _)| *t == id) {
            carousel.pointer_move(point, now);
        }
    }

    pub fn end(&mut self, carousel: &mut Carousel, id: TouchId, now: Duration) {
        let Some(pos) = self.touches.iter().position(|(t, _)| *t == id) else {
            return;
        };
        let (_, point) = self.touches.remove(pos);

        if carousel.is_pinching() {
            if self.touches.len() == 1 {
                carousel.pinch_end(now);
            }
        } else if self.touches.is_empty() {
            carousel.pointer_up(point, now);
        } else if pos == 0 {
            // the finger driving the pointer lifted; the next one takes over
            let (_, next) = self.touches[0];
            carousel.pointer_handoff(next, now);
        }
    }

    /// Drops every contact, e.g. when the host cancels the touch sequence.
    pub fn cancel(&mut self, carousel: &mut Carousel, now: Duration) {
        let driver = self.touches.first().map(|(_, p)| *p);
        self.touches.clear();
        if carousel.is_pinching() {
            carousel.pinch_end(now);
        } else if let Some(point) = driver {
            carousel.pointer_up(point, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CarouselState;
    use crate::gallery::ImageEntry;
    use crate::geometry::Size;
    use crate::scheduler::{ManualClock, TickSource, run_until_idle};
    use crate::settings::CarouselSettings;

    fn carousel() -> Carousel {
        let entries: Vec<_> = (0..5).map(|i| ImageEntry::new(format!("{i}"), "")).collect();
        let mut c = Carousel::new(&entries, CarouselSettings::default()).unwrap();
        c.set_viewport(Size::new(400.0, 500.0));
        c
    }

    #[test]
    fn test_two_finger_geometry() {
        let (mid, dist) = two_finger_geometry(Point::new(0.0, 0.0), Point::new(6.0, 8.0));
        assert_eq!(mid, Point::new(3.0, 4.0));
        assert_eq!(dist, 10.0);
    }

    #[test]
    fn test_second_finger_turns_swipe_into_pinch() {
        let mut c = carousel();
        let mut clock = ManualClock::new();
        let mut touches = TouchRouter::new();
        let t = clock.now();

        touches.start(&mut c, 1, Point::new(180.0, 250.0), t);
        assert_eq!(c.state(), CarouselState::Dragging);
        touches.update(&mut c, 1, Point::new(170.0, 250.0), t);

        touches.start(&mut c, 2, Point::new(220.0, 250.0), t);
        assert_eq!(c.state(), CarouselState::Pinching);
        assert!((c.drag_offset() + 10.0).abs() < 1e-9);

        run_until_idle(&mut c, &mut clock, 2_000);
        assert_eq!(c.drag_offset(), 0.0);
        assert!(c.is_pinching());

        touches.update(&mut c, 2, Point::new(270.0, 250.0), clock.now());
        assert!((c.zoom().scale() - 2.0).abs() < 1e-9);

        touches.end(&mut c, 2, clock.now());
        assert_eq!(c.state(), CarouselState::Zoomed);
        touches.end(&mut c, 1, clock.now());
        assert_eq!(touches.active(), 0);
        assert!(c.is_zoomed());
    }

    #[test]
    fn test_single_finger_swipe() {
        let mut c = carousel();
        let mut touches = TouchRouter::new();
        touches.start(&mut c, 7, Point::new(200.0, 250.0), Duration::ZERO);
        touches.update(&mut c, 7, Point::new(120.0, 250.0), Duration::from_millis(16));
        assert_eq!(c.drag_offset(), -80.0);
        touches.end(&mut c, 7, Duration::from_millis(400));
        assert_eq!(c.state(), CarouselState::Snapping);
    }

    #[test]
    fn test_lifting_first_finger_after_refused_pinch_hands_swipe_over() {
        let mut c = carousel();
        let mut clock = ManualClock::new();
        let mut touches = TouchRouter::new();

        touches.start(&mut c, 1, Point::new(180.0, 250.0), clock.now());
        // midpoint lands beside the active card, so no pinch
        touches.start(&mut c, 2, Point::new(700.0, 250.0), clock.now());
        assert_eq!(c.state(), CarouselState::Dragging);

        touches.end(&mut c, 1, clock.frame());
        assert_eq!(touches.active(), 1);
        assert_eq!(c.state(), CarouselState::Dragging);

        touches.update(&mut c, 2, Point::new(702.0, 250.0), clock.frame());
        assert_eq!(c.drag_offset(), 2.0);

        touches.end(&mut c, 2, clock.advance(Duration::from_millis(200)));
        run_until_idle(&mut c, &mut clock, 2_000);
        assert_eq!(c.current_index(), 0);
        assert_eq!(c.drag_offset(), 0.0);
    }

    #[test]
    fn test_second_finger_moves_do_not_drive_swipe() {
        let mut c = carousel();
        let mut touches = TouchRouter::new();
        let t = Duration::ZERO;

        touches.start(&mut c, 1, Point::new(180.0, 250.0), t);
        touches.start(&mut c, 2, Point::new(700.0, 250.0), t);
        touches.update(&mut c, 2, Point::new(400.0, 250.0), t);
        assert_eq!(c.drag_offset(), 0.0);

        touches.update(&mut c, 1, Point::new(160.0, 250.0), t);
        assert_eq!(c.drag_offset(), -20.0);
    }

    #[test]
    fn test_cancel_after_refused_pinch_ends_swipe() {
        let mut c = carousel();
        let mut touches = TouchRouter::new();
        touches.start(&mut c, 1, Point::new(180.0, 250.0), Duration::ZERO);
        touches.start(&mut c, 2, Point::new(700.0, 250.0), Duration::ZERO);
        touches.cancel(&mut c, Duration::ZERO);
        assert!(!c.is_dragging());
    }

    #[test]
    fn test_cancel_releases_pinch() {
        let mut c = carousel();
        let mut touches = TouchRouter::new();
        touches.start(&mut c, 1, Point::new(180.0, 250.0), Duration::ZERO);
        touches.start(&mut c, 2, Point::new(220.0, 250.0), Duration::ZERO);
        touches.cancel(&mut c, Duration::ZERO);
        assert_eq!(touches.active(), 0);
        assert!(!c.is_pinching());
    }
}
