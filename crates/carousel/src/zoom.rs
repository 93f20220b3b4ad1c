//! Focal zoom and pan of the active card's image.
//!
//! Coordinates handed to this module are relative to the image's unscaled
//! layout box (top-left origin). Pan is applied around the image center.

use crate::easing::{Easing, Tween};
use crate::geometry::{Point, Size};
use crate::settings::CarouselSettings;
use std::time::Duration;

const SCALE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub min_scale: f64,
    pub max_scale: f64,
    pub generosity_x: f64,
    pub generosity_y: f64,
    pub elastic_ratio: f64,
    pub spring_back: Duration,
}

impl From<&CarouselSettings> for ZoomLimits {
    fn from(s: &CarouselSettings) -> Self {
        Self {
            min_scale: s.min_scale,
            max_scale: s.max_scale,
            generosity_x: s.pan_generosity_x,
            generosity_y: s.pan_generosity_y,
            elastic_ratio: s.elastic_ratio,
            spring_back: s.spring_back(),
        }
    }
}

/// New pan that keeps the image point under `focal` fixed when the scale
/// changes by `ratio`.
pub fn focal_pan(focal: Point, center: Point, pan: Point, ratio: f64) -> Point {
    let anchor = focal - center;
    anchor - (anchor - pan) * ratio
}

/// Compresses the part of `value` beyond `±bound` by `ratio`.
pub fn elastic(value: f64, bound: f64, ratio: f64) -> f64 {
    if value > bound {
        bound + (value - bound) * ratio
    } else if value < -bound {
        -bound + (value + bound) * ratio
    } else {
        value
    }
}

/// Inverse of [`elastic`]: the raw drag value that displays as `value`.
pub fn unelastic(value: f64, bound: f64, ratio: f64) -> f64 {
    if value > bound {
        bound + (value - bound) / ratio
    } else if value < -bound {
        -bound + (value + bound) / ratio
    } else {
        value
    }
}

#[derive(Debug, Clone)]
pub struct ZoomModel {
    scale: f64,
    pan: Point,
    image: Size,
    viewport: Size,
    limits: ZoomLimits,
    spring: Option<Tween<Point>>,
}

impl ZoomModel {
    pub fn new(limits: ZoomLimits) -> Self {
        Self {
            scale: limits.min_scale,
            pan: Point::ZERO,
            image: Size::default(),
            viewport: Size::default(),
            limits,
            spring: None,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn image(&self) -> Size {
        self.image
    }

    pub fn limits(&self) -> &ZoomLimits {
        &self.limits
    }

    pub fn is_zoomed(&self) -> bool {
        self.scale > self.limits.min_scale + SCALE_EPSILON
    }

    pub fn is_springing(&self) -> bool {
        self.spring.is_some()
    }

    /// Updates the image layout box and the viewport the pan bound is measured
    /// against.
    pub fn set_frame(&mut self, image: Size, viewport: Size) {
        self.image = image;
        self.viewport = viewport;
        if self.spring.is_none() {
            self.pan = self.clamp(self.pan);
        }
    }

    pub fn set_limits(&mut self, limits: ZoomLimits) {
        self.limits = limits;
        self.scale = self.scale.clamp(limits.min_scale, limits.max_scale);
        if !self.is_zoomed() {
            self.reset();
        }
    }

    /// Hard pan bound per axis at the current scale.
    pub fn max_pan(&self) -> Point {
        let scaled = self.image.scaled(self.scale);
        Point::new(
            ((scaled.width - self.viewport.width) / 2.0).max(0.0) * self.limits.generosity_x,
            ((scaled.height - self.viewport.height) / 2.0).max(0.0) * self.limits.generosity_y,
        )
    }

    pub fn clamp(&self, pan: Point) -> Point {
        let max = self.max_pan();
        Point::new(pan.x.clamp(-max.x, max.x), pan.y.clamp(-max.y, max.y))
    }

    pub fn is_within_bounds(&self) -> bool {
        self.clamp(self.pan) == self.pan
    }

    /// Zooms to `target` keeping the image point under `focal` in place.
    /// Returns whether the scale changed.
    pub fn zoom_to(&mut self, target: f64, focal: Point) -> bool {
        let ZoomLimits {
            min_scale,
            max_scale,
            ..
        } = self.limits;
        let target = target.clamp(min_scale, max_scale);
        if (target - self.scale).abs() < SCALE_EPSILON {
            return false;
        }

        self.spring = None;
        let ratio = target / self.scale;
        let mut pan = focal_pan(focal, self.image.center(), self.pan, ratio);
        if target < self.scale {
            let pull = (max_scale - target) / (max_scale - min_scale);
            pan = pan * (1.0 - pull);
        }
        self.scale = target;

        if self.is_zoomed() {
            self.pan = self.clamp(pan);
        } else {
            self.reset();
        }
        true
    }

    pub fn zoom_by(&mut self, factor: f64, focal: Point) -> bool {
        self.zoom_to(self.scale * factor, focal)
    }

    pub fn reset(&mut self) {
        self.scale = self.limits.min_scale;
        self.pan = Point::ZERO;
        self.spring = None;
    }

    /// Raw (pre-elastic) pan that displays as the current pan.
    pub fn raw_pan(&self) -> Point {
        let max = self.max_pan();
        let r = self.limits.elastic_ratio;
        Point::new(
            unelastic(self.pan.x, max.x, r),
            unelastic(self.pan.y, max.y, r),
        )
    }

    /// Sets the pan from a raw drag value, rubber-banding past the bound.
    pub fn drag_pan(&mut self, raw: Point) {
        self.spring = None;
        let max = self.max_pan();
        let r = self.limits.elastic_ratio;
        self.pan = Point::new(elastic(raw.x, max.x, r), elastic(raw.y, max.y, r));
    }

    /// Starts the spring-back if the pan sits in the elastic zone. Returns
    /// whether an animation is needed.
    pub fn release(&mut self, now: Duration, animate: bool) -> bool {
        let target = self.clamp(self.pan);
        if target == self.pan {
            self.spring = None;
            return false;
        }
        if !animate {
            self.pan = target;
            self.spring = None;
            return false;
        }
        self.spring = Some(Tween::new(
            self.pan,
            target,
            now,
            self.limits.spring_back,
            Easing::EaseOutCubic,
        ));
        true
    }

    pub fn cancel_spring(&mut self) {
        self.spring = None;
    }

    /// Advances the spring-back. Returns whether it is still running.
    pub fn tick(&mut self, now: Duration) -> bool {
        let Some(spring) = self.spring else {
            return false;
        };
        let (pan, done) = spring.sample(now);
        self.pan = pan;
        if done {
            self.spring = None;
        }
        !done
    }
}
