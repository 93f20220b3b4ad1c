use crate::easing::Easing;
use crate::geometry::Size;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 4.0;
pub const FRICTION: f64 = 0.94;
pub const MIN_VELOCITY: f64 = 0.3;
pub const ELASTIC_RATIO: f64 = 0.3;
pub const WHEEL_ZOOM_STEP: f64 = 0.15;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CarouselSettings {
    pub friction: f64,
    pub min_velocity: f64,
    pub snap_duration_ms: u64,
    pub snap_easing: Easing,
    pub spring_back_ms: u64,
    pub elastic_ratio: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    pub wheel_zoom_step: f64,
    pub double_tap_scale: f64,
    pub double_tap_ms: u64,
    pub tap_slop: f64,
    pub pan_generosity_x: f64,
    pub pan_generosity_y: f64,
    pub card_width: f64,
    pub card_height: f64,
}

impl Default for CarouselSettings {
    fn default() -> Self {
        Self {
            friction: FRICTION,
            min_velocity: MIN_VELOCITY,
            snap_duration_ms: 300,
            snap_easing: Easing::EaseOutCubic,
            spring_back_ms: 400,
            elastic_ratio: ELASTIC_RATIO,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            wheel_zoom_step: WHEEL_ZOOM_STEP,
            double_tap_scale: 2.0,
            double_tap_ms: 300,
            tap_slop: 8.0,
            pan_generosity_x: 2.0,
            pan_generosity_y: 4.0,
            card_width: 320.0,
            card_height: 420.0,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("friction must be in (0, 1), got {0}")]
    Friction(f64),
    #[error("min_scale ({min}) must be positive and below max_scale ({max})")]
    ScaleRange { min: f64, max: f64 },
    #[error("{0} must be positive")]
    NotPositive(&'static str),
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
}

impl CarouselSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let floats = [
            ("friction", self.friction),
            ("min_velocity", self.min_velocity),
            ("elastic_ratio", self.elastic_ratio),
            ("min_scale", self.min_scale),
            ("max_scale", self.max_scale),
            ("wheel_zoom_step", self.wheel_zoom_step),
            ("double_tap_scale", self.double_tap_scale),
            ("tap_slop", self.tap_slop),
            ("pan_generosity_x", self.pan_generosity_x),
            ("pan_generosity_y", self.pan_generosity_y),
            ("card_width", self.card_width),
            ("card_height", self.card_height),
        ];
        if let Some((name, _)) = floats.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SettingsError::NotFinite(*name));
        }

        if !(self.friction > 0.0 && self.friction < 1.0) {
            return Err(SettingsError::Friction(self.friction));
        }
        if !(self.min_scale > 0.0 && self.min_scale < self.max_scale) {
            return Err(SettingsError::ScaleRange {
                min: self.min_scale,
                max: self.max_scale,
            });
        }
        let positive = [
            ("min_velocity", self.min_velocity),
            ("elastic_ratio", self.elastic_ratio),
            ("wheel_zoom_step", self.wheel_zoom_step),
            ("double_tap_scale", self.double_tap_scale),
            ("tap_slop", self.tap_slop),
            ("pan_generosity_x", self.pan_generosity_x),
            ("pan_generosity_y", self.pan_generosity_y),
            ("card_width", self.card_width),
            ("card_height", self.card_height),
            ("snap_duration_ms", self.snap_duration_ms as f64),
            ("spring_back_ms", self.spring_back_ms as f64),
            ("double_tap_ms", self.double_tap_ms as f64),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v <= 0.0) {
            return Err(SettingsError::NotPositive(*name));
        }
        Ok(())
    }

    pub fn card_size(&self) -> Size {
        Size::new(self.card_width, self.card_height)
    }

    pub fn snap_duration(&self) -> Duration {
        Duration::from_millis(self.snap_duration_ms)
    }

    pub fn spring_back(&self) -> Duration {
        Duration::from_millis(self.spring_back_ms)
    }

    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.double_tap_ms)
    }
}
