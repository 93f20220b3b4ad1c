//! Maps a card's signed circular distance from the active slot to how it is
//! drawn. Used for both the settled strip and every frame of a drag.

use crate::easing::lerp;
use crate::geometry::circular_distance;
use strum::Display as StrumDisplay;

/// Pixels per card step inside the first two bands. A drag of this length
/// moves the strip by exactly one card.
pub const CARD_SPACING: f64 = 380.0;
pub const FAR_SPACING: f64 = 500.0;
pub const HIDDEN_SPACING: f64 = 600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
    Active,
    Side,
    Far,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardVisual {
    pub translate_x: f64,
    pub scale: f64,
    pub blur: f64,
    pub brightness: f64,
    pub opacity: f64,
    pub z_index: i32,
    pub tier: Tier,
}

impl CardVisual {
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }
}

struct Band {
    start: f64,
    end: f64,
    spacing: f64,
    scale: (f64, f64),
    blur: (f64, f64),
    brightness: (f64, f64),
    opacity: (f64, f64),
    z_index: i32,
    tier: Tier,
}

const BANDS: [Band; 3] = [
    Band {
        start: 0.0,
        end: 0.5,
        spacing: CARD_SPACING,
        scale: (1.0, 0.75),
        blur: (0.0, 2.0),
        brightness: (1.0, 0.8),
        opacity: (1.0, 0.7),
        z_index: 100,
        tier: Tier::Active,
    },
    Band {
        start: 0.5,
        end: 1.5,
        spacing: CARD_SPACING,
        scale: (0.75, 0.5),
        blur: (2.0, 6.0),
        brightness: (0.8, 0.6),
        opacity: (0.7, 0.4),
        z_index: 50,
        tier: Tier::Side,
    },
    Band {
        start: 1.5,
        end: 2.5,
        spacing: FAR_SPACING,
        scale: (0.5, 0.3),
        blur: (6.0, 10.0),
        brightness: (0.6, 0.5),
        opacity: (0.4, 0.0),
        z_index: 30,
        tier: Tier::Far,
    },
];

const HIDDEN: CardVisual = CardVisual {
    translate_x: 0.0,
    scale: 0.3,
    blur: 10.0,
    brightness: 0.5,
    opacity: 0.0,
    z_index: 1,
    tier: Tier::Hidden,
};

/// Visual for a card sitting `distance` slots away from the active one.
/// Everything but the translation depends only on `|distance|`.
pub fn card_visual(distance: f64) -> CardVisual {
    let d = distance.abs();
    let sign = if distance < 0.0 { -1.0 } else { 1.0 };

    let Some(band) = BANDS.iter().find(|b| d >= b.start && d < b.end) else {
        return CardVisual {
            translate_x: sign * d * HIDDEN_SPACING,
            ..HIDDEN
        };
    };

    let t = (d - band.start) / (band.end - band.start);
    CardVisual {
        translate_x: sign * d * band.spacing,
        scale: lerp(band.scale.0, band.scale.1, t),
        blur: lerp(band.blur.0, band.blur.1, t),
        brightness: lerp(band.brightness.0, band.brightness.1, t),
        opacity: lerp(band.opacity.0, band.opacity.1, t),
        z_index: band.z_index,
        tier: band.tier,
    }
}

/// Visuals for every card on a ring of `count`, with the strip centered on
/// the fractional `position`.
pub fn layout(count: usize, position: f64) -> Vec<CardVisual> {
    (0..count)
        .map(|i| card_visual(circular_distance(i as f64, position, count)))
        .collect()
}
