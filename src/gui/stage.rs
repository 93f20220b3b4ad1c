use crate::config::Config;
use crate::gui::theme::ThemeColors;
use cairo::Context;
use carousel::{
    Card, CardVisual, Carousel, CarouselError, ImageSource, MonotonicClock, Point, Rect, Size,
    TickSource, TouchId, TouchRouter,
};
use gdk_pixbuf::{InterpType, Pixbuf};
use gdk4::prelude::*;
use palette::Srgba;
use std::f64::consts::PI;
use std::path::PathBuf;
use std::time::Duration;

/// Height of the stage in layout units. The window is scaled to fit it.
pub const REFERENCE_HEIGHT: f64 = 900.0;
/// Longest edge images are decoded at.
pub const MAX_DECODE_SIZE: i32 = 2048;
pub const CORNER_RADIUS: f64 = 18.0;
/// Blur radius each pre-scaled copy stands in for, with its linear downscale.
/// Cards pick the copy nearest their blur.
const BLUR_LEVELS: [(f64, i32); 3] = [(2.0, 4), (6.0, 8), (10.0, 16)];
const MIN_BLUR: f64 = 0.5;
const CAPTION_SIZE: f64 = 22.0;
const CAPTION_GAP: f64 = 36.0;

pub fn stage_scale(height: f64) -> f64 {
    if height > 0.0 {
        height / REFERENCE_HEIGHT
    } else {
        1.0
    }
}

/// Filesystem path for a source, if it names a local file.
pub fn local_path(src: &ImageSource) -> Option<PathBuf> {
    let s = src.as_str();
    match s.split_once("://") {
        Some(("file", rest)) => Some(PathBuf::from(rest)),
        Some(_) => None,
        None if s.is_empty() => None,
        None => Some(PathBuf::from(s)),
    }
}

/// Index into `BLUR_LEVELS` for a card drawn with `blur`, or `None` when the
/// sharp image should be used.
fn blur_level(blur: f64) -> Option<usize> {
    if blur <= MIN_BLUR {
        return None;
    }
    BLUR_LEVELS
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (a.0 - blur).abs().total_cmp(&(b.0 - blur).abs()))
        .map(|(i, _)| i)
}

struct CardImage {
    full: Pixbuf,
    blurred: Vec<Option<Pixbuf>>,
}

impl CardImage {
    fn load(src: &ImageSource) -> Option<Self> {
        let Some(path) = local_path(src) else {
            log::warn!("Unsupported image source '{}'", src);
            return None;
        };
        match Pixbuf::from_file_at_scale(&path, MAX_DECODE_SIZE, MAX_DECODE_SIZE, true) {
            Ok(full) => {
                let blurred = BLUR_LEVELS
                    .iter()
                    .map(|(_, downscale)| {
                        full.scale_simple(
                            (full.width() / downscale).max(1),
                            (full.height() / downscale).max(1),
                            InterpType::Bilinear,
                        )
                    })
                    .collect();
                Some(Self { full, blurred })
            }
            Err(e) => {
                log::warn!("Failed to load image '{}': {}", path.display(), e);
                None
            }
        }
    }

    fn size(&self) -> Size {
        Size::new(self.full.width() as f64, self.full.height() as f64)
    }

    fn pick(&self, blur: f64) -> &Pixbuf {
        blur_level(blur)
            .and_then(|level| self.blurred.get(level))
            .and_then(Option::as_ref)
            .unwrap_or(&self.full)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Begin,
    Update,
    End,
    Cancel,
}

/// The carousel plus everything needed to put it on screen.
pub struct Stage {
    carousel: Carousel,
    clock: MonotonicClock,
    touches: TouchRouter,
    images: Vec<Option<CardImage>>,
    scale: f64,
}

impl Stage {
    pub fn new(config: &Config, effects: bool) -> Result<Self, CarouselError> {
        let mut carousel = Carousel::new(&config.images, config.carousel.clone())?;
        carousel.set_effects_enabled(effects);

        let images = Self::load_images(&mut carousel);
        Ok(Self {
            carousel,
            clock: MonotonicClock::new(),
            touches: TouchRouter::new(),
            images,
            scale: 1.0,
        })
    }

    fn load_images(carousel: &mut Carousel) -> Vec<Option<CardImage>> {
        let images: Vec<_> = carousel
            .cards()
            .iter()
            .map(|card| CardImage::load(&card.entry.src))
            .collect();
        for (i, image) in images.iter().enumerate() {
            if let Some(image) = image {
                carousel.set_natural_size(i, image.size());
            }
        }
        images
    }

    /// Applies a reloaded config. Settings changes keep the current card; a
    /// different image list starts over.
    pub fn apply_config(&mut self, config: &Config) -> Result<(), CarouselError> {
        let same_images = self.carousel.len() == config.images.len()
            && self
                .carousel
                .cards()
                .iter()
                .zip(&config.images)
                .all(|(card, entry)| &card.entry == entry);

        if same_images {
            self.carousel.set_settings(config.carousel.clone())?;
            return Ok(());
        }

        let viewport = self.carousel.viewport();
        let effects = self.carousel.effects_enabled();
        let mut carousel = Carousel::new(&config.images, config.carousel.clone())?;
        carousel.set_viewport(viewport);
        carousel.set_effects_enabled(effects);
        self.images = Self::load_images(&mut carousel);
        self.carousel = carousel;
        self.touches = TouchRouter::new();
        Ok(())
    }

    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    pub fn carousel_mut(&mut self) -> &mut Carousel {
        &mut self.carousel
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.scale = stage_scale(height);
        self.carousel
            .set_viewport(Size::new(width / self.scale, REFERENCE_HEIGHT));
    }

    /// Converts widget coordinates to stage units.
    pub fn to_stage(&self, x: f64, y: f64) -> Point {
        Point::new(x / self.scale, y / self.scale)
    }

    /// Feeds one touchscreen contact, given in widget coordinates.
    pub fn touch(&mut self, phase: TouchPhase, id: TouchId, x: f64, y: f64) {
        let now = self.now();
        let point = self.to_stage(x, y);
        let carousel = &mut self.carousel;
        match phase {
            TouchPhase::Begin => self.touches.start(carousel, id, point, now),
            TouchPhase::Update => self.touches.update(carousel, id, point, now),
            TouchPhase::End => self.touches.end(carousel, id, now),
            TouchPhase::Cancel => self.touches.cancel(carousel, now),
        }
    }

    pub fn draw(
        &self,
        cr: &Context,
        colors: &ThemeColors,
        show_captions: bool,
    ) -> Result<(), cairo::Error> {
        paint_backdrop(cr, colors)?;

        cr.save()?;
        cr.scale(self.scale, self.scale);

        let mut visuals: Vec<(usize, CardVisual)> = self
            .carousel
            .visuals()
            .into_iter()
            .enumerate()
            .filter(|(_, v)| v.is_visible())
            .collect();
        visuals.sort_by_key(|(_, v)| v.z_index);

        for (index, visual) in &visuals {
            self.draw_card(cr, *index, visual, colors)?;
        }

        if show_captions && !self.carousel.is_zoomed() {
            let active = self.carousel.current_index();
            if let Some((_, visual)) = visuals.iter().find(|(i, _)| *i == active) {
                let rect = self.carousel.card_rect(active, visual);
                draw_caption(cr, self.carousel.current_card(), &rect, visual, colors)?;
            }
        }

        cr.restore()
    }

    fn draw_card(
        &self,
        cr: &Context,
        index: usize,
        visual: &CardVisual,
        colors: &ThemeColors,
    ) -> Result<(), cairo::Error> {
        let rect = self.carousel.card_rect(index, visual);
        let card = &self.carousel.cards()[index];
        let blur = if self.carousel.effects_enabled() {
            visual.blur
        } else {
            0.0
        };

        cr.save()?;
        cr.push_group();

        rounded_rect(cr, &rect, CORNER_RADIUS * visual.scale);
        set_source(cr, colors.card);
        cr.fill_preserve()?;
        cr.clip();

        match self.images.get(index).and_then(Option::as_ref) {
            Some(image) => {
                let fit = Rect::centered(rect.center(), card.image_size(rect.size));
                paint_pixbuf(cr, image.pick(blur), &fit)?;
            }
            None => draw_placeholder(cr, &rect, colors)?,
        }

        let shade = 1.0 - visual.brightness;
        if shade > 0.0 {
            let (r, g, b, _) = colors.shade.into_components();
            cr.set_source_rgba(r, g, b, shade);
            cr.paint()?;
        }

        cr.pop_group_to_source()?;
        cr.paint_with_alpha(visual.opacity)?;
        cr.restore()
    }
}

fn set_source(cr: &Context, color: Srgba<f64>) {
    let (r, g, b, a) = color.into_components();
    cr.set_source_rgba(r, g, b, a);
}

fn paint_backdrop(cr: &Context, colors: &ThemeColors) -> Result<(), cairo::Error> {
    set_source(cr, colors.backdrop);
    cr.paint()
}

fn rounded_rect(cr: &Context, rect: &Rect, radius: f64) {
    let Rect { origin, size } = *rect;
    let r = radius.min(size.width / 2.0).min(size.height / 2.0);
    cr.new_sub_path();
    cr.arc(origin.x + size.width - r, origin.y + r, r, -PI / 2.0, 0.0);
    cr.arc(
        origin.x + size.width - r,
        origin.y + size.height - r,
        r,
        0.0,
        PI / 2.0,
    );
    cr.arc(origin.x + r, origin.y + size.height - r, r, PI / 2.0, PI);
    cr.arc(origin.x + r, origin.y + r, r, PI, 1.5 * PI);
    cr.close_path();
}

fn paint_pixbuf(cr: &Context, pixbuf: &Pixbuf, target: &Rect) -> Result<(), cairo::Error> {
    let (pw, ph) = (pixbuf.width() as f64, pixbuf.height() as f64);
    if pw <= 0.0 || ph <= 0.0 || target.size.is_empty() {
        return Ok(());
    }

    cr.save()?;
    cr.translate(target.origin.x, target.origin.y);
    cr.scale(target.size.width / pw, target.size.height / ph);
    cr.set_source_pixbuf(pixbuf, 0.0, 0.0);
    cr.source().set_filter(cairo::Filter::Good);
    cr.paint()?;
    cr.restore()
}

fn draw_placeholder(cr: &Context, rect: &Rect, colors: &ThemeColors) -> Result<(), cairo::Error> {
    let center = rect.center();
    let r = rect.size.width.min(rect.size.height) * 0.12;
    set_source(cr, colors.placeholder);
    cr.set_line_width(r * 0.25);
    cr.arc(center.x, center.y, r, 0.0, 2.0 * PI);
    cr.stroke()?;
    cr.move_to(center.x - r * 0.7, center.y + r * 0.7);
    cr.line_to(center.x + r * 0.7, center.y - r * 0.7);
    cr.stroke()
}

fn draw_caption(
    cr: &Context,
    card: &Card,
    rect: &Rect,
    visual: &CardVisual,
    colors: &ThemeColors,
) -> Result<(), cairo::Error> {
    let text = card.entry.caption.as_str();
    if text.is_empty() {
        return Ok(());
    }

    let (r, g, b, a) = colors.caption.into_components();
    cr.set_source_rgba(r, g, b, a * visual.opacity);
    cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Normal);
    cr.set_font_size(CAPTION_SIZE);
    if let Ok(ext) = cr.text_extents(text) {
        let center = rect.center();
        cr.move_to(
            center.x - ext.width() / 2.0,
            rect.origin.y + rect.size.height + CAPTION_GAP,
        );
        cr.show_text(text)?;
    }
    Ok(())
}

/// Shown instead of the carousel when there is nothing to display.
pub fn draw_message(
    cr: &Context,
    width: f64,
    height: f64,
    colors: &ThemeColors,
    message: &str,
) -> Result<(), cairo::Error> {
    paint_backdrop(cr, colors)?;
    set_source(cr, colors.placeholder);
    cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Bold);
    cr.set_font_size(18.0 * stage_scale(height));
    if let Ok(ext) = cr.text_extents(message) {
        cr.move_to(width / 2.0 - ext.width() / 2.0, height / 2.0);
        cr.show_text(message)?;
    }
    Ok(())
}
