use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use palette::Srgba;

/// Colours the stage paints with, taken from the active GTK theme where it
/// names them.
pub struct ThemeColors {
    pub backdrop: Srgba<f64>,
    pub card: Srgba<f64>,
    pub placeholder: Srgba<f64>,
    pub caption: Srgba<f64>,
    pub shade: Srgba<f64>,
}

impl ThemeColors {
    pub fn from_context(context: &gtk::StyleContext) -> Self {
        let named = |name: &str, fallback: Srgba<f64>| -> Srgba<f64> {
            context
                .lookup_color(name)
                .map(rgba_to_srgba)
                .unwrap_or(fallback)
        };

        Self {
            backdrop: opaque(named("window_bg_color", Srgba::new(0.06, 0.06, 0.08, 1.0))),
            card: opaque(named("card_bg_color", Srgba::new(0.14, 0.14, 0.17, 1.0))),
            placeholder: named("insensitive_fg_color", Srgba::new(0.45, 0.45, 0.5, 1.0)),
            caption: named("window_fg_color", Srgba::new(0.95, 0.95, 0.95, 1.0)),
            shade: Srgba::new(0.0, 0.0, 0.0, 1.0),
        }
    }
}

fn rgba_to_srgba(c: gdk::RGBA) -> Srgba<f64> {
    Srgba::new(
        c.red() as f64,
        c.green() as f64,
        c.blue() as f64,
        c.alpha() as f64,
    )
}

/// Cards and the backdrop must hide what is behind them.
fn opaque(color: Srgba<f64>) -> Srgba<f64> {
    Srgba::new(color.red, color.green, color.blue, 1.0)
}

pub fn load_css() {
    let provider = gtk::CssProvider::new();
    provider.load_from_data(
        "
.vitrine-stage {
    background: none;
}
.vitrine-nav {
    min-width: 48px;
    min-height: 48px;
    margin: 24px;
}
",
    );

    match gdk::Display::default() {
        Some(display) => gtk::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        ),
        None => log::warn!("No display, skipping stylesheet"),
    }
}
