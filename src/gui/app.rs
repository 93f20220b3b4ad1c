use crate::config;
use crate::events::AppEvent;
use crate::gui::stage::{self, Stage, TouchPhase};
use crate::gui::theme::{self, ThemeColors};
use crate::preferences::Preferences;
use carousel::{Animated, Carousel, CarouselEvent, Key, Point, RemoteCommand, TouchId};
use glib::translate::ToGlibPtr;
use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub const APP_NAME: &str = "Vitrine";
const EMPTY_MESSAGE: &str = "No images configured";

pub fn window_title(caption: &str, index: usize, count: usize) -> String {
    let position = format!("{}/{}", index + 1, count);
    if caption.is_empty() {
        format!("{} {}", APP_NAME, position)
    } else {
        format!("{} ({})", caption, position)
    }
}

pub struct AppModel {
    stage: Rc<RefCell<Option<Stage>>>,
    preferences: Rc<Cell<Preferences>>,
    title: String,
    /// Last pointer position in widget coordinates, for wheel zoom.
    pointer: Point,
    drawing_area: gtk::DrawingArea,
}

#[derive(Debug)]
pub enum AppMsg {
    Remote(RemoteCommand),
    ConfigReload,
    Carousel(CarouselEvent),
    Key(Key),
    ToggleEffects,
    ToggleCaptions,
    Previous,
    Next,
    Resize(f64, f64),
    DragBegin(Point),
    DragUpdate(Point),
    DragEnd(Point),
    Motion(Point),
    Leave,
    Scroll(f64),
    PinchBegin(Point),
    PinchUpdate(Point, f64),
    PinchEnd,
    Touch(TouchPhase, TouchId, Point),
}

fn touch_phase(kind: gdk::EventType) -> Option<TouchPhase> {
    match kind {
        gdk::EventType::TouchBegin => Some(TouchPhase::Begin),
        gdk::EventType::TouchUpdate => Some(TouchPhase::Update),
        gdk::EventType::TouchEnd => Some(TouchPhase::End),
        gdk::EventType::TouchCancel => Some(TouchPhase::Cancel),
        _ => None,
    }
}

/// Touch sequences are told apart by address.
fn touch_id(sequence: &gdk::EventSequence) -> TouchId {
    let ptr: *const gdk::ffi::GdkEventSequence = sequence.to_glib_none().0;
    ptr as usize as TouchId
}

/// Position of `event` relative to `widget`. Legacy controllers see surface
/// coordinates.
fn widget_point(widget: &gtk::Widget, event: &gdk::Event) -> Option<Point> {
    let (x, y) = event.position()?;
    let native = widget.native()?;
    let (dx, dy) = native.surface_transform();
    let local = native.compute_point(
        widget,
        &gtk::graphene::Point::new((x - dx) as f32, (y - dy) as f32),
    )?;
    Some(Point::new(local.x() as f64, local.y() as f64))
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::Command(c) => AppMsg::Remote(c),
            AppEvent::ConfigReload => AppMsg::ConfigReload,
        }
    }
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = (
        config::Config,
        Preferences,
        async_channel::Receiver<AppEvent>,
    );
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        #[name = "window"]
        gtk::ApplicationWindow {
            #[watch]
            set_title: Some(&model.title),
            set_default_size: (1280, 800),

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    let msg = match key {
                        gtk::gdk::Key::Left => AppMsg::Key(Key::ArrowLeft),
                        gtk::gdk::Key::Right => AppMsg::Key(Key::ArrowRight),
                        gtk::gdk::Key::Escape => AppMsg::Key(Key::Escape),
                        gtk::gdk::Key::e => AppMsg::ToggleEffects,
                        gtk::gdk::Key::c => AppMsg::ToggleCaptions,
                        _ => return glib::Propagation::Proceed,
                    };
                    sender.input(msg);
                    glib::Propagation::Stop
                }
            },

            #[name = "overlay"]
            gtk::Overlay {
                #[name = "drawing_area"]
                gtk::DrawingArea {
                    set_hexpand: true,
                    set_vexpand: true,
                    add_css_class: "vitrine-stage",

                    connect_resize[sender] => move |_, width, height| {
                        sender.input(AppMsg::Resize(width as f64, height as f64));
                    },

                    // touchscreens go through the touch router; the gestures
                    // below only see mouse and touchpad input
                    add_controller = gtk::EventControllerLegacy {
                        set_propagation_phase: gtk::PropagationPhase::Capture,
                        connect_event[sender] => move |controller, event| {
                            let Some(phase) = touch_phase(event.event_type()) else {
                                return glib::Propagation::Proceed;
                            };
                            let id = touch_id(&event.event_sequence());
                            let Some(point) = controller
                                .widget()
                                .and_then(|widget| widget_point(&widget, event))
                            else {
                                return glib::Propagation::Proceed;
                            };
                            sender.input(AppMsg::Touch(phase, id, point));
                            glib::Propagation::Stop
                        },
                    },

                    add_controller = gtk::GestureDrag {
                        connect_drag_begin[sender] => move |_, x, y| {
                            sender.input(AppMsg::DragBegin(Point::new(x, y)));
                        },
                        connect_drag_update[sender] => move |gesture, dx, dy| {
                            if let Some((x, y)) = gesture.start_point() {
                                sender.input(AppMsg::DragUpdate(Point::new(x + dx, y + dy)));
                            }
                        },
                        connect_drag_end[sender] => move |gesture, dx, dy| {
                            if let Some((x, y)) = gesture.start_point() {
                                sender.input(AppMsg::DragEnd(Point::new(x + dx, y + dy)));
                            }
                        },
                    },

                    add_controller = gtk::GestureZoom {
                        connect_begin[sender] => move |gesture, _| {
                            if let Some((x, y)) = gesture.bounding_box_center() {
                                sender.input(AppMsg::PinchBegin(Point::new(x, y)));
                            }
                        },
                        connect_scale_changed[sender] => move |gesture, scale| {
                            if let Some((x, y)) = gesture.bounding_box_center() {
                                sender.input(AppMsg::PinchUpdate(Point::new(x, y), scale));
                            }
                        },
                        connect_end[sender] => move |_, _| {
                            sender.input(AppMsg::PinchEnd);
                        },
                    },

                    add_controller = gtk::EventControllerScroll::new(
                        gtk::EventControllerScrollFlags::VERTICAL
                    ) {
                        connect_scroll[sender] => move |_, _, dy| {
                            sender.input(AppMsg::Scroll(dy));
                            glib::Propagation::Stop
                        },
                    },

                    add_controller = gtk::EventControllerMotion {
                        connect_motion[sender] => move |_, x, y| {
                            sender.input(AppMsg::Motion(Point::new(x, y)));
                        },
                        connect_leave[sender] => move |_| {
                            sender.input(AppMsg::Leave);
                        },
                    },
                },

                add_overlay = &gtk::Button {
                    set_icon_name: "go-previous-symbolic",
                    set_tooltip_text: Some("Previous image"),
                    set_halign: gtk::Align::Start,
                    set_valign: gtk::Align::Center,
                    set_can_focus: false,
                    add_css_class: "circular",
                    add_css_class: "osd",
                    add_css_class: "vitrine-nav",
                    connect_clicked => AppMsg::Previous,
                },

                add_overlay = &gtk::Button {
                    set_icon_name: "go-next-symbolic",
                    set_tooltip_text: Some("Next image"),
                    set_halign: gtk::Align::End,
                    set_valign: gtk::Align::Center,
                    set_can_focus: false,
                    add_css_class: "circular",
                    add_css_class: "osd",
                    add_css_class: "vitrine-nav",
                    connect_clicked => AppMsg::Next,
                },
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let (config, preferences, rx) = init;

        theme::load_css();

        let stage = match Stage::new(&config, preferences.visual_effects) {
            Ok(stage) => Some(stage),
            Err(e) => {
                log::error!("Cannot show gallery: {}", e);
                None
            }
        };
        let title = stage
            .as_ref()
            .map(|s| title_for(s.carousel()))
            .unwrap_or_else(|| APP_NAME.to_string());

        let model = AppModel {
            stage: Rc::new(RefCell::new(stage)),
            preferences: Rc::new(Cell::new(preferences)),
            title,
            pointer: Point::ZERO,
            drawing_area: gtk::DrawingArea::default(),
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();

        let stage_draw = model.stage.clone();
        let prefs_draw = model.preferences.clone();
        widgets
            .drawing_area
            .set_draw_func(move |drawing_area, cr, width, height| {
                let colors = ThemeColors::from_context(&drawing_area.style_context());
                let result = match stage_draw.borrow().as_ref() {
                    Some(stage) => stage.draw(cr, &colors, prefs_draw.get().show_captions),
                    None => stage::draw_message(
                        cr,
                        width as f64,
                        height as f64,
                        &colors,
                        EMPTY_MESSAGE,
                    ),
                };
                if let Err(e) = result {
                    log::error!("Drawing error: {}", e);
                }
            });

        let stage_tick = model.stage.clone();
        let tick_sender = sender.clone();
        widgets
            .drawing_area
            .add_tick_callback(move |drawing_area, _| {
                if let Some(stage) = stage_tick.borrow_mut().as_mut() {
                    let now = stage.now();
                    let carousel = stage.carousel_mut();
                    if carousel.is_animating() {
                        carousel.tick(now);
                        drawing_area.queue_draw();
                    }
                    for event in carousel.drain_events() {
                        tick_sender.input(AppMsg::Carousel(event));
                    }
                }
                glib::ControlFlow::Continue
            });

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, _sender: ComponentSender<Self>) {
        match msg {
            AppMsg::ConfigReload => self.reload_config(),
            AppMsg::Carousel(event) => self.on_carousel_event(event),
            AppMsg::ToggleEffects => {
                let mut prefs = self.preferences.get();
                let enabled = prefs.toggle_effects();
                self.save_preferences(prefs);
                log::info!("Visual effects {}", if enabled { "on" } else { "off" });
                if let Some(stage) = self.stage.borrow_mut().as_mut() {
                    stage.carousel_mut().set_effects_enabled(enabled);
                }
            }
            AppMsg::ToggleCaptions => {
                let mut prefs = self.preferences.get();
                prefs.toggle_captions();
                self.save_preferences(prefs);
            }
            AppMsg::Resize(width, height) => {
                if let Some(stage) = self.stage.borrow_mut().as_mut() {
                    stage.resize(width, height);
                }
            }
            input => self.handle_input(input),
        }
        self.drawing_area.queue_draw();
    }
}

fn title_for(carousel: &Carousel) -> String {
    window_title(
        carousel.current_card().entry.caption.as_str(),
        carousel.current_index(),
        carousel.len(),
    )
}

impl AppModel {
    fn handle_input(&mut self, msg: AppMsg) {
        match msg {
            AppMsg::Motion(p) | AppMsg::DragBegin(p) | AppMsg::DragUpdate(p) => self.pointer = p,
            _ => {}
        }

        let mut guard = self.stage.borrow_mut();
        let Some(stage) = guard.as_mut() else {
            return;
        };
        let now = stage.now();
        let pointer = stage.to_stage(self.pointer.x, self.pointer.y);

        match msg {
            AppMsg::DragBegin(p) => {
                let p = stage.to_stage(p.x, p.y);
                stage.carousel_mut().pointer_down(p, now);
            }
            AppMsg::DragUpdate(p) => {
                let p = stage.to_stage(p.x, p.y);
                stage.carousel_mut().pointer_move(p, now);
            }
            AppMsg::DragEnd(p) => {
                let p = stage.to_stage(p.x, p.y);
                stage.carousel_mut().pointer_up(p, now);
            }
            AppMsg::Motion(p) => {
                let p = stage.to_stage(p.x, p.y);
                stage.carousel_mut().pointer_move(p, now);
            }
            AppMsg::Leave => stage.carousel_mut().pointer_leave(),
            AppMsg::Scroll(dy) => {
                stage.carousel_mut().wheel(pointer, dy, now);
            }
            AppMsg::PinchBegin(center) => {
                let center = stage.to_stage(center.x, center.y);
                stage.carousel_mut().pinch_begin(center, 1.0, now);
            }
            AppMsg::PinchUpdate(center, scale) => {
                let center = stage.to_stage(center.x, center.y);
                stage.carousel_mut().pinch_update(center, scale);
            }
            AppMsg::PinchEnd => stage.carousel_mut().pinch_end(now),
            AppMsg::Touch(phase, id, p) => stage.touch(phase, id, p.x, p.y),
            AppMsg::Key(key) => {
                stage.carousel_mut().key(key, now);
            }
            AppMsg::Previous => stage.carousel_mut().previous(now),
            AppMsg::Next => stage.carousel_mut().next(now),
            AppMsg::Remote(command) => {
                if let Err(e) = stage.carousel_mut().apply(command, now) {
                    log::warn!("Ignoring remote command '{}': {}", command, e);
                }
            }
            AppMsg::ConfigReload
            | AppMsg::Carousel(_)
            | AppMsg::ToggleEffects
            | AppMsg::ToggleCaptions
            | AppMsg::Resize(..) => {}
        }
    }

    fn on_carousel_event(&mut self, event: CarouselEvent) {
        match event {
            CarouselEvent::ActiveChanged { index } => {
                if let Some(stage) = self.stage.borrow().as_ref() {
                    self.title = title_for(stage.carousel());
                }
                log::debug!("Active card is now {}", index);
            }
            CarouselEvent::ZoomChanged { scale } => log::trace!("Zoom {:.2}", scale),
            CarouselEvent::HoverChanged { hovering } => {
                self.drawing_area
                    .set_cursor_from_name(hovering.then_some("zoom-in"));
            }
            CarouselEvent::StateChanged { from, to } => log::debug!("{} -> {}", from, to),
        }
    }

    fn save_preferences(&self, prefs: Preferences) {
        self.preferences.set(prefs);
        prefs.save();
    }

    fn reload_config(&mut self) {
        let new_config = match config::load_config() {
            Ok(c) => c,
            Err(e) => {
                log::error!("Failed to reload config: {}", e);
                return;
            }
        };

        let mut guard = self.stage.borrow_mut();
        let result = match guard.as_mut() {
            Some(stage) => stage.apply_config(&new_config),
            None => match Stage::new(&new_config, self.preferences.get().visual_effects) {
                Ok(mut stage) => {
                    stage.resize(
                        self.drawing_area.width() as f64,
                        self.drawing_area.height() as f64,
                    );
                    *guard = Some(stage);
                    Ok(())
                }
                Err(e) => Err(e),
            },
        };

        match result {
            Ok(()) => {
                if let Some(stage) = guard.as_ref() {
                    self.title = title_for(stage.carousel());
                }
                log::info!("Configuration reloaded");
            }
            Err(e) => log::error!("Failed to apply reloaded config: {}", e),
        }
    }
}
