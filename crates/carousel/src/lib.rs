//! Circular image carousel with drag, momentum, snapping and focal zoom.
//!
//! The [`Carousel`] controller owns all state. Hosts feed it pointer, wheel,
//! pinch and key input stamped with a [`TickSource`] time, call
//! [`Animated::tick`] once per frame while [`Animated::is_animating`] is true,
//! draw [`Carousel::visuals`], and drain [`CarouselEvent`]s.

pub mod macros;

pub mod command;
pub mod controller;
pub mod easing;
pub mod events;
pub mod gallery;
pub mod geometry;
pub mod layout;
pub mod scheduler;
pub mod settings;
pub mod touch;
pub mod zoom;

pub use command::{RemoteCommand, SOCKET_PATH};
pub use controller::{Carousel, CarouselError, Key};
pub use events::{CarouselEvent, CarouselState};
pub use gallery::{Caption, Card, GalleryError, ImageEntry, ImageSource};
pub use geometry::{Point, Rect, Size};
pub use layout::{CardVisual, Tier};
pub use scheduler::{Animated, ManualClock, MonotonicClock, TickSource};
pub use settings::CarouselSettings;
pub use touch::{TouchId, TouchRouter};
