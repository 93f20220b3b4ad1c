use strum::Display as StrumDisplay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay)]
pub enum CarouselState {
    Idle,
    Dragging,
    Momentum,
    Snapping,
    Zoomed,
    Pinching,
}

/// Everything the carousel tells its host. Drained with
/// [`Carousel::drain_events`](crate::controller::Carousel::drain_events).
#[derive(Debug, Clone, PartialEq)]
pub enum CarouselEvent {
    ActiveChanged { index: usize },
    ZoomChanged { scale: f64 },
    HoverChanged { hovering: bool },
    StateChanged { from: CarouselState, to: CarouselState },
}
