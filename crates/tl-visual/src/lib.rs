//! The timeline visual as the host sees it
//!
//! [`TimelineVisual`] receives update notifications, maps the dataset into
//! items, renders them through a [`tl_render::TimelineSurface`] and wires
//! clicks on rendered items back to host selection via [`SelectionBridge`].

pub mod selection;
pub mod visual;

pub use selection::SelectionBridge;
pub use visual::{HostServices, TimelineVisual, UpdateOutcome, VisualState, VisualUpdate};
