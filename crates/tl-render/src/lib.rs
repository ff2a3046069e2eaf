//! Rendering surface for the timeline visual
//!
//! `dom` is the element tree the host hands the visual, `layout` places items
//! into lanes and levels, and `surface` owns the container the timeline is
//! rendered into.

pub mod dom;
pub mod layout;
pub mod surface;

pub use dom::{ClickListener, Document, DomBatch, Element, ElementId};
pub use layout::{lay_out, LaneLayout, PlacedItem, TimelineLayout, ITEM_HEIGHT};
pub use surface::{HostElement, RenderedFrame, RenderedItem, TimelineSurface};
