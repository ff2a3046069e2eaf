//! Core abstractions for the timeline visual
//!
//! This crate holds the host boundary (selection handles and the services
//! that issue and consume them), the lifecycle event bus, and the settings
//! the host configures the visual with.

pub mod events;
pub mod host;
pub mod settings;

// Re-export commonly used types
pub use events::EventBus;
pub use host::{
    ColumnSource, RowSelectionFactory, SelectionHandle, SelectionHandleFactory,
    SelectionManager,
};
pub use settings::{AxisOrientation, RenderOptions, SettingsError, VisualSettings};
