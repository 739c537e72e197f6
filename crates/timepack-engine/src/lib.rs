//! timepack-engine: Event packing for calendar timeline views
//!
//! This crate provides the layout core of a day timeline, including:
//! - Event and packed-event types with timestamp parsing
//! - The packing algorithm that assigns overlapping events to columns
//! - Layout configuration and the timeline view model

pub mod config;
pub mod event;
pub mod packer;
pub mod timeline;

// Re-export commonly used types
pub use config::{Config, ConfigError, LayoutConfig};
pub use event::{
    intervals_overlap, read_events, timestamp, Event, EventParseError, Fields, PackedEvent,
    DEFAULT_EVENT_HOURS,
};
pub use packer::{hours_between, pack_events, Packer};
pub use timeline::Timeline;
