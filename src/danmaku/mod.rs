//! Comment-to-overlay layout engine.
//!
//! Data flows one way through four stages:
//! - [`comment`]: raw records into escaped, validated comments
//! - [`smoothing`]: spread out start times inside overloaded time windows
//! - [`tracks`]: round-robin track and vertical offset assignment
//! - [`emitter`]: duration, movement path, styled text and time codes
//!
//! [`engine::LayoutEngine`] runs the stages in order. Nothing here prints or
//! touches the filesystem except [`source`], which decodes the XML container.

pub mod comment;
pub mod config;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod smoothing;
pub mod source;
pub mod tracks;

pub use config::LayoutConfig;
pub use emitter::{OverlayEvent, format_timestamp};
pub use engine::{LayoutEngine, RunReport};
pub use source::load_comment_file;
