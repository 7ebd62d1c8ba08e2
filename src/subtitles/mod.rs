//! ASS subtitle output for overlay tracks.

mod ass;

pub use ass::{OverlayStyles, distribution_sample, generate_ass_file, write_ass_file};
