pub mod pitch;

pub use pitch::{PitchContent, PitchRecord, CONTENT_FIELDS, NOT_SPECIFIED};
