//! Dailies Data Model
//!
//! Defines the inputs of a dailies render:
//! - **Fields:** Slate metadata values (shot, LUT, dates, description)
//! - **Sequence:** Frame-numbered image files resolved on disk
//! - **Layout:** Text positions, sizes, and canvas resolution
//! - **Resources:** Slate assets and fonts

pub mod fields;
pub mod layout;
pub mod resources;
pub mod sequence;

pub use fields::*;
pub use layout::*;
pub use resources::*;
pub use sequence::{SequenceDescriptor, SequencePattern};
