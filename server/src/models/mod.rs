pub mod event;

pub use event::{Event, EventDate, EventPatch, NewEvent};
