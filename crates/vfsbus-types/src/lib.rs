//! vfsbus-types: pure data types shared by vfsbus peers.
//!
//! - [`EventType`]: the fixed vocabulary of file-tree event kinds
//! - [`VfsEvent`]: `{eventType, data}` records and their constructors
//!
//! No I/O, no runtime. Anything that can speak JSON can produce these.

mod event;
mod event_type;

pub use event::VfsEvent;
pub use event_type::{EventType, UnknownEventType};
