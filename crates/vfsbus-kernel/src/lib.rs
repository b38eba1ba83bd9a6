//! vfsbus-kernel: routes file-tree events between two virtual file peers.
//!
//! This crate provides:
//!
//! - **VirtualFile**: the seam events are applied to, plus an in-memory tree
//! - **TopicBus**: in-process publish/subscribe keyed by event topic
//! - **EventEmitter**: outbound sink + bus subscriptions for one tree
//! - **Dispatch**: server and client rules for applying incoming events
//!
//! # Example
//!
//! ```ignore
//! use vfsbus_kernel::{server_default_exec_event, EventEmitter, MemoryVirtualFile, TopicBus};
//! use vfsbus_kernel::{VfsEvent, VirtualFile};
//!
//! let vfs = MemoryVirtualFile::new(EventEmitter::detached(TopicBus::new()));
//!
//! server_default_exec_event(&VfsEvent::create_dir("/", "src"), &vfs).await?;
//! server_default_exec_event(&VfsEvent::set_file_content("/src/lib.rs", "// hi"), &vfs).await?;
//!
//! assert_eq!(vfs.get_file_content("/src/lib.rs").await?, "// hi");
//! ```

pub mod bus;
pub mod dispatch;
pub mod emitter;
pub mod vfs;

pub use bus::{Handler, SubscriptionToken, TopicBus};
pub use dispatch::{
    client_default_exec_event, server_default_exec_event, DispatchError, Outcome, Role,
    UnknownRole,
};
pub use emitter::{EventEmitter, EventSink};
pub use vfs::{MemoryVirtualFile, NodeKind, TreeEntry, VfsError, VirtualFile};
pub use vfsbus_types::{EventType, VfsEvent};
