//! Virtual file trees that events are applied to.
//!
//! - **VirtualFile**: the seam dispatch talks to; real implementations own
//!   storage, diffing and transport
//! - **MemoryVirtualFile**: ephemeral in-memory tree (tests, CLI replay)
//!
//! # Paths
//!
//! Virtual paths are `/`-rooted strings. `/src/main.rs` names `main.rs`
//! inside the tree's `src` directory regardless of where (or whether) the
//! tree lives on disk.

mod memory;
mod traits;

pub use memory::{MemoryVirtualFile, NodeKind, TreeEntry};
pub use traits::{VfsError, VirtualFile};
