//! In-memory virtual file tree.
//!
//! Used by tests and the `vfsbus` CLI. All data is ephemeral.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::traits::{VfsError, VirtualFile};
use crate::emitter::EventEmitter;

/// Node in the memory tree.
#[derive(Debug, Clone)]
enum Node {
    File { content: String },
    Directory,
}

/// Kind of tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

/// A listed entry, as returned by [`MemoryVirtualFile::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Absolute virtual path (always starts with `/`).
    pub path: PathBuf,
    pub kind: NodeKind,
    /// Content length in bytes (0 for directories).
    pub size: u64,
}

type Nodes = HashMap<PathBuf, Node>;

/// In-memory file tree implementing [`VirtualFile`].
///
/// Thread-safe via internal `RwLock`. Each operation takes the lock once, so
/// concurrent events never observe a half-applied move or delete.
#[derive(Debug)]
pub struct MemoryVirtualFile {
    nodes: RwLock<Nodes>,
    emitter: EventEmitter,
}

impl MemoryVirtualFile {
    /// Create an empty tree that emits through `emitter`.
    pub fn new(emitter: EventEmitter) -> Self {
        let mut nodes = HashMap::new();
        // Root directory always exists
        nodes.insert(PathBuf::new(), Node::Directory);
        Self {
            nodes: RwLock::new(nodes),
            emitter,
        }
    }

    /// Normalize a path: remove leading `/`, resolve `.` and `..`.
    pub(crate) fn normalize(path: &str) -> PathBuf {
        let mut result = PathBuf::new();
        for component in Path::new(path).components() {
            match component {
                Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
                Component::ParentDir => {
                    result.pop();
                }
                Component::Normal(s) => result.push(s),
            }
        }
        result
    }

    /// All entries except the root, sorted by path.
    pub async fn entries(&self) -> Vec<TreeEntry> {
        let nodes = self.nodes.read().await;
        let mut result: Vec<_> = nodes
            .iter()
            .filter(|(path, _)| !path.as_os_str().is_empty())
            .map(|(path, node)| match node {
                Node::File { content } => TreeEntry {
                    path: absolute(path),
                    kind: NodeKind::File,
                    size: content.len() as u64,
                },
                Node::Directory => TreeEntry {
                    path: absolute(path),
                    kind: NodeKind::Directory,
                    size: 0,
                },
            })
            .collect();
        result.sort_by(|a, b| a.path.cmp(&b.path));
        result
    }

    /// Kind of the entry at `path`, if any.
    pub async fn kind(&self, path: &str) -> Option<NodeKind> {
        let nodes = self.nodes.read().await;
        nodes.get(&Self::normalize(path)).map(|node| match node {
            Node::File { .. } => NodeKind::File,
            Node::Directory => NodeKind::Directory,
        })
    }

    /// Number of entries, not counting the root.
    pub async fn len(&self) -> usize {
        self.nodes.read().await.len() - 1
    }

    /// True if only the root exists.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop everything but the root.
    pub async fn reset(&self) {
        let mut nodes = self.nodes.write().await;
        nodes.retain(|path, _| path.as_os_str().is_empty());
    }

    /// Create `name` inside `parent`, creating missing parent directories.
    async fn create(&self, parent: &str, name: &str, node: Node) -> Result<(), VfsError> {
        let parent = Self::normalize(parent);
        check_name(&parent, name)?;
        let target = parent.join(name);

        let mut nodes = self.nodes.write().await;
        ensure_dirs(&mut nodes, &parent)?;
        if nodes.contains_key(&target) {
            return Err(VfsError::AlreadyExists(absolute(&target)));
        }
        nodes.insert(target, node);
        Ok(())
    }

    /// Write file content, creating the file and its parents if needed.
    async fn write(&self, path: &str, content: &str) -> Result<(), VfsError> {
        let normalized = Self::normalize(path);
        let Some(parent) = normalized.parent() else {
            return Err(VfsError::IsADirectory(absolute(&normalized)));
        };

        let mut nodes = self.nodes.write().await;
        ensure_dirs(&mut nodes, parent)?;

        // Check we're not overwriting a directory
        if let Some(Node::Directory) = nodes.get(&normalized) {
            return Err(VfsError::IsADirectory(absolute(&normalized)));
        }

        nodes.insert(
            normalized,
            Node::File {
                content: content.to_string(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl VirtualFile for MemoryVirtualFile {
    async fn create_dir(&self, virtual_path: &str, dir_name: &str) -> Result<(), VfsError> {
        self.create(virtual_path, dir_name, Node::Directory).await
    }

    async fn create_file(&self, virtual_path: &str, file_name: &str) -> Result<(), VfsError> {
        self.create(
            virtual_path,
            file_name,
            Node::File {
                content: String::new(),
            },
        )
        .await
    }

    async fn rename_file(&self, virtual_path: &str, new_name: &str) -> Result<(), VfsError> {
        let from = Self::normalize(virtual_path);
        let Some(parent) = from.parent() else {
            return Err(VfsError::RootDirectory);
        };
        check_name(parent, new_name)?;
        let to = parent.join(new_name);

        let mut nodes = self.nodes.write().await;
        relocate(&mut nodes, &from, &to)
    }

    async fn delete_file(&self, virtual_path: &str) -> Result<(), VfsError> {
        let target = Self::normalize(virtual_path);
        if target.as_os_str().is_empty() {
            return Err(VfsError::RootDirectory);
        }

        let mut nodes = self.nodes.write().await;
        if !nodes.contains_key(&target) {
            return Err(VfsError::NotFound(absolute(&target)));
        }
        nodes.retain(|path, _| !path.starts_with(&target));
        Ok(())
    }

    async fn move_file(&self, virtual_path: &str, new_path: &str) -> Result<(), VfsError> {
        let from = Self::normalize(virtual_path);
        let to = Self::normalize(new_path);
        if from.as_os_str().is_empty() {
            return Err(VfsError::RootDirectory);
        }
        if to != from && to.starts_with(&from) {
            return Err(VfsError::InvalidName {
                path: absolute(&from),
                name: new_path.to_string(),
            });
        }
        let Some(dest_parent) = to.parent() else {
            return Err(VfsError::AlreadyExists(absolute(&to)));
        };

        let mut nodes = self.nodes.write().await;
        if !nodes.contains_key(&from) {
            return Err(VfsError::NotFound(absolute(&from)));
        }
        ensure_dirs(&mut nodes, dest_parent)?;
        relocate(&mut nodes, &from, &to)
    }

    async fn change_file_content(&self, virtual_path: &str, content: &str) -> Result<(), VfsError> {
        self.write(virtual_path, content).await
    }

    async fn get_file_content(&self, virtual_path: &str) -> Result<String, VfsError> {
        let normalized = Self::normalize(virtual_path);
        let nodes = self.nodes.read().await;

        match nodes.get(&normalized) {
            Some(Node::File { content }) => Ok(content.clone()),
            Some(Node::Directory) => Err(VfsError::IsADirectory(absolute(&normalized))),
            None => Err(VfsError::NotFound(absolute(&normalized))),
        }
    }

    async fn set_file_content(&self, virtual_path: &str, content: &str) -> Result<(), VfsError> {
        self.write(virtual_path, content).await
    }

    fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }
}

/// Render a normalized key as an absolute virtual path.
fn absolute(path: &Path) -> PathBuf {
    Path::new("/").join(path)
}

/// A name must be exactly one normal path component.
fn check_name(parent: &Path, name: &str) -> Result<(), VfsError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains('/') => Ok(()),
        _ => Err(VfsError::InvalidName {
            path: absolute(parent),
            name: name.to_string(),
        }),
    }
}

/// Make sure `dir` and all its ancestors exist as directories.
fn ensure_dirs(nodes: &mut Nodes, dir: &Path) -> Result<(), VfsError> {
    let mut current = PathBuf::new();
    for component in dir.components() {
        current.push(component);
        match nodes.get(&current) {
            Some(Node::Directory) => {}
            Some(Node::File { .. }) => return Err(VfsError::NotADirectory(absolute(&current))),
            None => {
                nodes.insert(current.clone(), Node::Directory);
            }
        }
    }
    Ok(())
}

/// Move `from` and everything under it to `to`.
fn relocate(nodes: &mut Nodes, from: &Path, to: &Path) -> Result<(), VfsError> {
    if from == to {
        return if nodes.contains_key(from) {
            Ok(())
        } else {
            Err(VfsError::NotFound(absolute(from)))
        };
    }
    if !nodes.contains_key(from) {
        return Err(VfsError::NotFound(absolute(from)));
    }
    if nodes.contains_key(to) {
        return Err(VfsError::AlreadyExists(absolute(to)));
    }

    // Collect paths to move (can't modify while iterating)
    let moving: Vec<PathBuf> = nodes
        .keys()
        .filter(|path| path.starts_with(from))
        .cloned()
        .collect();

    for old_path in moving {
        let Some(node) = nodes.remove(&old_path) else {
            continue;
        };
        let new_path = match old_path.strip_prefix(from) {
            Ok(rel) if !rel.as_os_str().is_empty() => to.join(rel),
            _ => to.to_path_buf(),
        };
        nodes.insert(new_path, node);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::TopicBus;
    use proptest::prelude::*;

    fn tree() -> MemoryVirtualFile {
        MemoryVirtualFile::new(EventEmitter::detached(TopicBus::new()))
    }

    fn paths(entries: &[TreeEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|e| e.path.to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_create_dir_and_file() {
        let vfs = tree();
        vfs.create_dir("/", "src").await.unwrap();
        vfs.create_file("/src", "main.rs").await.unwrap();

        assert_eq!(vfs.kind("/src").await, Some(NodeKind::Directory));
        assert_eq!(vfs.kind("/src/main.rs").await, Some(NodeKind::File));
        assert_eq!(vfs.get_file_content("/src/main.rs").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_create_makes_missing_parents() {
        let vfs = tree();
        vfs.create_file("/a/b/c", "leaf.txt").await.unwrap();

        assert_eq!(
            paths(&vfs.entries().await),
            vec!["/a", "/a/b", "/a/b/c", "/a/b/c/leaf.txt"]
        );
    }

    #[tokio::test]
    async fn test_create_existing_fails() {
        let vfs = tree();
        vfs.create_dir("/", "src").await.unwrap();

        let err = vfs.create_file("/", "src").await.unwrap_err();
        assert!(matches!(err, VfsError::AlreadyExists(p) if p == Path::new("/src")));
    }

    #[tokio::test]
    async fn test_create_under_file_fails() {
        let vfs = tree();
        vfs.create_file("/", "notes.txt").await.unwrap();

        let err = vfs.create_dir("/notes.txt", "sub").await.unwrap_err();
        assert!(matches!(err, VfsError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_invalid_names() {
        let vfs = tree();
        for name in ["", ".", "..", "a/b", "/abs"] {
            let err = vfs.create_file("/", name).await.unwrap_err();
            assert!(matches!(err, VfsError::InvalidName { .. }), "name {name:?}");
        }
        assert!(vfs.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_and_get_content() {
        let vfs = tree();
        vfs.set_file_content("/docs/readme.md", "# hi").await.unwrap();
        assert_eq!(vfs.get_file_content("/docs/readme.md").await.unwrap(), "# hi");

        vfs.change_file_content("/docs/readme.md", "# bye").await.unwrap();
        assert_eq!(vfs.get_file_content("docs/./readme.md").await.unwrap(), "# bye");
    }

    #[tokio::test]
    async fn test_write_to_directory_fails() {
        let vfs = tree();
        vfs.create_dir("/", "src").await.unwrap();

        let err = vfs.set_file_content("/src", "x").await.unwrap_err();
        assert!(matches!(err, VfsError::IsADirectory(_)));
        let err = vfs.set_file_content("/", "x").await.unwrap_err();
        assert!(matches!(err, VfsError::IsADirectory(_)));
    }

    #[tokio::test]
    async fn test_get_content_errors() {
        let vfs = tree();
        vfs.create_dir("/", "src").await.unwrap();

        assert!(matches!(
            vfs.get_file_content("/src").await.unwrap_err(),
            VfsError::IsADirectory(_)
        ));
        assert!(matches!(
            vfs.get_file_content("/nope").await.unwrap_err(),
            VfsError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_rename_directory_moves_children() {
        let vfs = tree();
        vfs.set_file_content("/dir/a.txt", "a").await.unwrap();
        vfs.set_file_content("/dir/sub/b.txt", "b").await.unwrap();

        vfs.rename_file("/dir", "renamed").await.unwrap();

        assert_eq!(
            paths(&vfs.entries().await),
            vec!["/renamed", "/renamed/a.txt", "/renamed/sub", "/renamed/sub/b.txt"]
        );
        assert_eq!(vfs.get_file_content("/renamed/sub/b.txt").await.unwrap(), "b");
    }

    #[tokio::test]
    async fn test_rename_does_not_touch_siblings_with_shared_prefix() {
        let vfs = tree();
        vfs.set_file_content("/dir/a.txt", "a").await.unwrap();
        vfs.set_file_content("/dir2/b.txt", "b").await.unwrap();

        vfs.rename_file("/dir", "moved").await.unwrap();

        assert_eq!(vfs.get_file_content("/dir2/b.txt").await.unwrap(), "b");
    }

    #[tokio::test]
    async fn test_rename_errors() {
        let vfs = tree();
        vfs.create_file("/", "a.txt").await.unwrap();
        vfs.create_file("/", "b.txt").await.unwrap();

        assert!(matches!(
            vfs.rename_file("/a.txt", "b.txt").await.unwrap_err(),
            VfsError::AlreadyExists(_)
        ));
        assert!(matches!(
            vfs.rename_file("/missing", "c.txt").await.unwrap_err(),
            VfsError::NotFound(_)
        ));
        assert!(matches!(
            vfs.rename_file("/", "root").await.unwrap_err(),
            VfsError::RootDirectory
        ));
        // Renaming to the same name is a no-op
        vfs.rename_file("/a.txt", "a.txt").await.unwrap();
    }

    #[tokio::test]
    async fn test_move_file_creates_destination_parents() {
        let vfs = tree();
        vfs.set_file_content("/a.txt", "payload").await.unwrap();

        vfs.move_file("/a.txt", "/archive/2024/a.txt").await.unwrap();

        assert_eq!(vfs.kind("/a.txt").await, None);
        assert_eq!(
            vfs.get_file_content("/archive/2024/a.txt").await.unwrap(),
            "payload"
        );
    }

    #[tokio::test]
    async fn test_move_directory_into_itself_fails() {
        let vfs = tree();
        vfs.create_dir("/", "dir").await.unwrap();

        let err = vfs.move_file("/dir", "/dir/inner").await.unwrap_err();
        assert!(matches!(err, VfsError::InvalidName { .. }));
        assert_eq!(vfs.kind("/dir").await, Some(NodeKind::Directory));
        assert_eq!(vfs.kind("/dir/inner").await, None);
    }

    #[tokio::test]
    async fn test_move_missing_source_creates_nothing() {
        let vfs = tree();
        let err = vfs.move_file("/ghost", "/new/dir/ghost").await.unwrap_err();
        assert!(matches!(err, VfsError::NotFound(_)));
        assert!(vfs.is_empty().await);
    }

    #[tokio::test]
    async fn test_move_onto_root_fails() {
        let vfs = tree();
        vfs.create_file("/", "a").await.unwrap();
        assert!(matches!(
            vfs.move_file("/a", "/").await.unwrap_err(),
            VfsError::AlreadyExists(_)
        ));
        assert!(matches!(
            vfs.move_file("/", "/b").await.unwrap_err(),
            VfsError::RootDirectory
        ));
    }

    #[tokio::test]
    async fn test_delete_is_recursive() {
        let vfs = tree();
        vfs.set_file_content("/dir/a.txt", "a").await.unwrap();
        vfs.set_file_content("/dir/sub/b.txt", "b").await.unwrap();
        vfs.set_file_content("/keep.txt", "k").await.unwrap();

        vfs.delete_file("/dir").await.unwrap();

        assert_eq!(paths(&vfs.entries().await), vec!["/keep.txt"]);
    }

    #[tokio::test]
    async fn test_delete_errors() {
        let vfs = tree();
        assert!(matches!(
            vfs.delete_file("/nope").await.unwrap_err(),
            VfsError::NotFound(_)
        ));
        assert!(matches!(
            vfs.delete_file("/").await.unwrap_err(),
            VfsError::RootDirectory
        ));
    }

    #[tokio::test]
    async fn test_reset() {
        let vfs = tree();
        vfs.set_file_content("/a/b.txt", "b").await.unwrap();
        assert_eq!(vfs.len().await, 2);

        vfs.reset().await;
        assert!(vfs.is_empty().await);
        assert_eq!(vfs.kind("/").await, Some(NodeKind::Directory));
    }

    #[tokio::test]
    async fn test_entries_report_size() {
        let vfs = tree();
        vfs.set_file_content("/a.txt", "12345").await.unwrap();
        let entries = vfs.entries().await;
        assert_eq!(entries[0].size, 5);
        assert_eq!(entries[0].kind, NodeKind::File);
    }

    #[test]
    fn test_path_normalization() {
        let expected = PathBuf::from("a/b/c.txt");
        assert_eq!(MemoryVirtualFile::normalize("/a/b/c.txt"), expected);
        assert_eq!(MemoryVirtualFile::normalize("a/./b/c.txt"), expected);
        assert_eq!(MemoryVirtualFile::normalize("a/b/../b/c.txt"), expected);
        assert_eq!(MemoryVirtualFile::normalize("/../.."), PathBuf::new());
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent_and_relative(
            segments in prop::collection::vec(prop_oneof!["a", "bb", "\\.", "\\.\\.", ""], 0..8)
        ) {
            let raw = format!("/{}", segments.join("/"));
            let once = MemoryVirtualFile::normalize(&raw);
            let again = MemoryVirtualFile::normalize(&once.to_string_lossy());

            prop_assert_eq!(&once, &again);
            prop_assert!(once
                .components()
                .all(|c| matches!(c, Component::Normal(_))));
        }
    }
}
