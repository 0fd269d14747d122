use std::sync::Arc;
use std::path::Path;
use std::{fs, fmt};

use rustc_hash::FxHashMap;

use crate::error::Result;

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct EntryId(pub(crate) usize);

/// A snapshot of a directory tree, indexed by path.
///
/// Jobs look rendered files up here instead of probing the file system once
/// per sitemap entry, and use the parent/child links to enumerate folders.
#[derive(Debug)]
pub struct FsTree {
    entries: Vec<Entry>,
    map: FxHashMap<Arc<Path>, EntryId>,
}

#[derive(Debug)]
pub struct Entry {
    pub id: EntryId,
    pub path: Arc<Path>,
    pub file_name: String,
    pub file_type: fs::FileType,
    pub parent: Option<EntryId>,
    pub children: Vec<EntryId>,
}

#[derive(Default, Debug)]
struct FsMetadata(Option<fs::Metadata>);

impl FsTree {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            entries: vec![],
        }
    }

    /// Walks the entire tree under `root`.
    pub fn build<P: AsRef<Path>>(root: P) -> Result<Self> {
        Self::build_to_depth(root, None)
    }

    /// Walks the tree under `root`, descending at most `max_depth` levels
    /// when `max_depth` is `Some`. The root itself is depth `0`.
    pub fn build_to_depth<P>(root: P, max_depth: Option<usize>) -> Result<Self>
        where P: AsRef<Path>
    {
        use jwalk::WalkDirGeneric;

        let root = root.as_ref();
        let mut walker = WalkDirGeneric::<FsMetadata>::new(root)
            .follow_links(true)
            .sort(true)
            .process_read_dir(|_, _, _, entries| {
                entries.iter_mut()
                    .filter_map(|e| e.as_mut().ok())
                    .for_each(|e| e.client_state = FsMetadata(e.metadata().ok()))
            });

        if let Some(depth) = max_depth {
            walker = walker.max_depth(depth);
        }

        let mut tree = FsTree::new();
        let entries = walker.into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.depth == 0 || e.client_state.0.is_some());

        for entry in entries {
            tree.insert(entry);
        }

        if tree.entries.first().map_or(true, |root| !root.file_type.is_dir()) {
            return err! {
                "site directory does not exist or is not a directory",
                "search root" => root.display(),
            }
        }

        Ok(tree)
    }

    pub fn root_id(&self) -> EntryId {
        EntryId(0)
    }

    /// Looks up `path` relative to `root`, or to the tree root when `root`
    /// is `None`.
    #[inline]
    pub fn get<R, P>(&self, root: R, path: P) -> Option<&Entry>
        where R: Into<Option<EntryId>>, P: AsRef<Path>
    {
        self.get_id(root, path).map(|id| &self[id])
    }

    /// Like [`FsTree::get_id()`] but only returns regular files.
    pub fn get_file_id<R, P>(&self, root: R, path: P) -> Option<EntryId>
        where R: Into<Option<EntryId>>, P: AsRef<Path>
    {
        let id = self.get_id(root, path)?;
        self[id].file_type.is_file().then_some(id)
    }

    pub fn get_id<R, P>(&self, root: R, path: P) -> Option<EntryId>
        where R: Into<Option<EntryId>>, P: AsRef<Path>
    {
        let root = root.into().unwrap_or(self.root_id());
        let full_path = self[root].path.join(path.as_ref());
        self.map.get(&*full_path).cloned()
    }

    /// The direct children of `parent` that are directories, in name order.
    pub fn subdirectories(&self, parent: EntryId) -> impl Iterator<Item = &Entry> {
        self[parent].children.iter()
            .map(move |&id| &self[id])
            .filter(|e| e.file_type.is_dir())
    }

    fn insert(&mut self, entry: jwalk::DirEntry<FsMetadata>) -> EntryId {
        let file_type = match entry.client_state.0 {
            Some(ref metadata) => metadata.file_type(),
            None => entry.file_type,
        };

        let entry = Entry {
            id: EntryId(self.entries.len()),
            path: Arc::from(entry.path().into_boxed_path()),
            file_type,
            file_name: entry.file_name.to_string_lossy().into_owned(),
            parent: match entry.depth {
                0 => None,
                _ => self.map.get(&*entry.parent_path).cloned(),
            },
            children: vec![],
        };

        self.map.insert(entry.path.clone(), entry.id);
        if let Some(parent) = entry.parent {
            self.entries[parent.0].children.push(entry.id);
        }

        let id = entry.id;
        self.entries.push(entry);
        id
    }
}

impl jwalk::ClientState for FsMetadata {
    type ReadDirState = ();
    type DirEntryState = Self;
}

impl std::ops::Index<EntryId> for FsTree {
    type Output = Entry;

    fn index(&self, index: EntryId) -> &Self::Output {
        &self.entries[index.0]
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
