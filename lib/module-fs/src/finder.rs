//! Recursive enumeration under a descend filter and a report filter.

use crate::matcher::{AcceptAll, PathFilter};
use crate::volume::{DirEntry, EntryKind};
use crate::{Result, VirtualPath};

/// The directory-listing primitive a [`FileFinder`] walks over.
pub trait FinderFs {
    /// The kind of entry at `path`, or `None` if nothing is there.
    fn entry_kind(&self, path: &VirtualPath) -> Result<Option<EntryKind>>;

    /// The children of the directory at `path`, in a stable order.
    fn list(&self, path: &VirtualPath) -> Result<Vec<DirEntry>>;
}

/// Depth-first file enumeration.
///
/// The descend filter decides which subdirectories are entered (it is never
/// consulted for the starting directory itself). The report filter decides
/// which files end up in the result. Results come back in traversal order,
/// which is deterministic for a given listing order.
///
/// ```ignore
/// let pngs = PathMatcher::new("glob:**/*.png")?;
/// let files = FileFinder::new(&fs)
///     .with_report_filter(&pngs)
///     .find(&VirtualPath::root())?;
/// ```
pub struct FileFinder<'a, F: FinderFs + ?Sized> {
    fs: &'a F,
    descend: &'a dyn PathFilter,
    report: &'a dyn PathFilter,
}

impl<'a, F: FinderFs + ?Sized> FileFinder<'a, F> {
    /// A finder that descends everywhere and reports every file.
    pub fn new(fs: &'a F) -> Self {
        FileFinder {
            fs,
            descend: &AcceptAll,
            report: &AcceptAll,
        }
    }

    pub fn with_descend_filter(mut self, filter: &'a dyn PathFilter) -> Self {
        self.descend = filter;
        self
    }

    pub fn with_report_filter(mut self, filter: &'a dyn PathFilter) -> Self {
        self.report = filter;
        self
    }

    /// Collect every matching file under `root`.
    ///
    /// A missing `root` yields an empty result. A `root` that is a file is
    /// returned on its own if the report filter accepts it.
    pub fn find(&self, root: &VirtualPath) -> Result<Vec<VirtualPath>> {
        let mut found = Vec::new();
        match self.fs.entry_kind(root)? {
            None | Some(EntryKind::Symlink) => {}
            Some(EntryKind::File) => {
                if self.report.accept(root) {
                    found.push(root.clone());
                }
            }
            Some(EntryKind::Directory) => self.walk(root, &mut found)?,
        }
        Ok(found)
    }

    fn walk(&self, dir: &VirtualPath, found: &mut Vec<VirtualPath>) -> Result<()> {
        for entry in self.fs.list(dir)? {
            let path = dir.child(&entry.name);
            match entry.kind {
                EntryKind::Directory => {
                    if self.descend.accept(&path) {
                        self.walk(&path, found)?;
                    }
                }
                EntryKind::File => {
                    if self.report.accept(&path) {
                        found.push(path);
                    }
                }
                // directory links may point back up the tree
                EntryKind::Symlink => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::PathMatcher;

    /// An in-memory tree keyed by absolute path; directories map to `None`.
    #[derive(Default)]
    struct Tree(BTreeMap<VirtualPath, Option<&'static str>>);

    impl Tree {
        fn new(files: &[&str]) -> Self {
            let mut tree = Tree::default();
            tree.0.insert(VirtualPath::root(), None);
            for file in files {
                let path = VirtualPath::parse(file);
                let mut parent = path.parent();
                while let Some(dir) = parent {
                    tree.0.insert(dir.clone(), None);
                    parent = dir.parent();
                }
                tree.0.insert(path, Some("file"));
            }
            tree
        }
    }

    impl FinderFs for Tree {
        fn entry_kind(&self, path: &VirtualPath) -> Result<Option<EntryKind>> {
            Ok(self.0.get(path).map(|contents| match contents {
                Some(_) => EntryKind::File,
                None => EntryKind::Directory,
            }))
        }

        fn list(&self, path: &VirtualPath) -> Result<Vec<DirEntry>> {
            Ok(self
                .0
                .iter()
                .filter(|(child, _)| child.parent().as_ref() == Some(path))
                .map(|(child, contents)| DirEntry {
                    name: child.file_name().unwrap().to_string(),
                    kind: if contents.is_some() {
                        EntryKind::File
                    } else {
                        EntryKind::Directory
                    },
                })
                .collect())
        }
    }

    fn paths(found: Vec<VirtualPath>) -> Vec<String> {
        found.into_iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn finds_everything_depth_first() {
        let tree = Tree::new(&["/b.txt", "/a/x.txt", "/a/deep/y.png", "/c/z.txt"]);

        let found = FileFinder::new(&tree).find(&VirtualPath::root()).unwrap();

        assert_eq!(
            paths(found),
            ["/a/deep/y.png", "/a/x.txt", "/b.txt", "/c/z.txt"]
        );
    }

    #[test]
    fn descend_filter_prunes_subtrees() {
        let tree = Tree::new(&["/keep/a.txt", "/skip/b.txt", "/top.txt"]);
        let not_skip = |p: &VirtualPath| p.file_name() != Some("skip");

        let found = FileFinder::new(&tree)
            .with_descend_filter(&not_skip)
            .find(&VirtualPath::root())
            .unwrap();

        assert_eq!(paths(found), ["/keep/a.txt", "/top.txt"]);
    }

    #[test]
    fn descend_filter_is_not_applied_to_the_root() {
        let tree = Tree::new(&["/root/a.txt", "/root/sub/b.txt"]);
        let never = |_: &VirtualPath| false;

        let found = FileFinder::new(&tree)
            .with_descend_filter(&never)
            .find(&VirtualPath::parse("/root"))
            .unwrap();

        assert_eq!(paths(found), ["/root/a.txt"]);
    }

    #[test]
    fn report_filter_selects_files() {
        let tree = Tree::new(&["/a.txt", "/b.png", "/d/c.txt"]);
        let txt = PathMatcher::new("glob:**/*.txt").unwrap();

        let found = FileFinder::new(&tree)
            .with_report_filter(&txt)
            .find(&VirtualPath::root())
            .unwrap();

        assert_eq!(paths(found), ["/a.txt", "/d/c.txt"]);
    }

    #[test]
    fn missing_root_and_file_root() {
        let tree = Tree::new(&["/a.txt"]);
        let png = PathMatcher::new("glob:**/*.png").unwrap();

        assert!(FileFinder::new(&tree)
            .find(&VirtualPath::parse("/nope"))
            .unwrap()
            .is_empty());
        assert_eq!(
            paths(FileFinder::new(&tree).find(&VirtualPath::parse("/a.txt")).unwrap()),
            ["/a.txt"]
        );
        assert!(FileFinder::new(&tree)
            .with_report_filter(&png)
            .find(&VirtualPath::parse("/a.txt"))
            .unwrap()
            .is_empty());
    }
}
