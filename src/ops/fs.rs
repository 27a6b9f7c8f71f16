//! File system, file clone and snapshot operations

use super::{check, non_empty};
use crate::codec::{encode_optional, encode_string_list, Record};
use crate::connection::Connection;
use crate::domain::{FileSystem, Pool, Snapshot};
use crate::error::{Error, Result};
use crate::job::Completion;
use crate::value::Value;

/// Files a snapshot revert applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertScope<'a> {
    /// Revert the whole file system
    All,
    /// Revert `files`, optionally restoring each to the matching entry of
    /// `restore_files` instead of its original path
    Files {
        files: &'a [String],
        restore_files: Option<&'a [String]>,
    },
}

impl Connection {
    pub async fn fs(&self) -> Result<Vec<FileSystem>> {
        self.tracked(self.list("fs", [])).await
    }

    /// Create a file system of `size_bytes` in `pool`
    pub async fn fs_create(
        &self,
        pool: &Pool,
        name: &str,
        size_bytes: u64,
    ) -> Result<Completion<FileSystem>> {
        self.tracked(async {
            check(pool)?;
            non_empty("file system name", name)?;
            if size_bytes == 0 {
                return Err(Error::argument("file system size must be greater than zero"));
            }
            self.mutate(
                "fs_create",
                [
                    ("pool", pool.encode()),
                    ("name", Value::from(name)),
                    ("size_bytes", Value::from(size_bytes)),
                ],
            )
            .await
        })
        .await
    }

    pub async fn fs_delete(&self, fs: &FileSystem) -> Result<Completion<()>> {
        self.tracked(async {
            check(fs)?;
            self.mutate("fs_delete", [("fs", fs.encode())]).await
        })
        .await
    }

    pub async fn fs_resize(
        &self,
        fs: &FileSystem,
        new_size_bytes: u64,
    ) -> Result<Completion<FileSystem>> {
        self.tracked(async {
            check(fs)?;
            if new_size_bytes == 0 {
                return Err(Error::argument("new size must be greater than zero"));
            }
            self.mutate(
                "fs_resize",
                [
                    ("fs", fs.encode()),
                    ("new_size_bytes", Value::from(new_size_bytes)),
                ],
            )
            .await
        })
        .await
    }

    /// Clone `source` into a new file system, optionally from `snapshot`
    pub async fn fs_clone(
        &self,
        source: &FileSystem,
        dest_name: &str,
        snapshot: Option<&Snapshot>,
    ) -> Result<Completion<FileSystem>> {
        self.tracked(async {
            check(source)?;
            if let Some(ss) = snapshot {
                check(ss)?;
            }
            non_empty("clone name", dest_name)?;
            self.mutate(
                "fs_clone",
                [
                    ("src_fs", source.encode()),
                    ("dest_fs_name", Value::from(dest_name)),
                    ("snapshot", encode_optional(snapshot)),
                ],
            )
            .await
        })
        .await
    }

    /// Clone a single file inside `fs`
    pub async fn file_clone(
        &self,
        fs: &FileSystem,
        src_file_name: &str,
        dest_file_name: &str,
        snapshot: Option<&Snapshot>,
    ) -> Result<Completion<()>> {
        self.tracked(async {
            check(fs)?;
            if let Some(ss) = snapshot {
                check(ss)?;
            }
            non_empty("source file name", src_file_name)?;
            non_empty("destination file name", dest_file_name)?;
            self.mutate(
                "file_clone",
                [
                    ("fs", fs.encode()),
                    ("src_file_name", Value::from(src_file_name)),
                    ("dest_file_name", Value::from(dest_file_name)),
                    ("snapshot", encode_optional(snapshot)),
                ],
            )
            .await
        })
        .await
    }

    /// Whether snapshots or clones depend on `fs`, or on `files` within it
    pub async fn fs_child_dependency(
        &self,
        fs: &FileSystem,
        files: Option<&[String]>,
    ) -> Result<bool> {
        self.tracked(async {
            check(fs)?;
            self.ask(
                "fs_child_dependency",
                [("fs", fs.encode()), ("files", encode_string_list(files))],
            )
            .await
        })
        .await
    }

    pub async fn fs_child_dependency_rm(
        &self,
        fs: &FileSystem,
        files: Option<&[String]>,
    ) -> Result<Completion<()>> {
        self.tracked(async {
            check(fs)?;
            self.mutate(
                "fs_child_dependency_rm",
                [("fs", fs.encode()), ("files", encode_string_list(files))],
            )
            .await
        })
        .await
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    pub async fn fs_snapshots(&self, fs: &FileSystem) -> Result<Vec<Snapshot>> {
        self.tracked(async {
            check(fs)?;
            self.list("fs_snapshots", [("fs", fs.encode())]).await
        })
        .await
    }

    /// Snapshot `fs`, or only `files` within it
    pub async fn fs_snapshot_create(
        &self,
        fs: &FileSystem,
        name: &str,
        files: Option<&[String]>,
    ) -> Result<Completion<Snapshot>> {
        self.tracked(async {
            check(fs)?;
            non_empty("snapshot name", name)?;
            self.mutate(
                "fs_snapshot_create",
                [
                    ("fs", fs.encode()),
                    ("snapshot_name", Value::from(name)),
                    ("files", encode_string_list(files)),
                ],
            )
            .await
        })
        .await
    }

    pub async fn fs_snapshot_delete(
        &self,
        fs: &FileSystem,
        snapshot: &Snapshot,
    ) -> Result<Completion<()>> {
        self.tracked(async {
            check(fs)?;
            check(snapshot)?;
            self.mutate(
                "fs_snapshot_delete",
                [("fs", fs.encode()), ("snapshot", snapshot.encode())],
            )
            .await
        })
        .await
    }

    /// Roll `fs` back to `snapshot`
    pub async fn fs_snapshot_revert(
        &self,
        fs: &FileSystem,
        snapshot: &Snapshot,
        scope: RevertScope<'_>,
    ) -> Result<Completion<()>> {
        self.tracked(async {
            check(fs)?;
            check(snapshot)?;
            let (files, restore_files, all_files) = match scope {
                RevertScope::All => (None, None, true),
                RevertScope::Files {
                    files,
                    restore_files,
                } => {
                    if files.is_empty() {
                        return Err(Error::argument("file list must not be empty"));
                    }
                    if restore_files.is_some_and(|r| r.len() != files.len()) {
                        return Err(Error::argument(
                            "restore_files must have one entry per reverted file",
                        ));
                    }
                    (Some(files), restore_files, false)
                }
            };
            self.mutate(
                "fs_snapshot_revert",
                [
                    ("fs", fs.encode()),
                    ("snapshot", snapshot.encode()),
                    ("files", encode_string_list(files)),
                    ("restore_files", encode_string_list(restore_files)),
                    ("all_files", Value::from(all_files)),
                ],
            )
            .await
        })
        .await
    }
}
