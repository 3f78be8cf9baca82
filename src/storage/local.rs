//! Local-disk `FileSystem` backend
//!
//! Serves a directory tree rooted at the configured server root. Virtual
//! paths are resolved lexically against the root; `..` never climbs above
//! it, so a session cannot escape the served area.

use std::io;
use std::path::{Component, Path, PathBuf};

use tokio::fs;

use crate::storage::FileSystem;

pub struct LocalFs {
    root: PathBuf,
    cwd: PathBuf,
}

impl LocalFs {
    /// The root must exist; it is canonicalized once so prefix checks and
    /// `pwd` rendering are stable for the session's lifetime.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = std::fs::canonicalize(root)?;
        Ok(Self {
            cwd: root.clone(),
            root,
        })
    }

    /// Resolves a client-supplied path to a real path under the root.
    ///
    /// Absolute virtual paths resolve against the root, relative ones
    /// against the current directory. `..` components pop until the root,
    /// where they are absorbed (so `CDUP` at the top level stays at `/`).
    fn resolve(&self, path: &str) -> PathBuf {
        let mut resolved = if path.starts_with('/') {
            self.root.clone()
        } else {
            self.cwd.clone()
        };
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::ParentDir => {
                    if resolved != self.root {
                        resolved.pop();
                    }
                }
                Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
            }
        }
        resolved
    }

    fn virtual_path(&self, real: &Path) -> String {
        let rel = real.strip_prefix(&self.root).unwrap_or(Path::new(""));
        let joined = rel.to_string_lossy().replace('\\', "/");
        if joined.is_empty() {
            "/".to_string()
        } else {
            format!("/{joined}")
        }
    }
}

impl FileSystem for LocalFs {
    type Reader = fs::File;
    type Writer = fs::File;

    fn pwd(&self) -> String {
        self.virtual_path(&self.cwd)
    }

    async fn cwd(&mut self, path: &str) -> io::Result<()> {
        let target = self.resolve(path);
        let meta = fs::metadata(&target).await?;
        if !meta.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", self.virtual_path(&target)),
            ));
        }
        self.cwd = target;
        Ok(())
    }

    async fn list(&self, path: Option<&str>, long: bool) -> io::Result<Vec<String>> {
        let dir = match path {
            Some(p) => self.resolve(p),
            None => self.cwd.clone(),
        };
        let mut read_dir = fs::read_dir(&dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let meta = entry.metadata().await?;
            names.push((name, meta));
        }
        names.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(names
            .into_iter()
            .map(|(name, meta)| {
                if long {
                    long_entry(&name, &meta)
                } else {
                    name
                }
            })
            .collect())
    }

    async fn retr(&self, path: &str) -> io::Result<fs::File> {
        fs::File::open(self.resolve(path)).await
    }

    async fn stor(&self, path: &str) -> io::Result<fs::File> {
        fs::File::create(self.resolve(path)).await
    }

    async fn dele(&self, path: &str) -> io::Result<()> {
        fs::remove_file(self.resolve(path)).await
    }

    async fn rmd(&self, path: &str) -> io::Result<()> {
        fs::remove_dir(self.resolve(path)).await
    }

    async fn mkd(&self, path: &str) -> io::Result<()> {
        fs::create_dir(self.resolve(path)).await
    }

    async fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        fs::rename(self.resolve(from), self.resolve(to)).await
    }
}

/// `ls -l`-shaped listing line. Timestamps are deliberately fixed; the
/// control plane does not promise mtime fidelity in listings.
fn long_entry(name: &str, meta: &std::fs::Metadata) -> String {
    let (kind, mode) = if meta.is_dir() {
        ('d', "rwxr-xr-x")
    } else {
        ('-', "rw-r--r--")
    };
    format!("{kind}{mode} 1 ftp ftp {:>12} Jan  1 00:00 {name}", meta.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileSystem;
    use std::fs as std_fs;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "oxide-ftp-localfs-{tag}-{}",
            std::process::id()
        ));
        let _ = std_fs::remove_dir_all(&dir);
        std_fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn pwd_tracks_cwd() {
        let root = scratch_dir("pwd");
        std_fs::create_dir(root.join("sub")).unwrap();
        let mut fs = LocalFs::new(&root).unwrap();

        assert_eq!(fs.pwd(), "/");
        fs.cwd("sub").await.unwrap();
        assert_eq!(fs.pwd(), "/sub");
        fs.cwd("..").await.unwrap();
        assert_eq!(fs.pwd(), "/");
    }

    #[tokio::test]
    async fn parent_components_cannot_escape_root() {
        let root = scratch_dir("escape");
        let mut fs = LocalFs::new(&root).unwrap();

        // Climbing above the root is absorbed, not an escape.
        fs.cwd("../../..").await.unwrap();
        assert_eq!(fs.pwd(), "/");
        assert_eq!(fs.resolve("../../etc/passwd"), root.join("etc/passwd"));
    }

    #[tokio::test]
    async fn cwd_to_file_fails() {
        let root = scratch_dir("cwdfile");
        std_fs::write(root.join("plain.txt"), b"x").unwrap();
        let mut fs = LocalFs::new(&root).unwrap();

        assert!(fs.cwd("plain.txt").await.is_err());
        assert!(fs.cwd("missing").await.is_err());
        assert_eq!(fs.pwd(), "/");
    }

    #[tokio::test]
    async fn list_is_sorted_and_long_form_has_details() {
        let root = scratch_dir("list");
        std_fs::write(root.join("b.txt"), b"bb").unwrap();
        std_fs::write(root.join("a.txt"), b"a").unwrap();
        std_fs::create_dir(root.join("docs")).unwrap();
        let fs = LocalFs::new(&root).unwrap();

        let names = fs.list(None, false).await.unwrap();
        assert_eq!(names, vec!["a.txt", "b.txt", "docs"]);

        let long = fs.list(None, true).await.unwrap();
        assert!(long[0].starts_with("-rw-r--r--"));
        assert!(long[0].ends_with("a.txt"));
        assert!(long[2].starts_with("drwxr-xr-x"));
    }

    #[tokio::test]
    async fn rename_missing_source_fails() {
        let root = scratch_dir("rename");
        let fs = LocalFs::new(&root).unwrap();
        assert!(fs.rename("ghost", "elsewhere").await.is_err());

        std_fs::write(root.join("src.txt"), b"data").unwrap();
        fs.rename("src.txt", "dst.txt").await.unwrap();
        assert!(root.join("dst.txt").exists());
        assert!(!root.join("src.txt").exists());
    }

    #[tokio::test]
    async fn mkd_dele_rmd_round_trip() {
        let root = scratch_dir("mut");
        let fs = LocalFs::new(&root).unwrap();

        fs.mkd("inner").await.unwrap();
        assert!(root.join("inner").is_dir());

        std_fs::write(root.join("inner/file"), b"x").unwrap();
        // rmd is remove_dir, not remove_dir_all; a populated directory stays.
        assert!(fs.rmd("inner").await.is_err());
        fs.dele("inner/file").await.unwrap();
        fs.rmd("inner").await.unwrap();
        assert!(!root.join("inner").exists());
    }
}
