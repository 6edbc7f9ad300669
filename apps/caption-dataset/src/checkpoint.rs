use anyhow::Context;
use std::{
    collections::HashSet,
    io::Write,
    path::{Path, PathBuf},
};

/// Ids of images whose caption has been written, one per line on disk.
#[derive(Debug)]
pub struct Checkpoint {
    path: PathBuf,
    completed: HashSet<String>,
}

impl Checkpoint {
    /// Reads an existing checkpoint, a missing file is an empty one.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let completed = match std::fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read checkpoint {}", path.display()))
            }
        };

        Ok(Self { path, completed })
    }

    /// Starts over, truncating whatever the file held.
    pub fn create(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        std::fs::File::create(&path)
            .with_context(|| format!("failed to create checkpoint {}", path.display()))?;

        Ok(Self {
            path,
            completed: HashSet::new(),
        })
    }

    pub fn contains(&self, image_id: &str) -> bool {
        self.completed.contains(image_id)
    }

    pub fn record(&mut self, image_id: &str) -> anyhow::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open checkpoint {}", self.path.display()))?;
        writeln!(file, "{}", image_id)?;
        self.completed.insert(image_id.to_string());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::load(dir.path().join("done.txt")).unwrap();
        assert!(checkpoint.is_empty());
    }

    #[test]
    fn test_record_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("done.txt");

        let mut checkpoint = Checkpoint::load(&path).unwrap();
        checkpoint.record("img1").unwrap();
        checkpoint.record("img2").unwrap();
        assert!(checkpoint.contains("img1"));

        let reloaded = Checkpoint::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("img2"));
        assert!(!reloaded.contains("img3"));
    }

    #[test]
    fn test_create_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("done.txt");
        std::fs::write(&path, "img1\n\n  img2 \n").unwrap();
        assert_eq!(Checkpoint::load(&path).unwrap().len(), 2);

        let checkpoint = Checkpoint::create(&path).unwrap();
        assert!(checkpoint.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
