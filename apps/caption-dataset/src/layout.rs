use anyhow::Context;
use std::path::{Path, PathBuf};
use strum_macros::AsRefStr;

/// Length of `_diffuse.png`, dropped from diffuse file names to get the id.
pub const DIFFUSE_SUFFIX_LEN: usize = 12;

/// One texture map of a material. The name is both the directory and the
/// file name suffix.
#[derive(AsRefStr, strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    Diffuse,
    Normals,
    Roughness,
    Specular,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialSet {
    pub image_id: String,
    pub diffuse: PathBuf,
    pub specular: PathBuf,
    pub roughness: PathBuf,
    pub normals: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DatasetLayout {
    root: PathBuf,
    output_dir: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn channel_dir(&self, channel: Channel) -> PathBuf {
        self.root.join(channel.as_ref())
    }

    pub fn channel_file(&self, image_id: &str, channel: Channel) -> PathBuf {
        self.channel_dir(channel)
            .join(format!("{}_{}.png", image_id, channel))
    }

    pub fn material_set(&self, image_id: &str) -> MaterialSet {
        MaterialSet {
            image_id: image_id.to_string(),
            diffuse: self.channel_file(image_id, Channel::Diffuse),
            specular: self.channel_file(image_id, Channel::Specular),
            roughness: self.channel_file(image_id, Channel::Roughness),
            normals: self.channel_file(image_id, Channel::Normals),
        }
    }

    pub fn output_file(&self, image_id: &str) -> PathBuf {
        self.output_dir.join(format!("{}.txt", image_id))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File names in the diffuse directory, sorted.
    pub fn diffuse_entries(&self) -> anyhow::Result<Vec<String>> {
        let diffuse_dir = self.channel_dir(Channel::Diffuse);
        let mut entries = vec![];

        for entry in std::fs::read_dir(&diffuse_dir)
            .with_context(|| format!("failed to list {}", diffuse_dir.display()))?
        {
            let entry = entry?;
            match entry.file_name().into_string() {
                Ok(name) => entries.push(name),
                Err(name) => {
                    tracing::warn!("skip non utf-8 file name: {:?}", name);
                }
            }
        }

        entries.sort();
        Ok(entries)
    }
}

/// Drops the last [`DIFFUSE_SUFFIX_LEN`] characters, names that short give "".
pub fn image_id_from_file_name(file_name: &str) -> &str {
    let cut = file_name
        .char_indices()
        .rev()
        .nth(DIFFUSE_SUFFIX_LEN - 1)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    &file_name[..cut]
}
