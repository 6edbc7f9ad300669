mod builder;
mod checkpoint;
mod config;
mod layout;
mod model;
mod prompt;

pub use builder::{generate_caption, DatasetBuilder, FailedImage, RunSummary};
pub use checkpoint::Checkpoint;
pub use config::{CaptionProvider, DatasetConfig, FailurePolicy};
pub use layout::{image_id_from_file_name, Channel, DatasetLayout, MaterialSet, DIFFUSE_SUFFIX_LEN};
pub use model::create_caption_model;
pub use prompt::{render_prompt, DEFAULT_PROMPT_TEMPLATE};
