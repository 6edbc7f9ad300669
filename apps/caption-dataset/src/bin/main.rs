use caption_dataset::{create_caption_model, DatasetBuilder, DatasetConfig};
use dataset_tracing::{init_tracing_to_file, init_tracing_to_stdout};
use std::path::PathBuf;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = DatasetConfig::load(config_path)?;

    match &config.log_dir {
        Some(log_dir) => init_tracing_to_file(log_dir.clone()),
        None => init_tracing_to_stdout(),
    }

    info!(
        "captioning {} into {} with {} ({})",
        config.dataset_root.display(),
        config.output_dir.display(),
        config.model,
        config.provider.as_ref()
    );

    let captioner = create_caption_model(&config)?;
    let builder = DatasetBuilder::new(config, captioner);
    let summary = builder.run().await?;

    if !summary.failed.is_empty() {
        warn!("{} images failed", summary.failed.len());
        for failed in &summary.failed {
            warn!("{}: {}", failed.image_id, failed.error);
        }
    }

    println!("{}", summary.report_line());

    Ok(())
}
