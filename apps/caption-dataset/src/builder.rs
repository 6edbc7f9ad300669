use crate::{
    checkpoint::Checkpoint,
    config::{DatasetConfig, FailurePolicy},
    layout::{image_id_from_file_name, DatasetLayout, MaterialSet},
    prompt::render_prompt,
};
use ai::{ImageCaption, ImageCaptionInput};
use anyhow::Context;
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use svbrdf_stats::{average_value, SvbrdfDescriptors};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedImage {
    pub image_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub processed: usize,
    /// Diffuse entries whose `<id>_diffuse.png` does not exist.
    pub skipped_missing_diffuse: usize,
    /// Already listed in the checkpoint.
    pub skipped_completed: usize,
    pub failed: Vec<FailedImage>,
    /// Processed counts at which a progress line was printed.
    pub progress_reports: Vec<usize>,
    pub elapsed: Duration,
}

impl RunSummary {
    /// `Took 1.5s for 3 images.`, seconds rounded to 3 places with the
    /// shortest form that keeps one decimal.
    pub fn report_line(&self) -> String {
        format!(
            "Took {}s for {} images.",
            format_seconds(self.elapsed.as_secs_f64()),
            self.processed
        )
    }
}

fn format_seconds(secs: f64) -> String {
    let rounded = (secs * 1e3).round_ties_even() / 1e3;
    if rounded.fract() == 0.0 {
        format!("{:.1}", rounded)
    } else {
        format!("{}", rounded)
    }
}

/// The progress line is due whenever the processed count sits on a multiple
/// of the interval, including 0 and entries that were skipped.
pub(crate) fn should_report(processed: usize, interval: usize) -> bool {
    interval > 0 && processed % interval == 0
}

/// Asks the captioner about the diffuse map, with the descriptors rendered
/// into the prompt template.
pub async fn generate_caption<C: ImageCaption + ?Sized>(
    captioner: &C,
    image_path: &Path,
    descriptors: &SvbrdfDescriptors,
    template: &str,
) -> anyhow::Result<String> {
    let input = ImageCaptionInput {
        image_file_paths: vec![image_path.to_path_buf()],
        prompt: Some(render_prompt(template, descriptors)),
    };
    captioner.caption(input).await
}

pub struct DatasetBuilder<C> {
    config: DatasetConfig,
    layout: DatasetLayout,
    captioner: C,
}

impl<C: ImageCaption> DatasetBuilder<C> {
    pub fn new(config: DatasetConfig, captioner: C) -> Self {
        let layout = DatasetLayout::new(&config.dataset_root, &config.output_dir);
        Self {
            config,
            layout,
            captioner,
        }
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    pub fn describe(&self, set: &MaterialSet) -> anyhow::Result<SvbrdfDescriptors> {
        let specular = average_value(&set.specular)
            .with_context(|| format!("specular map of {}", set.image_id))?;
        let roughness = average_value(&set.roughness)
            .with_context(|| format!("roughness map of {}", set.image_id))?;
        let normals = average_value(&set.normals)
            .with_context(|| format!("normals map of {}", set.image_id))?;

        tracing::debug!(
            "{}: specular {}, roughness {}, normals {}",
            set.image_id,
            specular,
            roughness,
            normals
        );

        Ok(SvbrdfDescriptors::from_averages(
            specular,
            roughness,
            normals,
            self.config.range_mode,
        ))
    }

    /// Writes `<id>.txt` once the statistics and the caption are both in hand,
    /// so a failure never leaves a partial file.
    pub async fn process_image(&self, set: &MaterialSet) -> anyhow::Result<PathBuf> {
        let descriptors = self.describe(set)?;
        let caption = generate_caption(
            &self.captioner,
            &set.diffuse,
            &descriptors,
            &self.config.prompt_template,
        )
        .await
        .with_context(|| format!("caption of {}", set.image_id))?;

        let output_path = self.layout.output_file(&set.image_id);
        tokio::fs::write(&output_path, format!("{}\n", caption))
            .await
            .with_context(|| format!("failed to write {}", output_path.display()))?;

        Ok(output_path)
    }

    #[tracing::instrument(name = "DatasetBuilder::run", err(Debug), skip_all, fields(model_id = %self.captioner.model_id()))]
    pub async fn run(&self) -> anyhow::Result<RunSummary> {
        let start_time = Instant::now();
        let mut summary = RunSummary::default();

        if self.config.create_output_dir {
            std::fs::create_dir_all(self.layout.output_dir()).with_context(|| {
                format!(
                    "failed to create output dir {}",
                    self.layout.output_dir().display()
                )
            })?;
        }

        let mut checkpoint = match &self.config.checkpoint {
            Some(path) if self.config.resume => Some(Checkpoint::load(path)?),
            Some(path) => Some(Checkpoint::create(path)?),
            None => None,
        };
        if let Some(checkpoint) = &checkpoint {
            if !checkpoint.is_empty() {
                tracing::info!("resuming, {} images already captioned", checkpoint.len());
            }
        }

        for file_name in self.layout.diffuse_entries()? {
            let image_id = image_id_from_file_name(&file_name);
            let set = self.layout.material_set(image_id);

            if !set.diffuse.is_file() {
                tracing::debug!("no diffuse map for {:?}, skip", file_name);
                summary.skipped_missing_diffuse += 1;
            } else if checkpoint.as_ref().is_some_and(|v| v.contains(image_id)) {
                tracing::debug!("{} already captioned, skip", image_id);
                summary.skipped_completed += 1;
            } else {
                let result = match self.process_image(&set).await {
                    Ok(output_path) => {
                        tracing::debug!("caption written to {}", output_path.display());
                        match checkpoint.as_mut() {
                            Some(checkpoint) => checkpoint.record(image_id),
                            None => Ok(()),
                        }
                    }
                    Err(e) => Err(e),
                };

                match result {
                    Ok(()) => summary.processed += 1,
                    Err(e) => match self.config.on_error {
                        FailurePolicy::Abort => {
                            return Err(e.context(format!("failed to caption image {}", image_id)));
                        }
                        FailurePolicy::Continue => {
                            tracing::error!("failed to caption image {}: {:?}", image_id, e);
                            summary.failed.push(FailedImage {
                                image_id: image_id.to_string(),
                                error: format!("{:#}", e),
                            });
                        }
                    },
                }
            }

            if should_report(summary.processed, self.config.progress_interval) {
                println!("Working on image: {}...", summary.processed);
                summary.progress_reports.push(summary.processed);
            }
        }

        summary.elapsed = start_time.elapsed();
        tracing::debug!(
            "processed {}, skipped {} without diffuse, {} from checkpoint, {} failed",
            summary.processed,
            summary.skipped_missing_diffuse,
            summary.skipped_completed,
            summary.failed.len()
        );

        Ok(summary)
    }
}
