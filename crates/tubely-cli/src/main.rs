//! Tubely CLI: run the upload pipelines against the configured storage.
//!
//! Storage and tool settings come from the environment (see `.env`). The
//! record store is in-process, so each `upload`/`thumbnail` run creates a
//! draft record owned by a fresh user before uploading into it.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tubely_cli::{guess_content_type, init_tracing};
use tubely_core::{AppError, Config, InMemoryVideoRepository, StorageObject, VideoRepository};
use tubely_processing::upload::UploadBody;
use tubely_processing::{
    classify, FastStartNormalizer, FfmpegNormalizer, FfprobeProber, MediaProber, RunScope,
    ThumbnailUploadPipeline, ThumbnailUploadRequest, UploadPipelineConfig, VideoUploadPipeline,
    VideoUploadRequest,
};
use tubely_storage::{create_assets_storage, create_storage, LocatorResolver, ResolverConfig};
use tracing::info;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "tubely", about = "Tubely video upload CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe a video and report its orientation
    Probe {
        /// Path to the video file
        file: PathBuf,
    },
    /// Produce a fast-start copy of a video
    Normalize {
        /// Path to the video file
        file: PathBuf,
        /// Where to write the normalized MP4
        #[arg(long)]
        output: PathBuf,
    },
    /// Upload a video through the full pipeline
    Upload {
        /// Path to the video file
        file: PathBuf,
        /// Declared content type (guessed from the extension by default)
        #[arg(long)]
        content_type: Option<String>,
        /// Title of the draft record
        #[arg(long, default_value = "Untitled")]
        title: String,
    },
    /// Upload a PNG or JPEG thumbnail
    Thumbnail {
        /// Path to the image file
        file: PathBuf,
        /// Declared content type (guessed from the extension by default)
        #[arg(long)]
        content_type: Option<String>,
        /// Title of the draft record
        #[arg(long, default_value = "Untitled")]
        title: String,
    },
    /// Resolve a stored object to a client URL
    Resolve {
        /// Bucket name
        bucket: String,
        /// Storage key
        key: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

async fn open_body(file: &Path) -> anyhow::Result<UploadBody> {
    let handle = tokio::fs::File::open(file)
        .await
        .with_context(|| format!("Failed to open {}", file.display()))?;
    Ok(Box::new(handle))
}

/// Draft record owned by a fresh user id
async fn draft_record(
    repository: &InMemoryVideoRepository,
    title: &str,
) -> anyhow::Result<tubely_core::VideoRecord> {
    let record = repository
        .create_video(Uuid::new_v4(), title, "Uploaded from the command line")
        .await?;
    Ok(record)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Probe { file } => {
            let config = Config::load_env()?;
            let prober = FfprobeProber::new(config.ffprobe_path())?;
            let probe = prober.probe(&file).await;
            print_json(&serde_json::json!({
                "probe": probe,
                "orientation": classify(&probe),
            }))?;
        }
        Commands::Normalize { file, output } => {
            let config = Config::load_env()?;
            let normalizer =
                FfmpegNormalizer::new(config.ffmpeg_path(), config.max_concurrent_ffmpeg())?;

            // Work on a copy so the tool's sibling outputs land in the run directory.
            let scope = RunScope::new(&config.upload_temp_dir())
                .context("Failed to create run directory")?;
            let input = scope.path().join("input.mp4");
            tokio::fs::copy(&file, &input)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let outcome = normalizer.normalize(&input).await;
            let (normalized, fast_start) = outcome
                .output()
                .map_err(|diagnostic| anyhow::anyhow!("Normalization failed: {}", diagnostic))?;
            tokio::fs::copy(normalized, &output)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            scope.close().context("Failed to remove run directory")?;
            info!(
                input = %file.display(),
                output = %output.display(),
                fast_start = ?fast_start,
                "Normalized video"
            );

            print_json(&serde_json::json!({
                "fast_start": fast_start,
                "output": output,
            }))?;
        }
        Commands::Upload {
            file,
            content_type,
            title,
        } => {
            let config = Config::from_env()?;
            let storage = create_storage(&config).await?;
            let repository = Arc::new(InMemoryVideoRepository::new());
            let record = draft_record(&repository, &title).await?;

            let pipeline = VideoUploadPipeline::new(
                repository.clone(),
                storage.clone(),
                Arc::new(FfprobeProber::new(config.ffprobe_path())?),
                Arc::new(FfmpegNormalizer::new(
                    config.ffmpeg_path(),
                    config.max_concurrent_ffmpeg(),
                )?),
                UploadPipelineConfig::from(&config),
            );

            let content_type =
                content_type.unwrap_or_else(|| guess_content_type(&file).to_string());
            let outcome = pipeline
                .run(VideoUploadRequest {
                    user_id: record.owner_id,
                    video_id: record.id,
                    content_type,
                    filename: file.file_name().map(|n| n.to_string_lossy().into_owned()),
                    body: open_body(&file).await?,
                })
                .await
                .map_err(AppError::from)
                .context("Video upload failed")?;

            let resolver = LocatorResolver::new(storage, ResolverConfig::from(&config));
            let view = resolver
                .present(&outcome.record)
                .await
                .map_err(AppError::from)?;
            info!(
                video_id = %outcome.record.id,
                bucket = %outcome.object.bucket,
                key = %outcome.object.key,
                url_mode = %resolver.mode(),
                "Video available"
            );

            print_json(&serde_json::json!({
                "upload": outcome,
                "video": view,
            }))?;
        }
        Commands::Thumbnail {
            file,
            content_type,
            title,
        } => {
            let config = Config::from_env()?;
            let storage = create_storage(&config).await?;
            let assets = create_assets_storage(&config).await?;
            let repository = Arc::new(InMemoryVideoRepository::new());
            let record = draft_record(&repository, &title).await?;

            let pipeline = ThumbnailUploadPipeline::new(
                repository.clone(),
                assets.clone(),
                UploadPipelineConfig::from(&config),
            );

            let content_type =
                content_type.unwrap_or_else(|| guess_content_type(&file).to_string());
            let outcome = pipeline
                .run(ThumbnailUploadRequest {
                    user_id: record.owner_id,
                    video_id: record.id,
                    content_type,
                    body: open_body(&file).await?,
                })
                .await
                .map_err(AppError::from)
                .context("Thumbnail upload failed")?;

            let resolver =
                LocatorResolver::new(storage, ResolverConfig::from(&config)).with_assets(assets);
            let view = resolver
                .present(&outcome.record)
                .await
                .map_err(AppError::from)?;
            info!(
                video_id = %outcome.record.id,
                bucket = %outcome.object.bucket,
                key = %outcome.object.key,
                "Thumbnail available"
            );

            print_json(&serde_json::json!({
                "upload": outcome,
                "video": view,
            }))?;
        }
        Commands::Resolve { bucket, key } => {
            let config = Config::from_env()?;
            let storage = create_storage(&config).await?;
            let resolver = LocatorResolver::new(storage, ResolverConfig::from(&config));

            let object = StorageObject::new(bucket, key, tubely_core::constants::VIDEO_MEDIA_TYPE);
            let url = resolver.resolve(&object).await.map_err(AppError::from)?;

            print_json(&serde_json::json!({
                "mode": resolver.mode().to_string(),
                "bucket": object.bucket,
                "key": object.key,
                "url": url,
            }))?;
        }
    }

    Ok(())
}
