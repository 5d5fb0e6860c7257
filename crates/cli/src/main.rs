mod settings;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use humanmark_core::annotation::domain::annotation_engine::AnnotationEngine;
use humanmark_core::annotation::domain::frame_builder::FrameBuilder;
use humanmark_core::annotation::infrastructure::outline_painter::OutlinePainter;
use humanmark_core::codec::infrastructure::image_buffer_codec::ImageBufferCodec;
use humanmark_core::detection::domain::detector_factory::DetectorFactory;
use humanmark_core::detection::infrastructure::model_detector_factory::ModelDetectorFactory;
use humanmark_core::pipeline::annotate_image_use_case::AnnotateImageUseCase;
use humanmark_core::pipeline::detect_batch_use_case::DetectBatchUseCase;
use humanmark_core::pipeline::infrastructure::sequential_pipeline_executor::SequentialPipelineExecutor;
use humanmark_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
use humanmark_core::pipeline::pipeline_executor::{PipelineConfig, PipelineExecutor};
use humanmark_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use humanmark_core::shared::constants::{FACE_MODEL_NAME, FACE_MODEL_URL, PERSON_MODEL_NAME};
use humanmark_core::shared::model_resolver::{self, ModelSource};
use humanmark_core::storage::domain::blob_store::BlobStore;
use humanmark_core::storage::infrastructure::local_blob_store::LocalBlobStore;

use settings::{Format, Overrides, Settings};

/// Face and person detection with bounding-box annotation over a blob store.
#[derive(Parser, Debug)]
#[command(name = "humanmark")]
struct Cli {
    /// Store path whose objects are annotated.
    input_root: String,

    /// Store path the annotated images are written under.
    output_root: String,

    /// Base directory of the local blob store [default: .].
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Worker threads; 1 runs the sequential executor [default: all cores].
    #[arg(long)]
    workers: Option<usize>,

    /// Images queued ahead of the workers [default: 8].
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Face cascade model (SeetaFace .bin). Downloaded to the cache if omitted.
    #[arg(long)]
    face_model: Option<PathBuf>,

    /// Person detection model (YOLO .onnx). Read from the cache if omitted.
    #[arg(long)]
    person_model: Option<PathBuf>,

    /// Output encoding [default: jpg].
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// JPEG quality, 1-100 [default: 95].
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// JSON settings file; flags given here take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            store_dir: self.store_dir.clone(),
            workers: self.workers,
            queue_capacity: self.queue_capacity,
            face_model: self.face_model.clone(),
            person_model: self.person_model.clone(),
            format: self.format,
            jpeg_quality: self.jpeg_quality,
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref(), cli.overrides())?;
    validate(&cli, &settings)?;

    let factory = build_detector_factory(&settings)?;
    let store: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(&settings.store_dir));
    let task = AnnotateImageUseCase::new(
        Box::new(ImageBufferCodec::new(settings.output_format())),
        FrameBuilder::new(),
        AnnotationEngine::new(
            settings.face,
            settings.person,
            Box::new(OutlinePainter::default()),
        ),
    );

    let mut use_case = DetectBatchUseCase::new(
        store,
        task,
        factory,
        build_executor(&settings),
        Box::new(StdoutPipelineLogger::default()),
    );
    let report = use_case.execute(&cli.input_root, &cli.output_root)?;

    log::info!(
        "Annotated {} of {} images into {}",
        report.written(),
        report.total(),
        settings.store_dir.join(&cli.output_root).display()
    );
    Ok(())
}

fn validate(cli: &Cli, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    if cli.input_root.trim_matches('/').is_empty() {
        return Err("Input root must name a directory under the store".into());
    }
    if !settings.store_dir.is_dir() {
        return Err(format!(
            "Store directory not found: {}",
            settings.store_dir.display()
        )
        .into());
    }
    settings.validate()
}

fn build_detector_factory(
    settings: &Settings,
) -> Result<Box<dyn DetectorFactory>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {FACE_MODEL_NAME}");
    let face_model = model_resolver::resolve(
        &ModelSource {
            name: FACE_MODEL_NAME,
            explicit_path: settings.face_model.as_deref(),
            url: Some(FACE_MODEL_URL),
        },
        Some(Box::new(download_progress)),
    )?;

    log::info!("Resolving model: {PERSON_MODEL_NAME}");
    let person_model = model_resolver::resolve(
        &ModelSource {
            name: PERSON_MODEL_NAME,
            explicit_path: settings.person_model.as_deref(),
            url: None,
        },
        None,
    )?;

    Ok(Box::new(ModelDetectorFactory::new(
        &face_model,
        &person_model,
        settings.person_confidence,
    )?))
}

fn build_executor(settings: &Settings) -> Box<dyn PipelineExecutor> {
    let workers = settings.workers.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });
    if workers <= 1 {
        log::debug!("Using sequential executor");
        return Box::new(SequentialPipelineExecutor::new());
    }
    Box::new(ThreadedPipelineExecutor::new(PipelineConfig {
        workers,
        queue_capacity: settings.queue_capacity,
    }))
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
    if total > 0 && downloaded >= total {
        eprintln!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_positionals_and_flags() {
        let cli = Cli::try_parse_from([
            "humanmark",
            "batch1",
            "results",
            "--workers",
            "3",
            "--format",
            "png",
        ])
        .unwrap();
        assert_eq!(cli.input_root, "batch1");
        assert_eq!(cli.output_root, "results");
        let overrides = cli.overrides();
        assert_eq!(overrides.workers, Some(3));
        assert_eq!(overrides.format, Some(Format::Png));
        assert!(overrides.jpeg_quality.is_none());
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["humanmark", "a", "b", "--format", "gif"]).is_err());
    }

    #[test]
    fn test_validate_requires_existing_store_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from(["humanmark", "in", "out"]).unwrap();
        let settings = Settings {
            store_dir: tmp.path().join("absent"),
            ..Default::default()
        };
        assert!(validate(&cli, &settings).is_err());

        let settings = Settings {
            store_dir: tmp.path().to_path_buf(),
            ..Default::default()
        };
        assert!(validate(&cli, &settings).is_ok());
    }

    #[test]
    fn test_validate_rejects_store_root_as_input() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from(["humanmark", "/", "out"]).unwrap();
        let settings = Settings {
            store_dir: tmp.path().to_path_buf(),
            ..Default::default()
        };
        assert!(validate(&cli, &settings).is_err());
    }

    #[test]
    fn test_missing_person_model_fails_setup() {
        let tmp = tempfile::tempdir().unwrap();
        let face = tmp.path().join("face.bin");
        std::fs::write(&face, b"not a model").unwrap();
        let settings = Settings {
            face_model: Some(face),
            person_model: Some(tmp.path().join("missing.onnx")),
            ..Default::default()
        };
        assert!(build_detector_factory(&settings).is_err());
    }
}
