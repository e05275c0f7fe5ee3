use ecosort::{
    BuiltinCatalog, Catalog, Classifier, ModelHandle, ModelInfo, ModelManager, RuntimeConfig, TensorLayout,
    DEFAULT_INPUT_SIZE,
};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CatalogPreset {
    /// metal, organic, paper, plastic
    Four,
    /// battery, biological, cardboard, clothes, glass, metal, paper, plastic, shoes, trash
    Ten,
}

#[derive(Parser)]
#[command(author, version, about = "Classify waste photos and print disposal tips", long_about = None)]
struct Args {
    /// Image files to classify
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Local ONNX model file
    #[arg(short, long, conflicts_with = "model_url")]
    model: Option<PathBuf>,

    /// Download the ONNX model from this URL into the cache
    #[arg(long)]
    model_url: Option<String>,

    /// Cache directory name for the downloaded model
    #[arg(long, default_value = "ecosort")]
    model_name: String,

    /// Expected SHA-256 of the downloaded model
    #[arg(long, requires = "model_url")]
    model_sha256: Option<String>,

    /// Force a fresh download of the model file
    #[arg(short, long)]
    fresh: bool,

    /// Built-in label set, in model output order
    #[arg(long, value_enum, default_value_t = CatalogPreset::Ten)]
    catalog: CatalogPreset,

    /// JSON catalog file overriding --catalog
    #[arg(long)]
    catalog_file: Option<PathBuf>,

    /// Square input resolution of the model
    #[arg(long, default_value_t = DEFAULT_INPUT_SIZE)]
    input_size: u32,

    /// Input tensor layout of the model (nhwc or nchw)
    #[arg(long, default_value = "nhwc")]
    layout: TensorLayout,

    /// Intra-op threads for ONNX Runtime (0 lets the runtime decide)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

async fn resolve_model(args: &Args) -> anyhow::Result<PathBuf> {
    if let Some(path) = &args.model {
        return Ok(path.clone());
    }

    let url = args.model_url.as_ref()
        .context("either --model or --model-url must be given")?;
    let mut model = ModelInfo::new(&args.model_name, url);
    if let Some(hash) = &args.model_sha256 {
        model = model.with_hash(hash);
    }

    let manager = ModelManager::new_default()
        .context("failed to create model cache directory")?;
    if args.fresh {
        info!("Fresh download requested - removing any existing model file...");
        manager.remove_download(&model)?;
    }
    let path = manager.ensure_model_downloaded(&model).await
        .with_context(|| format!("failed to fetch model from {}", url))?;
    Ok(path)
}

fn load_catalog(args: &Args) -> anyhow::Result<Catalog> {
    match &args.catalog_file {
        Some(path) => Catalog::from_json_file(path)
            .with_context(|| format!("failed to load catalog {:?}", path)),
        None => Ok(Catalog::builtin(match args.catalog {
            CatalogPreset::Four => BuiltinCatalog::FourClass,
            CatalogPreset::Ten => BuiltinCatalog::TenClass,
        })),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    info!("=== Starting EcoSort ===");
    let start_time = Instant::now();

    let model_path = resolve_model(&args).await?;
    let catalog = load_catalog(&args)?;

    let classifier = Classifier::builder()
        .with_catalog(catalog)
        .with_input_size(args.input_size)
        .with_layout(args.layout)
        .with_runtime_config(RuntimeConfig::with_threads(args.threads))
        .with_handle(ModelHandle::global())
        .with_model_file(model_path)?
        .build()?;

    classifier.load()?;
    info!("=== Model ready (took {:.2?}) ===", start_time.elapsed());

    let classify_start = Instant::now();
    let mut failures = 0;
    for (i, path) in args.images.iter().enumerate() {
        info!("Image {}/{}: {:?}", i + 1, args.images.len(), path);
        if !process_input(&classifier, path, args.json) {
            failures += 1;
        }
    }

    info!("Classification time: {:.2?}", classify_start.elapsed());
    info!("Total time: {:.2?}", start_time.elapsed());

    Ok(if failures == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn process_input(classifier: &Classifier, path: &Path, as_json: bool) -> bool {
    match classifier.classify_path(path) {
        Ok(result) => {
            if as_json {
                println!("{}", json!({ "image": path, "result": result }));
            } else {
                println!("\n{}\n{}", path.display(), result);
            }
            true
        }
        Err(e) => {
            if as_json {
                println!("{}", json!({ "image": path, "error": e.to_string() }));
            } else {
                eprintln!("\nError classifying {}: {}", path.display(), e);
            }
            false
        }
    }
}
