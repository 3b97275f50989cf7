use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use imgchain_handlers::{
    FsStore, ObjectStore, PipelineConfig, RoutingHandler, Stage, StageHandler, StorageLocation,
};
use serde_json::Value;

/// Where to read the invocation payload from.
#[derive(clap::Args, Clone)]
struct EventArgs {
    /// JSON invocation payload; read from stdin when omitted
    #[arg(long)]
    event: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "imgchain")]
#[command(about = "Run imgchain pipeline stages against a local object store")]
#[command(long_about = "\
Run imgchain pipeline stages against a local object store

Buckets are directories under the store root and object keys are paths
inside them. Stages hand off through key prefixes:

  input/ → rotate → stage1/ → resize → stage2/ → grayscale → output/

Each stage command accepts either a storage notification
({\"Records\": [{\"s3\": {\"bucket\": {\"name\": ..}, \"object\": {\"key\": ..}}}]})
or a direct call ({\"image_data\": <base64>} or {\"s3_bucket\", \"s3_key\"})
and prints the resulting metrics record as JSON.

Environment:
  IMGCHAIN_JPEG_QUALITY       output JPEG quality (default 75)
  IMGCHAIN_PYTHON_BUCKET      routing target buckets
  IMGCHAIN_JAVA_BUCKET
  IMGCHAIN_JAVASCRIPT_BUCKET")]
#[command(version)]
struct Cli {
    /// Directory holding one subdirectory per bucket
    #[arg(long, env = "IMGCHAIN_STORE_ROOT", default_value = "imgchain-store", global = true)]
    store_root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rotate an image by 180°
    Rotate(EventArgs),
    /// Scale an image to 150%
    Resize(EventArgs),
    /// Convert an image to grayscale
    Grayscale(EventArgs),
    /// Upload a base64 image to its language's bucket
    Route(EventArgs),
    /// Run every remaining stage for one object, as the notification cascade would
    Chain {
        #[arg(long)]
        bucket: String,
        /// Key under input/, stage1/ or stage2/
        #[arg(long)]
        key: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env();
    let fs_store = FsStore::new(cli.store_root);
    log::debug!("store root {}", fs_store.root().display());
    let store: Arc<dyn ObjectStore> = Arc::new(fs_store);

    match cli.command {
        Command::Rotate(args) => run_stage(Stage::Rotate, &args, store, &config)?,
        Command::Resize(args) => run_stage(Stage::Resize, &args, store, &config)?,
        Command::Grayscale(args) => run_stage(Stage::Grayscale, &args, store, &config)?,
        Command::Route(args) => {
            let event = read_event(&args)?;
            let response = RoutingHandler::new(store, config.buckets).handle(&event);
            print_json(&response.to_value())?;
        }
        Command::Chain { bucket, key } => {
            let run = imgchain_handlers::run_chain(&StorageLocation::new(bucket, key), store, &config)?;
            print_json(&Value::Array(run.records.into_iter().map(Value::Object).collect()))?;
        }
    }

    Ok(())
}

fn run_stage(
    stage: Stage,
    args: &EventArgs,
    store: Arc<dyn ObjectStore>,
    config: &PipelineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let event = read_event(args)?;
    let record = StageHandler::from_config(stage, store, config).handle(&event)?;
    print_json(&Value::Object(record))
}

fn read_event(args: &EventArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = match &args.event {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&raw)?)
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
