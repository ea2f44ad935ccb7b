//! ggufscope CLI - Inspect GGUF model containers.

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use ggufscope::{Container, DecodeConfig, GgufFile, MetadataValue};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// JSON output for `inspect`.
#[derive(Serialize)]
struct InspectOutput {
    file: String,
    version: u32,
    byte_order: String,
    alignment: u64,
    data_region_base: u64,
    tensor_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_tensor_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Vec<MetadataOutput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tensors: Option<Vec<TensorOutput>>,
}

#[derive(Serialize)]
struct MetadataOutput {
    key: String,
    kind: String,
    /// Scalar value; arrays only report their length.
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    len: Option<usize>,
}

#[derive(Serialize)]
struct TensorOutput {
    name: String,
    encoding: String,
    shape: Vec<u64>,
    relative_offset: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
}

/// JSON output for `locate`.
#[derive(Serialize)]
struct LocateOutput {
    file: String,
    tensor: String,
    encoding: String,
    shape: Vec<u64>,
    offset: u64,
    length: u64,
    end: u64,
}

/// Inspect GGUF model containers.
///
/// Decodes the header, metadata and tensor table of a GGUF file and
/// locates or extracts tensor payloads.
#[derive(Parser, Debug)]
#[command(name = "ggufscope")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Reject files whose tensor offsets are not monotonic
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show header, metadata and tensors of a file
    Inspect(InspectArgs),
    /// Print the absolute byte range of a tensor
    Locate(LocateArgs),
    /// Copy the raw bytes of a tensor to a file
    Extract(ExtractArgs),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// GGUF file path
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Skip the metadata table
    #[arg(long)]
    no_metadata: bool,

    /// Skip the tensor table
    #[arg(long)]
    no_tensors: bool,
}

#[derive(Parser, Debug)]
struct LocateArgs {
    /// GGUF file path
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Tensor name (the first match is used)
    #[arg(value_name = "TENSOR")]
    tensor: String,

    /// Output results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct ExtractArgs {
    /// GGUF file path
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Tensor name (the first match is used)
    #[arg(value_name = "TENSOR")]
    tensor: String,

    /// Output file path
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Show progress bar
    #[arg(long)]
    progress: bool,
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

/// Create a progress bar with a standard style.
fn create_progress_bar(len: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}",
    ) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(msg.to_string());
    pb
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 * 1024 {
        format!("{:.2} GiB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    } else if bytes >= 1024 * 1024 {
        format!("{:.2} MiB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.2} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

fn decode_config(strict: bool) -> DecodeConfig {
    let config = DecodeConfig::from_env();
    if strict {
        config.with_verify_offsets(true)
    } else {
        config
    }
}

fn scalar_json(value: &MetadataValue) -> Option<serde_json::Value> {
    let json = match value {
        MetadataValue::UInt8(v) => (*v).into(),
        MetadataValue::Int8(v) => (*v).into(),
        MetadataValue::UInt16(v) => (*v).into(),
        MetadataValue::Int16(v) => (*v).into(),
        MetadataValue::UInt32(v) => (*v).into(),
        MetadataValue::Int32(v) => (*v).into(),
        MetadataValue::UInt64(v) => (*v).into(),
        MetadataValue::Int64(v) => (*v).into(),
        MetadataValue::Float32(v) => f64::from(*v).into(),
        MetadataValue::Float64(v) => (*v).into(),
        MetadataValue::Bool(v) => (*v).into(),
        MetadataValue::String(s) => s.as_str().into(),
        MetadataValue::FileType(t) => t.name().into(),
        MetadataValue::Array(_) => return None,
    };
    Some(json)
}

fn metadata_output(container: &Container) -> Vec<MetadataOutput> {
    container
        .metadata()
        .sorted()
        .into_iter()
        .map(|(key, value)| MetadataOutput {
            key: key.to_string(),
            kind: value.type_name(),
            value: scalar_json(value),
            len: value.as_array().map(|a| a.len()),
        })
        .collect()
}

fn tensor_output(container: &Container) -> Vec<TensorOutput> {
    container
        .tensors()
        .iter()
        .map(|t| TensorOutput {
            name: t.name.clone(),
            encoding: t.encoding.name(),
            shape: t.dimensions.clone(),
            relative_offset: t.relative_offset,
            size: t.byte_size().ok(),
        })
        .collect()
}

fn run_inspect(args: InspectArgs, config: &DecodeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let file = GgufFile::open_path_with_config(&args.input, config)?;
    let container = file.container();
    info!(
        file = %args.input.display(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Decoded header"
    );

    // Unknown encodings have no size; report what is known instead of failing.
    let total_bytes = container.total_tensor_bytes().ok();

    if args.json {
        let output = InspectOutput {
            file: args.input.display().to_string(),
            version: container.version().as_u32(),
            byte_order: container.byte_order().to_string(),
            alignment: container.alignment(),
            data_region_base: container.data_region_base(),
            tensor_count: container.tensor_count(),
            total_tensor_bytes: total_bytes,
            metadata: (!args.no_metadata).then(|| metadata_output(container)),
            tensors: (!args.no_tensors).then(|| tensor_output(container)),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("GGUF file: {}", args.input.display());
    println!(
        "Version: {} ({})",
        container.version(),
        container.byte_order()
    );
    println!("Alignment: {}", container.alignment());
    println!("Data region: offset {}", container.data_region_base());
    println!("Tensors: {}", container.tensor_count());
    match total_bytes {
        Some(total) => println!("Total tensor data: {}", format_size(total)),
        None => println!("Total tensor data: unknown (unsupported encodings)"),
    }

    if !args.no_metadata {
        println!();
        println!("Metadata ({} keys):", container.metadata().len());
        for (key, value) in container.metadata().sorted() {
            match value {
                MetadataValue::String(s) => println!("  {}: {:?}", key, s),
                other => println!("  {}: {}", key, other),
            }
        }
    }

    if !args.no_tensors {
        println!();
        println!("Tensors:");
        for t in container.tensors() {
            println!("  {}: {} [{}]", t.name, t.encoding, t.shape_string());
        }
    }

    Ok(())
}

fn run_locate(args: LocateArgs, config: &DecodeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let file = GgufFile::open_path_with_config(&args.input, config)?;
    let container = file.container();
    let tensor = container.find_tensor(&args.tensor)?;
    let range = container.locator().byte_range(tensor)?;

    if args.json {
        let output = LocateOutput {
            file: args.input.display().to_string(),
            tensor: tensor.name.clone(),
            encoding: tensor.encoding.name(),
            shape: tensor.dimensions.clone(),
            offset: range.offset,
            length: range.length,
            end: range.end(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "{}: {} [{}] bytes {}..{} ({})",
            tensor.name,
            tensor.encoding,
            tensor.shape_string(),
            range.offset,
            range.end(),
            format_size(range.length)
        );
    }

    Ok(())
}

fn run_extract(args: ExtractArgs, config: &DecodeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let mut file = GgufFile::open_path_with_config(&args.input, config)?;
    let range = file.container().byte_range(&args.tensor)?;

    let pb = if args.progress {
        create_progress_bar(range.length, &args.tensor)
    } else {
        ProgressBar::hidden()
    };

    let mut writer = pb.wrap_write(BufWriter::new(File::create(&args.output)?));
    let copied: Result<u64, Box<dyn std::error::Error>> = (|| {
        let written = file.copy_tensor(&args.tensor, &mut writer)?;
        writer.flush()?;
        Ok(written)
    })();
    let written = match copied {
        Ok(written) => written,
        Err(e) => {
            pb.abandon();
            drop(writer);
            // Don't leave a partial payload behind
            if let Err(remove_err) = fs::remove_file(&args.output) {
                warn!(path = %args.output.display(), error = %remove_err, "Failed to remove partial output");
            }
            return Err(e);
        }
    };
    pb.finish_and_clear();

    info!(
        tensor = %args.tensor,
        bytes = written,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Extracted tensor"
    );
    eprintln!(
        "Wrote {} ({}) to: {}",
        args.tensor,
        format_size(written),
        args.output.display()
    );

    Ok(())
}

fn run_completions(args: CompletionsArgs) {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "ggufscope", &mut io::stdout());
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = decode_config(cli.strict);

    let result = match cli.command {
        Commands::Inspect(args) => run_inspect(args, &config),
        Commands::Locate(args) => run_locate(args, &config),
        Commands::Extract(args) => run_extract(args, &config),
        Commands::Completions(args) => {
            run_completions(args);
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
