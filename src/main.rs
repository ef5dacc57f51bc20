use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use gpipe_client::{Client, ClientConfig};
use gpipe_definition::Pipeline;
use gpipe_encoding::{WireFormat, encode, to_json_string_pretty};

/// gpipe - Build and submit pipeline definitions to an orchestrator
#[derive(Parser)]
#[command(name = "gpipe")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Print the wire document for a definition file
  Encode {
    /// Path to the pipeline definition file (JSON)
    pipeline_file: PathBuf,

    /// Wire format: json or yaml
    #[arg(long, default_value = "json")]
    format: WireFormat,

    /// Indent the JSON document
    #[arg(long)]
    pretty: bool,
  },

  /// Submit a pipeline to the orchestrator and print the response
  Run {
    /// Path to the pipeline definition file (JSON)
    pipeline_file: PathBuf,

    /// Orchestrator base URL
    #[arg(long, env = "GPIPE_BASE_URL")]
    base_url: Option<String>,

    /// Bearer key sent with the request
    #[arg(long, env = "GPIPE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Wire format: json or yaml
    #[arg(long, default_value = "json")]
    format: WireFormat,

    /// Request timeout in milliseconds
    #[arg(long, env = "GPIPE_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Path to the config file (default: ~/.gpipe/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reject duplicate or empty step ids before sending
    #[arg(long)]
    validate: bool,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(io::stderr)
    .init();

  match cli.command {
    Some(Commands::Encode {
      pipeline_file,
      format,
      pretty,
    }) => {
      encode_pipeline(&pipeline_file, format, pretty)?;
    }
    Some(Commands::Run {
      pipeline_file,
      base_url,
      api_key,
      format,
      timeout_ms,
      config,
      validate,
    }) => {
      let flags = ClientConfig {
        base_url,
        api_key,
        timeout_ms,
      };
      run_pipeline(pipeline_file, format, flags, config, validate)?;
    }
    None => {
      println!("gpipe - use --help to see available commands");
    }
  }

  Ok(())
}

fn encode_pipeline(pipeline_file: &Path, format: WireFormat, pretty: bool) -> Result<()> {
  let pipeline = load_pipeline(pipeline_file)?;

  let document = match format {
    WireFormat::Json if pretty => to_json_string_pretty(&pipeline),
    _ => encode(&pipeline, format),
  }
  .context("failed to encode pipeline")?;

  // The text form already ends with a newline.
  if document.ends_with('\n') {
    print!("{}", document);
  } else {
    println!("{}", document);
  }

  Ok(())
}

fn run_pipeline(
  pipeline_file: PathBuf,
  format: WireFormat,
  flags: ClientConfig,
  config_file: Option<PathBuf>,
  validate: bool,
) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async {
    run_pipeline_async(pipeline_file, format, flags, config_file, validate).await
  })
}

async fn run_pipeline_async(
  pipeline_file: PathBuf,
  format: WireFormat,
  flags: ClientConfig,
  config_file: Option<PathBuf>,
  validate: bool,
) -> Result<()> {
  let pipeline = load_pipeline(&pipeline_file)?;
  if validate {
    pipeline.validate().context("invalid pipeline")?;
  }

  // Flags and environment win over the config file.
  let file_config = match config_file.or_else(default_config_path) {
    Some(path) => ClientConfig::load(&path).context("failed to load config file")?,
    None => ClientConfig::default(),
  };
  let config = flags.or(file_config);

  let client = Client::from_config(&config).context("failed to create client")?;
  eprintln!(
    "Submitting {} step(s) to {}",
    pipeline.len(),
    client.jobs_url()
  );

  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      on_interrupt.cancel();
    }
  });

  let response = client
    .run_with_cancel(&pipeline, format, cancel)
    .await
    .context("pipeline submission failed")?;

  println!("{}", serde_json::to_string_pretty(&response)?);

  Ok(())
}

/// Read a definition file, taking the input from stdin when it is piped.
fn load_pipeline(pipeline_file: &Path) -> Result<Pipeline> {
  let content = std::fs::read_to_string(pipeline_file)
    .with_context(|| format!("failed to read pipeline file: {}", pipeline_file.display()))?;

  let mut pipeline: Pipeline = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse pipeline file: {}", pipeline_file.display()))?;

  if let Some(input) = read_input_from_stdin()? {
    pipeline = pipeline
      .try_with_input(&input)
      .context("failed to use stdin as pipeline input")?;
  }

  Ok(pipeline)
}

fn read_input_from_stdin() -> Result<Option<serde_json::Value>> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    return Ok(None);
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read input from stdin")?;

  if input.trim().is_empty() {
    Ok(None)
  } else {
    serde_json::from_str(&input)
      .map(Some)
      .context("failed to parse input JSON from stdin")
  }
}

fn default_config_path() -> Option<PathBuf> {
  dirs::home_dir().map(|home| home.join(".gpipe").join("config.json"))
}
