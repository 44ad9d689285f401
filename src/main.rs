//! Command-line interface for dam-stream
//!
//! # Usage Examples
//!
//! ```bash
//! # Stream an original asset to stdout
//! dam-stream --base-url https://dam.example.com/files/ \
//!   cat dam://images/photo.jpg > photo.jpg
//!
//! # Report the size of a derivative
//! dam-stream --config dam.toml stat dam://styles/thumb/photo.jpg
//!
//! # Show the public URL of an asset
//! dam-stream --config dam.toml url dam://images/photo.jpg
//!
//! # Upload a local file to the DAM
//! dam-stream --config dam.toml upload ./report.pdf
//! ```
//!
//! Logging is controlled with `RUST_LOG` (e.g. `RUST_LOG=dam_remote_file=debug`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use dam_stream::remote::RemoteFs;
use dam_stream::upload::{DamUploader, FileRecord, LocalFileRecord};
use dam_stream::DamOpts;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "dam-stream")]
#[command(about = "Read DAM assets through a virtual URI scheme and upload local files")]
#[command(long_about = None)]
struct Cli {
    /// DAM connection options
    #[command(flatten)]
    opts: DamOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the content of an asset to stdout
    Cat {
        /// Asset URI (e.g. dam://images/photo.jpg)
        uri: String,
    },
    /// Print the size of an asset in bytes
    Stat {
        /// Asset URI
        uri: String,
    },
    /// Print the remote URL an asset URI translates to
    Url {
        /// Asset URI
        uri: String,
    },
    /// Upload a local file and print the URI of the remote copy
    Upload {
        /// Local file to upload
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.opts.resolve().await?;
    let client = Arc::new(config.http_client()?);

    match cli.command {
        Commands::Cat { uri } => {
            let fs = RemoteFs::new(client, config.translator());
            let mut stream = fs
                .open(&uri, "r")
                .await
                .with_context(|| format!("Failed to open {uri}"))?;

            let mut stdout = std::io::stdout().lock();
            let copied = std::io::copy(&mut stream, &mut stdout)
                .with_context(|| format!("Failed to read {uri}"))?;
            stream.close();
            tracing::debug!("Wrote {} bytes of {}", copied, uri);
        }
        Commands::Stat { uri } => {
            let fs = RemoteFs::new(client, config.translator());
            let stat = fs
                .url_stat(&uri)
                .await
                .with_context(|| format!("Failed to stat {uri}"))?;
            println!("{}", stat.size);
        }
        Commands::Url { uri } => {
            let translator = config.translator();
            let url = translator
                .translate(&uri)
                .with_context(|| format!("Failed to translate {uri}"))?;
            println!("{url}");
        }
        Commands::Upload { path } => {
            let endpoint = config
                .upload_endpoint
                .clone()
                .context("No upload endpoint configured (set --upload-endpoint or DAM_UPLOAD_ENDPOINT)")?;
            let uploader = DamUploader::new(client, endpoint, Arc::new(config.translator()));

            let mut record = LocalFileRecord::new(&path)?;
            let uri = uploader
                .upload(&mut record)
                .await
                .with_context(|| format!("Failed to upload {}", path.display()))?;

            tracing::info!("{} now points at {}", path.display(), record.location());
            println!("{uri}");
        }
    }

    Ok(())
}
