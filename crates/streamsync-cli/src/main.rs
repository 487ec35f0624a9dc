//! streamsync CLI: operator commands for videos on the streaming provider.
//!
//! Reads STREAM_API_TOKEN and STREAM_ACCOUNT_ID. Commands that touch local
//! metadata records also need DATABASE_URL; `list --local` needs only that.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use streamsync_cli::{
    format_metadata_table, format_totals, format_video_table, init_tracing, report_error,
    OutputFormat,
};
use streamsync_client::{StreamGateway, VideoGateway};
use streamsync_core::hooks::AssetLibrary;
use streamsync_core::models::{RemoteVideo, RemoteVideoId, RemoteVideoTotals};
use streamsync_core::{StreamConfig, SyncError};
use streamsync_db::{connect, run_migrations, MetadataRepository, PostgresMetadataRepository};
use streamsync_handler::{AssetHandler, BatchEvent, LocalAssetLibrary};

#[derive(Parser)]
#[command(name = "streamsync", about = "Manage videos synced to the streaming provider")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all uploaded videos for the account
    List {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// List the local metadata records instead of asking the provider
        #[arg(long)]
        local: bool,
    },
    /// Show the provider record of one video
    Show {
        /// Provider video identifier
        id: String,
    },
    /// Delete a video from the provider and drop its local record
    Delete {
        /// Provider video identifier
        id: String,
    },
    /// Upload every video in a directory that is not already present
    UploadAll {
        /// Directory containing the video files
        #[arg(long, value_name = "DIR")]
        dir: PathBuf,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

async fn open_repository(config: &StreamConfig) -> anyhow::Result<Arc<PostgresMetadataRepository>> {
    let pool = connect(config.database_url()?, config.db_max_connections)
        .await
        .context("Failed to connect to the metadata database")?;
    run_migrations(&pool)
        .await
        .context("Failed to apply metadata migrations")?;
    Ok(Arc::new(PostgresMetadataRepository::new(pool)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let result = run(cli).await;
    if let Err(err) = &result {
        if let Some(sync_err) = err.downcast_ref::<SyncError>() {
            report_error(sync_err);
        }
    }
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = StreamConfig::from_env().context("Failed to load configuration")?;

    if let Commands::List {
        format,
        local: true,
    } = cli.command
    {
        let repository = open_repository(&config).await?;
        let records = repository.find_all().await?;
        match format {
            OutputFormat::Json => print_json(&records)?,
            OutputFormat::Table => {
                print!("{}", format_metadata_table(&records));
                println!("{} local records", records.len());
            }
        }
        return Ok(());
    }

    if !config.has_credentials() {
        anyhow::bail!("STREAM_API_TOKEN and STREAM_ACCOUNT_ID must be set to reach the provider");
    }
    let gateway = StreamGateway::new(&config).context("Failed to create streaming client")?;

    match cli.command {
        Commands::List { format, .. } => {
            let envelope = gateway.list().await?;
            if !envelope.is_success() {
                eprintln!("{}", envelope.error_information());
            }

            let videos = RemoteVideo::list_from(&envelope);
            match format {
                OutputFormat::Json => print_json(&videos)?,
                OutputFormat::Table => {
                    print!("{}", format_video_table(&videos));
                    println!("{}", format_totals(&RemoteVideoTotals::of(&videos)));
                }
            }
        }
        Commands::Show { id } => {
            let id = RemoteVideoId::new(id)?;
            let envelope = gateway.get(&id).await?;
            if !envelope.is_success() {
                eprintln!("{}", envelope.error_information());
            }
            print_json(&envelope)?;
        }
        Commands::Delete { id } => {
            let id = RemoteVideoId::new(id)?;
            let repository = open_repository(&config).await?;

            let envelope = gateway.delete(&id).await?;
            if !envelope.is_success() {
                eprintln!("{}", envelope.error_information());
            }

            if let Some(metadata) = repository.find_by_remote_id(&id).await? {
                repository.remove(&metadata).await?;
                tracing::info!(remote_id = %id, asset_id = %metadata.asset_id, "Local video metadata removed");
            }
        }
        Commands::UploadAll { dir } => {
            let repository = open_repository(&config).await?;
            let library = LocalAssetLibrary::new(dir);
            let assets = library
                .find_all_videos()
                .await
                .with_context(|| format!("Failed to scan {}", library.root().display()))?;

            println!("Uploading {} files", assets.len());

            let handler = AssetHandler::new(Arc::new(gateway), repository);
            let mut stdout = std::io::stdout();
            let uploaded = handler
                .upload_all(&assets, |event| match event {
                    BatchEvent::Started(asset) => {
                        print!("{} ... ", asset.filename);
                        // A failing upload leaves the prefix visible
                        let _ = stdout.flush();
                    }
                    BatchEvent::Finished(_, outcome) => {
                        let status = if outcome.was_uploaded() {
                            "Uploaded"
                        } else {
                            "Not uploaded"
                        };
                        println!("{}", status);
                    }
                })
                .await;

            if uploaded.is_err() {
                println!("Failed");
            }
            uploaded?;
        }
    }

    Ok(())
}
