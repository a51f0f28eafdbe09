//! DataFileUtil CLI - Command-line access to the DataFileUtil service

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use datafileutil_client::{AuthToken, ClientConfig, DataFileUtilClient, DEFAULT_AUTH_URL};
use datafileutil_rpc::{
    CopyShockNodeParams, FileToShockParams, GetObjectsParams, ObjectSaveData, OwnShockNodeParams,
    PackFileParams, PackFormat, PackageForDownloadParams, SaveObjectsParams, ShockToFileParams,
    UnpackFileParams,
};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "datafileutil-cli", version, about = "Move files between Shock and the workspace via DataFileUtil")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// DataFileUtil service URL
    #[arg(long, env = "DATAFILEUTIL_URL")]
    url: String,

    /// Auth token sent with every call
    #[arg(long, env = "KB_AUTH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Auth service root used to validate the token
    #[arg(long, env = "KB_AUTH_URL", default_value = DEFAULT_AUTH_URL)]
    auth_url: String,

    /// Allow plain http service URLs
    #[arg(long)]
    insecure: bool,

    /// Accept any TLS certificate
    #[arg(long)]
    trust_all_certs: bool,

    /// Read timeout in milliseconds (0 = none)
    #[arg(long, default_value_t = 0)]
    timeout_ms: u64,

    /// Stream request bodies from disk
    #[arg(long)]
    streaming: bool,

    /// Dispatch to a specific deployed service version
    #[arg(long)]
    service_version: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show service status
    Status,
    /// Show workspace and Shock service versions
    Versions,
    /// Download a Shock node to a file or directory
    ShockToFile {
        #[arg(long)]
        shock_id: String,
        #[arg(long)]
        file_path: String,
    },
    /// Upload a file to Shock
    FileToShock {
        #[arg(long)]
        file_path: String,
        #[arg(long)]
        make_handle: bool,
        #[arg(long)]
        gzip: bool,
    },
    /// Decompress and unbundle a file
    UnpackFile {
        #[arg(long)]
        file_path: String,
    },
    /// Pack a file or directory into an archive
    PackFile {
        #[arg(long)]
        file_path: String,
        /// gzip, targz or zip
        #[arg(long)]
        pack: Option<PackFormat>,
    },
    /// Bundle a file with workspace provenance and upload it
    PackageForDownload {
        #[arg(long)]
        file_path: String,
        #[arg(long = "ws-ref")]
        ws_refs: Vec<String>,
    },
    /// Copy a Shock node
    CopyShockNode {
        #[arg(long)]
        shock_id: String,
        #[arg(long)]
        make_handle: bool,
    },
    /// Gain ownership of a Shock node
    OwnShockNode {
        #[arg(long)]
        shock_id: String,
        #[arg(long)]
        make_handle: bool,
    },
    /// Translate a workspace name to its id
    WsNameToId { name: String },
    /// Fetch workspace objects by reference
    GetObjects {
        refs: Vec<String>,
        #[arg(long)]
        ignore_errors: bool,
    },
    /// Save objects listed in a JSON file (an array of object save data)
    SaveObjects {
        #[arg(long)]
        workspace_id: i64,
        objects: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("datafileutil_client=info".parse()?))
        .init();

    let cli = Cli::parse();
    let client = connect(&cli.connection).await?;

    match cli.command {
        Command::Status => print_json(&client.status().await?)?,
        Command::Versions => {
            let (workspace, shock) = client.versions().await?;
            print_json(&serde_json::json!({"workspace": workspace, "shock": shock}))?;
        }
        Command::ShockToFile { shock_id, file_path } => {
            let params = ShockToFileParams::new(shock_id, file_path);
            print_json(&client.shock_to_file(&params).await?)?;
        }
        Command::FileToShock {
            file_path,
            make_handle,
            gzip,
        } => {
            let params = FileToShockParams::new(file_path)
                .with_make_handle(make_handle)
                .with_gzip(gzip);
            print_json(&client.file_to_shock(&params).await?)?;
        }
        Command::UnpackFile { file_path } => {
            print_json(&client.unpack_file(&UnpackFileParams::new(file_path)).await?)?;
        }
        Command::PackFile { file_path, pack } => {
            let mut params = PackFileParams::new(file_path);
            params.pack = pack;
            print_json(&client.pack_file(&params).await?)?;
        }
        Command::PackageForDownload { file_path, ws_refs } => {
            let params = PackageForDownloadParams::new(file_path).with_ws_refs(ws_refs);
            print_json(&client.package_for_download(&params).await?)?;
        }
        Command::CopyShockNode {
            shock_id,
            make_handle,
        } => {
            let params = CopyShockNodeParams::new(shock_id).with_make_handle(make_handle);
            print_json(&client.copy_shock_node(&params).await?)?;
        }
        Command::OwnShockNode {
            shock_id,
            make_handle,
        } => {
            let params = OwnShockNodeParams::new(shock_id).with_make_handle(make_handle);
            print_json(&client.own_shock_node(&params).await?)?;
        }
        Command::WsNameToId { name } => print_json(&client.ws_name_to_id(&name).await?)?,
        Command::GetObjects {
            refs,
            ignore_errors,
        } => {
            let params = GetObjectsParams::new(refs).with_ignore_errors(ignore_errors);
            print_json(&client.get_objects(&params).await?)?;
        }
        Command::SaveObjects {
            workspace_id,
            objects,
        } => {
            let raw = tokio::fs::read(&objects)
                .await
                .with_context(|| format!("reading {}", objects.display()))?;
            let objects: Vec<ObjectSaveData> =
                serde_json::from_slice(&raw).context("objects file must be a JSON array")?;
            let params = SaveObjectsParams::new(workspace_id, objects);
            print_json(&client.save_objects(&params).await?)?;
        }
    }

    Ok(())
}

async fn connect(args: &ConnectionArgs) -> Result<DataFileUtilClient> {
    let mut config = ClientConfig::new(&args.url)?
        .with_auth_url(&args.auth_url)?
        .with_read_timeout_millis(args.timeout_ms)
        .with_insecure_http(args.insecure)
        .with_trust_all_certificates(args.trust_all_certs)
        .with_streaming_mode(args.streaming);
    if let Some(token) = args.token.as_deref().filter(|t| !t.is_empty()) {
        config = config.with_token(AuthToken::new(token));
    }
    if let Some(version) = &args.service_version {
        config = config.with_service_version(version.clone());
    }

    debug!("Connecting to {}", config.url);
    let client = DataFileUtilClient::with_config(config)
        .await
        .with_context(|| format!("connecting to {}", args.url))?;
    Ok(client)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
