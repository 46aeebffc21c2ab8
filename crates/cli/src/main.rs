use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use hub_app::Hub;
use hub_kernel::settings::Settings;
use hub_kernel::ServiceAccountConfig;
use serde_json::{Map, Value};

/// Operator tooling for the research hub's Firebase backend.
#[derive(Debug, Parser)]
#[command(name = "hub-cli", version, about)]
struct Cli {
    /// Credentials file (defaults to the configured path, normally `.env`).
    #[arg(long, global = true, env = "HUB_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Skip the Firestore round-trip during initialization.
    #[arg(long, global = true)]
    no_verify: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse and validate the credentials file without contacting Firebase.
    Validate,
    /// Initialize Firebase and run the connectivity check.
    Check,
    /// Read or write Firestore documents.
    #[command(subcommand)]
    Doc(DocCommand),
    /// Read or write Realtime Database nodes.
    #[command(subcommand)]
    Ref(RefCommand),
}

#[derive(Debug, Subcommand)]
enum DocCommand {
    /// Print a document's fields as JSON.
    Get { path: String },
    /// Overwrite a document with a JSON object.
    Set { path: String, json: String },
}

#[derive(Debug, Subcommand)]
enum RefCommand {
    /// Print the value at a path as JSON.
    Get { path: String },
    /// Replace the value at a path with JSON.
    Set { path: String, json: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load hub settings")?;
    hub_telemetry::init(&settings.telemetry);

    if let Some(path) = cli.credentials {
        settings.firebase.credentials_path = path;
    }

    match cli.command {
        Command::Validate => validate(&settings),
        Command::Check => {
            settings.firebase.verify_connection = true;
            let hub = Hub::start(settings).await?;
            println!(
                "connected to project {}",
                hub.firebase().app().project_id()
            );
            Ok(())
        }
        Command::Doc(doc) => {
            settings.firebase.verify_connection &= !cli.no_verify;
            let hub = Hub::start(settings).await?;
            run_doc(&hub, doc).await
        }
        Command::Ref(reference) => {
            settings.firebase.verify_connection &= !cli.no_verify;
            let hub = Hub::start(settings).await?;
            run_ref(&hub, reference).await
        }
    }
}

fn validate(settings: &Settings) -> anyhow::Result<()> {
    let path = &settings.firebase.credentials_path;
    let config = ServiceAccountConfig::from_file(path)
        .with_context(|| format!("invalid credentials file {}", path.display()))?;

    println!("project_id: {}", config.project_id);
    println!("client_email: {}", config.client_email);
    println!("database_url: {}", config.default_database_url());
    tracing::info!(path = %path.display(), "credentials file is valid");
    Ok(())
}

async fn run_doc(hub: &Hub, command: DocCommand) -> anyhow::Result<()> {
    let firestore = hub.firebase().firestore();
    match command {
        DocCommand::Get { path } => {
            let document = firestore
                .document(&path)?
                .get()
                .await?
                .ok_or_else(|| anyhow!("document {path} does not exist"))?;
            println!("{}", serde_json::to_string_pretty(&document.fields)?);
        }
        DocCommand::Set { path, json } => {
            let fields = parse_object(&json)?;
            let document = firestore.document(&path)?.set(&fields).await?;
            println!("wrote {}", document.name);
        }
    }
    Ok(())
}

async fn run_ref(hub: &Hub, command: RefCommand) -> anyhow::Result<()> {
    let root = hub.firebase().realtime();
    match command {
        RefCommand::Get { path } => {
            let value = root.child(&path)?.get().await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        RefCommand::Set { path, json } => {
            let value: Value =
                serde_json::from_str(&json).with_context(|| "value is not valid JSON")?;
            let node = root.child(&path)?;
            node.set(&value).await?;
            println!("wrote {}", node.path());
        }
    }
    Ok(())
}

fn parse_object(json: &str) -> anyhow::Result<Map<String, Value>> {
    match serde_json::from_str(json).with_context(|| "document is not valid JSON")? {
        Value::Object(fields) => Ok(fields),
        other => Err(anyhow!("document must be a JSON object, got {other}")),
    }
}
