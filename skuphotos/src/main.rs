use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use drive_core::DriveClient;
use skuphotos::config::{EngineConfig, api_base_from_env, bearer_token_from_env};
use skuphotos::console::{LinePrompt, TerminalPresenter};
use skuphotos::shell::{self, ShellCommand};
use skuphotos::sync::ViewSynchronizer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "\
Usage: skuphotos [--shell | --list | --open SKU | --capture SKU FILE... | --help]
  --shell              interactive session (default)
  --list               print SKU folders with photo counts
  --open SKU           open or create the folder for SKU and list its photos
  --capture SKU FILE   upload files into the SKU folder as sequential photos
  --help               show this message

Environment:
  SKUPHOTOS_TOKEN            Drive OAuth access token (required)
  SKUPHOTOS_ROOT_FOLDER      root folder name (default: Amazon Product Photos)
  SKUPHOTOS_NAME_SEPARATOR   none | underscore
  SKUPHOTOS_CONFIRM_CREATE   ask before creating a SKU folder (default: true)
  SKUPHOTOS_PAGE_SIZE        list page size (default: 100)
  SKUPHOTOS_API_BASE         API endpoint override
  RUST_LOG                   log filter (default: info)";

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliMode {
    Shell,
    List,
    Open(String),
    Capture { sku: String, files: Vec<PathBuf> },
    Help,
}

fn parse_cli_mode<I>(args: I) -> anyhow::Result<CliMode>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter().skip(1);
    let mut mode = CliMode::Shell;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--shell" => mode = CliMode::Shell,
            "--list" => mode = CliMode::List,
            "--help" | "-h" => mode = CliMode::Help,
            "--open" => {
                let sku = args.next().context("--open requires a SKU")?;
                mode = CliMode::Open(sku);
            }
            "--capture" => {
                let sku = args.next().context("--capture requires a SKU")?;
                let files: Vec<PathBuf> = args.by_ref().map(PathBuf::from).collect();
                if files.is_empty() {
                    anyhow::bail!("--capture requires at least one file");
                }
                mode = CliMode::Capture { sku, files };
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(mode)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let mode = parse_cli_mode(std::env::args())?;
    if mode == CliMode::Help {
        println!("{USAGE}");
        return Ok(());
    }
    init_tracing();

    let token = bearer_token_from_env()
        .context("set SKUPHOTOS_TOKEN to a Google Drive access token")?;
    let config = EngineConfig::from_env();
    let client = match api_base_from_env() {
        Some(base) => DriveClient::with_base_url(&base, token),
        None => DriveClient::new(token),
    }
    .context("invalid Drive client configuration")?
    .with_page_size(config.page_size);

    let prompt = Arc::new(LinePrompt::stdio());
    let mut sync = ViewSynchronizer::new(
        Arc::new(client),
        Arc::new(TerminalPresenter),
        prompt.clone(),
        config,
    );
    sync.start()
        .await
        .context("failed to open the photo root folder")?;

    match mode {
        CliMode::Shell => shell::run(&mut sync, &prompt).await?,
        CliMode::List | CliMode::Help => {}
        CliMode::Open(sku) => {
            shell::execute(&mut sync, ShellCommand::Open(sku)).await?;
        }
        CliMode::Capture { sku, files } => {
            let payloads = shell::load_payloads(&files).await?;
            if sync.open_folder(&sku).await?.is_none() {
                anyhow::bail!("folder for SKU \"{sku}\" was not created; nothing uploaded");
            }
            for name in sync.upload_batch(payloads).await? {
                println!("uploaded {name}");
            }
        }
    }
    Ok(())
}
