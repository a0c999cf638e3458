mod benefits;
mod comparison;
mod config;
mod credentials;
mod csv;
mod editor;
mod github;
mod prompt;
mod relay;
mod render;
mod source;
mod wiki;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::benefits::{apply_filters, parse_benefits, Filter, FilterSet};
use crate::config::{load_config, Config, DEFAULT_CONFIG_PATH, RELAY_TOKEN_ENV};
use crate::credentials::{LocalStore, StoredToken, TerminalPrompt};
use crate::editor::Editor;
use crate::github::GitHubClient;
use crate::relay::RelayState;

fn cli() -> Command {
    let csv_arg = Arg::new("csv")
        .long("csv")
        .value_name("SRC")
        .help("CSV file path or http(s) URL")
        .required(true);

    Command::new("promo-sync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Renders the promo site's CSV data and syncs edits to GitHub")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .global(true)
                .default_value(DEFAULT_CONFIG_PATH),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("serve")
                .about("Run the CSV sync relay")
                .arg(Arg::new("bind").long("bind").value_name("ADDR")),
        )
        .subcommand(
            Command::new("add")
                .about("Add a benefit to the library and dispatch the updated CSV")
                .arg(csv_arg.clone()),
        )
        .subcommand(
            Command::new("render")
                .about("Print a page fragment as HTML")
                .subcommand_required(true)
                .subcommand(
                    Command::new("library").arg(csv_arg.clone()).arg(
                        Arg::new("filter")
                            .long("filter")
                            .action(ArgAction::Append)
                            .value_parser(Filter::ALL.map(Filter::key)),
                    ),
                )
                .subcommand(
                    Command::new("comparison").arg(csv_arg.clone()).arg(
                        Arg::new("show-hidden")
                            .long("show-hidden")
                            .action(ArgAction::SetTrue),
                    ),
                )
                .subcommand(
                    Command::new("modal").arg(csv_arg).arg(
                        Arg::new("feature")
                            .long("feature")
                            .value_name("NAME")
                            .required(true),
                    ),
                )
                .subcommand(
                    Command::new("wiki").arg(
                        Arg::new("text")
                            .long("text")
                            .value_name("SRC")
                            .required(true),
                    ),
                ),
        )
}

fn init_logging() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let matches = cli().get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);
    let config = load_config(Path::new(config_path))?;

    match matches.subcommand() {
        Some(("serve", sub)) => serve(config, sub).await,
        Some(("add", sub)) => add(config, sub).await,
        Some(("render", sub)) => render(sub).await,
        _ => unreachable!("subcommand is required"),
    }
}

async fn serve(mut config: Config, args: &ArgMatches) -> Result<()> {
    if let Some(bind) = args.get_one::<String>("bind") {
        config.bind = bind.clone();
    }
    let token = std::env::var(RELAY_TOKEN_ENV)
        .with_context(|| format!("{} environment variable not set", RELAY_TOKEN_ENV))?;

    let api = GitHubClient::new(config.clone(), Some(token))?;
    relay::serve(Arc::new(RelayState {
        api: Arc::new(api),
        config,
    }))
    .await
}

async fn add(config: Config, args: &ArgMatches) -> Result<()> {
    let src = args.get_one::<String>("csv").context("--csv is required")?;
    let text = source::load_text(&Client::new(), src).await?;
    let mut editor = Editor::new(parse_benefits(&text));
    info!(rows = editor.rows().len(), "benefits library loaded");

    let form = prompt::ask_form()?;
    let credentials = StoredToken::new(LocalStore::new(&config.token_store), TerminalPrompt);
    let github = GitHubClient::new(config, None)?;

    let outcome = editor.submit(&form, &credentials, &github).await;
    info!(save = ?editor.save_state(), rows = editor.rows().len(), "submit finished");

    match outcome {
        Ok(view) => {
            println!("{}", render::benefits_table(&view).to_html());
            // The dispatch only queues a workflow; nothing confirms the file landed.
            println!("✅ Benefit added successfully! The CSV file has been updated and will be live shortly.");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "benefit not saved");
            eprintln!("❌ {}\n\nPlease try again or contact support.", e);
            Err(e.into())
        }
    }
}

async fn render(args: &ArgMatches) -> Result<()> {
    let client = Client::new();
    let html = match args.subcommand() {
        Some(("library", sub)) => {
            let src = sub.get_one::<String>("csv").context("--csv is required")?;
            let rows = parse_benefits(&source::load_text(&client, src).await?);
            // each --filter is a chip click; repeating one turns it back off
            let mut filters = FilterSet::default();
            for filter in sub
                .get_many::<String>("filter")
                .into_iter()
                .flatten()
                .map(String::as_str)
                .filter_map(Filter::from_key)
            {
                filters.toggle(filter);
            }
            render::benefits_table(&apply_filters(&rows, &filters)).to_html()
        }
        Some(("comparison", sub)) => {
            let src = sub.get_one::<String>("csv").context("--csv is required")?;
            let show_hidden = sub.get_flag("show-hidden");
            let rows = comparison::parse_comparison(&source::load_text(&client, src).await?);
            info!(
                rows = rows.len(),
                shown = comparison::visible_rows(&rows, show_hidden).len(),
                "comparison table"
            );
            render::comparison_body(&rows, show_hidden).to_html()
        }
        Some(("modal", sub)) => {
            let src = sub.get_one::<String>("csv").context("--csv is required")?;
            let feature = sub.get_one::<String>("feature").context("--feature is required")?;
            let rows = comparison::parse_comparison(&source::load_text(&client, src).await?);
            render::modal_body(&rows, feature)
                .with_context(|| format!("No modal content for feature '{}'", feature))?
                .to_html()
        }
        Some(("wiki", sub)) => {
            let src = sub.get_one::<String>("text").context("--text is required")?;
            let blocks = wiki::parse_wiki(&source::load_text(&client, src).await?);
            render::to_html(&render::wiki_page(&blocks))
        }
        _ => unreachable!("subcommand is required"),
    };
    println!("{}", html);
    Ok(())
}
