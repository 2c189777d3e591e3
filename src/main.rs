use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use moddb_scrape::config::Settings;
use moddb_scrape::parser::BASE_URL;
use moddb_scrape::{Client, HttpTransport, ListingKind, WatchKind};

#[derive(Parser)]
#[command(name = "moddb_scrape", about = "Extract typed entities from moddb.com pages")]
struct Cli {
    /// Config file (default: ./moddb.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mod page
    Mod { url: String },
    /// Game page
    Game { url: String },
    /// Engine page
    Engine { url: String },
    /// Group or company page
    Group { url: String },
    /// Download page
    File { url: String },
    /// Addon page
    Addon { url: String },
    /// Image, video or audio page
    Media { url: String },
    /// News, feature, tutorial or blog article
    Article { url: String },
    /// One page of a listing under a mod/game/engine/group page
    List {
        #[arg(value_enum)]
        kind: ListArg,
        url: String,
        #[arg(short, long, default_value = "1")]
        page: u32,
    },
    /// One page of comments under any entity page
    Comments {
        url: String,
        #[arg(short, long, default_value = "1")]
        page: u32,
    },
    /// Updates for watched pages (needs a session cookie)
    Updates,
    /// Watched pages of one kind (needs a session cookie)
    Watched {
        #[arg(value_enum)]
        kind: WatchArg,
        #[arg(short, long, default_value = "1")]
        page: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ListArg {
    Files,
    Articles,
    Tutorials,
    Addons,
    Mods,
    Games,
}

impl From<ListArg> for ListingKind {
    fn from(arg: ListArg) -> Self {
        match arg {
            ListArg::Files => ListingKind::Files,
            ListArg::Articles => ListingKind::Articles,
            ListArg::Tutorials => ListingKind::Tutorials,
            ListArg::Addons => ListingKind::Addons,
            ListArg::Mods => ListingKind::Mods,
            ListArg::Games => ListingKind::Games,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum WatchArg {
    Mods,
    Games,
    Engines,
    Groups,
    Members,
}

impl From<WatchArg> for WatchKind {
    fn from(arg: WatchArg) -> Self {
        match arg {
            WatchArg::Mods => WatchKind::Mod,
            WatchArg::Games => WatchKind::Game,
            WatchArg::Engines => WatchKind::Engine,
            WatchArg::Groups => WatchKind::Group,
            WatchArg::Members => WatchKind::Member,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    let transport = HttpTransport::new(&settings)?;
    let mut client = Client::new(transport);
    if let Some(session) = settings.session() {
        client = client.with_session(session);
    }
    let url = |raw: &str| resolve_url(BASE_URL, raw);

    match cli.command {
        Commands::Mod { url: u } => print(&client.get_mod(&url(&u)?)?)?,
        Commands::Game { url: u } => print(&client.get_game(&url(&u)?)?)?,
        Commands::Engine { url: u } => print(&client.get_engine(&url(&u)?)?)?,
        Commands::Group { url: u } => print(&client.get_group(&url(&u)?)?)?,
        Commands::File { url: u } => print(&client.get_file(&url(&u)?)?)?,
        Commands::Addon { url: u } => print(&client.get_addon(&url(&u)?)?)?,
        Commands::Media { url: u } => print(&client.get_media(&url(&u)?)?)?,
        Commands::Article { url: u } => print(&client.get_article(&url(&u)?)?)?,
        Commands::List { kind, url: u, page } => {
            print(&client.get_listing(&url(&u)?, kind.into(), page)?)?
        }
        Commands::Comments { url: u, page } => print(&client.get_comments(&url(&u)?, page)?)?,
        Commands::Updates => print(&client.get_updates()?)?,
        Commands::Watched { kind, page } => print(&client.get_watched(kind.into(), page)?)?,
    }

    info!("done in {:.1}s", t0.elapsed().as_secs_f64());
    Ok(())
}

/// Accept `/mods/foo` as well as a full url.
fn resolve_url(base: &str, raw: &str) -> anyhow::Result<String> {
    let base = url::Url::parse(base).with_context(|| format!("bad base url {base:?}"))?;
    let joined = base
        .join(raw.trim())
        .with_context(|| format!("bad url {raw:?}"))?;
    Ok(joined.to_string().trim_end_matches('/').to_string())
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
