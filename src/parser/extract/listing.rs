//! Paginated listings (a page's files, articles, addons...) and the
//! watched-items update feed.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use tracing::debug;

use super::{image_src, titled_thumbnail, A, TIME};
use crate::error::{Error, Result};
use crate::model::{Engine, Game, Group, Mod, Thumbnail, ThumbnailKind, Update};
use crate::parser::dom::{self, absolute, attr, child_elements, class_count, has_class, heading_box, text, Document};
use crate::parser::decode::parse_timestamp;

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.table").unwrap());
static STOP_WATCHING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[title="Stop Watching"]"#).unwrap());
static CLEAR: LazyLock<Selector> = LazyLock::new(|| Selector::parse(r#"a[title="Clear"]"#).unwrap());
static CHANGE_LINKS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p a").unwrap());

const UPDATE_HEADINGS: &[&str] = &[
    "Mods Watch",
    "Members Watch",
    "Engines Watch",
    "Groups Watch",
    "Games Watch",
];

/// A sub-resource listing hanging off a page url.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Files,
    Articles,
    Tutorials,
    Addons,
    Mods,
    Games,
}

impl ListingKind {
    pub fn segment(self) -> &'static str {
        match self {
            ListingKind::Files => "downloads",
            ListingKind::Articles => "articles",
            ListingKind::Tutorials => "tutorials",
            ListingKind::Addons => "addons",
            ListingKind::Mods => "mods",
            ListingKind::Games => "games",
        }
    }

    pub fn thumbnail_kind(self) -> ThumbnailKind {
        match self {
            ListingKind::Files => ThumbnailKind::File,
            ListingKind::Articles | ListingKind::Tutorials => ThumbnailKind::Article,
            ListingKind::Addons => ThumbnailKind::Addon,
            ListingKind::Mods => ThumbnailKind::Mod,
            ListingKind::Games => ThumbnailKind::Game,
        }
    }
}

/// Things a logged-in member can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    Mod,
    Game,
    Engine,
    Group,
    Member,
}

impl WatchKind {
    pub fn segment(self) -> &'static str {
        match self {
            WatchKind::Mod => "mods",
            WatchKind::Game => "games",
            WatchKind::Engine => "engines",
            WatchKind::Group => "groups",
            WatchKind::Member => "members",
        }
    }

    pub fn thumbnail_kind(self) -> ThumbnailKind {
        match self {
            WatchKind::Mod => ThumbnailKind::Mod,
            WatchKind::Game => ThumbnailKind::Game,
            WatchKind::Engine => ThumbnailKind::Engine,
            WatchKind::Group => ThumbnailKind::Group,
            WatchKind::Member => ThumbnailKind::Member,
        }
    }
}

/// Pages whose articles, tutorials and addons can be listed.
pub trait Listable {
    fn page_url(&self) -> &str;
}

/// Pages that also list downloads. Engines do not.
pub trait HasFiles: Listable {}

impl Listable for Mod {
    fn page_url(&self) -> &str {
        &self.page.url
    }
}

impl Listable for Game {
    fn page_url(&self) -> &str {
        &self.page.url
    }
}

impl Listable for Group {
    fn page_url(&self) -> &str {
        &self.page.url
    }
}

impl Listable for Engine {
    fn page_url(&self) -> &str {
        &self.page.url
    }
}

impl HasFiles for Mod {}
impl HasFiles for Game {}
impl HasFiles for Group {}

/// `<page>/<segment>/page/<index>`; pages are numbered from 1.
pub fn listing_url(page_url: &str, kind: ListingKind, index: u32) -> Result<String> {
    paged(&format!("{}/{}", page_url.trim_end_matches('/'), kind.segment()), index)
}

/// `<url>/page/<index>`.
pub fn paged(url: &str, index: u32) -> Result<String> {
    if index < 1 {
        return Err(Error::InvalidPage(index));
    }
    Ok(format!("{}/page/{}", url.trim_end_matches('/'), index))
}

/// Rows of the first table on a listing page. An empty listing renders the
/// table with extra class tokens and a "no results" notice instead of rows.
pub fn extract_listing(doc: &Document, kind: ThumbnailKind) -> Result<Vec<Thumbnail>> {
    let table = dom::require(doc.root(), &TABLE, "listing")?;
    if class_count(table) > 1 {
        debug!(?kind, "listing has no results");
        return Ok(Vec::new());
    }
    child_elements(table)
        .filter(|row| row.value().name() == "div" && has_class(*row, "rowcontent"))
        .map(|row| {
            let a = dom::require(row, &A, "listing row")?;
            titled_thumbnail(a, kind, "listing row")
        })
        .collect()
}

/// The per-kind "... Watch" boxes of the updates page.
pub fn extract_updates(doc: &Document) -> Result<Vec<Update>> {
    let root = doc.root();
    let mut updates = Vec::new();
    for heading in UPDATE_HEADINGS {
        let Some(outer) = heading_box(root, heading) else {
            continue;
        };
        let table = dom::require(outer, &TABLE, "updates")?;
        for row in child_elements(table).filter(|row| dom::first(*row, &STOP_WATCHING).is_some()) {
            updates.push(update(row)?);
        }
    }
    debug!(count = updates.len(), "parsed updates");
    Ok(updates)
}

fn update(row: ElementRef<'_>) -> Result<Update> {
    let a = dom::require(row, &A, "update subject")?;
    let url = absolute(&attr(a, "href", "update subject")?, "update subject")?;
    let kind = ThumbnailKind::from_url(&url)
        .ok_or_else(|| Error::invalid("update subject", format!("unrecognised url {}", url)))?;
    let mut subject = Thumbnail::new(attr(a, "title", "update subject")?, url, kind);
    subject.image = image_src(a);

    let unfollow = dom::require(row, &STOP_WATCHING, "unfollow")?;
    let clear = dom::require(row, &CLEAR, "clear")?;

    let changes = row
        .select(&CHANGE_LINKS)
        .map(|a| {
            let url = absolute(&attr(a, "href", "update change")?, "update change")?;
            let kind = ThumbnailKind::from_url(&url)
                .ok_or_else(|| Error::invalid("update change", format!("unrecognised url {}", url)))?;
            Ok(Thumbnail::new(text(a), url, kind))
        })
        .collect::<Result<Vec<_>>>()?;

    let time = dom::require(row, &TIME, "update date")?;

    Ok(Update {
        subject,
        unfollow: absolute(&attr(unfollow, "href", "unfollow")?, "unfollow")?,
        clear: absolute(&attr(clear, "href", "clear")?, "clear")?,
        changes,
        date: parse_timestamp(&attr(time, "datetime", "update date")?)?,
    })
}
