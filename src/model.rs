//! Entity values produced by the extractors.
//!
//! Everything here is built once from a document snapshot and never mutated
//! afterwards; re-fetching a page yields a fresh value.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

pub type Timestamp = DateTime<FixedOffset>;

// ── Thumbnails ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailKind {
    Mod,
    Game,
    Engine,
    Group,
    Member,
    File,
    Addon,
    Article,
    Media,
    Job,
}

impl ThumbnailKind {
    /// Classify a site URL by its right-most recognised path segment, so
    /// `/mods/foo/downloads/bar` is a file and `/games/x/mods/y` a mod.
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url
            .split_once("://")
            .map(|(_, rest)| rest.split_once('/').map_or("", |(_, p)| p))
            .unwrap_or(url);
        let path = path.split(['?', '#']).next().unwrap_or_default();
        path.split('/').rev().find_map(|segment| match segment {
            "mods" => Some(ThumbnailKind::Mod),
            "games" => Some(ThumbnailKind::Game),
            "engines" => Some(ThumbnailKind::Engine),
            "groups" | "company" => Some(ThumbnailKind::Group),
            "members" => Some(ThumbnailKind::Member),
            "downloads" => Some(ThumbnailKind::File),
            "addons" => Some(ThumbnailKind::Addon),
            "news" | "articles" | "features" | "tutorials" => Some(ThumbnailKind::Article),
            "images" | "videos" | "audio" => Some(ThumbnailKind::Media),
            "jobs" => Some(ThumbnailKind::Job),
            _ => None,
        })
    }
}

/// A named, typed pointer to another entity. Holding one never implies the
/// target has been fetched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Thumbnail {
    pub name: String,
    pub url: String,
    pub kind: ThumbnailKind,
    pub image: Option<String>,
}

impl Thumbnail {
    pub fn new(name: impl Into<String>, url: impl Into<String>, kind: ThumbnailKind) -> Self {
        Thumbnail {
            name: name.into(),
            url: url.into(),
            kind,
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

// ── Page boxes ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    Mod,
    Game,
    Engine,
    Group,
}

impl PageKind {
    pub fn watch_label(self) -> &'static str {
        match self {
            PageKind::Mod => "Mod watch",
            PageKind::Game => "Game watch",
            PageKind::Engine => "Engine watch",
            PageKind::Group => "Group watch",
        }
    }

    pub fn articles_heading(self) -> &'static str {
        match self {
            PageKind::Mod => "Articles",
            _ => "Related Articles",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Share {
    pub reddit: String,
    pub mail: String,
    pub twitter: String,
    pub facebook: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStatus {
    Released,
    EarlyAccess,
    ComingSoon,
    Unreleased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    OpenToAll,
    MustApply,
    InviteOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub kind: PageKind,
    pub contact: Option<String>,
    /// Watch/unwatch toggle endpoint.
    pub follow: String,
    pub share: Option<Share>,
    pub icon: Option<String>,
    /// Keyed by the lower-cased role label ("developer", "publisher", "creator", ...).
    pub developers: BTreeMap<String, Thumbnail>,
    pub release: Option<Timestamp>,
    pub status: Option<ReleaseStatus>,
    pub platforms: Vec<String>,
    pub homepage: Option<String>,
    pub engine: Option<Thumbnail>,
    pub game: Option<Thumbnail>,
    pub private: Option<bool>,
    pub membership: Option<Membership>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub files: Option<u64>,
    pub articles: Option<u64>,
    pub reviews: Option<u64>,
    pub watchers: Option<u64>,
    pub mods: Option<u64>,
    pub addons: Option<u64>,
    pub members: Option<u64>,
    pub visits: u64,
    pub today: u64,
    pub rank: u64,
    pub total: u64,
    pub updated: Option<Timestamp>,
}

/// A browse category: the link text plus the numeric id the site filters by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleTag {
    pub name: String,
    pub id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Style {
    pub theme: StyleTag,
    pub genre: StyleTag,
    pub players: StyleTag,
    pub scope: Option<StyleTag>,
    pub boxart: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryKind {
    Video,
    Image,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryItem {
    pub thumbnail: Thumbnail,
    pub kind: GalleryKind,
}

// ── Pages ──

/// Fields shared by every page-like entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageCore {
    pub name: String,
    pub url: String,
    pub rating: Option<f32>,
    pub embed: String,
    pub profile: Profile,
    pub statistics: Statistics,
    pub suggestions: Vec<Thumbnail>,
    pub articles: Vec<Thumbnail>,
    pub article: Option<PartialArticle>,
    pub gallery: Vec<GalleryItem>,
    pub comments: CommentTree,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mod {
    pub page: PageCore,
    pub style: Style,
    pub files: Vec<Thumbnail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Game {
    pub page: PageCore,
    pub style: Style,
    pub files: Vec<Thumbnail>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub page: PageCore,
    pub style: Style,
    pub files: Vec<Thumbnail>,
}

/// Engines list the games built on them instead of files, and have no
/// style box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Engine {
    pub page: PageCore,
    pub games: Vec<Thumbnail>,
}

// ── Files ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Releases,
    FullVersion,
    Demo,
    Patch,
    Script,
    Trainer,
    Media,
    Trailer,
    Movie,
    Music,
    Audio,
    Wallpaper,
    Tools,
    SourceCode,
    Miscellaneous,
    Other(u32),
}

impl FileCategory {
    pub fn from_id(id: u32) -> Self {
        match id {
            1 => FileCategory::Releases,
            2 => FileCategory::FullVersion,
            3 => FileCategory::Demo,
            4 => FileCategory::Patch,
            5 => FileCategory::Media,
            6 => FileCategory::Trailer,
            7 => FileCategory::Movie,
            8 => FileCategory::Music,
            9 => FileCategory::Wallpaper,
            10 => FileCategory::Tools,
            20 => FileCategory::Miscellaneous,
            25 => FileCategory::Audio,
            26 => FileCategory::SourceCode,
            28 => FileCategory::Script,
            29 => FileCategory::Trainer,
            other => FileCategory::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct File {
    pub name: String,
    /// MD5 digest as published, 32 hex characters.
    pub hash: String,
    pub size: u64,
    pub downloads: u64,
    pub today: u64,
    pub category: FileCategory,
    pub uploader: Thumbnail,
    pub added: Timestamp,
    pub button: String,
    pub widget: String,
    pub description: String,
    pub preview: String,
    pub url: String,
    pub comments: CommentTree,
}

/// Addon pages share the file page template.
pub type Addon = File;

// ── Media ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
    Audio,
}

impl MediaKind {
    /// Video needs both a duration and a size, image a size alone; anything
    /// else is audio.
    pub fn classify(duration: Option<u32>, size: Option<&MediaSize>) -> Self {
        match (duration, size) {
            (Some(_), Some(_)) => MediaKind::Video,
            (None, Some(_)) => MediaKind::Image,
            _ => MediaKind::Audio,
        }
    }
}

/// Width and height as printed on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaSize {
    pub width: String,
    pub height: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Media {
    pub name: String,
    pub url: String,
    pub description: String,
    pub date: Timestamp,
    pub author: Thumbnail,
    /// Seconds.
    pub duration: Option<u32>,
    pub size: Option<MediaSize>,
    pub views: u64,
    pub today: u64,
    pub filename: Option<String>,
    pub kind: MediaKind,
    pub file_url: Option<String>,
}

// ── Articles ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleKind {
    News,
    Feature,
    Tutorial,
    Blog,
}

impl ArticleKind {
    /// Accepts the singular or plural label in any case.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        let singular = label.strip_suffix('s').unwrap_or(&label);
        match singular {
            "new" | "news" => Some(ArticleKind::News),
            "feature" => Some(ArticleKind::Feature),
            "tutorial" => Some(ArticleKind::Tutorial),
            "blog" => Some(ArticleKind::Blog),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub kind: ArticleKind,
    pub url: String,
    pub title: String,
    pub intro: String,
    pub author: Thumbnail,
    pub date: Timestamp,
    pub tags: BTreeMap<String, String>,
    pub report: String,
    pub views: u64,
    pub today: u64,
    pub share: Share,
    pub html: String,
    pub plaintext: String,
}

/// The teaser of an article shown on a page's front.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialArticle {
    pub title: String,
    pub url: String,
    pub date: Timestamp,
    pub kind: ArticleKind,
    pub html: String,
    pub plaintext: String,
}

// ── Comments ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: u64,
    pub author: Thumbnail,
    pub body: Option<String>,
    pub date: Timestamp,
    /// 0 top-level, 1 reply, 2 reply to a reply.
    pub position: u8,
    pub karma: i64,
    pub upvote: Option<String>,
    pub downvote: Option<String>,
    pub approved: bool,
    pub developer: bool,
    pub staff: bool,
    pub subscriber: bool,
    pub guest: bool,
    pub embeds: Vec<String>,
    pub location: Option<Thumbnail>,
    pub children: Vec<Comment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CommentTree {
    pub comments: Vec<Comment>,
}

impl CommentTree {
    /// Pre-order walk: each comment followed by its replies.
    pub fn flatten(&self) -> Vec<&Comment> {
        let mut out = Vec::new();
        for top in &self.comments {
            out.push(top);
            for reply in &top.children {
                out.push(reply);
                out.extend(reply.children.iter());
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.flatten().len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}

// ── Updates ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Update {
    pub subject: Thumbnail,
    pub unfollow: String,
    pub clear: String,
    pub changes: Vec<Thumbnail>,
    pub date: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_url_uses_rightmost_segment() {
        assert_eq!(
            ThumbnailKind::from_url("https://www.moddb.com/mods/foo/downloads/bar"),
            Some(ThumbnailKind::File)
        );
        assert_eq!(
            ThumbnailKind::from_url("https://www.moddb.com/games/half-life/mods/foo"),
            Some(ThumbnailKind::Mod)
        );
        assert_eq!(ThumbnailKind::from_url("/members/someone"), Some(ThumbnailKind::Member));
        assert_eq!(
            ThumbnailKind::from_url("https://www.moddb.com/engines/source/news/x?page=2"),
            Some(ThumbnailKind::Article)
        );
        assert_eq!(ThumbnailKind::from_url("https://www.moddb.com/about"), None);
        assert_eq!(ThumbnailKind::from_url("https://www.moddb.com"), None);
    }

    #[test]
    fn media_kind_is_exhaustive() {
        let size = MediaSize {
            width: "1920".into(),
            height: "1080".into(),
        };
        assert_eq!(MediaKind::classify(Some(90), Some(&size)), MediaKind::Video);
        assert_eq!(MediaKind::classify(None, Some(&size)), MediaKind::Image);
        assert_eq!(MediaKind::classify(Some(90), None), MediaKind::Audio);
        assert_eq!(MediaKind::classify(None, None), MediaKind::Audio);
    }

    #[test]
    fn article_kind_labels() {
        assert_eq!(ArticleKind::from_label("News"), Some(ArticleKind::News));
        assert_eq!(ArticleKind::from_label("Features"), Some(ArticleKind::Feature));
        assert_eq!(ArticleKind::from_label("tutorial"), Some(ArticleKind::Tutorial));
        assert_eq!(ArticleKind::from_label("Podcast"), None);
    }

    #[test]
    fn file_category_keeps_unknown_ids() {
        assert_eq!(FileCategory::from_id(4), FileCategory::Patch);
        assert_eq!(FileCategory::from_id(77), FileCategory::Other(77));
    }
}
