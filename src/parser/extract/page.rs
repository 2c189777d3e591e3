//! Mod, game, engine and group pages.
//!
//! All four share one template: a header with the name and rating, the side
//! boxes, a handful of thumbnail boxes, the image strip and the comments.
//! Boxes that a page simply does not have (no articles yet, no gallery)
//! come back empty; the landmarks every page carries are required.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use tracing::debug;

use super::article::article_rows;
use super::{boxes, comments, image_src, titled_thumbnail, A};
use crate::error::{Error, Result};
use crate::model::{
    Engine, GalleryItem, GalleryKind, Game, Group, Mod, PageCore, PageKind, PartialArticle, Style,
    Thumbnail, ThumbnailKind,
};
use crate::parser::dom::{
    self, absolute, attr, has_class, has_exact_classes, heading_box, require_itemprop, text, Document,
};

static SCORE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.score").unwrap());
static EMBED: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"input[type="text"][maxlength="500"]"#).unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.row").unwrap());
static HEADING_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a.heading").unwrap());
static CONTENT_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.content h4 a").unwrap());
static ARTICLES_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.inner div.table").unwrap());
static IMAGEBOX: LazyLock<Selector> = LazyLock::new(|| Selector::parse("ul#imagebox li").unwrap());
static TITLED_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[title][href]").unwrap());

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "flv", "mov", "avi"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Extract everything the four page kinds have in common.
pub fn parse_core(doc: &Document, kind: PageKind) -> Result<PageCore> {
    let root = doc.root();

    let name = text(require_itemprop(root, "mainEntityOfPage")?);
    let url = doc.og("og:url")?;
    debug!(?kind, %name, "parsing page");

    let embed = attr(dom::require(root, &EMBED, "embed")?, "value", "embed")?;
    let (articles, article) = articles(root, kind)?;

    Ok(PageCore {
        rating: rating(root)?,
        embed,
        profile: boxes::profile(root, kind)?,
        statistics: boxes::statistics(root)?,
        suggestions: suggestions(root)?,
        articles,
        article,
        gallery: gallery(root)?,
        comments: comments::extract(root)?,
        name,
        url,
    })
}

/// Unrated pages carry no score block at all.
fn rating(root: ElementRef<'_>) -> Result<Option<f32>> {
    let Some(score) = dom::first(root, &SCORE) else {
        debug!("page has no rating");
        return Ok(None);
    };
    let value = dom::require_itemprop(score, "ratingValue")?;
    let raw = attr(value, "content", "rating")?;
    let rating: f32 = raw
        .trim()
        .parse()
        .map_err(|_| Error::invalid("rating", format!("{:?} is not a number", raw)))?;
    if !(0.0..=10.0).contains(&rating) {
        return Err(Error::invalid("rating", format!("{} is outside 0-10", rating)));
    }
    Ok(Some(rating))
}

fn suggestions(root: ElementRef<'_>) -> Result<Vec<Thumbnail>> {
    let Some(outer) = heading_box(root, "You may also like") else {
        debug!("page has no suggestions box");
        return Ok(Vec::new());
    };
    outer
        .select(&ROW)
        .filter(|row| has_exact_classes(*row, &["row", "clear"]))
        .map(|row| {
            let link = dom::require(row, &HEADING_LINK, "suggestion")?;
            let url = absolute(&attr(link, "href", "suggestion")?, "suggestion")?;
            let kind = ThumbnailKind::from_url(&url).unwrap_or(ThumbnailKind::Mod);
            let thumb = Thumbnail::new(text(link), url, kind);
            Ok(match image_src(row) {
                Some(src) => thumb.with_image(src),
                None => thumb,
            })
        })
        .collect()
}

/// The article thumbnails and the lead teaser above them.
fn articles(
    root: ElementRef<'_>,
    kind: PageKind,
) -> Result<(Vec<Thumbnail>, Option<PartialArticle>)> {
    let Some(outer) = heading_box(root, kind.articles_heading()) else {
        debug!(?kind, "page has no articles box");
        return Ok((Vec::new(), None));
    };
    let table = dom::require(outer, &ARTICLES_TABLE, "articles")?;

    let thumbnails = article_rows(table)
        .map(|row| {
            let a = dom::require(row, &A, "article thumbnail")?;
            titled_thumbnail(a, ThumbnailKind::Article, "article thumbnail")
        })
        .collect::<Result<Vec<_>>>()?;

    let has_teaser = table
        .select(&ROW)
        .any(|row| has_class(row, "rownoimage"));
    let lead = if has_teaser {
        Some(PartialArticle::from_fragment(table)?)
    } else {
        None
    };
    Ok((thumbnails, lead))
}

fn gallery(root: ElementRef<'_>) -> Result<Vec<GalleryItem>> {
    root.select(&IMAGEBOX)
        .filter_map(|li| dom::first(li, &TITLED_LINK))
        .map(|a| {
            let url = absolute(&attr(a, "href", "gallery")?, "gallery")?;
            let image = image_src(a);
            let kind = image.as_deref().map_or(GalleryKind::Unknown, gallery_kind);
            let mut thumbnail = Thumbnail::new(attr(a, "title", "gallery")?, url, ThumbnailKind::Media);
            thumbnail.image = image;
            Ok(GalleryItem { thumbnail, kind })
        })
        .collect()
}

/// Video thumbnails keep the clip's extension ahead of the image one
/// (`trailer.mp4.jpg`), so any video extension wins.
fn gallery_kind(src: &str) -> GalleryKind {
    let file = src
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    let extensions: Vec<&str> = file.split('.').skip(1).collect();
    if extensions.iter().any(|ext| VIDEO_EXTENSIONS.contains(ext)) {
        GalleryKind::Video
    } else if extensions.last().is_some_and(|ext| IMAGE_EXTENSIONS.contains(ext)) {
        GalleryKind::Image
    } else {
        GalleryKind::Unknown
    }
}

/// Rows of a "Files" or "Games" style box: the name sits in the content
/// heading, the image anywhere in the row.
fn thumbnails_in_box(
    root: ElementRef<'_>,
    heading: &'static str,
    kind: ThumbnailKind,
) -> Result<Vec<Thumbnail>> {
    let Some(outer) = heading_box(root, heading) else {
        debug!(heading, "page has no such box");
        return Ok(Vec::new());
    };
    outer
        .select(&ROW)
        .filter(|row| has_exact_classes(*row, &["row", "rowcontent", "clear"]))
        .map(|row| {
            let link = dom::require(row, &CONTENT_LINK, heading)?;
            let url = absolute(&attr(link, "href", heading)?, heading)?;
            let thumb = Thumbnail::new(text(link), url, kind);
            Ok(match image_src(row) {
                Some(src) => thumb.with_image(src),
                None => thumb,
            })
        })
        .collect()
}

fn styled_page(doc: &Document, kind: PageKind) -> Result<(PageCore, Style, Vec<Thumbnail>)> {
    let page = parse_core(doc, kind)?;
    let style = boxes::style(doc.root())?;
    let files = thumbnails_in_box(doc.root(), "Files", ThumbnailKind::File)?;
    Ok((page, style, files))
}

impl Mod {
    pub fn from_document(doc: &Document) -> Result<Self> {
        let (page, style, files) = styled_page(doc, PageKind::Mod)?;
        Ok(Mod { page, style, files })
    }
}

impl Game {
    pub fn from_document(doc: &Document) -> Result<Self> {
        let (page, style, files) = styled_page(doc, PageKind::Game)?;
        Ok(Game { page, style, files })
    }
}

impl Group {
    pub fn from_document(doc: &Document) -> Result<Self> {
        let (page, style, files) = styled_page(doc, PageKind::Group)?;
        Ok(Group { page, style, files })
    }
}

impl Engine {
    pub fn from_document(doc: &Document) -> Result<Self> {
        let page = parse_core(doc, PageKind::Engine)?;
        let games = thumbnails_in_box(doc.root(), "Games", ThumbnailKind::Game)?;
        Ok(Engine { page, games })
    }
}
