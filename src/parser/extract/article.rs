use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::boxes::share_links;
use super::{link_thumbnail, row_link, A, TIME};
use crate::client::Client;
use crate::error::{Error, Result};
use crate::model::{Article, ArticleKind, PartialArticle, ThumbnailKind};
use crate::parser::decode::{parse_counted_views, parse_timestamp};
use crate::parser::dom::{
    self, absolute, attr, child_elements, closest, find_by_label, has_class, has_exact_classes,
    require_itemprop, require_label, text, Document,
};
use crate::transport::Transport;

static H4_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h4 a").unwrap());
static SUBHEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.subheading").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.row").unwrap());

impl Article {
    pub fn from_document(doc: &Document) -> Result<Self> {
        let root = doc.root();

        let browse = require_label(root, "Browse")?;
        let raw_kind = text(row_link(browse, "browse")?);
        let kind = ArticleKind::from_label(&raw_kind)
            .ok_or_else(|| Error::invalid("article kind", format!("unknown category {:?}", raw_kind)))?;

        // The sidebar table holding Browse also holds the rest of the labels.
        let menu = closest(browse, |el| has_class(el, "tablemenu"))
            .ok_or_else(|| Error::missing("article menu"))?;

        let mut tags = BTreeMap::new();
        if let Some(row) = find_by_label(menu, "Tags") {
            for a in row.select(&A) {
                tags.insert(text(a), absolute(&attr(a, "href", "tags")?, "tags")?);
            }
        }

        let report = absolute(
            &attr(row_link(require_label(menu, "Report")?, "report")?, "href", "report")?,
            "report",
        )?;
        let (views, today) =
            parse_counted_views(&text(row_link(require_label(menu, "Views")?, "views")?))?;
        let share = share_links(require_label(menu, "Share")?)?
            .ok_or_else(|| Error::invalid("share", "expected four share links"))?;

        let author_box = require_itemprop(root, "author")?;
        let author_link = dom::first(author_box, &A).ok_or_else(|| Error::missing("author"))?;
        let author = link_thumbnail(author_link, ThumbnailKind::Member, "author")?;

        let published = require_itemprop(root, "datePublished")?;
        let date = parse_timestamp(&attr(published, "datetime", "datePublished")?)?;

        let body = require_itemprop(root, "articleBody")?;

        Ok(Article {
            kind,
            url: doc.og("og:url")?,
            title: text(require_itemprop(root, "headline")?),
            intro: text(require_itemprop(root, "description")?),
            author,
            date,
            tags,
            report,
            views,
            today,
            share,
            html: body.html(),
            plaintext: text(body),
        })
    }
}

impl PartialArticle {
    /// Build the teaser from the fragment that holds its heading row
    /// (`rownoimage`) and content row (`rowcontentnext`).
    pub fn from_fragment(scope: ElementRef<'_>) -> Result<Self> {
        let meta = row_with(scope, &["row", "rowcontent", "rownoimage", "clear"])
            .ok_or_else(|| Error::missing("article teaser"))?;
        let link = dom::require(meta, &H4_LINK, "article teaser title")?;
        let time = dom::require(meta, &TIME, "article teaser date")?;

        let kind = dom::first(meta, &SUBHEADING)
            .map(text)
            .and_then(|s| s.split_whitespace().next().and_then(ArticleKind::from_label))
            .unwrap_or(ArticleKind::News);

        let content = row_with(scope, &["row", "rowcontent", "rowcontentnext", "clear"])
            .ok_or_else(|| Error::missing("article teaser content"))?;

        Ok(PartialArticle {
            title: text(link),
            url: absolute(&attr(link, "href", "article teaser title")?, "article teaser title")?,
            date: parse_timestamp(&attr(time, "datetime", "article teaser date")?)?,
            kind,
            html: content.html(),
            plaintext: text(content),
        })
    }

    pub fn from_document(doc: &Document) -> Result<Self> {
        Self::from_fragment(doc.root())
    }

    /// Fetch the full article this teaser points to.
    pub fn resolve<T: Transport>(&self, client: &Client<T>) -> Result<Article> {
        client.get_article(&self.url)
    }
}

fn row_with<'a>(scope: ElementRef<'a>, classes: &[&str]) -> Option<ElementRef<'a>> {
    scope.select(&ROW).find(|el| has_exact_classes(*el, classes))
}

/// Thumbnail rows of an articles table: the `div.row` children that are
/// neither the teaser heading nor its content.
pub(super) fn article_rows<'a>(table: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    child_elements(table).filter(|el| has_exact_classes(*el, &["row", "rowcontent", "clear"]))
}
