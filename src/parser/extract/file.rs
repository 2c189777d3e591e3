use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;

use super::{comments, link_thumbnail, row_input_value, row_link, row_time, summary_text};
use crate::error::{Error, Result};
use crate::model::{File, FileCategory, ThumbnailKind};
use crate::parser::decode::{parse_byte_size, parse_counted_views, parse_timestamp, trailing_id};
use crate::parser::dom::{self, attr, closest, find_by_label, has_class, require_label, text, Document};

static MD5_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{32}$").unwrap());
static SUMMARY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p#downloadsummary").unwrap());

impl File {
    /// Parse a download or addon page.
    pub fn from_document(doc: &Document) -> Result<Self> {
        let root = doc.root();

        let info = find_by_label(root, "MD5 Hash")
            .and_then(|row| closest(row, |el| has_class(el, "tablemenu")))
            .ok_or_else(|| Error::missing("file info"))?;

        let hash = summary_text(require_label(info, "MD5 Hash")?, "md5 hash")?;
        if !MD5_RE.is_match(&hash) {
            return Err(Error::invalid("md5 hash", format!("{:?} is not a 32 digit hex digest", hash)));
        }

        let name = summary_text(require_label(info, "Filename")?, "filename")?;
        let size = parse_byte_size(&summary_text(require_label(info, "Size")?, "size")?)?;

        let downloads = text(row_link(require_label(info, "Downloads")?, "downloads")?);
        let (downloads, today) = parse_counted_views(&downloads)?;

        let category_link = row_link(require_label(info, "Category")?, "category")?;
        let category = FileCategory::from_id(trailing_id(&attr(category_link, "href", "category")?)?);

        let uploader = link_thumbnail(
            row_link(require_label(info, "Uploader")?, "uploader")?,
            ThumbnailKind::Member,
            "uploader",
        )?;

        let added = row_time(require_label(info, "Added")?, "added")?;
        let added = parse_timestamp(&attr(added, "datetime", "added")?)?;

        let button = row_input_value(require_label(info, "Embed Button")?, "embed button")?;
        let widget = row_input_value(require_label(info, "Embed Widget")?, "embed widget")?;

        let description = text(dom::require(root, &SUMMARY, "download summary")?);

        Ok(File {
            name,
            hash,
            size,
            downloads,
            today,
            category,
            uploader,
            added,
            button,
            widget,
            description,
            preview: doc.og("og:image")?,
            url: doc.og("og:url")?,
            comments: comments::extract(root)?,
        })
    }
}
