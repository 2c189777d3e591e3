use std::sync::LazyLock;

use scraper::Selector;
use tracing::debug;

use super::{link_thumbnail, row_link, row_time, summary_text};
use crate::error::{Error, Result};
use crate::model::{Media, MediaKind, MediaSize, ThumbnailKind};
use crate::parser::decode::{parse_counted_views, parse_duration, parse_timestamp};
use crate::parser::dom::{self, attr, closest, find_by_label, has_class, require_label, text, Document};

static PLAYER_SOURCE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("video#mediaplayer source").unwrap());

impl Media {
    /// Parse an image, video or audio page. The kind follows from which of
    /// the duration and size rows the page shows.
    pub fn from_document(doc: &Document) -> Result<Self> {
        let root = doc.root();
        let info = find_by_label(root, "Views")
            .and_then(|row| closest(row, |el| has_class(el, "tablemenu")))
            .ok_or_else(|| Error::missing("media info"))?;

        let date = row_time(require_label(info, "Date")?, "date")?;
        let date = parse_timestamp(&attr(date, "datetime", "date")?)?;
        let author = link_thumbnail(row_link(require_label(info, "By")?, "by")?, ThumbnailKind::Member, "by")?;

        let duration = find_by_label(info, "Duration")
            .map(|row| row_time(row, "duration").and_then(|t| parse_duration(&text(t))))
            .transpose()?;
        let size = find_by_label(info, "Size")
            .map(|row| summary_text(row, "size").and_then(|s| media_size(&s)))
            .transpose()?;
        let (views, today) = parse_counted_views(&summary_text(require_label(info, "Views")?, "views")?)?;
        let filename = find_by_label(info, "Filename")
            .map(|row| summary_text(row, "filename"))
            .transpose()?;

        let kind = MediaKind::classify(duration, size.as_ref());
        let file_url = match kind {
            MediaKind::Video => {
                // og:image is the poster frame, `<clip>.<ext>.jpg`.
                let poster = doc.og("og:image")?;
                Some(poster.rsplit_once('.').map_or(poster.clone(), |(stem, _)| stem.to_string()))
            }
            MediaKind::Image => Some(doc.og("og:image")?),
            MediaKind::Audio => dom::first(root, &PLAYER_SOURCE)
                .and_then(|source| source.value().attr("src"))
                .map(str::to_string),
        };
        if file_url.is_none() {
            debug!(?kind, "media page exposes no file url");
        }

        Ok(Media {
            name: doc.og("og:title")?,
            url: doc.og("og:url")?,
            description: doc.meta_name("description")?,
            date,
            author,
            duration,
            size,
            views,
            today,
            filename,
            kind,
            file_url,
        })
    }
}

/// `1920×1080`, kept as printed.
fn media_size(raw: &str) -> Result<MediaSize> {
    let (width, height) = raw
        .split_once('×')
        .ok_or_else(|| Error::invalid("size", format!("{:?} is not width×height", raw)))?;
    Ok(MediaSize {
        width: width.trim().to_string(),
        height: height.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/media.html").unwrap()
    }

    #[test]
    fn video_page() {
        let media = Media::from_document(&Document::parse(&fixture())).unwrap();
        assert_eq!(media.kind, MediaKind::Video);
        assert_eq!(media.name, "Anomaly 1.5.1 release trailer");
        assert_eq!(media.url, "https://www.moddb.com/mods/stalker-anomaly/videos/release-trailer");
        assert_eq!(media.description, "Official trailer for the 1.5.1 release.");
        assert_eq!(media.author.name, "Raven");
        assert_eq!(media.author.url, "https://www.moddb.com/members/raven");
        assert_eq!(media.duration, Some(205));
        assert_eq!(
            media.size,
            Some(MediaSize {
                width: "1920".into(),
                height: "1080".into()
            })
        );
        assert_eq!((media.views, media.today), (12_034, 56));
        assert_eq!(media.filename.as_deref(), Some("anomaly_151_trailer.mp4"));
        assert_eq!(
            media.file_url.as_deref(),
            Some("https://media.moddb.com/images/mods/1/31/30233/trailer.mp4")
        );
        assert_eq!(media.date.to_rfc3339(), "2021-02-05T20:00:00+00:00");
    }

    #[test]
    fn image_page_drops_duration() {
        let html = fixture().replace("<h5>Duration</h5>", "<h5>Length</h5>");
        let media = Media::from_document(&Document::parse(&html)).unwrap();
        assert_eq!(media.kind, MediaKind::Image);
        assert_eq!(media.duration, None);
        assert_eq!(
            media.file_url.as_deref(),
            Some("https://media.moddb.com/images/mods/1/31/30233/trailer.mp4.jpg")
        );
    }

    #[test]
    fn audio_page_uses_player_source() {
        let html = fixture()
            .replace("<h5>Duration</h5>", "<h5>Length</h5>")
            .replace("<h5>Size</h5>", "<h5>Dimensions</h5>");
        let media = Media::from_document(&Document::parse(&html)).unwrap();
        assert_eq!(media.kind, MediaKind::Audio);
        assert_eq!(media.size, None);
        assert_eq!(
            media.file_url.as_deref(),
            Some("https://media.moddb.com/audio/trailer-theme.mp3")
        );
    }

    #[test]
    fn malformed_size() {
        let html = fixture().replace("1920×1080", "1920x1080");
        assert!(matches!(
            Media::from_document(&Document::parse(&html)),
            Err(Error::Extraction { field: "size", .. })
        ));
    }

    #[test]
    fn views_are_required() {
        let html = fixture().replace("<h5>Views</h5>", "<h5>Hits</h5>");
        assert!(matches!(
            Media::from_document(&Document::parse(&html)),
            Err(Error::Extraction { field: "media info", .. })
        ));
    }
}
