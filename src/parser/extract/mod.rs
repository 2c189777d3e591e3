pub mod article;
pub mod boxes;
pub mod comments;
pub mod file;
pub mod listing;
pub mod media;
pub mod page;

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::dom::{self, absolute, attr, text};
use crate::error::{Error, Result};
use crate::model::{Thumbnail, ThumbnailKind};

static SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static A: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static TIME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("time").unwrap());
static INPUT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("input").unwrap());

/// Text of the value span next to a label.
fn summary_text(row: ElementRef<'_>, field: &'static str) -> Result<String> {
    dom::first(row, &SPAN)
        .map(text)
        .ok_or_else(|| Error::invalid(field, "labelled row has no value"))
}

fn row_link<'a>(row: ElementRef<'a>, field: &'static str) -> Result<ElementRef<'a>> {
    dom::first(row, &A).ok_or_else(|| Error::invalid(field, "labelled row has no link"))
}

fn row_href(row: ElementRef<'_>, field: &'static str) -> Result<String> {
    let a = row_link(row, field)?;
    absolute(&attr(a, "href", field)?, field)
}

fn row_time<'a>(row: ElementRef<'a>, field: &'static str) -> Result<ElementRef<'a>> {
    dom::first(row, &TIME).ok_or_else(|| Error::invalid(field, "labelled row has no <time>"))
}

fn row_input_value(row: ElementRef<'_>, field: &'static str) -> Result<String> {
    let input = dom::first(row, &INPUT)
        .ok_or_else(|| Error::invalid(field, "labelled row has no <input>"))?;
    attr(input, "value", field)
}

fn image_src(scope: ElementRef<'_>) -> Option<String> {
    dom::first(scope, &IMG).and_then(|img| img.value().attr("src").map(str::to_string))
}

/// Thumbnail named by the link text.
fn link_thumbnail(a: ElementRef<'_>, kind: ThumbnailKind, field: &'static str) -> Result<Thumbnail> {
    let url = absolute(&attr(a, "href", field)?, field)?;
    Ok(Thumbnail::new(text(a), url, kind))
}

/// Thumbnail named by the link's `title`, with the image it wraps.
fn titled_thumbnail(a: ElementRef<'_>, kind: ThumbnailKind, field: &'static str) -> Result<Thumbnail> {
    let url = absolute(&attr(a, "href", field)?, field)?;
    let thumb = Thumbnail::new(attr(a, "title", field)?, url, kind);
    Ok(match image_src(a) {
        Some(src) => thumb.with_image(src),
        None => thumb,
    })
}
