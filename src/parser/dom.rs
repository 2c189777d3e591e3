//! Landmark queries over a parsed page.
//!
//! Extractors never address nodes by position alone. They anchor on a label
//! (`<h5>Size</h5>`), a box heading (`<span class="heading">Files</span>`), a
//! microdata property or an `og:` meta tag, and only then walk into the
//! surrounding markup.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{Error, Result};

static H5: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h5").unwrap());
static SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static META: LazyLock<Selector> = LazyLock::new(|| Selector::parse("meta").unwrap());
static ITEMPROP: LazyLock<Selector> = LazyLock::new(|| Selector::parse("[itemprop]").unwrap());
static BASE: LazyLock<Url> = LazyLock::new(|| Url::parse(super::BASE_URL).unwrap());

/// A parsed page or fragment.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(markup: &str) -> Self {
        Document {
            html: Html::parse_document(markup),
        }
    }

    pub fn fragment(markup: &str) -> Self {
        Document {
            html: Html::parse_fragment(markup),
        }
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// Content of `<meta property="og:...">`.
    pub fn og(&self, property: &'static str) -> Result<String> {
        self.html
            .select(&META)
            .find(|m| m.value().attr("property") == Some(property))
            .and_then(|m| m.value().attr("content"))
            .map(str::to_string)
            .ok_or_else(|| Error::missing(property))
    }

    /// Content of `<meta name="...">`.
    pub fn meta_name(&self, name: &'static str) -> Result<String> {
        self.html
            .select(&META)
            .find(|m| m.value().attr("name") == Some(name))
            .and_then(|m| m.value().attr("content"))
            .map(str::to_string)
            .ok_or_else(|| Error::missing(name))
    }
}

/// Whitespace-normalised text of an element and its descendants.
pub fn text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn first<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

pub fn require<'a>(
    scope: ElementRef<'a>,
    selector: &Selector,
    field: &'static str,
) -> Result<ElementRef<'a>> {
    first(scope, selector).ok_or_else(|| Error::missing(field))
}

pub fn attr(el: ElementRef<'_>, name: &str, field: &'static str) -> Result<String> {
    el.value()
        .attr(name)
        .map(str::to_string)
        .ok_or_else(|| Error::invalid(field, format!("<{}> has no {} attribute", el.value().name(), name)))
}

/// The row holding a labelled field: the parent of the `<h5>` whose text is
/// `label`.
pub fn find_by_label<'a>(scope: ElementRef<'a>, label: &str) -> Option<ElementRef<'a>> {
    scope
        .select(&H5)
        .find(|h| text(*h) == label)
        .and_then(parent)
}

pub fn require_label<'a>(scope: ElementRef<'a>, label: &'static str) -> Result<ElementRef<'a>> {
    find_by_label(scope, label).ok_or_else(|| Error::missing(label))
}

/// Every labelled row whose label is one of `labels`, with the label text.
pub fn find_labels<'a>(scope: ElementRef<'a>, labels: &[&str]) -> Vec<(String, ElementRef<'a>)> {
    scope
        .select(&H5)
        .filter_map(|h| {
            let label = text(h);
            if !labels.contains(&label.as_str()) {
                return None;
            }
            parent(h).map(|row| (label, row))
        })
        .collect()
}

/// The box (`div.normalbox`) whose heading span reads `heading`.
pub fn heading_box<'a>(scope: ElementRef<'a>, heading: &str) -> Option<ElementRef<'a>> {
    scope
        .select(&SPAN)
        .filter(|s| text(*s) == heading)
        .find_map(|s| closest(s, |el| has_class(el, "normalbox")))
}

/// First element carrying `itemprop="name"`.
pub fn itemprop<'a>(scope: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    scope
        .select(&ITEMPROP)
        .find(|el| el.value().attr("itemprop") == Some(name))
}

pub fn require_itemprop<'a>(scope: ElementRef<'a>, name: &'static str) -> Result<ElementRef<'a>> {
    itemprop(scope, name).ok_or_else(|| Error::missing(name))
}

pub fn parent(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

/// Nearest strict ancestor matching `pred`.
pub fn closest<'a>(el: ElementRef<'a>, pred: impl Fn(ElementRef<'a>) -> bool) -> Option<ElementRef<'a>> {
    el.ancestors().filter_map(ElementRef::wrap).find(|a| pred(*a))
}

pub fn child_elements(el: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    el.children().filter_map(ElementRef::wrap)
}

pub fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

pub fn class_count(el: ElementRef<'_>) -> usize {
    el.value().classes().count()
}

/// True when the class attribute holds exactly these tokens, in any order.
pub fn has_exact_classes(el: ElementRef<'_>, classes: &[&str]) -> bool {
    class_count(el) == classes.len() && classes.iter().all(|c| has_class(el, c))
}

/// Resolve a site-relative link against the site root.
pub fn absolute(href: &str, field: &'static str) -> Result<String> {
    BASE.join(href.trim())
        .map(String::from)
        .map_err(|e| Error::invalid(field, format!("bad link {:?}: {}", href, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOXES: &str = r#"
        <html><body>
        <div class="normalbox">
          <div class="normalcorner"><div class="title"><div class="headings">
            <span class="heading">Files</span>
          </div></div></div>
          <div class="inner"><p id="in-files">x</p></div>
        </div>
        <div class="table tablemenu">
          <div class="row clear"><h5>Size</h5><span class="summary"> 2mb </span></div>
          <div class="row clear"><h5>Files</h5><a href="/x">12</a></div>
        </div>
        <meta property="og:url" content="https://www.moddb.com/mods/x">
        <span itemprop="headline">Title here</span>
        </body></html>"#;

    #[test]
    fn label_lookup_returns_row() {
        let doc = Document::parse(BOXES);
        let row = find_by_label(doc.root(), "Size").unwrap();
        assert!(has_exact_classes(row, &["clear", "row"]));
        assert_eq!(text(row), "Size 2mb");
        assert!(find_by_label(doc.root(), "Nope").is_none());
        assert!(matches!(
            require_label(doc.root(), "Nope"),
            Err(Error::Extraction { field: "Nope", .. })
        ));
    }

    #[test]
    fn heading_box_ignores_h5_labels() {
        let doc = Document::parse(BOXES);
        let b = heading_box(doc.root(), "Files").unwrap();
        assert!(has_class(b, "normalbox"));
        assert!(b.html().contains("in-files"));
    }

    #[test]
    fn meta_and_microdata() {
        let doc = Document::parse(BOXES);
        assert_eq!(doc.og("og:url").unwrap(), "https://www.moddb.com/mods/x");
        assert!(doc.og("og:image").is_err());
        assert_eq!(text(itemprop(doc.root(), "headline").unwrap()), "Title here");
    }

    #[test]
    fn absolute_links() {
        assert_eq!(
            absolute("/mods/x", "url").unwrap(),
            "https://www.moddb.com/mods/x"
        );
        assert_eq!(
            absolute("https://media.moddb.com/a.jpg", "url").unwrap(),
            "https://media.moddb.com/a.jpg"
        );
    }
}
