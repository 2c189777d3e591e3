//! Comment rows and the reply tree they flatten into.
//!
//! The site renders comments as one flat run of rows in pre-order; a row
//! only says how deep it is (`reply1`, `reply2`), never who its parent is.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Node, Selector};
use tracing::debug;

use super::{image_src, A, TIME};
use crate::error::{Error, Result};
use crate::model::{Comment, CommentTree, Thumbnail, ThumbnailKind};
use crate::parser::decode::{parse_grouped_int, parse_timestamp};
use crate::parser::dom::{self, absolute, attr, child_elements, has_class, text};

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.table.tablecomments").unwrap());
static AVATAR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a.avatar").unwrap());
static ACTIONS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.actions").unwrap());
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.comment").unwrap());
static IFRAME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("iframe").unwrap());
static RELATED: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a.related").unwrap());
static KARMA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([+-]?[0-9,]+)").unwrap());

/// Thread every comment row under the page's comment table.
pub fn extract(scope: ElementRef<'_>) -> Result<CommentTree> {
    let table = dom::require(scope, &TABLE, "comments")?;
    let rows = child_elements(table)
        .filter(|el| el.value().name() == "div" && has_class(*el, "row"))
        .map(parse_comment)
        .collect::<Result<Vec<_>>>()?;
    build_tree(rows)
}

/// Rebuild the reply hierarchy from a pre-order stream of comments.
///
/// Depth 0 opens a new thread, depth 1 attaches to the last thread, depth 2
/// to the last reply of the last thread.
pub fn build_tree(stream: impl IntoIterator<Item = Comment>) -> Result<CommentTree> {
    let mut tree = CommentTree::default();
    for (index, comment) in stream.into_iter().enumerate() {
        let position = comment.position;
        let malformed = |reason| Error::MalformedCommentStream {
            index,
            position,
            reason,
        };
        match position {
            0 => tree.comments.push(comment),
            1 => tree
                .comments
                .last_mut()
                .ok_or_else(|| malformed("reply before any top-level comment"))?
                .children
                .push(comment),
            2 => tree
                .comments
                .last_mut()
                .ok_or_else(|| malformed("reply before any top-level comment"))?
                .children
                .last_mut()
                .ok_or_else(|| malformed("second-level reply without a first-level reply"))?
                .children
                .push(comment),
            _ => return Err(malformed("nesting deeper than two levels")),
        }
    }
    Ok(tree)
}

fn parse_comment(row: ElementRef<'_>) -> Result<Comment> {
    let id = attr(row, "id", "comment id")?
        .parse::<u64>()
        .map_err(|e| Error::invalid("comment id", e.to_string()))?;

    let avatar = dom::require(row, &AVATAR, "comment author")?;
    let author_url = absolute(&attr(avatar, "href", "comment author")?, "comment author")?;
    let author_name = attr(avatar, "title", "comment author")?;
    let mut author = Thumbnail::new(author_name, author_url, ThumbnailKind::Member);
    author.image = image_src(avatar);

    let time = dom::require(row, &TIME, "comment date")?;
    let date = parse_timestamp(&attr(time, "datetime", "comment date")?)?;

    let position = if has_class(row, "reply2") {
        2
    } else if has_class(row, "reply1") {
        1
    } else {
        0
    };

    let body = dom::first(row, &BODY).map(body_text);
    if body.is_none() {
        debug!(id, author = %author.name, "comment has no body, likely an embed");
    }

    let (karma, upvote, downvote, approved) = match dom::first(row, &ACTIONS) {
        Some(actions) => parse_actions(actions)?,
        None => (0, None, None, false),
    };

    let location = match dom::first(row, &RELATED) {
        Some(a) => {
            let url = absolute(&attr(a, "href", "comment location")?, "comment location")?;
            ThumbnailKind::from_url(&url).map(|kind| Thumbnail::new(text(a), url, kind))
        }
        None => None,
    };

    let guest = author.name.eq_ignore_ascii_case("guest");
    Ok(Comment {
        id,
        author,
        body,
        date,
        position,
        karma,
        upvote,
        downvote,
        approved,
        developer: has_badge(row, "developer"),
        staff: has_badge(row, "staff"),
        subscriber: has_badge(row, "subscriber"),
        guest,
        embeds: row
            .select(&IFRAME)
            .filter_map(|f| f.value().attr("src").map(str::to_string))
            .collect(),
        location,
        children: Vec::new(),
    })
}

/// Karma sits in the first span; the vote links follow the reply link.
fn parse_actions(actions: ElementRef<'_>) -> Result<(i64, Option<String>, Option<String>, bool)> {
    let karma_text = child_elements(actions)
        .find(|el| el.value().name() == "span")
        .map(text);
    let Some(karma_text) = karma_text else {
        return Ok((0, None, None, false));
    };
    let karma = KARMA_RE
        .captures(&karma_text)
        .map(|c| {
            let raw = &c[1];
            let magnitude = i64::try_from(parse_grouped_int(raw.trim_start_matches(['+', '-']))?)
                .map_err(|_| Error::MalformedInteger(raw.to_string()))?;
            Ok::<_, Error>(if raw.starts_with('-') { -magnitude } else { magnitude })
        })
        .transpose()?
        .unwrap_or(0);

    let links: Vec<ElementRef<'_>> = actions.select(&A).collect();
    let vote = |i: usize| -> Result<Option<String>> {
        links
            .get(i)
            .map(|a| absolute(&attr(*a, "href", "comment vote")?, "comment vote"))
            .transpose()
    };
    Ok((karma, vote(1)?, vote(2)?, true))
}

fn has_badge(row: ElementRef<'_>, class: &str) -> bool {
    row.descendants()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().name() == "span" && has_class(el, class))
}

/// Comment text with every link replaced by its target.
fn body_text(body: ElementRef<'_>) -> String {
    fn walk(el: ElementRef<'_>, out: &mut String) {
        for child in el.children() {
            match child.value() {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) if e.name() == "a" => match e.attr("href") {
                    Some(href) => out.push_str(href),
                    None => {
                        if let Some(inner) = ElementRef::wrap(child) {
                            walk(inner, out);
                        }
                    }
                },
                Node::Element(_) => {
                    if let Some(inner) = ElementRef::wrap(child) {
                        out.push(' ');
                        walk(inner, out);
                        out.push(' ');
                    }
                }
                _ => {}
            }
        }
    }
    let mut raw = String::new();
    walk(body, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
