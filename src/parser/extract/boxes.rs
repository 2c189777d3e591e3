//! The profile, statistics and style side boxes shared by page-like entities.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use tracing::debug;

use super::{image_src, link_thumbnail, row_href, row_link, row_time, summary_text, A};
use crate::error::{Error, Result};
use crate::model::{
    Membership, PageKind, Profile, ReleaseStatus, Share, Statistics, Style, StyleTag, ThumbnailKind,
};
use crate::parser::decode::{parse_counted_views, parse_grouped_int, parse_rank, parse_timestamp, trailing_id};
use crate::parser::dom::{self, attr, find_by_label, find_labels, heading_box, require_label, text};

static TABLEMENU: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.table.tablemenu").unwrap());

const DEVELOPER_LABELS: &[&str] = &["Developer", "Publisher", "Developer & Publisher", "Creator", "Company"];
const COUNTER_LABELS: &[&str] = &["Files", "Articles", "Reviews", "Watchers", "Mods", "Addons", "Members"];

/// The label table inside the box headed `heading`.
fn box_table<'a>(scope: ElementRef<'a>, heading: &'static str) -> Result<ElementRef<'a>> {
    let outer = heading_box(scope, heading).ok_or_else(|| Error::missing(heading))?;
    dom::require(outer, &TABLEMENU, heading)
}

pub fn profile(scope: ElementRef<'_>, kind: PageKind) -> Result<Profile> {
    let table = box_table(scope, "Profile")?;

    let follow = row_href(require_label(table, kind.watch_label())?, "follow")?;
    let contact = find_by_label(table, "Contact")
        .map(|row| row_href(row, "contact"))
        .transpose()?;
    let share = match find_by_label(table, "Share") {
        Some(row) => share_links(row)?,
        None => None,
    };
    if share.is_none() {
        debug!(?kind, "profile has no usable share box");
    }

    let icon = match kind {
        PageKind::Mod | PageKind::Game => find_by_label(table, "Icon").and_then(image_src),
        _ => None,
    };

    let mut developers = BTreeMap::new();
    let mut release = None;
    let mut status = None;
    let mut platforms = Vec::new();
    let mut homepage = None;
    let mut engine = None;
    let mut game = None;
    let mut private = None;
    let mut membership = None;

    if kind != PageKind::Group {
        for (label, row) in find_labels(table, DEVELOPER_LABELS) {
            let a = row_link(row, "developer")?;
            let thumb_kind = if label == "Creator" {
                ThumbnailKind::Member
            } else {
                ThumbnailKind::Group
            };
            developers.insert(label.to_lowercase(), link_thumbnail(a, thumb_kind, "developer")?);
        }

        match find_by_label(table, "Release date") {
            Some(row) => {
                let time = row_time(row, "release date")?;
                release = time
                    .value()
                    .attr("datetime")
                    .map(parse_timestamp)
                    .transpose()?;
                status = Some(release_status(&text(time)));
            }
            None => debug!(?kind, "no release date row"),
        }

        if kind != PageKind::Mod {
            if let Some(row) = find_by_label(table, "Platforms") {
                platforms = row.select(&A).map(text).collect();
            }
        }

        homepage = find_by_label(table, "Homepage")
            .map(|row| row_link(row, "homepage").and_then(|a| attr(a, "href", "homepage")))
            .transpose()?;
        if homepage.is_none() {
            debug!(?kind, "no homepage");
        }
    }

    match kind {
        PageKind::Game => {
            engine = find_by_label(table, "Engine")
                .map(|row| link_thumbnail(row_link(row, "engine")?, ThumbnailKind::Engine, "engine"))
                .transpose()?;
        }
        PageKind::Mod => {
            let row = require_label(table, "Game")?;
            game = Some(link_thumbnail(row_link(row, "game")?, ThumbnailKind::Game, "game")?);
        }
        PageKind::Group => {
            private = find_by_label(table, "Privacy")
                .map(|row| summary_text(row, "privacy"))
                .transpose()?
                .map(|p| p != "Public");
            membership = find_by_label(table, "Subscription")
                .map(|row| summary_text(row, "subscription"))
                .transpose()?
                .map(|s| membership_policy(&s));
        }
        PageKind::Engine => {}
    }

    Ok(Profile {
        kind,
        contact,
        follow,
        share,
        icon,
        developers,
        release,
        status,
        platforms,
        homepage,
        engine,
        game,
        private,
        membership,
    })
}

pub fn statistics(scope: ElementRef<'_>) -> Result<Statistics> {
    let table = box_table(scope, "Statistics")?;

    let mut counters: BTreeMap<String, u64> = BTreeMap::new();
    for (label, row) in find_labels(table, COUNTER_LABELS) {
        let value = parse_grouped_int(&text(row_link(row, "statistics")?))?;
        counters.insert(label.to_lowercase(), value);
    }

    let visits = text(row_link(require_label(table, "Visits")?, "visits")?);
    let (visits, today) = parse_counted_views(&visits)?;
    let (rank, total) = parse_rank(&text(row_link(require_label(table, "Rank")?, "rank")?))?;

    let updated = dom::itemprop(scope, "dateModified")
        .and_then(|t| t.value().attr("datetime"))
        .map(parse_timestamp)
        .transpose()?;

    Ok(Statistics {
        files: counters.get("files").copied(),
        articles: counters.get("articles").copied(),
        reviews: counters.get("reviews").copied(),
        watchers: counters.get("watchers").copied(),
        mods: counters.get("mods").copied(),
        addons: counters.get("addons").copied(),
        members: counters.get("members").copied(),
        visits,
        today,
        rank,
        total,
        updated,
    })
}

pub fn style(scope: ElementRef<'_>) -> Result<Style> {
    let table = box_table(scope, "Style")?;

    let tag = |row: ElementRef<'_>, field: &'static str| -> Result<StyleTag> {
        let a = row_link(row, field)?;
        Ok(StyleTag {
            name: text(a),
            id: trailing_id(&attr(a, "href", field)?)?,
        })
    };

    let scope_tag = find_by_label(table, "Project")
        .map(|row| tag(row, "project"))
        .transpose()?;
    if scope_tag.is_none() {
        debug!("style box has no project scope");
    }
    let boxart = find_by_label(table, "Boxart").and_then(image_src);
    if boxart.is_none() {
        debug!("style box has no boxart");
    }

    Ok(Style {
        theme: tag(require_label(table, "Theme")?, "theme")?,
        genre: tag(require_label(table, "Genre")?, "genre")?,
        players: tag(require_label(table, "Players")?, "players")?,
        scope: scope_tag,
        boxart,
    })
}

/// Reddit, mail, twitter, facebook, in that order.
pub(super) fn share_links(row: ElementRef<'_>) -> Result<Option<Share>> {
    let hrefs = row
        .select(&A)
        .map(|a| attr(a, "href", "share"))
        .collect::<Result<Vec<_>>>()?;
    Ok(match hrefs.as_slice() {
        [reddit, mail, twitter, facebook, ..] => Some(Share {
            reddit: reddit.clone(),
            mail: mail.clone(),
            twitter: twitter.clone(),
            facebook: facebook.clone(),
        }),
        _ => None,
    })
}

fn release_status(label: &str) -> ReleaseStatus {
    if label.contains("Coming") {
        ReleaseStatus::ComingSoon
    } else if label.contains("Early") {
        ReleaseStatus::EarlyAccess
    } else if label.contains("Released") {
        ReleaseStatus::Released
    } else {
        ReleaseStatus::Unreleased
    }
}

fn membership_policy(label: &str) -> Membership {
    match label {
        "Open to all members" => Membership::OpenToAll,
        "Must apply to join" => Membership::MustApply,
        _ => Membership::InviteOnly,
    }
}
