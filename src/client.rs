//! Fetch-then-extract entry points and the member actions.
//!
//! Every `get_*` call performs exactly one fetch through the transport and
//! hands the markup to the matching extractor. Actions that change state on
//! the site (watching, voting, clearing updates) need a [`Session`].

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{
    Addon, Article, Comment, CommentTree, Engine, File, Game, Group, Media, Mod, Thumbnail, Update,
};
use crate::parser::extract::comments;
use crate::parser::extract::listing::{
    extract_listing, extract_updates, listing_url, paged, HasFiles, ListingKind, Listable, WatchKind,
};
use crate::parser::{Document, BASE_URL};
use crate::transport::{Session, Transport};

/// Every url it builds and every link the extractors return is rooted at
/// [`BASE_URL`].
pub struct Client<T: Transport> {
    transport: T,
    session: Option<Session>,
}

/// Body of the site's ajax action responses.
#[derive(Debug, Deserialize)]
struct ActionReply {
    #[serde(default)]
    text: String,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Client {
            transport,
            session: None,
        }
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn require_session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(Error::NoSession)
    }

    fn get_document(&self, url: &str) -> Result<Document> {
        let html = match &self.session {
            Some(session) => {
                debug!(url, "fetching (authenticated)");
                self.transport.fetch_authenticated(url, session)?
            }
            None => {
                debug!(url, "fetching");
                self.transport.fetch(url)?
            }
        };
        Ok(Document::parse(&html))
    }

    fn post_action(&self, url: &str, form: &[(&str, &str)]) -> Result<String> {
        let session = self.require_session()?;
        info!(url, "posting action");
        Ok(self.transport.post_authenticated(url, form, session)?)
    }

    // ── Entities ──

    pub fn get_mod(&self, url: &str) -> Result<Mod> {
        Mod::from_document(&self.get_document(url)?)
    }

    pub fn get_game(&self, url: &str) -> Result<Game> {
        Game::from_document(&self.get_document(url)?)
    }

    pub fn get_engine(&self, url: &str) -> Result<Engine> {
        Engine::from_document(&self.get_document(url)?)
    }

    pub fn get_group(&self, url: &str) -> Result<Group> {
        Group::from_document(&self.get_document(url)?)
    }

    pub fn get_file(&self, url: &str) -> Result<File> {
        File::from_document(&self.get_document(url)?)
    }

    pub fn get_addon(&self, url: &str) -> Result<Addon> {
        Addon::from_document(&self.get_document(url)?)
    }

    pub fn get_media(&self, url: &str) -> Result<Media> {
        Media::from_document(&self.get_document(url)?)
    }

    pub fn get_article(&self, url: &str) -> Result<Article> {
        Article::from_document(&self.get_document(url)?)
    }

    /// One page of comments under any entity page.
    pub fn get_comments(&self, page_url: &str, index: u32) -> Result<CommentTree> {
        let doc = self.get_document(&paged(page_url, index)?)?;
        comments::extract(doc.root())
    }

    // ── Listings ──

    pub fn get_listing(&self, page_url: &str, kind: ListingKind, index: u32) -> Result<Vec<Thumbnail>> {
        let url = listing_url(page_url, kind, index)?;
        extract_listing(&self.get_document(&url)?, kind.thumbnail_kind())
    }

    pub fn get_files(&self, page: &impl HasFiles, index: u32) -> Result<Vec<Thumbnail>> {
        self.get_listing(page.page_url(), ListingKind::Files, index)
    }

    pub fn get_articles(&self, page: &impl Listable, index: u32) -> Result<Vec<Thumbnail>> {
        self.get_listing(page.page_url(), ListingKind::Articles, index)
    }

    pub fn get_tutorials(&self, page: &impl Listable, index: u32) -> Result<Vec<Thumbnail>> {
        self.get_listing(page.page_url(), ListingKind::Tutorials, index)
    }

    pub fn get_addons(&self, page: &impl Listable, index: u32) -> Result<Vec<Thumbnail>> {
        self.get_listing(page.page_url(), ListingKind::Addons, index)
    }

    pub fn get_mods(&self, game: &Game, index: u32) -> Result<Vec<Thumbnail>> {
        self.get_listing(game.page_url(), ListingKind::Mods, index)
    }

    pub fn get_games(&self, engine: &Engine, index: u32) -> Result<Vec<Thumbnail>> {
        self.get_listing(engine.page_url(), ListingKind::Games, index)
    }

    // ── Member actions ──

    pub fn get_updates(&self) -> Result<Vec<Update>> {
        self.require_session()?;
        let doc = self.get_document(&format!("{}/messages/updates", BASE_URL))?;
        extract_updates(&doc)
    }

    pub fn get_watched(&self, kind: WatchKind, index: u32) -> Result<Vec<Thumbnail>> {
        self.require_session()?;
        let url = paged(
            &format!("{}/messages/watching/{}", BASE_URL, kind.segment()),
            index,
        )?;
        extract_listing(&self.get_document(&url)?, kind.thumbnail_kind())
    }

    /// Toggle watching the page behind a profile's follow url.
    pub fn track(&self, follow_url: &str) -> Result<()> {
        if follow_url.is_empty() {
            return Err(Error::MissingAction("follow"));
        }
        self.post_action(follow_url, &[])?;
        Ok(())
    }

    /// Stop watching the update's subject. True when the site confirms.
    pub fn unfollow(&self, update: &Update) -> Result<bool> {
        self.ajax_action(&update.unfollow, "no longer watching")
    }

    /// Dismiss the pending changes of an update. True when the site confirms.
    pub fn clear(&self, update: &Update) -> Result<bool> {
        self.ajax_action(&update.clear, "successfully removed")
    }

    pub fn like_comment(&self, comment: &Comment) -> Result<()> {
        let url = comment.upvote.as_deref().ok_or(Error::MissingAction("upvote"))?;
        self.post_action(url, &[])?;
        Ok(())
    }

    pub fn dislike_comment(&self, comment: &Comment) -> Result<()> {
        let url = comment.downvote.as_deref().ok_or(Error::MissingAction("downvote"))?;
        self.post_action(url, &[])?;
        Ok(())
    }

    fn ajax_action(&self, url: &str, confirmation: &str) -> Result<bool> {
        let body = self.post_action(url, &[("ajax", "t")])?;
        let reply: ActionReply = serde_json::from_str(&body)?;
        Ok(reply.text.contains(confirmation))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;
    use crate::transport::TransportError;

    #[derive(Debug, Clone, PartialEq)]
    enum Request {
        Get { url: String, authenticated: bool },
        Post { url: String, form: Vec<(String, String)> },
    }

    /// Serves canned markup by url and records every request.
    #[derive(Default)]
    struct RecordingTransport {
        pages: HashMap<String, String>,
        reply: String,
        requests: RefCell<Vec<Request>>,
    }

    impl RecordingTransport {
        fn serve(mut self, url: &str, fixture: &str) -> Self {
            let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", fixture)).unwrap();
            self.pages.insert(url.to_string(), html);
            self
        }

        fn reply(mut self, body: &str) -> Self {
            self.reply = body.to_string();
            self
        }

        fn get(&self, url: &str, authenticated: bool) -> std::result::Result<String, TransportError> {
            self.requests.borrow_mut().push(Request::Get {
                url: url.to_string(),
                authenticated,
            });
            self.pages.get(url).cloned().ok_or_else(|| TransportError::Status {
                status: 404,
                url: url.to_string(),
            })
        }
    }

    impl Transport for RecordingTransport {
        fn fetch(&self, url: &str) -> std::result::Result<String, TransportError> {
            self.get(url, false)
        }

        fn fetch_authenticated(&self, url: &str, _session: &Session) -> std::result::Result<String, TransportError> {
            self.get(url, true)
        }

        fn post_authenticated(
            &self,
            url: &str,
            form: &[(&str, &str)],
            _session: &Session,
        ) -> std::result::Result<String, TransportError> {
            self.requests.borrow_mut().push(Request::Post {
                url: url.to_string(),
                form: form.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            });
            Ok(self.reply.clone())
        }
    }

    const MOD_URL: &str = "https://www.moddb.com/mods/stalker-anomaly";
    const ARTICLE_URL: &str = "https://www.moddb.com/mods/stalker-anomaly/news/anomaly-151-released";

    fn session() -> Session {
        Session::from_cookie_header("freeman=abc")
    }

    fn requests(client: &Client<RecordingTransport>) -> Vec<Request> {
        client.transport().requests.borrow().clone()
    }

    #[test]
    fn resolve_fetches_the_teaser_once() {
        let client = Client::new(
            RecordingTransport::default()
                .serve(MOD_URL, "mod")
                .serve(ARTICLE_URL, "article"),
        );
        let m = client.get_mod(MOD_URL).unwrap();
        let teaser = m.page.article.as_ref().unwrap();
        assert_eq!(teaser.url, ARTICLE_URL);

        let article = teaser.resolve(&client).unwrap();
        assert_eq!(article.url, ARTICLE_URL);
        assert_eq!(
            requests(&client),
            vec![
                Request::Get { url: MOD_URL.into(), authenticated: false },
                Request::Get { url: ARTICLE_URL.into(), authenticated: false },
            ]
        );
    }

    #[test]
    fn listing_url_and_page_guard() {
        let client = Client::new(
            RecordingTransport::default().serve(&format!("{}/downloads/page/1", MOD_URL), "listing"),
        );
        let files = client.get_listing(MOD_URL, ListingKind::Files, 1).unwrap();
        assert_eq!(files.len(), 3);

        assert!(matches!(
            client.get_listing(MOD_URL, ListingKind::Files, 0),
            Err(Error::InvalidPage(0))
        ));
        assert_eq!(requests(&client).len(), 1);
    }

    #[test]
    fn listing_helpers_use_the_page_url() {
        let client = Client::new(
            RecordingTransport::default()
                .serve(MOD_URL, "mod")
                .serve(&format!("{}/addons/page/2", MOD_URL), "listing_empty"),
        );
        let m = client.get_mod(MOD_URL).unwrap();
        assert!(client.get_addons(&m, 2).unwrap().is_empty());
        assert!(matches!(
            client.get_files(&m, 3),
            Err(Error::Transport(TransportError::Status { status: 404, .. }))
        ));
    }

    #[test]
    fn comment_pages() {
        let client = Client::new(
            RecordingTransport::default().serve(&format!("{}/page/2", MOD_URL), "mod"),
        );
        let tree = client.get_comments(MOD_URL, 2).unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn member_actions_need_a_session() {
        let client = Client::new(RecordingTransport::default());
        assert!(matches!(client.get_updates(), Err(Error::NoSession)));
        assert!(matches!(client.track("https://www.moddb.com/mods/x/watch"), Err(Error::NoSession)));
        assert!(requests(&client).is_empty());
    }

    #[test]
    fn updates_and_unfollow() {
        let client = Client::new(
            RecordingTransport::default()
                .serve("https://www.moddb.com/messages/updates", "updates")
                .reply(r#"{"error":false,"text":"You are no longer watching this mod"}"#),
        )
        .with_session(session());

        let updates = client.get_updates().unwrap();
        assert_eq!(updates.len(), 3);
        // Links pulled from the page share the host of the url that fetched it.
        assert!(updates
            .iter()
            .all(|u| u.unfollow.starts_with(BASE_URL) && u.clear.starts_with(BASE_URL)));
        assert!(client.unfollow(&updates[0]).unwrap());
        // The reply never mentions removal, so clearing reports failure.
        assert!(!client.clear(&updates[0]).unwrap());

        let log = requests(&client);
        assert_eq!(
            log[0],
            Request::Get {
                url: "https://www.moddb.com/messages/updates".into(),
                authenticated: true
            }
        );
        assert_eq!(
            log[1],
            Request::Post {
                url: "https://www.moddb.com/mods/stalker-anomaly/unwatch/abc".into(),
                form: vec![("ajax".into(), "t".into())],
            }
        );
    }

    #[test]
    fn watched_listing() {
        let client = Client::new(
            RecordingTransport::default()
                .serve("https://www.moddb.com/messages/watching/mods/page/1", "listing"),
        )
        .with_session(session());
        let watched = client.get_watched(WatchKind::Mod, 1).unwrap();
        assert_eq!(watched.len(), 3);
        assert!(watched.iter().all(|t| t.kind == crate::model::ThumbnailKind::Mod));
    }

    #[test]
    fn comment_votes() {
        let client = Client::new(RecordingTransport::default().serve(MOD_URL, "mod"))
            .with_session(session());
        let m = client.get_mod(MOD_URL).unwrap();
        let mut comment = m.page.comments.comments[0].clone();

        client.like_comment(&comment).unwrap();
        comment.downvote = None;
        assert!(matches!(
            client.dislike_comment(&comment),
            Err(Error::MissingAction("downvote"))
        ));
        assert_eq!(
            requests(&client).last(),
            Some(&Request::Post {
                url: "https://www.moddb.com/comments/7001/up".into(),
                form: Vec::new(),
            })
        );
    }

    #[test]
    fn bad_action_reply() {
        let client = Client::new(RecordingTransport::default().reply("<html>login</html>"))
            .with_session(session());
        let update = Update {
            subject: Thumbnail::new("x", "https://www.moddb.com/mods/x", crate::model::ThumbnailKind::Mod),
            unfollow: "https://www.moddb.com/mods/x/unwatch".into(),
            clear: "https://www.moddb.com/messages/updates/clear/mods/1".into(),
            changes: Vec::new(),
            date: crate::parser::decode::parse_timestamp("2021-01-01").unwrap(),
        };
        assert!(matches!(client.clear(&update), Err(Error::ActionResponse(_))));
    }
}
