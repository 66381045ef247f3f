//! The admin capsule listing.
//!
//! [`AdminRoster`] holds one server page of capsules plus a client-side
//! keyword filter over it. The page is tied to the session generation it was
//! loaded under: once the session changes (logout, a rejected token, a new
//! login) the cached page reads as empty until the next [`AdminRoster::load`].

use tracing::{debug, instrument, warn};

use time_capsule_core::{Capsule, CapsuleCode, CapsuleSort, Pagination};

use crate::error::ClientError;
use crate::gateway::HttpGateway;

/// Outcome of [`AdminRoster::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The backend deleted the capsule.
    Deleted,
    /// The backend no longer had it; it was dropped locally anyway.
    AlreadyDeleted,
}

#[derive(Debug)]
struct LoadedPage {
    generation: u64,
    items: Vec<Capsule>,
    pagination: Pagination,
}

/// One page of the admin listing with a keyword filter.
#[derive(Debug)]
pub struct AdminRoster {
    gateway: HttpGateway,
    sort: CapsuleSort,
    page_size: u32,
    keyword: String,
    page: Option<LoadedPage>,
}

impl AdminRoster {
    /// An empty roster loading `page_size` capsules per page.
    #[must_use]
    pub fn new(gateway: HttpGateway, page_size: u32) -> Self {
        Self {
            gateway,
            sort: CapsuleSort::default(),
            page_size: page_size.max(1),
            keyword: String::new(),
            page: None,
        }
    }

    /// Use `sort` for subsequent loads.
    #[must_use]
    pub fn with_sort(mut self, sort: CapsuleSort) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The loaded page, if it still belongs to the current session.
    fn current(&self) -> Option<&LoadedPage> {
        let generation = self.gateway.session().generation();
        self.page.as_ref().filter(|page| page.generation == generation)
    }

    fn current_mut(&mut self) -> Option<&mut LoadedPage> {
        let generation = self.gateway.session().generation();
        self.page
            .as_mut()
            .filter(|page| page.generation == generation)
    }

    /// Replace the cached page with `page` (1-based) from the backend.
    ///
    /// On failure the previous page is kept.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthorized`] without sending anything if no
    /// admin is logged in, otherwise any gateway error.
    #[instrument(skip(self))]
    pub async fn load(&mut self, page: u32, page_size: u32) -> Result<(), ClientError> {
        let session = self.gateway.session().snapshot();
        if !session.is_authenticated() {
            return Err(ClientError::Unauthorized(
                "admin login required".to_string(),
            ));
        }

        let loaded = self
            .gateway
            .list_capsules(page, page_size, self.sort)
            .await?;
        debug!(
            items = loaded.items.len(),
            total = loaded.pagination.total_items,
            "Loaded admin page"
        );

        self.page = Some(LoadedPage {
            generation: session.generation,
            items: loaded.items,
            pagination: loaded.pagination,
        });
        Ok(())
    }

    /// [`AdminRoster::load`] with the roster's own page size.
    ///
    /// # Errors
    ///
    /// Same as [`AdminRoster::load`].
    pub async fn load_page(&mut self, page: u32) -> Result<(), ClientError> {
        self.load(page, self.page_size).await
    }

    /// Delete a capsule on the backend and drop it from the cached page.
    ///
    /// A capsule the backend no longer has is dropped locally too. Any
    /// other failure leaves the page unchanged. Pagination totals stay as
    /// the server last reported them.
    ///
    /// # Errors
    ///
    /// Returns any gateway error other than [`ClientError::NotFound`].
    #[instrument(skip(self), fields(code = %code))]
    pub async fn remove(&mut self, code: &CapsuleCode) -> Result<Removal, ClientError> {
        let removal = match self.gateway.delete_capsule(code).await {
            Ok(()) => Removal::Deleted,
            Err(ClientError::NotFound(message)) => {
                warn!(message = %message, "Capsule already gone, dropping locally");
                Removal::AlreadyDeleted
            }
            Err(e) => return Err(e),
        };

        if let Some(page) = self.current_mut() {
            page.items.retain(|capsule| capsule.code.as_ref() != Some(code));
        }
        Ok(removal)
    }

    /// Set the keyword and return the filtered view.
    pub fn filter(&mut self, keyword: &str) -> Vec<&Capsule> {
        self.set_keyword(keyword);
        self.filtered()
    }

    pub fn set_keyword(&mut self, keyword: &str) {
        keyword.clone_into(&mut self.keyword);
    }

    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Items on the cached page matching the keyword, in server order.
    #[must_use]
    pub fn filtered(&self) -> Vec<&Capsule> {
        filter_capsules(self.items(), &self.keyword)
    }

    /// All items on the cached page.
    #[must_use]
    pub fn items(&self) -> &[Capsule] {
        self.current().map_or(&[], |page| page.items.as_slice())
    }

    /// Pagination as the server reported it for the cached page.
    #[must_use]
    pub fn pagination(&self) -> Option<Pagination> {
        self.current().map(|page| page.pagination)
    }

    /// Whether a page for the current session is cached.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    /// Forget the cached page and keyword.
    pub fn clear(&mut self) {
        self.page = None;
        self.keyword.clear();
    }
}

/// Case-insensitive substring match on title and code. The keyword is used
/// as typed, whitespace included. Only an empty keyword keeps everything.
/// Order is preserved.
#[must_use]
pub fn filter_capsules<'a>(items: &'a [Capsule], keyword: &str) -> Vec<&'a Capsule> {
    if keyword.is_empty() {
        return items.iter().collect();
    }
    let needle = keyword.to_lowercase();
    items
        .iter()
        .filter(|capsule| capsule.matches_keyword(&needle))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use secrecy::SecretString;
    use serde_json::json;

    use super::*;
    use crate::config::ClientConfig;
    use crate::session::SessionStore;
    use crate::storage::MemoryStorage;

    fn capsule(code: &str, title: &str) -> Capsule {
        serde_json::from_value(json!({
            "capsuleCode": code,
            "title": title,
            "openTime": "2030-01-01T00:00:00Z",
        }))
        .unwrap()
    }

    fn roster() -> AdminRoster {
        let session = SessionStore::hydrate(Arc::new(MemoryStorage::new())).unwrap();
        let gateway = HttpGateway::new(
            &ClientConfig::default(),
            session,
            Arc::new(time_capsule_core::SystemClock),
        )
        .unwrap();
        AdminRoster::new(gateway, 20)
    }

    fn seed(roster: &mut AdminRoster, items: Vec<Capsule>) {
        roster.page = Some(LoadedPage {
            generation: roster.gateway.session().generation(),
            pagination: Pagination {
                current_page: 1,
                page_size: 20,
                total_items: items.len() as u64,
                total_pages: 1,
            },
            items,
        });
    }

    #[test]
    fn test_filter_by_title() {
        let items = vec![capsule("ALPHA001", "Alpha"), capsule("BETA0001", "Beta")];

        let hits = filter_capsules(&items, "al");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Alpha");
    }

    #[test]
    fn test_filter_empty_keeps_order() {
        let items = vec![capsule("ALPHA001", "Alpha"), capsule("BETA0001", "Beta")];

        let hits = filter_capsules(&items, "");
        let titles: Vec<_> = hits.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Alpha", "Beta"]);
    }

    #[test]
    fn test_filter_keeps_surrounding_whitespace() {
        let items = vec![
            capsule("LTR00001", "Letter to 2031"),
            capsule("LTR00002", "Letterbox"),
        ];

        let hits = filter_capsules(&items, "letter ");
        let titles: Vec<_> = hits.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Letter to 2031"]);

        let hits = filter_capsules(&items, " ");
        let titles: Vec<_> = hits.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Letter to 2031"]);
    }

    #[test]
    fn test_filter_by_code_case_insensitive() {
        let items = vec![capsule("ALPHA001", "First"), capsule("BETA0001", "Second")];
        let hits = filter_capsules(&items, "beta");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Second");
    }

    #[test]
    fn test_filter_does_not_touch_pagination() {
        let mut roster = roster();
        roster
            .gateway
            .session()
            .set_token(Some(SecretString::from("t")))
            .unwrap();
        seed(
            &mut roster,
            vec![capsule("ALPHA001", "Alpha"), capsule("BETA0001", "Beta")],
        );

        assert_eq!(roster.filter("zzz").len(), 0);
        assert_eq!(roster.items().len(), 2);
        assert_eq!(roster.pagination().unwrap().total_items, 2);
    }

    #[test]
    fn test_session_change_hides_cached_page() {
        let mut roster = roster();
        roster
            .gateway
            .session()
            .set_token(Some(SecretString::from("t")))
            .unwrap();
        seed(&mut roster, vec![capsule("ALPHA001", "Alpha")]);
        assert!(roster.is_loaded());

        roster.gateway.session().logout().unwrap();
        assert!(!roster.is_loaded());
        assert!(roster.items().is_empty());
        assert!(roster.pagination().is_none());
        assert!(roster.filtered().is_empty());
    }

    #[tokio::test]
    async fn test_load_requires_session() {
        let mut roster = roster();
        let err = roster.load(1, 20).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(!roster.is_loaded());
    }

    #[test]
    fn test_clear() {
        let mut roster = roster();
        seed(&mut roster, vec![capsule("ALPHA001", "Alpha")]);
        roster.set_keyword("al");
        roster.clear();
        assert!(roster.items().is_empty());
        assert_eq!(roster.keyword(), "");
    }
}
