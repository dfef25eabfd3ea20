//! Membership roster crawl
//!
//! Builds the complete, enriched member list of a wiki from the paginated
//! membership listing module:
//! 1. Discover the total page count from page 0's pagination control.
//! 2. Fan out one listing call per page, bounded only by the shared AJAX
//!    queue ceiling.
//! 3. Flatten the per-page stubs in (page, position) order, dropping
//!    duplicate identities.
//! 4. Enrich every stub with a profile lookup, position-preserving.
//!
//! Any stage error aborts the whole crawl; there is no partial roster.

mod parse;

use crate::client::WikidotKit;
use crate::types::{User, UserStub};
use crate::Result;
use futures::future::try_join_all;
use serde_json::json;
use std::collections::HashSet;
use url::Url;

const MEMBERS_MODULE: &str = "membership/MembersListModule";
const USER_INFO_MODULE: &str = "users/UserInfoWinModule";

impl WikidotKit {
    /// Crawls the full membership roster of the wiki at `base_url`
    ///
    /// Returns one entry per distinct member, either fully enriched or
    /// marked deleted, ordered by (listing page, position within page).
    pub async fn fetch_members_list(&self, base_url: &Url) -> Result<Vec<User>> {
        self.log("fetching members list", json!({ "wiki": base_url.as_str() }));

        let listing = self
            .ajax_call(base_url, json!({ "moduleName": MEMBERS_MODULE }))
            .await?;
        let total_pages = parse::page_count(&listing.body)?;

        self.log(
            "members listing paginated",
            json!({ "wiki": base_url.as_str(), "totalPages": total_pages }),
        );

        let pages = try_join_all(
            (0..total_pages).map(|page| self.fetch_members_page(base_url, page)),
        )
        .await?;

        let mut seen = HashSet::new();
        let stubs: Vec<UserStub> = pages
            .into_iter()
            .flatten()
            .filter(|stub| seen.insert(stub.uid))
            .collect();

        self.log(
            "members list flattened",
            json!({ "wiki": base_url.as_str(), "members": stubs.len() }),
        );

        try_join_all(
            stubs
                .iter()
                .map(|stub| self.fetch_user_profile(base_url, stub.uid)),
        )
        .await
    }

    /// Fetches and extracts one page of the membership listing
    async fn fetch_members_page(&self, base_url: &Url, page: u32) -> Result<Vec<UserStub>> {
        self.log(
            "fetching members page",
            json!({ "wiki": base_url.as_str(), "page": page }),
        );

        let response = self
            .ajax_call(
                base_url,
                json!({ "moduleName": MEMBERS_MODULE, "page": page }),
            )
            .await?;

        parse::member_stubs(&response.body)
    }

    /// Looks up one user's profile by identity
    ///
    /// A profile that renders no display name yields [`User::Deleted`].
    pub async fn fetch_user_profile(&self, base_url: &Url, uid: u64) -> Result<User> {
        self.log(
            "fetching user profile",
            json!({ "wiki": base_url.as_str(), "uid": uid }),
        );

        let response = self
            .ajax_call(
                base_url,
                json!({ "moduleName": USER_INFO_MODULE, "user_id": uid }),
            )
            .await?;

        parse::user_profile(&response.body, uid)
    }
}
