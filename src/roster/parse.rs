//! Markup extraction for the roster crawl
//!
//! The membership listing and profile modules render plain HTML fragments.
//! Extraction rules:
//! - total page count: integer text of the second-to-last pager target
//! - member entry: last anchor inside each `.printuser`; display name is the
//!   anchor text, the uid is the numeric argument of its `onclick` call
//! - profile: `h1` display name, first `.table tr em` as the about text, the
//!   first and second `.table tr .odate` as account and membership dates
//!
//! Missing or malformed structure is a `Parse` error; nothing is defaulted.

use crate::transport::{compile, text_of, HtmlDocument};
use crate::types::{User, UserProfile, UserStub};
use crate::{Result, WikidotError};
use chrono::{NaiveDate, NaiveDateTime};
use scraper::ElementRef;

const PAGER_TARGET: &str = ".pager .target";
const MEMBER_ENTRY: &str = ".printuser";
const PROFILE_NAME: &str = "h1";
const PROFILE_ABOUT: &str = ".table tr em";
const PROFILE_DATES: &str = ".table tr .odate";

/// Total page count of the membership listing
pub(crate) fn page_count(body: &str) -> Result<u32> {
    let doc = HtmlDocument::parse(body);
    let targets = doc.select(PAGER_TARGET)?;

    let index = targets.len().checked_sub(2).ok_or_else(|| {
        WikidotError::Parse("members listing has no pagination control".to_string())
    })?;

    let text = text_of(&targets[index]);
    text.parse()
        .map_err(|_| WikidotError::Parse(format!("pager target {text:?} is not a page count")))
}

/// Member stubs of one listing page, in document order
pub(crate) fn member_stubs(body: &str) -> Result<Vec<UserStub>> {
    let doc = HtmlDocument::parse(body);
    let anchors = compile("a")?;
    let mut stubs = Vec::new();

    for entry in doc.select(MEMBER_ENTRY)? {
        let handle = entry.select(&anchors).last().ok_or_else(|| {
            WikidotError::Parse("membership entry has no user handle".to_string())
        })?;

        let username = text_of(&handle);
        let onclick = handle.value().attr("onclick").ok_or_else(|| {
            WikidotError::Parse(format!("user handle {username:?} has no onclick attribute"))
        })?;

        stubs.push(UserStub {
            uid: uid_from_handle(onclick)?,
            username,
        });
    }

    Ok(stubs)
}

/// A resolved profile, or the deleted marker when no name is rendered
pub(crate) fn user_profile(body: &str, uid: u64) -> Result<User> {
    let doc = HtmlDocument::parse(body);

    let username = doc
        .select(PROFILE_NAME)?
        .first()
        .map(text_of)
        .unwrap_or_default();
    if username.is_empty() {
        return Ok(User::Deleted { uid });
    }

    let about = doc
        .select(PROFILE_ABOUT)?
        .first()
        .map(text_of)
        .filter(|text| !text.is_empty());

    let dates = doc.select(PROFILE_DATES)?;
    let user_since = date_at(&dates, 0, "account date")?;
    let member_since = date_at(&dates, 1, "membership date")?;

    Ok(User::Active(UserProfile {
        uid,
        username,
        about,
        user_since,
        member_since,
    }))
}

/// The numeric argument of the call in a user handle's onclick attribute,
/// e.g. `WIKIDOT.page.listeners.userInfo(4598089); return false;`
fn uid_from_handle(onclick: &str) -> Result<u64> {
    let open = onclick.rfind('(').ok_or_else(|| {
        WikidotError::Parse(format!("user handle onclick {onclick:?} has no call"))
    })?;
    let rest = &onclick[open + 1..];
    let close = rest.find(')').ok_or_else(|| {
        WikidotError::Parse(format!("user handle onclick {onclick:?} has no call"))
    })?;

    let token = rest[..close].trim();
    token
        .parse()
        .map_err(|_| WikidotError::Parse(format!("user handle argument {token:?} is not numeric")))
}

fn date_at(dates: &[ElementRef<'_>], index: usize, what: &str) -> Result<NaiveDate> {
    let element = dates
        .get(index)
        .ok_or_else(|| WikidotError::Parse(format!("profile is missing the {what}")))?;
    parse_member_date(&text_of(element))
}

/// Dates as the profile module renders them, plus plain ISO dates
fn parse_member_date(text: &str) -> Result<NaiveDate> {
    let text = text.trim();

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%d %b %Y") {
        return Ok(date);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, "%d %b %Y %H:%M") {
        return Ok(datetime.date());
    }

    Err(WikidotError::Parse(format!(
        "unrecognized profile date {text:?}"
    )))
}
