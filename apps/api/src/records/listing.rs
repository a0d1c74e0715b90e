use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::{BackendError, RecordStore};
use crate::models::options::GraduationYear;
use crate::records::filter::{year_options, RecordFilter};
use crate::records::kinds::RecordKind;
use crate::session::Session;

/// Why the item list is (or isn't) empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Populated,
    /// Nothing has been registered yet.
    Empty,
    /// Rows exist, the current filters exclude all of them.
    NoMatches,
}

/// One list page: filtered rows plus what the filter controls need.
#[derive(Debug, Clone, Serialize)]
pub struct Listing<R, C: 'static> {
    pub status: ListingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
    /// Rows fetched before filtering.
    pub total: usize,
    /// Fetched rows left out because they did not decode.
    pub skipped: usize,
    pub matched: usize,
    pub items: Vec<R>,
    pub year_options: Vec<GraduationYear>,
    pub category_options: &'static [C],
}

/// Filters already-fetched rows (newest first) into a list page.
pub fn build_listing<K: RecordKind>(
    rows: &[K::Row],
    filter: &RecordFilter<K::Category>,
) -> Listing<K::Row, K::Category> {
    let items: Vec<K::Row> = filter.apply::<K>(rows).into_iter().cloned().collect();

    let (status, notice) = if rows.is_empty() {
        (ListingStatus::Empty, Some(K::EMPTY_MESSAGE))
    } else if items.is_empty() {
        (ListingStatus::NoMatches, Some(K::NO_MATCH_MESSAGE))
    } else {
        (ListingStatus::Populated, None)
    };

    Listing {
        status,
        notice,
        total: rows.len(),
        skipped: 0,
        matched: items.len(),
        items,
        year_options: year_options::<K>(rows),
        category_options: K::CATEGORY_OPTIONS,
    }
}

/// Fetches the whole collection joined with authors and filters it locally.
pub async fn fetch_listing<K: RecordKind>(
    store: &dyn RecordStore,
    session: &Session,
    filter: &RecordFilter<K::Category>,
) -> Result<Listing<K::Row, K::Category>, BackendError> {
    let raw = store
        .select_with_author(&session.access_token, K::TABLE)
        .await?;
    let (rows, skipped) = decode_rows::<K>(raw);

    let mut listing = build_listing::<K>(&rows, filter);
    listing.skipped = skipped;
    debug!(
        "Listed {}: {} of {} rows match ({} skipped)",
        K::TABLE,
        listing.matched,
        listing.total,
        skipped
    );
    Ok(listing)
}

/// Decodes fetched rows, leaving out (and logging) any that do not fit the
/// row type, e.g. a label outside an option set written straight to the
/// table. Returns the decoded rows and how many were left out.
pub fn decode_rows<K: RecordKind>(raw: Vec<Value>) -> (Vec<K::Row>, usize) {
    let mut rows = Vec::with_capacity(raw.len());
    let mut skipped = 0;
    for value in raw {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("<no id>")
            .to_string();
        match serde_json::from_value::<K::Row>(value) {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!("Skipping undecodable {} row {id}: {e}", K::TABLE);
                skipped += 1;
            }
        }
    }
    (rows, skipped)
}
