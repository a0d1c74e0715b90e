// Shared experience records: three parallel collections (entry sheets,
// coding tests, interviews) listed with local filtering and appended to by
// their owners. Nothing here updates or deletes a row.

pub mod filter;
pub mod handlers;
pub mod kinds;
pub mod listing;
pub mod submission;

pub use filter::{ListQuery, RecordFilter};
pub use kinds::{CodingTest, Interview, RecordKind, Screening};
pub use listing::{Listing, ListingStatus};
