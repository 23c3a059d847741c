//! Domain types for the follower report.
//!
//! Identifiers read from the data export, the enriched user records
//! resolved for them, and the map that joins the two.

mod account_id;
mod discovery;
mod user;

pub use account_id::{AccountId, InvalidAccountId};
pub use discovery::{DiscoveryRecord, account_ids};
pub use user::{UserInfo, UserMap};
