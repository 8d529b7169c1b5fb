pub mod db;
pub mod notifications;
pub mod opportunities;
pub mod watchlist;

pub use db::FlipperDb;
pub use notifications::NotificationLedger;
pub use opportunities::{OpportunityStore, MAX_LIST_LIMIT};
pub use watchlist::WatchlistStore;
