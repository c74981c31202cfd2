//! Search, season browsing and pagination state for an anime discovery UI.
//!
//! Input flows through the [`QueryCoordinator`](coordinator::QueryCoordinator),
//! which decides what to fetch; the [`ResultStore`](store::ResultStore) runs
//! the fetch against an [`AnimeCatalog`](kisetsu_api::AnimeCatalog) and
//! publishes the resulting [`ViewState`](store::ViewState). A
//! [`Session`](session::Session) wires the two to a message channel.

pub mod config;
pub mod coordinator;
pub mod detail;
pub mod error;
pub mod logging;
pub mod query;
pub mod route;
pub mod seasons;
pub mod session;
pub mod store;

#[cfg(test)]
pub mod testing;

pub use config::{AppConfig, Theme};
pub use coordinator::{Command, Message, QueryCoordinator};
pub use error::CoreError;
pub use query::{ActiveQuery, QueryState, SelectedSeason};
pub use route::Route;
pub use seasons::SeasonCatalog;
pub use session::Session;
pub use store::{FetchStatus, ResultStore, ViewState};
