//! Dashboard data/render loop.
//!
//! - [`model`]: coin records decoded from the proxy's listing
//! - [`state`]: observable state, refresh transitions and filtering
//! - [`source`]: the port the dashboard pulls listings through
//! - [`scheduler`]: single-writer event loop with the periodic timer
//! - [`theme`]: light/dark preference and its persistence

pub mod model;
pub mod scheduler;
pub mod source;
pub mod state;
pub mod theme;

pub use model::CoinRecord;
pub use scheduler::{DashboardHandle, RefreshScheduler};
pub use source::{FetchError, PriceSource};
pub use state::{DashboardState, Trigger, filter_coins};
pub use theme::{Theme, ThemeController};
