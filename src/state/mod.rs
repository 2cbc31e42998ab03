//! State module for tracking site indexing progress
//!
//! # Components
//!
//! - `SiteStatus`: The INDEXING → INDEXED | FAILED state machine
//! - `SiteLifecycle`: Per-site handle that serializes status changes and persists them

mod lifecycle;
mod site_status;

// Re-export main types
pub use lifecycle::{root_http_error, SiteLifecycle, MAIN_PAGE_UNAVAILABLE, STOPPED_BY_USER};
pub use site_status::SiteStatus;
