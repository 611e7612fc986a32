//! menu-server: restaurant menu and story catalog
//!
//! Every orderable record (primary categories, menu categories, menu items,
//! story categories, stories) is ranked among its siblings by the
//! [`ordering`] engine, which is the only writer of `sort_order`.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod ordering;
pub mod state;
pub mod validation;

pub use config::Config;
pub use state::AppState;
