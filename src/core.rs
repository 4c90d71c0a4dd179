pub mod config;
pub mod error;
pub mod location;
pub mod price;
pub mod reconcile;
pub mod series;
pub mod target;
