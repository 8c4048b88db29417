//! Persistence of pinned points.

pub mod persistence;

pub use persistence::{PointStore, STORE_VERSION};
