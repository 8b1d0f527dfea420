//! Car catalog on top of the mailbox bridge.
//!
//! [`CarService`] turns typed catalog calls into exchanges and maps the
//! worker's records back to [`Car`]s. Image paths arriving from the worker are
//! rewritten by [`PathRewrite`] so the UI can load them as resources.

mod adapter;
mod car;
mod service;

pub use adapter::{CarAdapter, PathRewrite, RESOURCE_IMAGE_PREFIX, SOURCE_IMAGE_PREFIX};
pub use car::{Car, CarFilter, SearchField, SortKey, DEFAULT_MAX_PRICE};
pub use service::{CarCatalog, CarService};

/// Operation names understood by the car worker.
pub mod operations {
    pub const GET_ALL_CARS: &str = "GET_ALL_CARS";
    pub const ADD_CAR: &str = "ADD_CAR";
    pub const UPDATE_CAR: &str = "UPDATE_CAR";
    pub const DELETE_CAR: &str = "DELETE_CAR";
    pub const SEARCH_CARS: &str = "SEARCH_CARS";
    pub const FILTER_CARS: &str = "FILTER_CARS";
    pub const SORT_CARS: &str = "SORT_CARS";
}
