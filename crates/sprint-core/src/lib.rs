pub mod capacity;
pub mod config;
pub mod error;
pub mod forecast;
pub mod io;
pub mod member;
pub mod migrate;
pub mod paths;
pub mod poker;
pub mod reconcile;
pub mod remote;
pub mod report;
pub mod rest;
pub mod rows;
pub mod settings;
pub mod store;
pub mod story;
pub mod types;
pub mod workspace;

pub use error::{PlanError, Result};
