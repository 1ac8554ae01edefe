//! Core library for the `kma-weather` CLI.
//!
//! This crate implements the full lookup pipeline against the KMA village
//! forecast service:
//! - lat/lon to forecast-grid projection
//! - bulletin (base time) selection on the KST publication schedule
//! - concurrent feed fetching with envelope validation
//! - reconciliation of the three feeds into one normalized snapshot
//!
//! It is used by `kma-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod gateway;
pub mod grid;
pub mod model;
pub mod reconcile;
pub mod schedule;
pub mod service;

pub use config::Config;
pub use error::{Feed, WeatherError};
pub use gateway::{FeedBundle, ProviderGateway, RawItem};
pub use model::{
    Coordinate, DailySample, GridCell, HourlySample, Precipitation, Sky, WeatherData,
};
pub use schedule::BulletinWindow;
pub use service::WeatherService;
