//! # statusbridge-clients
//!
//! Blocking HTTP implementations of the two capability traits:
//! [`ShotGridClient`] for [`TrackingSystem`](statusbridge_core::TrackingSystem)
//! and [`FileMakerClient`] for [`ExternalStore`](statusbridge_core::ExternalStore).

mod http;

pub mod filemaker;
pub mod shotgrid;

pub use filemaker::FileMakerClient;
pub use shotgrid::ShotGridClient;
