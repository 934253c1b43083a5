//! Client for a remote fraud-detection service.
//!
//! - [`session`]: login/signup validation, the local "authenticated" flag and
//!   the route guard in front of the dashboard.
//! - [`dashboard`]: upload a transaction file, map the returned predictions
//!   into rows and KPI values.
//! - [`service`]: the HTTP side of the prediction service.

pub mod dashboard;
pub mod data;
pub mod error;
pub mod logging;
pub mod model;
pub mod notify;
pub mod service;
pub mod session;
pub mod state;
pub mod storage;
