// Library exports so integration tests can drive the same code paths as the
// binary.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod flash;
pub mod forms;
pub mod routes;
pub mod state;
pub mod uploads;
