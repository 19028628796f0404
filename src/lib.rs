//! Heat-risk check in the terminal.
//!
//! Collects age, a health condition and a location (typed city name or an
//! acquired position), submits them to a remote risk-calculation endpoint
//! and keeps the latest result in local storage for the results view.

pub mod api;
pub mod app;
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod events;
pub mod form;
pub mod location;
pub mod logging;
pub mod models;
pub mod ui;
