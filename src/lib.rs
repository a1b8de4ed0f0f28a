pub mod compose;
pub mod config;
pub mod error;
pub mod extract;
pub mod logger;
pub mod model;
pub mod monitor;
pub mod schedule;
pub mod service;
pub mod time;
