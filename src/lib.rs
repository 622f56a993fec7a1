#![warn(missing_docs)]
//! Vigil is a change-detection monitoring service: scheduled checks fetch a
//! value of interest from an external source, diff it against a stored
//! baseline, and send a Telegram notification when the value changes.

pub mod baseline;
pub mod config;
pub mod executor;
pub mod http_client;
pub mod monitor;
pub mod monitors;
pub mod notification;
pub mod scheduler;
pub mod supervisor;
