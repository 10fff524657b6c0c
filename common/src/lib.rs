#![allow(clippy::module_inception)]

pub mod config;
pub mod data;
pub mod schema;
pub mod transaction;
