//! Storefront product search
//!
//! Keeps an Elasticsearch index of the product catalog in step with the
//! relational store and serves full-text search over it.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod search;

pub use error::{AppError, Result};
