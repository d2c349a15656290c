//! # sales-query
//!
//! Answers natural-language questions about a sales table.
//!
//! A question goes through three fixed stages: the hosted model writes a
//! SQLite query, the query runs against the local `sales_sale` table, and the
//! model explains the rows. Failures in a stage become the answer text rather
//! than errors, so callers always get a [`pipeline::QueryAnswer`].

pub mod config;
pub mod error;
pub mod http_server;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod sales;

pub use error::{Error, Result};
pub use pipeline::{QueryAnswer, QueryPipeline};
