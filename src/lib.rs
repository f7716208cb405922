//! aerokv - schema-driven queries over an ordered key-value store
//!
//! Collections are declared as models in a [`schema::SchemaRegistry`].
//! A [`client::Client`] connects to a store and hands out one
//! [`client::Namespace`] per collection, offering create, findUnique,
//! findMany, update, delete, deleteMany, upsert and count with
//! relation inclusion and field projection.

pub mod cli;
pub mod client;
pub mod observability;
pub mod query;
pub mod schema;
pub mod store;

pub use client::{Client, ClientConfig, ClientError, Namespace, QueryError};
pub use schema::{Record, SchemaRegistry};
