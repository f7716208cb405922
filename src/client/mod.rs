//! Client subsystem for aerokv
//!
//! [`Client`] owns the single store connection and its lifecycle
//! (uninitialized, initializing, ready, closed). [`Namespace`] is the CRUD
//! façade of one collection, materialized on first access and cached.
//!
//! # Usage
//!
//! ```ignore
//! let client = Client::in_memory(registry);
//! client.init().await?;
//!
//! let users = client.namespace("users")?;
//! let user = users.create(CreateArgs::new(json!({"name": "Alice"}))).await?;
//! ```

mod client;
mod config;
mod errors;
mod lifecycle;
mod namespace;
mod resolver;

pub use client::Client;
pub use config::{ClientConfig, ENV_TOKEN, ENV_URL};
pub use errors::{ClientError, ClientResult, Operation, QueryError, QueryResult};
pub use lifecycle::LifecycleState;
pub use namespace::Namespace;
