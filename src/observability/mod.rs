//! Observability subsystem for aerokv
//!
//! Structured events through `tracing`.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. Logging never fails an operation
//!
//! # Usage
//!
//! ```ignore
//! use aerokv::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::RecordCreated, &[("collection", "users")]);
//! ```

mod events;
pub mod logging;

pub use events::Event;

use std::fmt;

use tracing::Level;

/// Log an event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log an event with fields.
///
/// Fields are rendered as `key=value` pairs in the given order, and only
/// when the event's level is enabled.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    if !event_enabled(event) {
        return;
    }
    let rendered = Fields(fields);
    let code = event.as_str();

    let level = event.level();
    if level == Level::ERROR {
        tracing::error!(event = code, "{}", rendered);
    } else if level == Level::WARN {
        tracing::warn!(event = code, "{}", rendered);
    } else if level == Level::INFO {
        tracing::info!(event = code, "{}", rendered);
    } else if level == Level::DEBUG {
        tracing::debug!(event = code, "{}", rendered);
    } else {
        tracing::trace!(event = code, "{}", rendered);
    }
}

/// Whether the installed subscriber would record `event`.
///
/// Callers check this before building costly field values.
pub fn event_enabled(event: Event) -> bool {
    let level = event.level();
    if level == Level::ERROR {
        tracing::enabled!(Level::ERROR)
    } else if level == Level::WARN {
        tracing::enabled!(Level::WARN)
    } else if level == Level::INFO {
        tracing::enabled!(Level::INFO)
    } else if level == Level::DEBUG {
        tracing::enabled!(Level::DEBUG)
    } else {
        tracing::enabled!(Level::TRACE)
    }
}

/// `key=value` pairs, formatted on demand
struct Fields<'a>(&'a [(&'a str, &'a str)]);

impl fmt::Display for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}
