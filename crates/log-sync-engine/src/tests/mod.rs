//! Engine scenario tests.
//!
//! - harness.rs: scripted remote store, recording syslog, engine wiring
//! - bootstrap.rs: first run without a cursor
//! - steady.rs: cursor advance, retries and quarantine
//! - resync.rs: 404 recovery against the index
//! - fatal.rs: errors that stop the agent
//! - logging.rs: span context on engine events
//! - cancellation.rs: shutdown behavior

mod harness;
mod resync;
