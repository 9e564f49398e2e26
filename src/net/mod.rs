//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop)
//!     → connection.rs (ID, open / upstream counts)
//!     → Hand off to HTTP layer (one task per connection)
//! ```
//!
//! # Design Decisions
//! - Unbounded: no accept queue limit or worker pool
//! - No read/write deadlines on client sockets

pub mod connection;
pub mod listener;

pub use connection::{Activity, ActivitySnapshot, ConnectionGuard, ConnectionId, UpstreamGuard};
pub use listener::{Listener, ListenerError};
