//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (one read, per-connection task)
//!     → request.rs (parse start line and headers)
//!     → [routing layer picks the origin]
//!     → [cache lookup]
//!     → forward.rs (origin round trip on a miss)
//!     → raw bytes back to the client
//! ```

pub mod forward;
pub mod request;
pub mod server;

pub use forward::{ForwardError, OriginForwarder};
pub use request::{ParseError, ProxyRequest};
pub use server::{ConnectionHandler, ProxyServer};
