//! Synchronous client for the Buffer v1 social-media scheduling API.
//!
//! # Overview
//! `BufferClient` exposes one method per remote operation. Each method
//! builds an `HttpRequest` from typed parameters, lets the configured
//! `Authorization` strategy attach credentials, executes it through an
//! injected `HttpTransport` and returns the decoded JSON body.
//!
//! # Design
//! - Payload rules live in `payload` as pure functions: optional fields the
//!   caller did not supply are omitted entirely, never sent empty.
//! - `Schedule` and `Update` validate on every mutation, so invalid days,
//!   times, media keys or dates are rejected before any I/O.
//! - The transport is injected; `UreqTransport` (default `ureq` feature)
//!   is the blocking implementation, and tests substitute a recording double.
//!
//! ```no_run
//! use buffer_core::{BufferClient, TokenAuthorization, Update, UreqTransport};
//!
//! # fn main() -> Result<(), buffer_core::ApiError> {
//! let client = BufferClient::new(TokenAuthorization::new("1/access-token"), UreqTransport::new());
//! let mut update = Update::new();
//! update.set_text("Hello from Rust").add_profile("4eb854340acb04e870000010");
//! update.schedule("2030-01-01 09:00")?;
//! let created = client.create_update(&update)?;
//! println!("{created}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod button;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod payload;
pub mod schedule;
pub mod transport;
pub mod types;
pub mod update;

pub use auth::{Authorization, QueryTokenAuthorization, TokenAuthorization};
pub use button::{Button, ButtonStyle};
pub use client::{BufferClient, DEFAULT_BASE_URL};
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError, TransportError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use payload::{InteractionsQuery, UpdatesQuery};
pub use schedule::Schedule;
pub use transport::HttpTransport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::OneOrMany;
pub use update::{MediaKey, ScheduleTime, Update};
