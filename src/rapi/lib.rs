//! # Rapi Architecture
//!
//! Rapi is a **UI-agnostic REST client SDK**. This is not a CLI application
//! that happens to have some library code—it's a library that happens to
//! have a CLI client.
//!
//! ## The Three-Layer Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (args.rs, wired by main.rs)                      │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  SDK Layer (client.rs, entity.rs, paginate.rs)              │
//! │  - ApiClient facade: one Response envelope per request      │
//! │  - Entity: metadata-validated CRUD/list/custom actions      │
//! │  - Paginate: lazy pull-based iteration over list endpoints  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Transport Layer (transport/)                               │
//! │  - Abstract Transport trait                                 │
//! │  - HttpTransport (production), MockTransport (testing)      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Policy
//!
//! The client layer never raises for an ordinary failed request: transport
//! failures, non-2xx statuses, and decode failures all become a `Response`
//! with `success == false`. Layers that must produce a bare value — the
//! paginator, custom-action call sites — convert a failed envelope into a
//! [`RapiError`]. The CLI is the outermost boundary: any raised error is
//! printed and the process exits non-zero.
//!
//! ## Key Principle: No I/O Assumptions in the SDK
//!
//! From `client.rs` inward, code:
//! - Takes regular Rust function arguments
//! - Returns regular Rust types (`Response`, `Result<T>`)
//! - **Never** writes to stdout/stderr
//! - **Never** calls `std::process::exit`
//!
//! The only I/O is the HTTP round-trip behind the `Transport` trait, which
//! tests replace with canned responses.
//!
//! ## Module Overview
//!
//! - [`client`]: The client facade—entry point for raw requests
//! - [`entity`]: Entity metadata, validation, CRUD, and custom actions
//! - [`paginate`]: Lazy page-by-page iteration
//! - [`response`]: The uniform success/error envelope
//! - [`profile`]: Named connection profiles (file + environment)
//! - [`transport`]: Transport abstraction and implementations
//! - [`error`]: Error types

pub mod client;
pub mod entity;
pub mod error;
pub mod paginate;
pub mod profile;
pub mod response;
pub mod transport;

pub use client::ApiClient;
pub use entity::{Entity, EntityConfig, ListOptions, SortDirection};
pub use error::{RapiError, Result};
pub use paginate::Paginate;
pub use profile::{Profile, ProfileStore};
pub use response::Response;
pub use transport::{Method, Transport};
