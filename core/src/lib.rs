//! Shared client core for the word-game web APIs.
//!
//! # Overview
//! Concrete game clients (crosswords, wordlists, ...) build URLs with the
//! [`query`] helpers and run them through a [`WordGameClient`], which signs
//! each request with OAuth 1.0a, exchanges JSON with the server and turns
//! error payloads back into typed errors.
//!
//! # Design
//! - One executor, parameterized by an [`HttpTransport`] and a [`Signer`]
//!   chosen at construction time.
//! - Every call splits into `build_*` (produces a signed request) and
//!   `parse_*` (consumes a response), so hosts may do the I/O themselves.
//! - Server error kinds are resolved through an explicit [`ErrorRegistry`]
//!   filled at start-up; unknown kinds degrade to the family base error.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod query;
pub mod reconstruct;
pub mod signer;
pub mod transport;
pub mod types;

pub use client::{ResponseTap, WordGameClient, WordGameClientBuilder};
pub use config::{ClientConfig, DEFAULT_API_ENDPOINT};
pub use error::{ClientError, ForeignError, GameError, Result, SigningError, BASE_KIND};
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
pub use query::{encode_query_value, with_paging, with_paging_and_filter, with_paging_filter_and_order};
pub use reconstruct::{ErrorRegistry, ForeignKind, GameConstructors};
pub use signer::{Credentials, OAuth1Signer, Signer};
pub use transport::UreqTransport;
pub use types::ErrorDetails;
