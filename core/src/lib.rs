//! Synchronous client core for the Logo Objects REST API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The caller executes the
//! actual HTTP round-trip, which keeps the core deterministic and testable.
//!
//! # Design
//! - `LogoClient` is stateless: a base URL plus default headers. Its
//!   `request` method is the single primitive every builder goes through.
//! - Each operation is split into `build_*` (produces a request) and
//!   `parse_*` (consumes a response), so the I/O boundary is explicit.
//! - `EntityClient<E>` gives every catalogued entity the same typed CRUD,
//!   search and tracking surface; entity-specific actions are inherent impls
//!   beside the entity's record type.
//! - `SearchQuery` and `ListQuery` produce the `q` filter and the other list
//!   options.
//!
//! ```
//! use logo_core::entities::Items;
//! use logo_core::{Criterion, ListQuery, LogoClient, SearchQuery};
//!
//! let client = LogoClient::new("http://erp.local:32001/api/v1");
//! let search = SearchQuery::new().and(Criterion::starts_with("CODE", "KB"));
//! let req = client
//!     .entity::<Items>()
//!     .build_search(&search, &ListQuery::new().limit(20))
//!     .unwrap();
//! assert_eq!(
//!     req.path,
//!     "http://erp.local:32001/api/v1/items?q=CODE%20like%20%27KB%2A%27&limit=20"
//! );
//! ```

pub mod client;
pub mod config;
pub mod entities;
pub mod entity;
pub mod error;
pub mod http;
pub mod model;
pub mod query;

pub use client::{ActionCall, LogoClient};
pub use config::{ClientConfig, ConfigError};
pub use entity::{Entity, EntityClient};
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use model::{find_parameter, DbColumn, Page, Parameter, TrackStatus};
pub use query::{Criterion, ListQuery, Op, QueryString, SearchQuery, Value};
