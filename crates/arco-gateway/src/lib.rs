#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Backend-agnostic request/response interface consumed by the Arco client core.
//!
//! Every call is fallible and side-effect free for the caller on failure; the
//! transport behind the trait (bindings, HTTP, a test fake) is not this crate's
//! concern.

pub mod error;
pub mod service;

pub use error::{RpcError, RpcResult};
pub use service::RpcGateway;
