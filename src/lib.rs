//! Typed entities extracted from moddb.com pages.
//!
//! The [`parser`] module turns an already-fetched document into values from
//! [`model`]; [`client::Client`] pairs it with a [`transport::Transport`] for
//! the fetch-then-extract calls and the logged-in member actions.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod transport;

pub use client::Client;
pub use error::{Error, Result};
pub use parser::extract::listing::{HasFiles, ListingKind, Listable, WatchKind};
pub use parser::Document;
pub use transport::{HttpTransport, Session, Transport, TransportError};
