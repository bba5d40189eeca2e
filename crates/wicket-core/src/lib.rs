//! Core types and access-control logic for the Wicket membership gate.
//!
//! This crate is deliberately free of HTTP dependencies. It defines the
//! membership record model, the [`TabularBackend`](backend::TabularBackend)
//! abstraction over a remote row-oriented store, and the three layers built
//! on top of it: [`MemberStore`](store::MemberStore),
//! [`TokenService`](token::TokenService), and
//! [`SessionGate`](session::SessionGate). All other crates depend on it.

pub mod backend;
pub mod error;
pub mod expiry;
pub mod member;
pub mod session;
pub mod store;
pub mod token;

pub use error::{Error, Result};
