//! Core domain types
//!
//! This module contains the structures shared by the client (which observes
//! them from the remote service) and the CLI (which reports on them). They are
//! independent of the service's wire format; see [`crate::dto`] for that.

pub mod annotation;
pub mod job;
pub mod resource;
pub mod schema;
pub mod trace;
