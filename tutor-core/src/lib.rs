//! Tutor Core
//!
//! Core types and abstractions for the Tutor lab toolkit.
//!
//! This crate contains:
//! - Domain types: Jobs, schema contracts, resource handles, citations
//! - DTOs: Wire representations of the remote assistants service
//! - Extraction: Locating, unfencing, parsing and validating job results

pub mod domain;
pub mod dto;
pub mod extract;
pub mod failure;
pub mod fence;
