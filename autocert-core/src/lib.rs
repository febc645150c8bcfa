//! Autocert Core - Shared certificate types
//!
//! This crate contains the side-effect-free pieces of autocert: the domain and
//! certificate records, the days-remaining arithmetic, the renewal decision and
//! the per-run summary that decides the process exit status.
//!
//! Everything that touches the filesystem or spawns processes lives in the
//! `autocert` crate.

mod decision;
mod domain;
mod summary;

pub use decision::*;
pub use domain::*;
pub use summary::*;
