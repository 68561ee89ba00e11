//! # Sparrow ECS
//!
//! A data-oriented entity component registry. The `World` stores components
//! per type in directly indexed slot arrays, keeps the members of every query
//! it has seen up to date incrementally, and maintains a parent/child index
//! between entities.
//!
//! Everything is single threaded and synchronous. Structural changes are
//! reported to an optional `EventSink` and to the `log` facade.

#[macro_use]
extern crate log;
extern crate failure;
extern crate serde;
extern crate smallvec;

#[macro_use]
pub mod utils;
#[macro_use]
pub mod ecs;
pub mod errors;
pub mod prelude;
pub mod settings;
