//! Airline logo harvesting.
//!
//! The acquisition side downloads logos for every airline in a catalog from
//! several CDNs on a bounded worker pool, filtering out blank and
//! placeholder images. The reconciliation side diffs the harvested tree
//! against a published repository, ignoring byte-level changes that leave
//! the pixels untouched.

pub mod acquire;
pub mod app;
pub mod audit;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod fr24;
pub mod http;
pub mod output;
pub mod progress;
pub mod reconcile;
pub mod sources;
pub mod store;
pub mod validate;
