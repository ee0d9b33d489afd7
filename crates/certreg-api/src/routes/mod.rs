//! # Route Modules
//!
//! Each module defines an Axum Router for one API surface area.
//! Routers are assembled in [`crate::app`].

pub mod admin;
pub mod certificates;
pub mod ledger;
pub mod transactions;
