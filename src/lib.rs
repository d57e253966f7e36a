//! CodeShare Market - trust and transaction integrity core.
//!
//! This crate implements the account lifecycle (registration, login,
//! purpose-bound tokens, password reset, email verification) and the
//! payment transaction lifecycle (checkout, gateway reconciliation,
//! refunds, download quotas) for the marketplace backend.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
