//! Obra Engine library crate.
//!
//! This crate exposes the construction cost estimator and the PILA
//! social-security contribution calculator as reusable modules.
//! External applications may call [`estimate::calculate`] and
//! [`pila::generate_pila`] directly or embed the HTTP API via
//! [`api::build_router`].

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod estimate;
pub mod models;
pub mod personnel;
pub mod pila;
pub mod rates;
pub mod store;
pub mod telemetry;

pub use error::EngineError;
pub use estimate::{calculate, calculate_with_factors, estimate_from_catalog};
pub use pila::{generate_pila, generate_pila_at, generate_pila_with_class};
