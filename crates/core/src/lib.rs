//! Domain core for the Terraform workspace control plane.
//!
//! Pure logic only: no database or HTTP access. The `db` and `api` crates
//! build on the types, transition rules and capability traits defined here.

pub mod authorization;
pub mod error;
pub mod executor;
pub mod hashing;
pub mod run_lifecycle;
pub mod state_document;
pub mod types;
