//! Data Transfer Objects for REST request/response serialization.
//!
//! Field names are camelCase on the wire. Money amounts are serialized as
//! JSON strings to avoid floating-point rounding.

pub mod common_dto;
pub mod customer_dto;
pub mod expense_dto;
pub mod job_dto;
pub mod regular_payment_dto;

pub use common_dto::*;
pub use customer_dto::*;
pub use expense_dto::*;
pub use job_dto::*;
pub use regular_payment_dto::*;
