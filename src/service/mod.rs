//! Service layer: business logic orchestration.
//!
//! [`RegularPaymentService`] keeps recurring payments and their scheduler
//! jobs in step, [`ExpenseService`] owns expense reads and materialization
//! writes, and [`JobService`] turns scheduler callbacks into expenses.
//! Services hold their collaborators as trait objects and are cheap to
//! clone.

pub mod customer_service;
pub mod expense_service;
pub mod job_service;
pub mod regular_payment_service;
pub mod sweep;

pub use customer_service::CustomerService;
pub use expense_service::{ExpenseService, NewExpenseInput};
pub use job_service::JobService;
pub use regular_payment_service::RegularPaymentService;
pub use sweep::MonthlySweep;
