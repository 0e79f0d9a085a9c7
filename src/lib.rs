//! # finance-gateway
//!
//! REST API for personal finance: customer profiles, expenses, and
//! recurring ("regular") payments that are materialized into expenses
//! every month.
//!
//! Each recurring payment owns one job in an external cron-style
//! scheduler, keyed by the payment id and firing on the payment's day of
//! month. When the job fires, the scheduler calls back into
//! `POST /jobs/execute`, which writes one expense copied from the payment.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, JWT)          External scheduler
//!     │                               │ callback
//!     ├── REST Handlers (api/) ───────┤
//!     │                               │
//!     ├── Services (service/) ── JobScheduler (scheduler/) ──► scheduler API
//!     │
//!     └── Stores (persistence/): PostgreSQL or in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod scheduler;
pub mod service;
