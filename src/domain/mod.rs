//! Domain layer: identifiers, entities, and scheduling types.
//!
//! Everything here is plain data plus validation. Persistence lives in
//! [`crate::persistence`], orchestration in [`crate::service`].

pub mod category;
pub mod customer;
pub mod expense;
pub mod ids;
pub mod job;
pub mod page;
pub mod regular_payment;
pub mod schedule;

pub use category::Category;
pub use customer::{AuthContext, Customer, Role};
pub use expense::{Expense, NewExpense};
pub use ids::{CustomerId, ExpenseId, RegularPaymentId, UserId};
pub use job::{JobEnvelope, JobType, ScheduledTask};
pub use page::{Page, PageRequest};
pub use regular_payment::{
    NewRegularPayment, RegularPayment, RegularPaymentDraft, RegularPaymentPatch,
};
pub use schedule::{CronField, CronSchedule};
