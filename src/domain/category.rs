//! Closed set of spending categories shared by regular payments and expenses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::GatewayError;

/// Spending category.
///
/// Serialized (JSON and SQL) as upper-case text, e.g. `"FOOD"`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    /// Groceries and eating out.
    Food,
    /// Public transport, fuel, taxis.
    Transport,
    /// Rent, mortgage.
    Housing,
    /// Electricity, water, internet.
    Utilities,
    /// Medical and insurance.
    Health,
    /// Leisure.
    Entertainment,
    /// General purchases.
    Shopping,
    /// Courses, books, tuition.
    Education,
    /// Trips and lodging.
    Travel,
    /// Streaming and other periodic services.
    Subscriptions,
    /// Anything else.
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 11] = [
        Self::Food,
        Self::Transport,
        Self::Housing,
        Self::Utilities,
        Self::Health,
        Self::Entertainment,
        Self::Shopping,
        Self::Education,
        Self::Travel,
        Self::Subscriptions,
        Self::Other,
    ];

    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "FOOD",
            Self::Transport => "TRANSPORT",
            Self::Housing => "HOUSING",
            Self::Utilities => "UTILITIES",
            Self::Health => "HEALTH",
            Self::Entertainment => "ENTERTAINMENT",
            Self::Shopping => "SHOPPING",
            Self::Education => "EDUCATION",
            Self::Travel => "TRAVEL",
            Self::Subscriptions => "SUBSCRIPTIONS",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| GatewayError::InvalidRequest(format!("unknown category: {s}")))
    }
}
