//! Budget domain model.
//!
//! Mirrors the persisted budget document: a named amount in a fixed
//! category, owned by a single user, optionally with a due date.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

use crate::error::{CoreError, Result};
use crate::id::new_id;

/// Fixed set of budget categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BudgetCategory {
    Food,
    Transport,
    Entertainment,
    Utilities,
    Other,
}

impl BudgetCategory {
    /// Returns the category name as stored in documents.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Transport => "Transport",
            Self::Entertainment => "Entertainment",
            Self::Utilities => "Utilities",
            Self::Other => "Other",
        }
    }

    /// Parses a category from its document name.
    ///
    /// # Errors
    /// Returns a validation error for unknown categories.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "Food" => Ok(Self::Food),
            "Transport" => Ok(Self::Transport),
            "Entertainment" => Ok(Self::Entertainment),
            "Utilities" => Ok(Self::Utilities),
            "Other" => Ok(Self::Other),
            other => Err(CoreError::validation(format!(
                "unknown budget category: {other}"
            ))),
        }
    }
}

impl fmt::Display for BudgetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A spending budget owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    /// Document id.
    pub id: String,

    /// Id of the owning user.
    pub owner_id: String,

    /// Budget name (required, trimmed).
    pub name: String,

    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Budgeted amount. Never negative.
    pub amount: f64,

    /// Budget category.
    pub category: BudgetCategory,

    /// Archived budgets are excluded from category lookups.
    #[serde(default)]
    pub archived: bool,

    /// Optional date the budget runs until.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,

    /// Whether the budget recurs after its due date.
    #[serde(default)]
    pub recurring: bool,

    /// When the document was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the document was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Budget {
    /// Creates a new budget, validating name and amount.
    ///
    /// # Errors
    /// Returns a validation error if the name is empty after trimming or the
    /// amount is negative or not finite.
    pub fn new(
        owner_id: impl Into<String>,
        name: &str,
        description: Option<String>,
        amount: f64,
        category: BudgetCategory,
    ) -> Result<Self> {
        let name = validate_name(name)?;
        validate_amount(amount)?;
        let now = OffsetDateTime::now_utc();
        Ok(Self {
            id: new_id(),
            owner_id: owner_id.into(),
            name,
            description,
            amount,
            category,
            archived: false,
            due_date: None,
            recurring: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies an update to the mutable fields, re-validating and bumping
    /// `updated_at`.
    ///
    /// # Errors
    /// Returns a validation error for an empty name or negative amount.
    pub fn apply_update(
        &mut self,
        name: &str,
        description: Option<String>,
        amount: f64,
        category: BudgetCategory,
    ) -> Result<()> {
        self.name = validate_name(name)?;
        validate_amount(amount)?;
        self.description = description;
        self.amount = amount;
        self.category = category;
        self.touch();
        Ok(())
    }

    /// Marks the budget as archived.
    pub fn archive(&mut self) {
        self.archived = true;
        self.touch();
    }

    /// Bumps the `updated_at` timestamp.
    pub fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }

    /// Remaining budget per day until the due date.
    ///
    /// When a future due date is set on an unarchived budget, the amount is
    /// distributed evenly over the remaining whole days. Otherwise the full
    /// amount is returned.
    #[must_use]
    pub fn remaining_per_day(&self, now: OffsetDateTime) -> f64 {
        match self.due_date {
            Some(due) if due > now && !self.archived => {
                let days_left = ((due - now).whole_seconds() as f64 / 86_400.0).ceil();
                self.amount / days_left.max(1.0)
            }
            _ => self.amount,
        }
    }
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation("name must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(CoreError::validation("amount must be a non-negative number"));
    }
    Ok(())
}
