//! Book model and related functionality
//!
//! A `Book` is one physical, lendable copy. The three boolean flags plus
//! `lender_id` and `return_date` make up its lifecycle state; the engine in
//! `crate::lifecycle` is the only place allowed to decide how they change
//! together.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Book entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub image_url: String,
    /// The member who listed this copy. Immutable after creation.
    pub owner_id: Uuid,
    /// The member currently reserving or holding the copy, if any.
    pub lender_id: Option<Uuid>,
    /// Due date of the running loan, set at hand-over.
    pub return_date: Option<NaiveDate>,
    pub reserved: bool,
    pub lent_out: bool,
    pub available_for_lending: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Whether the running loan is past its due date, compared date-only.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.return_date.is_some_and(|due| due < today)
    }
}

/// New book creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub image_url: String,
    pub owner_id: Uuid,
}
