//! Book lifecycle engine
//!
//! Pure decision logic for every state transition of a book: given the
//! current row, the acting user and whatever clock or duration input the
//! transition needs, each operation either returns the complete replacement
//! loan state or an error, without touching the database. The repository
//! applies a returned [`LoanState`] in a single UPDATE, so a partial
//! transition (for example `lent_out` set without a due date) is never
//! observable.
//!
//! Authorization is checked before anything else in every operation; a
//! failed call leaves the book untouched.

use chrono::{Days, NaiveDate};
use thiserror::Error;
use uuid::Uuid;

use crate::models::Book;

/// Errors a lifecycle transition can produce
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Bad input, reported inline to the caller
    #[error("{0}")]
    Validation(String),

    /// Acting user is anonymous or not the owner/lender the action requires
    #[error("You are not authorized to do that action")]
    Unauthorized,

    /// The referenced state does not exist (e.g. cancelling a reservation
    /// that was never made)
    #[error("{0}")]
    NotFound(&'static str),

    /// The book's current state forbids the transition
    #[error("{0}")]
    Conflict(&'static str),

    /// Hand-over attempted while the book is already lent out
    #[error("Book is already handed over")]
    AlreadyHandedOver,
}

/// Complete replacement state for the lifecycle columns of a book.
///
/// Every transition that mutates a book produces one of these; all five
/// fields are written together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanState {
    pub reserved: bool,
    pub lent_out: bool,
    pub available_for_lending: bool,
    pub lender_id: Option<Uuid>,
    pub return_date: Option<NaiveDate>,
}

impl LoanState {
    /// Snapshot the lifecycle fields of a book
    pub fn of(book: &Book) -> Self {
        Self {
            reserved: book.reserved,
            lent_out: book.lent_out,
            available_for_lending: book.available_for_lending,
            lender_id: book.lender_id,
            return_date: book.return_date,
        }
    }

    /// Check the structural invariants that must hold after every
    /// transition:
    ///
    /// 1. `lent_out` implies `reserved`, a lender and a due date.
    /// 2. `!reserved` implies no lender, no due date and `!lent_out`.
    pub fn holds_invariants(&self) -> bool {
        if self.lent_out
            && !(self.reserved && self.lender_id.is_some() && self.return_date.is_some())
        {
            return false;
        }
        if !self.reserved
            && (self.lent_out || self.lender_id.is_some() || self.return_date.is_some())
        {
            return false;
        }
        true
    }

    /// Apply this state back onto a book, mirroring what the repository's
    /// UPDATE does.
    pub fn apply_to(&self, book: &mut Book) {
        book.reserved = self.reserved;
        book.lent_out = self.lent_out;
        book.available_for_lending = self.available_for_lending;
        book.lender_id = self.lender_id;
        book.return_date = self.return_date;
    }
}

/// Outcome of a reserve attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// The reservation was placed
    Reserved(LoanState),
    /// The book was already reserved; idempotent no-op, not an error
    AlreadyReserved,
}

/// Outcome of a listing toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The listing flag was flipped to the contained state
    Toggled(LoanState),
    /// The book is lent out; the listing stays as it is
    IgnoredLentOut,
}

fn is_owner(book: &Book, actor: Uuid) -> bool {
    book.owner_id == actor
}

fn is_owner_or_lender(book: &Book, actor: Uuid) -> bool {
    book.owner_id == actor || book.lender_id == Some(actor)
}

/// Reserve a book for the acting user.
///
/// Owners may not reserve their own books. Reserving an already reserved
/// book changes nothing and reports `AlreadyReserved`; the standing
/// reservation is kept.
pub fn reserve(book: &Book, actor: Uuid) -> Result<ReserveOutcome, LifecycleError> {
    if is_owner(book, actor) {
        return Err(LifecycleError::Unauthorized);
    }
    if book.reserved {
        return Ok(ReserveOutcome::AlreadyReserved);
    }

    Ok(ReserveOutcome::Reserved(LoanState {
        reserved: true,
        lent_out: false,
        available_for_lending: book.available_for_lending,
        lender_id: Some(actor),
        return_date: None,
    }))
}

/// Cancel a standing reservation.
///
/// Only the owner or the reserving member may cancel. Cancelling a book
/// that is not reserved is a not-found condition. A running loan has to be
/// returned, not cancelled; clearing `reserved` under an active loan would
/// leave `lent_out` without a lender.
pub fn cancel_reservation(book: &Book, actor: Uuid) -> Result<LoanState, LifecycleError> {
    if !is_owner_or_lender(book, actor) {
        return Err(LifecycleError::Unauthorized);
    }
    if !book.reserved {
        return Err(LifecycleError::NotFound("Book is not reserved"));
    }
    if book.lent_out {
        return Err(LifecycleError::Conflict(
            "Book is lent out and must be returned instead",
        ));
    }

    Ok(LoanState {
        reserved: false,
        lent_out: false,
        available_for_lending: book.available_for_lending,
        lender_id: None,
        return_date: None,
    })
}

/// Mark a reserved book as physically handed over to the borrower.
///
/// The due date is computed from the owner's duration preference as it is
/// configured at hand-over time; later preference changes do not move the
/// due date of a running loan.
pub fn hand_over(
    book: &Book,
    actor: Uuid,
    owner_duration_days: u32,
    today: NaiveDate,
) -> Result<LoanState, LifecycleError> {
    if !is_owner_or_lender(book, actor) {
        return Err(LifecycleError::Unauthorized);
    }
    if book.lent_out {
        return Err(LifecycleError::AlreadyHandedOver);
    }
    if !book.reserved {
        return Err(LifecycleError::Conflict(
            "Book must be reserved before it can be handed over",
        ));
    }

    let due = today
        .checked_add_days(Days::new(u64::from(owner_duration_days)))
        .ok_or(LifecycleError::Validation(
            "Lending duration is out of range".to_string(),
        ))?;

    Ok(LoanState {
        reserved: true,
        lent_out: true,
        available_for_lending: book.available_for_lending,
        lender_id: book.lender_id,
        return_date: Some(due),
    })
}

/// Return a book, ending the reservation and any running loan.
///
/// Either party of the loan may return the book; all four loan fields are
/// reset in one go.
pub fn return_book(book: &Book, actor: Uuid) -> Result<LoanState, LifecycleError> {
    if !is_owner_or_lender(book, actor) {
        return Err(LifecycleError::Unauthorized);
    }

    Ok(LoanState {
        reserved: false,
        lent_out: false,
        available_for_lending: book.available_for_lending,
        lender_id: None,
        return_date: None,
    })
}

/// Flip a book's `available_for_lending` listing flag.
///
/// Owner only. A lent-out book keeps its listing as it is; the toggle is a
/// silent no-op until the book comes back.
pub fn toggle_listing(book: &Book, actor: Uuid) -> Result<ToggleOutcome, LifecycleError> {
    if !is_owner(book, actor) {
        return Err(LifecycleError::Unauthorized);
    }
    if book.lent_out {
        return Ok(ToggleOutcome::IgnoredLentOut);
    }

    let mut state = LoanState::of(book);
    state.available_for_lending = !state.available_for_lending;
    Ok(ToggleOutcome::Toggled(state))
}

/// Check whether the acting user may remove a book from the catalog.
///
/// Owner only, and never while the book is reserved or lent out.
pub fn check_removal(book: &Book, actor: Uuid) -> Result<(), LifecycleError> {
    if !is_owner(book, actor) {
        return Err(LifecycleError::Unauthorized);
    }
    if book.lent_out || book.reserved {
        return Err(LifecycleError::Conflict(
            "Book is reserved or lent out and cannot be removed",
        ));
    }
    Ok(())
}
