//! Catalog and lifecycle routes
//!
//! Every mutating handler follows the same shape: load the book, let the
//! lifecycle engine decide with the authenticated actor passed in
//! explicitly, then persist the returned loan state in one UPDATE. The
//! handlers never mutate lifecycle fields themselves.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    lifecycle::{self, ReserveOutcome, ToggleOutcome},
    middleware::AuthUser,
    models::{Book, NewBook},
    state::AppState,
    validation,
};

/// Request for adding a book to the catalog
#[derive(Deserialize)]
pub struct AddBookRequest {
    pub title: String,
    pub author: String,
    pub image_url: String,
}

/// Query parameters for the search endpoint
#[derive(Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

/// A member-facing book listing with the overdue subset
#[derive(Serialize)]
pub struct BookListResponse {
    pub books: Vec<Book>,
    /// Ids of books whose loan is past its due date
    pub due_books: Vec<Uuid>,
}

fn overdue_ids(books: &[Book]) -> Vec<Uuid> {
    let today = Utc::now().date_naive();
    books
        .iter()
        .filter(|b| b.is_overdue(today))
        .map(|b| b.id)
        .collect()
}

async fn load_book(state: &AppState, id: Uuid) -> ApiResult<Book> {
    state
        .book_repository
        .find_by_id(id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load book {}: {}", id, e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))
}

async fn persist_loan_state(
    state: &AppState,
    id: Uuid,
    loan_state: &lifecycle::LoanState,
) -> ApiResult<Book> {
    state
        .book_repository
        .apply_loan_state(id, loan_state)
        .await
        .map_err(|e| {
            tracing::error!("Failed to persist loan state for book {}: {}", id, e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("Book not found".to_string()))
}

/// Main page: every book currently listed for lending
pub async fn home(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let books = state.book_repository.list_available().await.map_err(|e| {
        tracing::error!("Failed to list available books: {}", e);
        ApiError::InternalServerError
    })?;

    Ok(Json(books))
}

/// Books that are listed for lending and not currently reserved
pub async fn available_books(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let books = state.book_repository.list_reservable().await.map_err(|e| {
        tracing::error!("Failed to list reservable books: {}", e);
        ApiError::InternalServerError
    })?;

    Ok(Json(books))
}

/// Case-insensitive substring search over titles and authors.
///
/// A blank query is rejected as bad input, distinct from a search with no
/// matches.
pub async fn searchbar(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<impl IntoResponse> {
    let query =
        validation::validate_search_query(params.query.as_deref()).map_err(ApiError::Validation)?;

    info!("Search query: {}", query);

    let books = state.book_repository.search(query).await.map_err(|e| {
        tracing::error!("Search failed: {}", e);
        ApiError::InternalServerError
    })?;

    Ok(Json(books))
}

/// Add a new book to the catalog.
///
/// The cover URL has to resolve to a real image, and the normalized
/// (title, author) pair has to be unique across the catalog.
pub async fn add_book(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Json(payload): Json<AddBookRequest>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_required(&payload.title, "Title").map_err(ApiError::Validation)?;
    validation::validate_author(&payload.author).map_err(ApiError::Validation)?;
    validation::validate_required(&payload.image_url, "Image URL").map_err(ApiError::Validation)?;

    let title = payload.title.trim().to_string();
    let author = validation::title_case(payload.author.trim());

    if !state.image_probe.check(&payload.image_url).await {
        warn!(
            "User {} failed to add book, image URL is not valid: {}",
            actor.id, payload.image_url
        );
        return Err(ApiError::Validation(
            "Image URL is not valid. Please try again.".to_string(),
        ));
    }

    let duplicate = state
        .book_repository
        .find_duplicate(&title, &author)
        .await
        .map_err(|e| {
            tracing::error!("Duplicate lookup failed: {}", e);
            ApiError::InternalServerError
        })?;
    if duplicate.is_some() {
        warn!(
            "User {} tried to add a book that already exists: {}",
            actor.id, title
        );
        return Err(ApiError::Validation(
            "A book with this title already exists.".to_string(),
        ));
    }

    let new_book = NewBook {
        title,
        author,
        image_url: payload.image_url,
        owner_id: actor.id,
    };

    let book = state.book_repository.create(&new_book).await.map_err(|e| {
        tracing::error!("Failed to create book: {}", e);
        ApiError::InternalServerError
    })?;

    info!(
        "User {} added book \"{}\" ({})",
        actor.id, book.title, book.id
    );

    Ok((StatusCode::CREATED, Json(book)))
}

/// Toggle a book's listing between available and unlisted
pub async fn activate_to_borrow(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let book = load_book(&state, id).await?;

    match lifecycle::toggle_listing(&book, actor.id)? {
        ToggleOutcome::Toggled(loan_state) => {
            let updated = persist_loan_state(&state, id, &loan_state).await?;
            let message = if updated.available_for_lending {
                format!("Book {} is set to available for lending.", updated.title)
            } else {
                format!("Book {} is set to unavailable for lending.", updated.title)
            };
            info!("(Book {}) {}", updated.id, message);
            Ok(Json(json!({ "success": true, "message": message })))
        }
        ToggleOutcome::IgnoredLentOut => {
            info!(
                "User {} toggled listing of lent-out book {}; listing unchanged",
                actor.id, book.id
            );
            Ok(Json(json!({
                "success": true,
                "message": format!("Book {} is lent out; listing unchanged.", book.title),
            })))
        }
    }
}

/// Reserve a book for the acting member
pub async fn reserve_book(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let book = load_book(&state, id).await?;

    match lifecycle::reserve(&book, actor.id)? {
        ReserveOutcome::Reserved(loan_state) => {
            let updated = persist_loan_state(&state, id, &loan_state).await?;
            info!("Book {} has been reserved for user {}", updated.id, actor.id);
            Ok(Json(json!({
                "message": format!("Book \"{}\" is reserved for You", updated.title),
            })))
        }
        ReserveOutcome::AlreadyReserved => {
            warn!(
                "Book {} is already reserved for user {:?}",
                book.id, book.lender_id
            );
            Ok(Json(json!({
                "message": format!("Book \"{}\" is already reserved", book.title),
            })))
        }
    }
}

/// Cancel a standing reservation
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let book = load_book(&state, id).await?;

    let loan_state = lifecycle::cancel_reservation(&book, actor.id)?;
    let updated = persist_loan_state(&state, id, &loan_state).await?;

    info!(
        "Book {} reservation has been cancelled by user {}",
        updated.id, actor.id
    );

    Ok(Json(json!({
        "message": format!(
            "Book \"{}\" reservation is successfully cancelled",
            updated.title
        ),
    })))
}

/// Mark a reserved book as handed over to the borrower.
///
/// The due date comes from the owner's duration preference as configured
/// right now; changing the preference later leaves the due date alone.
pub async fn receive_book(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let book = load_book(&state, id).await?;

    let owner = state
        .user_repository
        .find_by_id(book.owner_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load owner of book {}: {}", book.id, e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("Book owner not found".to_string()))?;

    let today = Utc::now().date_naive();
    let loan_state = lifecycle::hand_over(&book, actor.id, owner.duration as u32, today)?;
    let updated = persist_loan_state(&state, id, &loan_state).await?;

    info!(
        "Book {} handed over to user {:?}, due {:?}",
        updated.id, updated.lender_id, updated.return_date
    );

    Ok(Json(json!({
        "message": format!("Book \"{}\" is handed over to lender.", updated.title),
        "return_date": updated.return_date,
    })))
}

/// Return a book, ending the loan and the reservation
pub async fn return_book(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let book = load_book(&state, id).await?;

    let loan_state = lifecycle::return_book(&book, actor.id)?;
    let updated = persist_loan_state(&state, id, &loan_state).await?;

    info!("User {} returned book {} successfully", actor.id, updated.id);

    Ok(Json(json!({
        "message": format!("You have returned book \"{}\" successfully", updated.title),
    })))
}

/// Remove a book from the catalog.
///
/// Owner only, and never while the book is reserved or lent out.
pub async fn remove_book(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let book = load_book(&state, id).await?;

    lifecycle::check_removal(&book, actor.id)?;

    let deleted = state.book_repository.delete(id).await.map_err(|e| {
        tracing::error!("Failed to delete book {}: {}", id, e);
        ApiError::InternalServerError
    })?;
    if !deleted {
        return Err(ApiError::NotFound("Book not found".to_string()));
    }

    info!("User {} removed their book {}", actor.id, book.id);

    Ok(Json(json!({
        "message": format!("Book {} has been removed successfully", book.title),
    })))
}

/// The acting member's own books, with the overdue subset
pub async fn my_books(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let books = state
        .book_repository
        .list_owned(actor.id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list owned books: {}", e);
            ApiError::InternalServerError
        })?;

    if books.is_empty() {
        info!("User {} has no books to show", actor.id);
    }

    let due_books = overdue_ids(&books);
    Ok(Json(BookListResponse { books, due_books }))
}

/// Books the acting member has reserved or borrowed, with the overdue
/// subset
pub async fn my_reserved_books(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let books = state
        .book_repository
        .list_borrowed(actor.id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list borrowed books: {}", e);
            ApiError::InternalServerError
        })?;

    if books.is_empty() {
        info!("User {} has no reserved books", actor.id);
    }

    let due_books = overdue_ids(&books);
    Ok(Json(BookListResponse { books, due_books }))
}
