//! Application state shared across handlers

use sqlx::PgPool;

use crate::{
    image_probe::ImageProbe,
    jwt::JwtService,
    repositories::{BookRepository, UserRepository},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_service: JwtService,
    pub user_repository: UserRepository,
    pub book_repository: BookRepository,
    pub image_probe: ImageProbe,
}
