//! Repositories for database operations

pub mod book;
pub mod user;

pub use book::BookRepository;
pub use user::UserRepository;
