//! Data models for the lending service

pub mod book;
pub mod user;

pub use book::{Book, NewBook};
pub use user::{NewUser, User};
