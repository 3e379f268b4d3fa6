//! Route modules for the Books API

pub mod books;
pub mod health;
