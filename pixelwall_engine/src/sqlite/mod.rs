//! SQLite database module for the Pixelwall Engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
