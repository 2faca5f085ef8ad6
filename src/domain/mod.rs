//! Domain models for Novel Notes
//!
//! Contains the core business logic without any I/O concerns.

mod id;
mod library;
mod rollover;
mod commands;

pub use id::{next_id, Id, IdError};
pub use library::{
    format_date, parse_date, Book, Bookcase, Item, Library, Page, Shelf, DATE_FORMAT,
};
pub use rollover::{
    auto_rollover, rollover_book, BookRollover, BookState, RolloverReport, Transition,
};
pub use commands::{
    add_book, add_bookcase, add_item, add_shelf, complete_item, find_book, AddedItem, BookRef,
    CommandError, CompletedItem, Parent, Scope,
};
