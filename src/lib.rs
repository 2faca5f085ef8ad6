//! Novel Notes - a daily checklist journal
//!
//! Items live on dated pages inside books, which sit on shelves in
//! bookcases. Once a day every book rolls over: completed items stay on the
//! old page as history and unfinished ones are carried to today's page.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{Book, Bookcase, Id, Item, Library, Page, Shelf};
