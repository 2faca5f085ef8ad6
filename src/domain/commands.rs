//! Library commands
//!
//! Each operation resolves its target by ID, applies one mutation in memory
//! and reports what it did. Failures are ordinary values: nothing here is
//! fatal, and a failed operation leaves the library untouched.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use thiserror::Error;

use super::id::{Id, IdError};
use super::library::{Book, Bookcase, Item, Library, Shelf};
use super::rollover::{rollover_book, Transition};

/// Level of the hierarchy a lookup failed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Bookcase,
    Shelf,
    Book,
    Item,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Bookcase => "bookcase",
            Scope::Shelf => "shelf",
            Scope::Book => "book",
            Scope::Item => "item",
        };
        f.write_str(name)
    }
}

/// The enclosing entity of a failed lookup, for messages like "in shelf 2"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent {
    pub scope: Scope,
    pub id: Id,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("{0}")]
    Usage(String),

    #[error("No {scope} found with ID {id}{}", in_parent(.parent))]
    NotFound {
        scope: Scope,
        id: Id,
        parent: Option<Parent>,
    },

    #[error("Item {item} is already completed.")]
    AlreadyCompleted { item: Id, book: Id },

    #[error("No {scope} IDs left{}", in_parent(.parent))]
    IdsExhausted {
        scope: Scope,
        parent: Option<Parent>,
    },
}

fn in_parent(parent: &Option<Parent>) -> String {
    match parent {
        Some(p) => format!(" in {} {}", p.scope, p.id),
        None => String::new(),
    }
}

impl From<IdError> for CommandError {
    fn from(err: IdError) -> Self {
        CommandError::Usage(err.to_string())
    }
}

impl CommandError {
    fn not_found(scope: Scope, id: Id, parent: Option<Parent>) -> Self {
        CommandError::NotFound { scope, id, parent }
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, CommandError::Usage(_))
    }
}

/// Path to a book: bookcase, shelf and book IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookRef {
    pub bookcase: Id,
    pub shelf: Id,
    pub book: Id,
}

impl BookRef {
    pub fn new(bookcase: Id, shelf: Id, book: Id) -> Self {
        Self {
            bookcase,
            shelf,
            book,
        }
    }
}

fn resolve_bookcase(library: &Library, id: Id) -> Result<&Bookcase, CommandError> {
    library
        .find_bookcase(id)
        .ok_or_else(|| CommandError::not_found(Scope::Bookcase, id, None))
}

fn resolve_bookcase_mut(library: &mut Library, id: Id) -> Result<&mut Bookcase, CommandError> {
    library
        .find_bookcase_mut(id)
        .ok_or_else(|| CommandError::not_found(Scope::Bookcase, id, None))
}

fn resolve_shelf_mut(
    library: &mut Library,
    bookcase_id: Id,
    shelf_id: Id,
) -> Result<&mut Shelf, CommandError> {
    resolve_bookcase_mut(library, bookcase_id)?
        .find_shelf_mut(shelf_id)
        .ok_or_else(|| {
            CommandError::not_found(
                Scope::Shelf,
                shelf_id,
                Some(Parent {
                    scope: Scope::Bookcase,
                    id: bookcase_id,
                }),
            )
        })
}

/// Read-only resolution down to a book
pub fn find_book(library: &Library, target: BookRef) -> Result<&Book, CommandError> {
    let shelf = resolve_bookcase(library, target.bookcase)?
        .find_shelf(target.shelf)
        .ok_or_else(|| {
            CommandError::not_found(
                Scope::Shelf,
                target.shelf,
                Some(Parent {
                    scope: Scope::Bookcase,
                    id: target.bookcase,
                }),
            )
        })?;

    shelf
        .find_book(target.book)
        .ok_or_else(|| book_not_found(target))
}

fn find_book_mut(library: &mut Library, target: BookRef) -> Result<&mut Book, CommandError> {
    resolve_shelf_mut(library, target.bookcase, target.shelf)?
        .find_book_mut(target.book)
        .ok_or_else(|| book_not_found(target))
}

fn book_not_found(target: BookRef) -> CommandError {
    CommandError::not_found(
        Scope::Book,
        target.book,
        Some(Parent {
            scope: Scope::Shelf,
            id: target.shelf,
        }),
    )
}

/// Appends a bookcase with the next top-level ID
pub fn add_bookcase(library: &mut Library, name: &str) -> Result<Id, CommandError> {
    let id = library
        .next_bookcase_id()
        .ok_or(CommandError::IdsExhausted {
            scope: Scope::Bookcase,
            parent: None,
        })?;
    library.bookcases.push(Bookcase::new(id, name));
    Ok(id)
}

/// Appends a shelf to a bookcase
pub fn add_shelf(library: &mut Library, bookcase_id: Id, name: &str) -> Result<Id, CommandError> {
    let bookcase = resolve_bookcase_mut(library, bookcase_id)?;
    let id = bookcase.next_shelf_id().ok_or(CommandError::IdsExhausted {
        scope: Scope::Shelf,
        parent: Some(Parent {
            scope: Scope::Bookcase,
            id: bookcase_id,
        }),
    })?;
    bookcase.shelves.push(Shelf::new(id, name));
    Ok(id)
}

/// Appends a book to a shelf, dated `today` with no pages yet
pub fn add_book(
    library: &mut Library,
    bookcase_id: Id,
    shelf_id: Id,
    name: &str,
    today: NaiveDate,
) -> Result<Id, CommandError> {
    let shelf = resolve_shelf_mut(library, bookcase_id, shelf_id)?;
    let id = shelf.next_book_id().ok_or(CommandError::IdsExhausted {
        scope: Scope::Book,
        parent: Some(Parent {
            scope: Scope::Shelf,
            id: shelf_id,
        }),
    })?;
    shelf.books.push(Book::new(id, name, Some(today)));
    Ok(id)
}

/// Result of adding an item
#[derive(Debug, Clone, PartialEq)]
pub struct AddedItem {
    pub id: Id,
    /// Non-`Unchanged` when the book had to be brought to today first
    pub transition: Transition,
}

/// Appends an item to the book's page for `today`.
///
/// The book is brought to `today` through the rollover state machine rather
/// than by overwriting its date, so a stale page is still migrated when this
/// runs before the daily rollover.
pub fn add_item(
    library: &mut Library,
    target: BookRef,
    text: &str,
    today: NaiveDate,
) -> Result<AddedItem, CommandError> {
    let book = find_book_mut(library, target)?;

    let transition = rollover_book(book, today);
    let id = book.next_item_id().ok_or(CommandError::IdsExhausted {
        scope: Scope::Item,
        parent: Some(Parent {
            scope: Scope::Book,
            id: target.book,
        }),
    })?;
    book.get_or_create_page(today).items.push(Item::new(id, text));

    Ok(AddedItem { id, transition })
}

/// Result of completing an item
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedItem {
    pub id: Id,
    pub text: String,
    pub page_date: NaiveDate,
    pub total_score: u64,
}

/// Marks an item done anywhere in the book's history and bumps the score
pub fn complete_item(
    library: &mut Library,
    target: BookRef,
    item_id: Id,
    now: DateTime<FixedOffset>,
) -> Result<CompletedItem, CommandError> {
    let book = find_book_mut(library, target)?;

    let (item, page_date) = book.find_item_mut(item_id).ok_or_else(|| {
        CommandError::not_found(
            Scope::Item,
            item_id,
            Some(Parent {
                scope: Scope::Book,
                id: target.book,
            }),
        )
    })?;

    if !item.complete(now) {
        return Err(CommandError::AlreadyCompleted {
            item: item_id,
            book: target.book,
        });
    }
    let text = item.text.clone();

    library.total_score += 1;

    Ok(CompletedItem {
        id: item_id,
        text,
        page_date,
        total_score: library.total_score,
    })
}
