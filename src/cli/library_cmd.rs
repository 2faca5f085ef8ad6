//! Library CLI commands
//!
//! Validates arguments, calls the domain operation and prints the result.
//! Command failures are reported here and never abort the run.

use super::app::{Commands, RunClock, BIN};
use super::output::Output;
use super::render;
use crate::domain::{
    add_book, add_bookcase, add_item, add_shelf, complete_item, find_book, BookRef, Bookcase,
    CommandError, Id, Library, RolloverReport,
};

const AVAILABLE: &str = "list, list-books, add-bookcase, add-shelf, add-book, add-item, \
                         view-book, complete-item, view-history, rollover";

/// Runs one command against the library
pub fn run(
    command: Commands,
    library: &mut Library,
    report: &RolloverReport,
    clock: &RunClock,
    output: &Output,
) {
    let ignored = command.ignored_args();
    if !ignored.is_empty() {
        output.verbose_ctx("args", &format!("Ignoring extra arguments: {}", ignored.join(" ")));
    }

    if let Err(err) = dispatch(command, library, report, clock, output) {
        output.verbose_ctx("command", &format!("{:?}", err));
        output.error(&err.to_string());
    }
}

fn dispatch(
    command: Commands,
    library: &mut Library,
    report: &RolloverReport,
    clock: &RunClock,
    output: &Output,
) -> Result<(), CommandError> {
    match command {
        Commands::List { .. } => {
            list(library, output);
            Ok(())
        }
        Commands::ListBooks { .. } => {
            list_books(library, output);
            Ok(())
        }
        Commands::AddBookcase { name } => {
            let name = words(&name, "add-bookcase <name>")?;
            let id = add_bookcase(library, &name)?;
            created(
                library,
                output,
                &format!("Added Bookcase {}: {}", id, name),
                serde_json::json!({ "bookcase_id": id, "name": name }),
            );
            Ok(())
        }
        Commands::AddShelf { bookcase_id, name } => {
            const USAGE: &str = "add-shelf <bookcase-id> <name>";
            let bookcase_id = required(bookcase_id, USAGE)?;
            let name = words(&name, USAGE)?;
            let bookcase = Id::parse_arg("Bookcase", &bookcase_id)?;

            let id = add_shelf(library, bookcase, &name)?;
            created(
                library,
                output,
                &format!("Added Shelf {} to Bookcase {}: {}", id, bookcase, name),
                serde_json::json!({ "bookcase_id": bookcase, "shelf_id": id, "name": name }),
            );
            Ok(())
        }
        Commands::AddBook {
            bookcase_id,
            shelf_id,
            name,
        } => {
            const USAGE: &str = "add-book <bookcase-id> <shelf-id> <name>";
            let bookcase_id = required(bookcase_id, USAGE)?;
            let shelf_id = required(shelf_id, USAGE)?;
            let name = words(&name, USAGE)?;
            let bookcase = Id::parse_arg("Bookcase", &bookcase_id)?;
            let shelf = Id::parse_arg("Shelf", &shelf_id)?;

            let id = add_book(library, bookcase, shelf, &name, clock.today)?;
            created(
                library,
                output,
                &format!(
                    "Added Book {} to Shelf {} in Bookcase {}: {}",
                    id, shelf, bookcase, name
                ),
                serde_json::json!({
                    "bookcase_id": bookcase,
                    "shelf_id": shelf,
                    "book_id": id,
                    "name": name,
                    "current_date": clock.today,
                }),
            );
            Ok(())
        }
        Commands::AddItem {
            bookcase_id,
            shelf_id,
            book_id,
            text,
        } => {
            const USAGE: &str = "add-item <bookcase-id> <shelf-id> <book-id> <text>";
            let ids = [bookcase_id, shelf_id, book_id];
            let ids = book_ids(ids, USAGE)?;
            let text = words(&text, USAGE)?;
            let target = parse_book_ref(&ids)?;

            let added = add_item(library, target, &text, clock.today)?;
            if added.transition.is_change() {
                output.verbose_ctx(
                    "add-item",
                    &format!("Book {} brought to today: {:?}", target.book, added.transition),
                );
            }
            created(
                library,
                output,
                &format!("Added Item {} to Book {}: {}", added.id, target.book, text),
                serde_json::json!({
                    "book_id": target.book,
                    "item_id": added.id,
                    "text": text,
                    "date": clock.today,
                }),
            );
            Ok(())
        }
        Commands::ViewBook {
            bookcase_id,
            shelf_id,
            book_id,
            ..
        } => {
            let ids = book_ids(
                [bookcase_id, shelf_id, book_id],
                "view-book <bookcase-id> <shelf-id> <book-id>",
            )?;
            let target = parse_book_ref(&ids)?;
            let book = find_book(library, target)?;

            if output.is_json() {
                output.data(&serde_json::json!({
                    "book": book,
                    "total_score": library.total_score,
                }));
            } else {
                output.text(&render::book_details(book));
                println!("Total score: {}", library.total_score);
            }
            Ok(())
        }
        Commands::CompleteItem {
            bookcase_id,
            shelf_id,
            book_id,
            item_id,
            ..
        } => {
            const USAGE: &str = "complete-item <bookcase-id> <shelf-id> <book-id> <item-id>";
            let [bookcase_id, shelf_id, book_id, item_id] =
                book_ids([bookcase_id, shelf_id, book_id, item_id], USAGE)?;
            let target = parse_book_ref(&[bookcase_id, shelf_id, book_id])?;
            let item = Id::parse_arg("Item", &item_id)?;

            let done = complete_item(library, target, item, clock.now)?;

            if output.is_json() {
                output.data(&serde_json::json!({
                    "success": true,
                    "book_id": target.book,
                    "item_id": done.id,
                    "text": done.text,
                    "page": done.page_date,
                    "completed_at": clock.now,
                    "total_score": done.total_score,
                }));
            } else {
                println!(
                    "Completed Item {} in Book {}: {}",
                    done.id, target.book, done.text
                );
                println!("New total score: {}", done.total_score);
                let book = find_book(library, target)?;
                output.text(&render::book_details(book));
            }
            Ok(())
        }
        Commands::ViewHistory {
            bookcase_id,
            shelf_id,
            book_id,
            ..
        } => {
            let ids = book_ids(
                [bookcase_id, shelf_id, book_id],
                "view-history <bookcase-id> <shelf-id> <book-id>",
            )?;
            let target = parse_book_ref(&ids)?;
            let book = find_book(library, target)?;

            if output.is_json() {
                let pages: Vec<_> = book.history_pages().collect();
                output.data(&serde_json::json!({
                    "book_id": book.id,
                    "name": book.name,
                    "current_date": book.current_date,
                    "pages": pages,
                    "total_score": library.total_score,
                }));
            } else {
                output.text(&render::book_history(book));
                println!("Total score: {}", library.total_score);
            }
            Ok(())
        }
        Commands::Rollover { .. } => {
            if output.is_json() {
                output.data(report);
            } else {
                output.text(&render::rollover_report(report));
            }
            Ok(())
        }
        Commands::Unknown(args) => {
            let name = args.first().map(String::as_str).unwrap_or_default();
            Err(CommandError::Usage(format!(
                "Unknown command: {}\nAvailable commands: {}",
                name, AVAILABLE
            )))
        }
    }
}

fn list(library: &Library, output: &Output) {
    if output.is_json() {
        let bookcases: Vec<_> = library.bookcases.iter().map(bookcase_json).collect();
        output.data(&serde_json::json!({
            "bookcases": bookcases,
            "total_score": library.total_score,
        }));
    } else {
        output.text(&render::library_summary(library));
    }
}

fn bookcase_json(bookcase: &Bookcase) -> serde_json::Value {
    let shelves: Vec<_> = bookcase
        .shelves
        .iter()
        .map(|sh| {
            let books: Vec<_> = sh
                .books
                .iter()
                .map(|bk| serde_json::json!({ "id": bk.id, "name": bk.name, "pages": bk.pages.len() }))
                .collect();
            serde_json::json!({ "id": sh.id, "name": sh.name, "books": books })
        })
        .collect();

    serde_json::json!({ "id": bookcase.id, "name": bookcase.name, "shelves": shelves })
}

fn list_books(library: &Library, output: &Output) {
    if output.is_json() {
        let books: Vec<_> = library
            .books()
            .map(|(bc, sh, bk)| {
                serde_json::json!({
                    "bookcase_id": bc.id,
                    "bookcase": bc.name,
                    "shelf_id": sh.id,
                    "shelf": sh.name,
                    "book_id": bk.id,
                    "book": bk.name,
                    "pages": bk.pages.len(),
                })
            })
            .collect();
        output.data(&books);
    } else {
        output.text(&render::all_books(library));
    }
}

/// Reports a created entity: the confirmation line plus the library tree
fn created(library: &Library, output: &Output, message: &str, data: serde_json::Value) {
    if output.is_json() {
        let mut data = data;
        data["success"] = serde_json::Value::Bool(true);
        output.data(&data);
    } else {
        output.success(message);
        output.text(&render::library_summary(library));
    }
}

fn usage(line: &str) -> CommandError {
    CommandError::Usage(format!("Usage: {} {}", BIN, line))
}

fn required(value: Option<String>, line: &str) -> Result<String, CommandError> {
    value.ok_or_else(|| usage(line))
}

/// Free text is every trailing word joined by single spaces
fn words(parts: &[String], line: &str) -> Result<String, CommandError> {
    if parts.is_empty() {
        return Err(usage(line));
    }
    Ok(parts.join(" "))
}

/// Checks that every positional ID is present before any is parsed
fn book_ids<const N: usize>(
    ids: [Option<String>; N],
    line: &str,
) -> Result<[String; N], CommandError> {
    if ids.iter().any(Option::is_none) {
        return Err(usage(line));
    }
    Ok(ids.map(Option::unwrap_or_default))
}

fn parse_book_ref(ids: &[String; 3]) -> Result<BookRef, CommandError> {
    Ok(BookRef::new(
        Id::parse_arg("Bookcase", &ids[0])?,
        Id::parse_arg("Shelf", &ids[1])?,
        Id::parse_arg("Book", &ids[2])?,
    ))
}
