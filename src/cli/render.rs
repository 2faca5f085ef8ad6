//! Text rendering of the library for terminal output

use std::fmt::Write;

use crate::domain::{Book, Item, Library, Page, RolloverReport, Transition};

/// Bookcases, their shelves and their books as an indented tree
pub fn library_summary(library: &Library) -> String {
    let mut out = String::new();

    if library.bookcases.is_empty() {
        out.push_str("No bookcases yet.\n");
        return out;
    }

    for bc in &library.bookcases {
        let _ = writeln!(out, "Bookcase {}: {}", bc.id, bc.name);

        if bc.shelves.is_empty() {
            out.push_str("  (no shelves)\n");
            continue;
        }

        for sh in &bc.shelves {
            let _ = writeln!(out, "  Shelf {}: {}", sh.id, sh.name);

            if sh.books.is_empty() {
                out.push_str("    (no books)\n");
                continue;
            }

            for bk in &sh.books {
                let _ = writeln!(out, "    Book {}: {} (pages: {})", bk.id, bk.name, bk.pages.len());
            }
        }
    }

    out
}

/// One line per book with its full location
pub fn all_books(library: &Library) -> String {
    let mut out = String::new();

    if library.bookcases.is_empty() {
        out.push_str("No bookcases yet.\n");
        return out;
    }

    for (bc, sh, bk) in library.books() {
        let _ = writeln!(
            out,
            "Bookcase {} ({}) -> Shelf {} ({}) -> Book {}: {} (pages: {})",
            bc.id,
            bc.name,
            sh.id,
            sh.name,
            bk.id,
            bk.name,
            bk.pages.len()
        );
    }

    out
}

/// Every page of a book, history included
pub fn book_details(book: &Book) -> String {
    let mut out = String::new();
    let current = book
        .current_date
        .map(|d| d.to_string())
        .unwrap_or_default();
    let _ = writeln!(out, "Book {}: {} (current date: {})", book.id, book.name, current);

    if book.pages.is_empty() {
        out.push_str("  (no pages)\n");
        return out;
    }

    for page in &book.pages {
        write_page(&mut out, page);
    }

    out
}

/// History pages only; the current page is left out
pub fn book_history(book: &Book) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "History for Book {}: {}", book.id, book.name);

    if book.pages.is_empty() {
        out.push_str("  (no pages yet)\n");
        return out;
    }

    let mut has_history = false;
    for page in book.history_pages() {
        has_history = true;
        write_page(&mut out, page);
    }

    if !has_history {
        out.push_str("  (no history pages yet)\n");
    }

    out
}

pub fn item_line(item: &Item) -> String {
    let status = if item.completed { "[x]" } else { "[ ]" };
    format!("{} {}: {}", status, item.id, item.text)
}

fn write_page(out: &mut String, page: &Page) {
    let _ = writeln!(out, "  Page {}:", page.date);
    if page.items.is_empty() {
        out.push_str("    (no items)\n");
        return;
    }
    for item in &page.items {
        let _ = writeln!(out, "    {}", item_line(item));
    }
}

/// Summary of a library-wide rollover
pub fn rollover_report(report: &RolloverReport) -> String {
    let mut out = String::new();

    if !report.performed {
        let _ = writeln!(out, "Rollover already performed for today: {}", report.date);
        return out;
    }

    let _ = writeln!(out, "Rollover completed for {}", report.date);
    if report.books.is_empty() {
        out.push_str("  (no books changed)\n");
        return out;
    }

    for entry in &report.books {
        let what = match entry.transition {
            Transition::Unchanged => continue,
            Transition::Initialized => "started today's page".to_string(),
            Transition::Recovered { previous } => {
                format!("page for {} was missing, started today's page", previous)
            }
            Transition::Migrated { from, moved, kept } => format!(
                "carried {} item(s) over from {}, {} kept as history",
                moved, from, kept
            ),
            Transition::IdsExhausted { from } => {
                format!("no item IDs left, page for {} left as is", from)
            }
        };
        let _ = writeln!(
            out,
            "  Bookcase {} / Shelf {} / Book {} ({}): {}",
            entry.bookcase_id, entry.shelf_id, entry.book_id, entry.book_name, what
        );
    }

    out
}
