//! Daily rollover
//!
//! Once per calendar day every book moves its working page forward to
//! today. Completed items stay behind on the old page as history; each
//! incomplete item is re-created on today's page with a fresh ID.
//!
//! Per book this is a small state machine keyed on `current_date`:
//!
//! | State           | Condition                  | Transition                         |
//! |-----------------|----------------------------|------------------------------------|
//! | `Uninitialized` | no current date            | set date, ensure today's page      |
//! | `Current`       | current date == today      | nothing                            |
//! | `Stale`         | current date != today      | migrate open items, set date       |
//!
//! A stale book whose old page is missing is treated like an uninitialized
//! one: the date advances and nothing is migrated. A stale book whose item
//! IDs cannot cover the carried items stays where it is.

use chrono::NaiveDate;
use serde::Serialize;

use super::id::Id;
use super::library::{Book, Item, Library};

/// Where a book stands relative to a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookState {
    Uninitialized,
    Current,
    Stale(NaiveDate),
}

/// What rollover did to a single book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    /// Already on today
    Unchanged,
    /// First rollover of a book without a current date
    Initialized,
    /// The previous working page was missing; date advanced without migration
    Recovered { previous: NaiveDate },
    /// Open items moved from the previous working page
    Migrated {
        from: NaiveDate,
        moved: usize,
        kept: usize,
    },
    /// Not enough item IDs left to carry the open items; nothing moved
    IdsExhausted { from: NaiveDate },
}

impl Transition {
    pub fn is_change(&self) -> bool {
        !matches!(self, Transition::Unchanged)
    }
}

/// Rollover outcome for one book, with its position in the hierarchy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookRollover {
    pub bookcase_id: Id,
    pub shelf_id: Id,
    pub book_id: Id,
    pub book_name: String,
    pub transition: Transition,
}

/// Outcome of a library-wide rollover
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RolloverReport {
    pub date: NaiveDate,
    /// False when the once-per-day gate had already been passed
    pub performed: bool,
    /// Books that changed, in hierarchy order
    pub books: Vec<BookRollover>,
}

impl RolloverReport {
    fn skipped(date: NaiveDate) -> Self {
        Self {
            date,
            performed: false,
            books: Vec::new(),
        }
    }

    /// Total number of items carried to today
    pub fn migrated_items(&self) -> usize {
        self.books
            .iter()
            .map(|b| match b.transition {
                Transition::Migrated { moved, .. } => moved,
                _ => 0,
            })
            .sum()
    }
}

impl Book {
    pub fn state(&self, today: NaiveDate) -> BookState {
        match self.current_date {
            None => BookState::Uninitialized,
            Some(date) if date == today => BookState::Current,
            Some(date) => BookState::Stale(date),
        }
    }
}

/// Brings one book to `today`. Calling it again on the same day is a no-op.
pub fn rollover_book(book: &mut Book, today: NaiveDate) -> Transition {
    let previous = match book.state(today) {
        BookState::Current => return Transition::Unchanged,
        BookState::Uninitialized => {
            book.current_date = Some(today);
            book.get_or_create_page(today);
            return Transition::Initialized;
        }
        BookState::Stale(previous) => previous,
    };

    let Some(old_index) = book.pages.iter().position(|pg| pg.date == previous) else {
        book.current_date = Some(today);
        book.get_or_create_page(today);
        return Transition::Recovered { previous };
    };

    // Fresh IDs are reserved while the open items are still counted, so a
    // migrated item never reuses the ID of the item it replaces.
    let open = book.pages[old_index]
        .items
        .iter()
        .filter(|it| !it.completed)
        .count();
    let Some(fresh_ids) = reserve_item_ids(book, open) else {
        return Transition::IdsExhausted { from: previous };
    };

    let old_items = std::mem::take(&mut book.pages[old_index].items);
    let (completed, incomplete): (Vec<Item>, Vec<Item>) =
        old_items.into_iter().partition(|it| it.completed);

    let kept = completed.len();
    book.pages[old_index].items = completed;

    let migrated: Vec<Item> = incomplete
        .into_iter()
        .zip(fresh_ids)
        .map(|(old, id)| Item::new(id, old.text))
        .collect();
    let moved = migrated.len();

    book.get_or_create_page(today).items.extend(migrated);
    book.current_date = Some(today);

    Transition::Migrated {
        from: previous,
        moved,
        kept,
    }
}

/// IDs for `count` new items in the book, or `None` if they would run past
/// `u64::MAX`
fn reserve_item_ids(book: &Book, count: usize) -> Option<impl Iterator<Item = Id>> {
    let (first, last) = match u64::try_from(count).ok()? {
        0 => (1, 0),
        n => {
            let first = book.next_item_id()?.get();
            (first, first.checked_add(n - 1)?)
        }
    };
    Some((first..=last).map(Id::new))
}

/// Runs the daily rollover over every book, at most once per day.
///
/// The gate is `last_rollover`: when it is already `today` (or later, if the
/// clock went backwards) nothing is touched. Otherwise every book is rolled
/// in hierarchy order and `last_rollover` becomes `today`, even for an
/// empty library.
pub fn auto_rollover(library: &mut Library, today: NaiveDate) -> RolloverReport {
    if library.last_rollover.is_some_and(|last| last >= today) {
        return RolloverReport::skipped(today);
    }

    let mut books = Vec::new();
    for bookcase in &mut library.bookcases {
        for shelf in &mut bookcase.shelves {
            for book in &mut shelf.books {
                let transition = rollover_book(book, today);
                if transition.is_change() {
                    books.push(BookRollover {
                        bookcase_id: bookcase.id,
                        shelf_id: shelf.id,
                        book_id: book.id,
                        book_name: book.name.clone(),
                        transition,
                    });
                }
            }
        }
    }

    library.last_rollover = Some(today);

    RolloverReport {
        date: today,
        performed: true,
        books,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::library::{parse_date, Bookcase, Page, Shelf};
    use chrono::DateTime;
    use proptest::prelude::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn done(id: u64, text: &str) -> Item {
        let mut item = Item::new(Id::new(id), text);
        item.complete(DateTime::parse_from_rfc3339("2025-01-01T18:00:00+00:00").unwrap());
        item
    }

    fn library_with(book: Book) -> Library {
        let mut shelf = Shelf::new(Id::new(1), "Shelf");
        shelf.books.push(book);
        let mut bookcase = Bookcase::new(Id::new(1), "Bookcase");
        bookcase.shelves.push(shelf);
        Library {
            bookcases: vec![bookcase],
            total_score: 0,
            last_rollover: None,
        }
    }

    fn two_item_book() -> Book {
        let mut book = Book::new(Id::new(1), "Daily", Some(date("2025-01-01")));
        book.pages.push(Page {
            date: date("2025-01-01"),
            items: vec![Item::new(Id::new(1), "A"), done(2, "B")],
        });
        book
    }

    #[test]
    fn empty_library_records_date() {
        let mut library = Library::new();
        let report = auto_rollover(&mut library, date("2025-01-01"));

        assert!(report.performed);
        assert!(report.books.is_empty());
        assert_eq!(library.last_rollover, Some(date("2025-01-01")));
        assert!(library.bookcases.is_empty());
    }

    #[test]
    fn stale_book_migrates_open_items() {
        let mut book = two_item_book();
        let transition = rollover_book(&mut book, date("2025-01-02"));

        assert_eq!(
            transition,
            Transition::Migrated {
                from: date("2025-01-01"),
                moved: 1,
                kept: 1
            }
        );
        assert_eq!(book.current_date, Some(date("2025-01-02")));

        let old = book.page(date("2025-01-01")).unwrap();
        assert_eq!(old.items.len(), 1);
        assert_eq!(old.items[0].id, Id::new(2));
        assert!(old.items[0].completed);

        let new = book.page(date("2025-01-02")).unwrap();
        assert_eq!(new.items.len(), 1);
        assert_eq!(new.items[0].id, Id::new(3));
        assert_eq!(new.items[0].text, "A");
        assert!(!new.items[0].completed);
        assert!(new.items[0].completed_at.is_none());
    }

    #[test]
    fn migrated_ids_skip_past_replaced_items() {
        let mut book = Book::new(Id::new(1), "Daily", Some(date("2025-01-01")));
        book.pages.push(Page {
            date: date("2025-01-01"),
            items: vec![done(1, "x"), Item::new(Id::new(7), "y"), Item::new(Id::new(3), "z")],
        });

        rollover_book(&mut book, date("2025-01-02"));

        let new = book.page(date("2025-01-02")).unwrap();
        let ids: Vec<_> = new.items.iter().map(|it| it.id.get()).collect();
        let texts: Vec<_> = new.items.iter().map(|it| it.text.as_str()).collect();
        assert_eq!(ids, vec![8, 9]);
        assert_eq!(texts, vec!["y", "z"]);
    }

    #[test]
    fn current_book_is_untouched() {
        let mut book = two_item_book();
        let before = book.clone();

        assert_eq!(rollover_book(&mut book, date("2025-01-01")), Transition::Unchanged);
        assert_eq!(book, before);
    }

    #[test]
    fn uninitialized_book_gets_empty_page() {
        let mut book = Book::new(Id::new(1), "Fresh", None);

        assert_eq!(rollover_book(&mut book, date("2025-03-04")), Transition::Initialized);
        assert_eq!(book.current_date, Some(date("2025-03-04")));
        assert_eq!(book.pages.len(), 1);
        assert!(book.pages[0].items.is_empty());
    }

    #[test]
    fn missing_old_page_self_heals() {
        let mut book = Book::new(Id::new(1), "Orphan", Some(date("2025-01-01")));
        book.pages.push(Page {
            date: date("2024-12-31"),
            items: vec![Item::new(Id::new(1), "left behind")],
        });

        let transition = rollover_book(&mut book, date("2025-01-02"));

        assert_eq!(
            transition,
            Transition::Recovered {
                previous: date("2025-01-01")
            }
        );
        assert_eq!(book.current_date, Some(date("2025-01-02")));
        assert_eq!(book.pages.len(), 2);
        assert!(book.page(date("2025-01-02")).unwrap().items.is_empty());
        assert_eq!(book.pages[0].items.len(), 1);
    }

    #[test]
    fn appends_to_existing_today_page() {
        let mut book = two_item_book();
        book.pages.push(Page {
            date: date("2025-01-02"),
            items: vec![Item::new(Id::new(5), "early")],
        });

        rollover_book(&mut book, date("2025-01-02"));

        let new = book.page(date("2025-01-02")).unwrap();
        let texts: Vec<_> = new.items.iter().map(|it| it.text.as_str()).collect();
        assert_eq!(texts, vec!["early", "A"]);
        assert_eq!(new.items[1].id, Id::new(6));
    }

    #[test]
    fn migration_ids_reach_the_top_of_the_range() {
        let mut book = Book::new(Id::new(1), "Edge", Some(date("2025-01-01")));
        book.pages.push(Page {
            date: date("2025-01-01"),
            items: vec![Item::new(Id::new(u64::MAX - 1), "last")],
        });

        rollover_book(&mut book, date("2025-01-02"));

        let new = book.page(date("2025-01-02")).unwrap();
        assert_eq!(new.items[0].id, Id::new(u64::MAX));
    }

    #[test]
    fn exhausted_ids_leave_book_stale() {
        let mut book = Book::new(Id::new(1), "Full", Some(date("2025-01-01")));
        book.pages.push(Page {
            date: date("2025-01-01"),
            items: vec![Item::new(Id::new(u64::MAX), "stuck")],
        });
        let before = book.clone();

        let transition = rollover_book(&mut book, date("2025-01-02"));

        assert_eq!(
            transition,
            Transition::IdsExhausted {
                from: date("2025-01-01")
            }
        );
        assert_eq!(book, before);
        assert_eq!(book.state(date("2025-01-02")), BookState::Stale(date("2025-01-01")));
    }

    #[test]
    fn exhausted_ids_do_not_block_completed_only_pages() {
        let mut book = Book::new(Id::new(1), "Done", Some(date("2025-01-01")));
        book.pages.push(Page {
            date: date("2025-01-01"),
            items: vec![done(u64::MAX, "finished")],
        });

        let transition = rollover_book(&mut book, date("2025-01-02"));

        assert_eq!(
            transition,
            Transition::Migrated {
                from: date("2025-01-01"),
                moved: 0,
                kept: 1
            }
        );
        assert_eq!(book.current_date, Some(date("2025-01-02")));
    }

    #[test]
    fn gate_blocks_second_run_same_day() {
        let mut library = library_with(two_item_book());

        let first = auto_rollover(&mut library, date("2025-01-02"));
        assert!(first.performed);
        assert_eq!(first.migrated_items(), 1);

        // Tamper with the book; the gate must keep rollover from looking at it
        library.bookcases[0].shelves[0].books[0].current_date = Some(date("2025-01-01"));
        let snapshot = library.clone();

        let second = auto_rollover(&mut library, date("2025-01-02"));
        assert!(!second.performed);
        assert_eq!(library, snapshot);
    }

    #[test]
    fn gate_never_moves_backwards() {
        let mut library = library_with(two_item_book());
        library.last_rollover = Some(date("2025-02-01"));
        let snapshot = library.clone();

        let report = auto_rollover(&mut library, date("2025-01-15"));
        assert!(!report.performed);
        assert_eq!(library, snapshot);
    }

    #[test]
    fn report_lists_changed_books_only() {
        let mut library = library_with(two_item_book());
        let shelf = &mut library.bookcases[0].shelves[0];
        shelf.books.push(Book::new(Id::new(2), "Today", Some(date("2025-01-02"))));
        shelf.books.push(Book::new(Id::new(3), "New", None));

        let report = auto_rollover(&mut library, date("2025-01-02"));

        let changed: Vec<_> = report.books.iter().map(|b| b.book_id.get()).collect();
        assert_eq!(changed, vec![1, 3]);
        assert_eq!(report.books[1].transition, Transition::Initialized);
    }

    fn arb_item() -> impl Strategy<Value = (String, bool)> {
        ("[a-z]{1,6}", any::<bool>())
    }

    fn arb_book() -> impl Strategy<Value = Book> {
        (prop::collection::vec(arb_item(), 0..12), 0u64..5).prop_map(|(items, offset)| {
            let mut book = Book::new(Id::new(1), "Prop", Some(date("2025-01-01")));
            let mut page = Page::new(date("2025-01-01"));
            for (index, (text, completed)) in items.into_iter().enumerate() {
                let id = index as u64 * 2 + 1 + offset;
                page.items.push(if completed {
                    done(id, &text)
                } else {
                    Item::new(Id::new(id), text)
                });
            }
            book.pages.push(page);
            book
        })
    }

    proptest! {
        #[test]
        fn same_day_rollover_is_idempotent(book in arb_book()) {
            let mut library = library_with(book);
            auto_rollover(&mut library, date("2025-01-02"));
            let after_first = library.clone();
            auto_rollover(&mut library, date("2025-01-02"));
            prop_assert_eq!(library, after_first);
        }

        #[test]
        fn completed_items_stay_unmodified(book in arb_book()) {
            let before: Vec<Item> = book.pages[0]
                .items
                .iter()
                .filter(|it| it.completed)
                .cloned()
                .collect();

            let mut book = book;
            rollover_book(&mut book, date("2025-01-02"));

            prop_assert_eq!(&book.page(date("2025-01-01")).unwrap().items, &before);
        }

        #[test]
        fn open_item_texts_migrate_with_new_ids(book in arb_book()) {
            let old_ids: Vec<Id> = book.items().map(|it| it.id).collect();
            let max_old = old_ids.iter().copied().max().unwrap_or_default();
            let mut expected: Vec<String> = book.pages[0]
                .items
                .iter()
                .filter(|it| !it.completed)
                .map(|it| it.text.clone())
                .collect();

            let mut book = book;
            rollover_book(&mut book, date("2025-01-02"));

            let new_page = book.page(date("2025-01-02")).unwrap();
            let mut texts: Vec<String> = new_page.items.iter().map(|it| it.text.clone()).collect();
            expected.sort();
            texts.sort();
            prop_assert_eq!(texts, expected);

            for item in &new_page.items {
                prop_assert!(item.id > max_old);
                prop_assert!(!item.completed);
            }
        }
    }
}
