//! Library domain model
//!
//! The hierarchy is Library → Bookcase → Shelf → Book → Page → Item. A book
//! keeps every page it ever had; the page matching `current_date` is the
//! working page and all others are history.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use super::id::{next_id, Id};

/// Calendar date format used for page dates and rollover bookkeeping
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Root of the hierarchy, persisted as a single document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub bookcases: Vec<Bookcase>,

    /// Count of items ever completed; never decremented
    #[serde(default)]
    pub total_score: u64,

    /// Last calendar date on which the daily rollover ran
    #[serde(default, with = "blank_date")]
    pub last_rollover: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookcase {
    pub id: Id,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub shelves: Vec<Shelf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shelf {
    pub id: Id,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub books: Vec<Book>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: Id,
    pub name: String,

    /// Date of the working page; `None` until the book is first rolled over
    #[serde(default, with = "blank_date")]
    pub current_date: Option<NaiveDate>,

    /// All pages, history included, in creation order
    #[serde(default, deserialize_with = "null_as_empty")]
    pub pages: Vec<Page>,
}

/// One day of a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Id,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<FixedOffset>>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_bookcase(&self, id: Id) -> Option<&Bookcase> {
        self.bookcases.iter().find(|bc| bc.id == id)
    }

    pub fn find_bookcase_mut(&mut self, id: Id) -> Option<&mut Bookcase> {
        self.bookcases.iter_mut().find(|bc| bc.id == id)
    }

    pub fn next_bookcase_id(&self) -> Option<Id> {
        next_id(self.bookcases.iter().map(|bc| bc.id))
    }

    /// Iterates every book with its bookcase and shelf, in hierarchy order
    pub fn books(&self) -> impl Iterator<Item = (&Bookcase, &Shelf, &Book)> {
        self.bookcases.iter().flat_map(|bc| {
            bc.shelves
                .iter()
                .flat_map(move |sh| sh.books.iter().map(move |bk| (bc, sh, bk)))
        })
    }

    /// Iterates every book mutably, in hierarchy order
    pub fn books_mut(&mut self) -> impl Iterator<Item = &mut Book> {
        self.bookcases
            .iter_mut()
            .flat_map(|bc| bc.shelves.iter_mut())
            .flat_map(|sh| sh.books.iter_mut())
    }
}

impl Bookcase {
    pub fn new(id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            shelves: Vec::new(),
        }
    }

    pub fn find_shelf(&self, id: Id) -> Option<&Shelf> {
        self.shelves.iter().find(|sh| sh.id == id)
    }

    pub fn find_shelf_mut(&mut self, id: Id) -> Option<&mut Shelf> {
        self.shelves.iter_mut().find(|sh| sh.id == id)
    }

    pub fn next_shelf_id(&self) -> Option<Id> {
        next_id(self.shelves.iter().map(|sh| sh.id))
    }
}

impl Shelf {
    pub fn new(id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            books: Vec::new(),
        }
    }

    pub fn find_book(&self, id: Id) -> Option<&Book> {
        self.books.iter().find(|bk| bk.id == id)
    }

    pub fn find_book_mut(&mut self, id: Id) -> Option<&mut Book> {
        self.books.iter_mut().find(|bk| bk.id == id)
    }

    pub fn next_book_id(&self) -> Option<Id> {
        next_id(self.books.iter().map(|bk| bk.id))
    }
}

impl Book {
    pub fn new(id: Id, name: impl Into<String>, current_date: Option<NaiveDate>) -> Self {
        Self {
            id,
            name: name.into(),
            current_date,
            pages: Vec::new(),
        }
    }

    /// Item IDs are unique across every page of the book, not per page
    pub fn next_item_id(&self) -> Option<Id> {
        next_id(self.items().map(|it| it.id))
    }

    /// Iterates all items on all pages, page order first
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.pages.iter().flat_map(|pg| pg.items.iter())
    }

    /// Finds an item by ID along with the page holding it
    pub fn find_item(&self, id: Id) -> Option<(&Item, &Page)> {
        self.pages.iter().find_map(|pg| {
            pg.items
                .iter()
                .find(|it| it.id == id)
                .map(|it| (it, pg))
        })
    }

    /// Mutable lookup; also returns the date of the owning page
    pub fn find_item_mut(&mut self, id: Id) -> Option<(&mut Item, NaiveDate)> {
        self.pages.iter_mut().find_map(|pg| {
            let date = pg.date;
            pg.items.iter_mut().find(|it| it.id == id).map(|it| (it, date))
        })
    }

    pub fn page(&self, date: NaiveDate) -> Option<&Page> {
        self.pages.iter().find(|pg| pg.date == date)
    }

    /// Returns the page for `date`, appending an empty one if missing.
    /// Existing pages are never reordered or removed.
    pub fn get_or_create_page(&mut self, date: NaiveDate) -> &mut Page {
        let index = match self.pages.iter().position(|pg| pg.date == date) {
            Some(index) => index,
            None => {
                self.pages.push(Page::new(date));
                self.pages.len() - 1
            }
        };
        &mut self.pages[index]
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.current_date.and_then(|date| self.page(date))
    }

    /// Pages whose date differs from the current date
    pub fn history_pages(&self) -> impl Iterator<Item = &Page> {
        let current = self.current_date;
        self.pages.iter().filter(move |pg| Some(pg.date) != current)
    }
}

impl Page {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            items: Vec::new(),
        }
    }
}

impl Item {
    pub fn new(id: Id, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            completed_at: None,
        }
    }

    /// Marks the item done. Returns false if it already was.
    pub fn complete(&mut self, at: DateTime<FixedOffset>) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        self.completed_at = Some(at);
        true
    }
}

/// Formats a date the way it is stored
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
}

/// Collections written as `null` (or omitted) load as empty
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Optional dates stored as `""` when absent
mod blank_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::DATE_FORMAT;

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.collect_str(&date.format(DATE_FORMAT)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => NaiveDate::parse_from_str(value, DATE_FORMAT)
                .map(Some)
                .map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn sample_book() -> Book {
        let mut book = Book::new(Id::new(1), "Daily", Some(date("2025-01-02")));
        book.pages.push(Page {
            date: date("2025-01-01"),
            items: vec![Item::new(Id::new(1), "A"), Item::new(Id::new(4), "B")],
        });
        book.pages.push(Page {
            date: date("2025-01-02"),
            items: vec![Item::new(Id::new(5), "C")],
        });
        book
    }

    #[test]
    fn next_ids_per_scope() {
        let mut library = Library::new();
        assert_eq!(library.next_bookcase_id(), Some(Id::new(1)));

        library.bookcases.push(Bookcase::new(Id::new(3), "Work"));
        assert_eq!(library.next_bookcase_id(), Some(Id::new(4)));

        let bookcase = &mut library.bookcases[0];
        assert_eq!(bookcase.next_shelf_id(), Some(Id::new(1)));
        bookcase.shelves.push(Shelf::new(Id::new(2), "Projects"));
        assert_eq!(bookcase.next_shelf_id(), Some(Id::new(3)));

        let shelf = &mut bookcase.shelves[0];
        assert_eq!(shelf.next_book_id(), Some(Id::new(1)));
    }

    #[test]
    fn item_ids_span_all_pages() {
        let book = sample_book();
        assert_eq!(book.next_item_id(), Some(Id::new(6)));
    }

    #[test]
    fn find_item_returns_owning_page() {
        let book = sample_book();

        let (item, page) = book.find_item(Id::new(4)).unwrap();
        assert_eq!(item.text, "B");
        assert_eq!(page.date, date("2025-01-01"));

        assert!(book.find_item(Id::new(2)).is_none());
    }

    #[test]
    fn find_item_mut_reports_page_date() {
        let mut book = sample_book();
        let (item, page_date) = book.find_item_mut(Id::new(5)).unwrap();
        assert_eq!(item.text, "C");
        assert_eq!(page_date, date("2025-01-02"));
    }

    #[test]
    fn get_or_create_page_reuses_existing() {
        let mut book = sample_book();

        book.get_or_create_page(date("2025-01-01"));
        assert_eq!(book.pages.len(), 2);

        book.get_or_create_page(date("2025-01-03"));
        assert_eq!(book.pages.len(), 3);
        assert_eq!(book.pages[2].date, date("2025-01-03"));
        assert!(book.pages[2].items.is_empty());

        // Order of existing pages is untouched
        assert_eq!(book.pages[0].date, date("2025-01-01"));
        assert_eq!(book.pages[1].date, date("2025-01-02"));
    }

    #[test]
    fn history_excludes_current_page() {
        let book = sample_book();
        let history: Vec<_> = book.history_pages().map(|pg| pg.date).collect();
        assert_eq!(history, vec![date("2025-01-01")]);
        assert_eq!(book.current_page().unwrap().date, date("2025-01-02"));
    }

    #[test]
    fn complete_only_once() {
        let at = DateTime::parse_from_rfc3339("2025-01-01T09:30:00+01:00").unwrap();
        let mut item = Item::new(Id::new(1), "A");

        assert!(item.complete(at));
        assert!(item.completed);
        assert_eq!(item.completed_at, Some(at));

        let later = DateTime::parse_from_rfc3339("2025-01-02T09:30:00+01:00").unwrap();
        assert!(!item.complete(later));
        assert_eq!(item.completed_at, Some(at));
    }

    #[test]
    fn books_iterates_in_hierarchy_order() {
        let mut library = Library::new();
        let mut bc1 = Bookcase::new(Id::new(1), "One");
        let mut sh = Shelf::new(Id::new(1), "S");
        sh.books.push(Book::new(Id::new(1), "a", None));
        sh.books.push(Book::new(Id::new(2), "b", None));
        bc1.shelves.push(sh);
        let mut bc2 = Bookcase::new(Id::new(2), "Two");
        let mut sh = Shelf::new(Id::new(1), "T");
        sh.books.push(Book::new(Id::new(1), "c", None));
        bc2.shelves.push(sh);
        library.bookcases = vec![bc1, bc2];

        let names: Vec<_> = library.books().map(|(_, _, bk)| bk.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(library.books_mut().count(), 3);
    }

    #[test]
    fn serializes_expected_shape() {
        let mut library = Library::new();
        let mut bookcase = Bookcase::new(Id::new(1), "Home");
        let mut shelf = Shelf::new(Id::new(1), "Chores");
        let mut book = Book::new(Id::new(1), "Daily", None);
        let mut page = Page::new(date("2025-01-01"));
        page.items.push(Item::new(Id::new(1), "Dishes"));
        book.pages.push(page);
        shelf.books.push(book);
        bookcase.shelves.push(shelf);
        library.bookcases.push(bookcase);

        let value = serde_json::to_value(&library).unwrap();
        assert_eq!(value["total_score"], 0);
        assert_eq!(value["last_rollover"], "");

        let book = &value["bookcases"][0]["shelves"][0]["books"][0];
        assert_eq!(book["current_date"], "");
        assert_eq!(book["pages"][0]["date"], "2025-01-01");

        let item = &book["pages"][0]["items"][0];
        assert_eq!(item["text"], "Dishes");
        assert_eq!(item["completed"], false);
        assert!(item.get("completed_at").is_none());
    }

    #[test]
    fn loads_legacy_document() {
        let json = r#"{
          "bookcases": [
            {
              "id": 1,
              "name": "Test Bookcase",
              "shelves": [
                {
                  "id": 1,
                  "name": "Test Shelf",
                  "books": [
                    {
                      "id": 1,
                      "name": "Test Book",
                      "current_date": "2025-11-14",
                      "pages": [
                        { "date": "2025-11-13", "items": null },
                        {
                          "date": "2025-11-14",
                          "items": [
                            { "id": 3, "text": "Write notes", "completed": true,
                              "completed_at": "2025-11-14T10:15:00-05:00" }
                          ]
                        }
                      ]
                    }
                  ]
                }
              ]
            }
          ],
          "total_score": 1,
          "last_rollover": "2025-11-14"
        }"#;

        let library: Library = serde_json::from_str(json).unwrap();
        assert_eq!(library.total_score, 1);
        assert_eq!(library.last_rollover, Some(date("2025-11-14")));

        let book = &library.bookcases[0].shelves[0].books[0];
        assert_eq!(book.current_date, Some(date("2025-11-14")));
        assert!(book.pages[0].items.is_empty());

        let item = &book.pages[1].items[0];
        assert!(item.completed);
        assert_eq!(
            item.completed_at.unwrap().to_rfc3339(),
            "2025-11-14T10:15:00-05:00"
        );
    }

    #[test]
    fn missing_and_blank_fields_default() {
        let library: Library = serde_json::from_str(r#"{"bookcases": null}"#).unwrap();
        assert!(library.bookcases.is_empty());
        assert_eq!(library.total_score, 0);
        assert_eq!(library.last_rollover, None);

        let book: Book =
            serde_json::from_str(r#"{"id": 2, "name": "x", "current_date": ""}"#).unwrap();
        assert_eq!(book.current_date, None);
        assert!(book.pages.is_empty());
    }

    #[test]
    fn rejects_malformed_dates() {
        let result: Result<Page, _> = serde_json::from_str(r#"{"date": "13/11/2025", "items": []}"#);
        assert!(result.is_err());

        let result: Result<Library, _> =
            serde_json::from_str(r#"{"bookcases": [], "last_rollover": "yesterday"}"#);
        assert!(result.is_err());
    }
}
