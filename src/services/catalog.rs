use crate::{
    error::{AppError, AppResult},
    models::{Availability, Book},
};

/// The library's books, in display order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    books: Vec<Book>,
}

impl Catalog {
    pub fn new(books: Vec<Book>) -> Self {
        Self { books }
    }

    /// Catalog pre-filled with the starter collection
    pub fn seeded() -> Self {
        Self::new(starter_collection())
    }

    pub fn all(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    pub fn require(&self, id: &str) -> AppResult<&Book> {
        self.get(id)
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Case-insensitive match on title, author or genre
    pub fn search(&self, query: &str) -> Vec<Book> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.books.clone();
        }

        self.books
            .iter()
            .filter(|b| {
                b.title.to_lowercase().contains(&needle)
                    || b.author.to_lowercase().contains(&needle)
                    || b.genre.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    /// New books go to the top of the catalog
    pub fn insert_front(&mut self, book: Book) -> AppResult<()> {
        if self.get(&book.id).is_some() {
            return Err(AppError::Conflict(format!("Book {} already exists", book.id)));
        }
        self.books.insert(0, book);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> AppResult<Book> {
        let index = self
            .books
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;
        Ok(self.books.remove(index))
    }

    pub fn set_availability(&mut self, id: &str, status: Availability) -> AppResult<&Book> {
        let book = self
            .books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;
        book.status = status;
        Ok(book)
    }

    pub fn toggle_stock(&mut self, id: &str) -> AppResult<&Book> {
        let current = self.require(id)?.status;
        self.set_availability(id, current.toggled())
    }

    /// Looks up recommended ids, keeping only books still in the catalog.
    ///
    /// Output follows catalog order and contains each book once.
    pub fn resolve(&self, ids: &[String]) -> Vec<Book> {
        self.books
            .iter()
            .filter(|b| ids.iter().any(|id| *id == b.id))
            .cloned()
            .collect()
    }
}

fn seed(
    id: &str,
    title: &str,
    author: &str,
    genre: &str,
    description: &str,
    cover_id: u64,
    rating: f32,
) -> Book {
    Book {
        id: id.to_string(),
        title: title.to_string(),
        author: author.to_string(),
        genre: genre.to_string(),
        description: description.to_string(),
        status: Availability::Available,
        cover_url: format!("https://covers.openlibrary.org/b/id/{}-L.jpg", cover_id),
        rating,
    }
}

fn starter_collection() -> Vec<Book> {
    vec![
        seed(
            "1",
            "The Great Gatsby",
            "F. Scott Fitzgerald",
            "Classic",
            "A portrait of the Jazz Age and the elusive American dream, told through the mysterious millionaire Jay Gatsby.",
            7222246,
            4.4,
        ),
        seed(
            "2",
            "Dune",
            "Frank Herbert",
            "Science Fiction",
            "On the desert planet Arrakis, a young heir is drawn into a struggle over the most valuable substance in the universe.",
            11481354,
            4.7,
        ),
        seed(
            "3",
            "To Kill a Mockingbird",
            "Harper Lee",
            "Classic",
            "A child's view of racial injustice and moral courage in a small Southern town.",
            12606502,
            4.8,
        ),
        seed(
            "4",
            "Neuromancer",
            "William Gibson",
            "Science Fiction",
            "A washed-up hacker is hired for one last job in a sprawling, neon-lit cyberspace.",
            8754384,
            4.1,
        ),
        seed(
            "5",
            "Sapiens",
            "Yuval Noah Harari",
            "History",
            "A brief history of humankind, from foraging bands to global empires.",
            8345356,
            4.5,
        ),
        seed(
            "6",
            "The Hobbit",
            "J.R.R. Tolkien",
            "Fantasy",
            "Bilbo Baggins is swept into a quest to reclaim a dwarven kingdom from a dragon.",
            6979861,
            4.8,
        ),
        seed(
            "7",
            "Clean Code",
            "Robert C. Martin",
            "Technology",
            "Principles and practices for writing readable, maintainable software.",
            8231994,
            4.3,
        ),
        seed(
            "8",
            "Pride and Prejudice",
            "Jane Austen",
            "Romance",
            "Elizabeth Bennet and Mr. Darcy misjudge each other in a comedy of manners.",
            12645114,
            4.6,
        ),
    ]
}
