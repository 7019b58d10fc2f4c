use serde::Serialize;

use super::Book;

/// Books viewed during the current session, oldest first
#[derive(Debug, Clone, Default, Serialize)]
pub struct InteractionHistory {
    items: Vec<Book>,
}

impl InteractionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a viewed book. Viewing the most recent entry again is a no-op.
    ///
    /// Returns whether the history grew.
    pub fn push(&mut self, book: Book) -> bool {
        if self.items.last().is_some_and(|last| last.id == book.id) {
            return false;
        }
        self.items.push(book);
        true
    }

    pub fn items(&self) -> &[Book] {
        &self.items
    }

    pub fn titles(&self) -> Vec<&str> {
        self.items.iter().map(|b| b.title.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
