use crate::document::Document;

/// A forward-only cursor over a query result snapshot.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    docs: Vec<Document>,
    pos: usize,
}

impl Cursor {
    #[must_use]
    pub const fn new(docs: Vec<Document>) -> Self {
        Self { docs, pos: 0 }
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn advance(&mut self) -> Option<Document> {
        if self.pos >= self.docs.len() {
            return None;
        }
        let d = std::mem::take(&mut self.docs[self.pos]);
        self.pos += 1;
        Some(d)
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.docs.len().saturating_sub(self.pos)
    }

    #[must_use]
    pub fn to_vec(mut self) -> Vec<Document> {
        self.docs.split_off(self.pos.min(self.docs.len()))
    }
}

impl Iterator for Cursor {
    type Item = Document;
    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}
