use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PagedResponse<T> {
    items: Vec<T>,
    has_next: bool,
}

impl<T> PagedResponse<T> {
    /// Expects one row more than `page_size` to have been fetched.
    pub fn from_overfetch(mut items: Vec<T>, page_size: u16) -> Self {
        let has_next = items.len() > page_size as usize;
        items.truncate(page_size as usize);
        Self { items, has_next }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<PagedResponse<U>, E> {
        Ok(PagedResponse {
            items: self.items.into_iter().map(f).collect::<Result<Vec<_>, _>>()?,
            has_next: self.has_next,
        })
    }
}
