//! In-memory search over a fixed field allowlist

use std::cell::RefCell;

use crate::models::display_value;
use crate::table::TableRow;

/// Case-insensitive substring match over `fields`. An empty needle matches everything.
pub fn matches_search<T: TableRow>(row: &T, fields: &[String], needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    fields.iter().any(|field| {
        row.field(field)
            .and_then(display_value)
            .map(|text| text.to_lowercase().contains(&needle))
            .unwrap_or(false)
    })
}

#[derive(Debug, Clone)]
struct Memo {
    search: String,
    revision: u64,
    indices: Vec<usize>,
}

/// Filtered view memoised on `(search, items revision)`
#[derive(Debug, Default)]
pub struct FilterMemo {
    memo: RefCell<Option<Memo>>,
    computations: RefCell<u64>,
}

impl FilterMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indices of matching rows, recomputed only when the key changes
    pub fn indices<T: TableRow>(
        &self,
        items: &[T],
        revision: u64,
        fields: &[String],
        search: &str,
    ) -> Vec<usize> {
        if let Some(memo) = self.memo.borrow().as_ref() {
            if memo.revision == revision && memo.search == search {
                return memo.indices.clone();
            }
        }

        let indices: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, row)| matches_search(*row, fields, search))
            .map(|(i, _)| i)
            .collect();

        *self.computations.borrow_mut() += 1;
        *self.memo.borrow_mut() = Some(Memo {
            search: search.to_string(),
            revision,
            indices: indices.clone(),
        });
        indices
    }

    /// How many times the filter actually ran
    #[cfg(test)]
    pub fn computations(&self) -> u64 {
        *self.computations.borrow()
    }
}
