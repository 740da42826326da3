//! Cursor pagination utilities for service layer
//!
//! Lists are ordered by descending identifier. A cursor names the boundary id
//! and the direction to read from it; it travels as URL-safe base64 JSON so
//! clients treat it as opaque.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use models::model_listing::ScanFrom;
use serde::{Deserialize, Serialize};

/// Fixed page size of the model listing.
pub const PER_PAGE: u64 = 20;

/// Decoded cursor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub id: i64,
    /// `true` reads older items (smaller ids), `false` reads back towards newer ones.
    #[serde(rename = "_pointsToNextItems")]
    pub points_to_next_items: bool,
}

impl Cursor {
    pub fn next_after(id: i64) -> Self { Self { id, points_to_next_items: true } }

    pub fn prev_before(id: i64) -> Self { Self { id, points_to_next_items: false } }

    pub fn encode(&self) -> String {
        // serializing two plain fields cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// `None` for anything that is not a cursor we issued.
    pub fn decode(raw: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(raw.trim().trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Where the row scan starts for this cursor.
    pub fn scan_from(cursor: Option<Cursor>) -> ScanFrom {
        match cursor {
            None => ScanFrom::Start,
            Some(c) if c.points_to_next_items => ScanFrom::Below(c.id),
            Some(c) => ScanFrom::Above(c.id),
        }
    }
}

/// One page of a cursor-paginated list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CursorPage<T> {
    pub data: Vec<T>,
    pub path: String,
    pub per_page: u64,
    pub next_cursor: Option<String>,
    pub next_page_url: Option<String>,
    pub prev_cursor: Option<String>,
    pub prev_page_url: Option<String>,
}

impl<T> CursorPage<T> {
    /// Build a page from rows fetched with limit `per_page + 1`, in scan order.
    pub fn from_scan<F>(mut rows: Vec<T>, cursor: Option<Cursor>, per_page: u64, path: &str, id_of: F) -> Self
    where
        F: Fn(&T) -> i64,
    {
        let has_more = rows.len() as u64 > per_page;
        rows.truncate(per_page as usize);
        let backwards = matches!(cursor, Some(c) if !c.points_to_next_items);
        if backwards {
            // scanned ascending; present newest first
            rows.reverse();
        }

        let first = rows.first().map(&id_of);
        let last = rows.last().map(&id_of);
        let (next, prev) = match (first, last) {
            (Some(first), Some(last)) => {
                let next = if backwards || has_more { Some(Cursor::next_after(last)) } else { None };
                let prev = if backwards { has_more } else { cursor.is_some() };
                (next, prev.then(|| Cursor::prev_before(first)))
            }
            _ => (None, None),
        };

        let next_cursor = next.map(|c| c.encode());
        let prev_cursor = prev.map(|c| c.encode());
        Self {
            next_page_url: next_cursor.as_ref().map(|c| page_url(path, c)),
            prev_page_url: prev_cursor.as_ref().map(|c| page_url(path, c)),
            next_cursor,
            prev_cursor,
            data: rows,
            path: path.to_string(),
            per_page,
        }
    }

    /// Convert the items while keeping the cursor links.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> CursorPage<U> {
        CursorPage {
            data: self.data.into_iter().map(f).collect(),
            path: self.path,
            per_page: self.per_page,
            next_cursor: self.next_cursor,
            next_page_url: self.next_page_url,
            prev_cursor: self.prev_cursor,
            prev_page_url: self.prev_page_url,
        }
    }
}

fn page_url(path: &str, cursor: &str) -> String { format!("{path}?cursor={cursor}") }
