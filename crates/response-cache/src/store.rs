//! Keyed store of cached entries
//!
//! A store is filled once during startup through `&mut` access, then shared
//! read-only (typically behind an `Arc`) with every request handler. The only
//! state that changes after that point is each entry's lazily computed ETag,
//! which synchronizes itself.

use crate::entry::{Entry, NewEntry};
use crate::types::CacheSize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Store {
    entries: HashMap<String, Entry>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, compressing its body if no gzip body was supplied
    ///
    /// An existing entry under the same uri is replaced wholesale.
    pub fn insert(&mut self, entry: NewEntry) {
        let entry = Entry::from(entry);
        if let Some(previous) = self.entries.insert(entry.uri().to_string(), entry) {
            debug!(uri = %previous.uri(), "Replaced existing cache entry");
        }
    }

    pub fn lookup(&self, uri: &str) -> Option<&Entry> {
        self.entries.get(uri)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries and the bytes held by both encodings of all of them
    pub fn size(&self) -> (usize, usize) {
        self.entries
            .values()
            .fold((0, 0), |(count, memory), entry| {
                (count + 1, memory + entry.memory())
            })
    }

    pub fn stats(&self) -> CacheSize {
        let (entries, memory) = self.size();
        CacheSize { entries, memory }
    }

    /// All entries, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> + '_ {
        self.entries
            .iter()
            .map(|(uri, entry)| (uri.as_str(), entry))
    }

    /// Entries matching `predicate`, in no particular order
    ///
    /// The iterator borrows the store; call again for a fresh pass.
    pub fn enumerate<'a, P>(
        &'a self,
        predicate: P,
    ) -> impl Iterator<Item = (&'a str, &'a Entry)> + 'a
    where
        P: Fn(&Entry) -> bool + 'a,
    {
        self.iter().filter(move |&(_, entry)| predicate(entry))
    }
}
