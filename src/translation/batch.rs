/*!
 * Size-bounded batching of resource entries.
 *
 * Entries are packed greedily and sequentially: each entry is appended to the
 * current batch until the next one would overflow the character budget, at
 * which point the batch is sealed and a new one started. No reordering and no
 * look-ahead, so concatenating the batches always yields the input order.
 */

use serde_json::{Map, Value};

use crate::formats::{Entry, ResourceEntries};

/// Token budget used when the configured one is zero or negative
pub const DEFAULT_MAX_TOKENS: i64 = 1365;

/// Rough conversion between model tokens and characters
pub const CHARS_PER_TOKEN: usize = 4;

/// Per-entry separator counted in the footprint
const ENTRY_SEPARATOR_LEN: usize = 1;

/// An ordered group of entries sent to the backend as one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    entries: Vec<Entry>,
    footprint: usize,
}

impl Batch {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            footprint: 0,
        }
    }

    fn push(&mut self, entry: Entry, footprint: usize) {
        self.entries.push(entry);
        self.footprint += footprint;
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Estimated serialized size in characters
    pub fn footprint(&self) -> usize {
        self.footprint
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    /// Serialize as a JSON array of single-pair objects: `[{"k":"v"},...]`
    pub fn to_payload(&self) -> String {
        Value::Array(self.entries.iter().map(single_pair_object).collect()).to_string()
    }
}

/// Greedy sequential batcher with a character budget
#[derive(Debug, Clone, Copy)]
pub struct Batcher {
    max_chars: usize,
}

impl Default for Batcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOKENS)
    }
}

impl Batcher {
    /// Create a batcher from a token budget.
    ///
    /// A zero or negative budget falls back to [`DEFAULT_MAX_TOKENS`].
    pub fn new(max_tokens: i64) -> Self {
        let tokens = if max_tokens > 0 {
            max_tokens
        } else {
            DEFAULT_MAX_TOKENS
        };
        let max_chars = usize::try_from(tokens)
            .unwrap_or(usize::MAX / CHARS_PER_TOKEN)
            .saturating_mul(CHARS_PER_TOKEN);
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Split entries into batches whose footprint stays within the budget.
    ///
    /// An entry that alone exceeds the budget becomes a batch of its own.
    /// The result never contains an empty batch.
    pub fn batch(&self, entries: &ResourceEntries) -> Vec<Batch> {
        let mut batches = Vec::new();
        let mut current = Batch::new();

        for entry in entries {
            let footprint = entry_footprint(entry);
            if !current.is_empty() && current.footprint + footprint > self.max_chars {
                batches.push(std::mem::replace(&mut current, Batch::new()));
            }
            current.push(entry.clone(), footprint);
        }

        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }
}

/// Size of an entry serialized alone as `{"key":"text"}`, plus its separator
pub fn entry_footprint(entry: &Entry) -> usize {
    single_pair_object(entry).to_string().chars().count() + ENTRY_SEPARATOR_LEN
}

fn single_pair_object(entry: &Entry) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(entry.key.clone(), Value::String(entry.text.clone()));
    Value::Object(map)
}
