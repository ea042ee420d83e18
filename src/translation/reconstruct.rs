/*!
 * Positional mapping of translated values back onto the original keys.
 *
 * Keys embedded in the reply are not trusted: the n-th returned value belongs to
 * the n-th original key. When the backend returns fewer values than were sent,
 * the trailing keys are simply absent from the result; extra values are ignored.
 */

use crate::formats::ResourceEntries;
use crate::translation::dispatch::TranslatedBatch;

/// A returned key that differs from the key at the same position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDivergence {
    pub position: usize,
    pub expected: String,
    pub returned: String,
}

/// Zip translated values against `keys` by position, trimming each value
pub fn reconstruct(keys: &[String], batches: &[TranslatedBatch]) -> ResourceEntries {
    keys.iter()
        .zip(batches.iter().flat_map(|b| b.pairs()))
        .map(|(key, pair)| (key.clone(), pair.text.trim().to_string()))
        .collect()
}

/// Positions where the backend's key does not match the original key
pub fn key_divergences(keys: &[String], batches: &[TranslatedBatch]) -> Vec<KeyDivergence> {
    keys.iter()
        .zip(batches.iter().flat_map(|b| b.pairs()))
        .enumerate()
        .filter(|(_, (expected, pair))| **expected != pair.key)
        .map(|(position, (expected, pair))| KeyDivergence {
            position,
            expected: expected.clone(),
            returned: pair.key.clone(),
        })
        .collect()
}
