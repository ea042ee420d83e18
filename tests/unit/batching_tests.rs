/*!
 * Tests for size-bounded batching
 */

use resxai::formats::ResourceEntries;
use resxai::translation::batch::{Batcher, CHARS_PER_TOKEN, DEFAULT_MAX_TOKENS, entry_footprint};

/// Entries of varied lengths, including one far over any small budget
fn varied_entries() -> ResourceEntries {
    (0..40)
        .map(|i| {
            let text = match i {
                7 => "x".repeat(500),
                _ => "word ".repeat(i % 9 + 1),
            };
            (format!("Key{:02}", i), text)
        })
        .collect()
}

/// Test that batches concatenate back to the input keys in order for many budgets
#[test]
fn test_batch_withVariousBudgets_shouldPreserveKeysAndOrder() {
    let entries = varied_entries();
    let expected = entries.keys();

    for budget in [1, 5, 10, 25, 60, 200, 10_000] {
        let batches = Batcher::new(budget).batch(&entries);
        let keys: Vec<String> = batches
            .iter()
            .flat_map(|b| b.keys().map(str::to_string).collect::<Vec<_>>())
            .collect();
        assert_eq!(keys, expected, "budget {}", budget);
        assert!(batches.iter().all(|b| !b.is_empty()), "budget {}", budget);
    }
}

/// Test that only singleton batches may exceed the budget
#[test]
fn test_batch_withVariousBudgets_shouldRespectBudgetExceptSingletons() {
    let entries = varied_entries();

    for budget in [1, 5, 10, 25, 60, 200] {
        let batcher = Batcher::new(budget);
        for batch in batcher.batch(&entries) {
            assert!(
                batch.footprint() <= batcher.max_chars() || batch.len() == 1,
                "budget {} produced an oversized batch of {}",
                budget,
                batch.len()
            );
        }
    }
}

/// Test that the footprint of a batch is the sum of its entries' footprints
#[test]
fn test_batch_footprint_shouldSumEntryFootprints() {
    let entries = varied_entries();
    for batch in Batcher::new(30).batch(&entries) {
        let sum: usize = batch.entries().iter().map(entry_footprint).sum();
        assert_eq!(batch.footprint(), sum);
    }
}

/// Test that batching is greedy: the next batch's first entry would not have fit
#[test]
fn test_batch_shouldBeGreedy() {
    let entries = varied_entries();
    let batcher = Batcher::new(40);
    let batches = batcher.batch(&entries);

    for pair in batches.windows(2) {
        let next_first = entry_footprint(&pair[1].entries()[0]);
        assert!(pair[0].footprint() + next_first > batcher.max_chars());
    }
}

/// Test that non-positive budgets use the default and still cover every entry
#[test]
fn test_batch_withNonPositiveBudget_shouldUseDefaultAndTerminate() {
    let entries = varied_entries();
    let default_batches = Batcher::new(DEFAULT_MAX_TOKENS).batch(&entries);

    for budget in [0, -1, i64::MIN] {
        let batcher = Batcher::new(budget);
        assert_eq!(batcher.max_chars(), DEFAULT_MAX_TOKENS as usize * CHARS_PER_TOKEN);
        assert_eq!(batcher.batch(&entries), default_batches);
    }
}

/// Test that an entry larger than the budget travels alone
#[test]
fn test_batch_withOversizedEntry_shouldIsolateIt() {
    let long = "Lorem ipsum ".repeat(100);
    let entries: ResourceEntries = [
        ("Before", "short"),
        ("Huge", long.as_str()),
        ("After", "short"),
    ]
    .into_iter()
    .collect();

    let batches = Batcher::new(20).batch(&entries);
    let huge = batches
        .iter()
        .find(|b| b.keys().any(|k| k == "Huge"))
        .unwrap();

    assert_eq!(huge.len(), 1);
    assert!(huge.footprint() > 80);
}
