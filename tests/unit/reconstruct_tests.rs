/*!
 * Tests for positional reconstruction
 */

use resxai::translation::{TranslatedBatch, TranslatedPair, key_divergences, reconstruct};

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn reply(content: &str) -> TranslatedBatch {
    TranslatedBatch::decode(content).unwrap()
}

/// Test that keys [a,b,c] with values [X,Y] map to {a:X, b:Y}
#[test]
fn test_reconstruct_withUndersupply_shouldMapByPosition() {
    let mapping = reconstruct(&keys(&["a", "b", "c"]), &[reply(r#"[{"a":"X"},{"b":"Y"}]"#)]);

    assert_eq!(mapping.keys(), vec!["a", "b"]);
    assert_eq!(mapping.get("a"), Some("X"));
    assert_eq!(mapping.get("b"), Some("Y"));
    assert_eq!(mapping.get("c"), None);
}

/// Test that values flow across batch boundaries in order
#[test]
fn test_reconstruct_withSeveralBatches_shouldFlattenInOrder() {
    let batches = [
        reply(r#"[{"a":"1"},{"b":"2"}]"#),
        reply(r#"[{"c":"3"}]"#),
        reply(r#"{"d":"4"}"#),
    ];
    let mapping = reconstruct(&keys(&["a", "b", "c", "d"]), &batches);

    let values: Vec<&str> = mapping.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(values, vec!["1", "2", "3", "4"]);
}

/// Test that the backend's keys do not change the matching
#[test]
fn test_reconstruct_withRenamedKeys_shouldStillUseOriginalKeys() {
    let keys = keys(&["Title", "Body"]);
    let batches = [reply(r#"[{"title":" Titre "},{"Corps":"Texte\n"}]"#)];

    let mapping = reconstruct(&keys, &batches);
    assert_eq!(mapping.get("Title"), Some("Titre"));
    assert_eq!(mapping.get("Body"), Some("Texte"));

    let divergences = key_divergences(&keys, &batches);
    let positions: Vec<usize> = divergences.iter().map(|d| d.position).collect();
    assert_eq!(positions, vec![0, 1]);
    assert_eq!(divergences[1].returned, "Corps");
}

/// Test that an oversupplied reply is cut at the number of keys
#[test]
fn test_reconstruct_withOversupply_shouldIgnoreExtraValues() {
    let batch = TranslatedBatch::new(vec![
        TranslatedPair { key: "a".to_string(), text: "A".to_string() },
        TranslatedPair { key: "extra".to_string(), text: "E".to_string() },
    ]);
    let mapping = reconstruct(&keys(&["a"]), &[batch]);

    assert_eq!(mapping.len(), 1);
    assert!(key_divergences(&keys(&["a"]), &[]).is_empty());
}
