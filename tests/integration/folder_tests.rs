/*!
 * Tests for directory mode: discovery, mirrored output and per-file fallback
 */

use anyhow::Result;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::common;
use resxai::Controller;
use resxai::errors::{AppError, TranslationError};
use resxai::ledger::FailureRecord;
use resxai::providers::mock::MockProvider;

/// Test that a nested tree is mirrored into `<dir>_<lang>` and a broken file falls back alone
#[tokio::test]
async fn test_run_withNestedDirectory_shouldMirrorTreeAndIsolateFailures() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("res");
    common::create_test_resx(&input, "Strings.resx")?;
    common::create_test_json(&input, "i18n/app.en.json")?;
    common::create_test_file(&input, "i18n/broken.json", "[1, 2, 3]")?;
    common::create_test_file(&input, "notes.txt", "not a resource")?;
    let controller = common::test_controller(temp_dir.path(), MockProvider::working());

    let summary = controller.run(&input, "fr").await?;

    let output_root = temp_dir.path().join("res_fr");
    assert_eq!(summary.output, output_root);
    assert_eq!(summary.translated, 2);

    let broken_output = output_root.join("i18n/broken.fr.json");
    assert_eq!(summary.failed, vec![broken_output.clone()]);
    assert_eq!(fs::read_to_string(&broken_output)?, "[1, 2, 3]");
    assert_eq!(controller.ledger().list_all()?, vec![FailureRecord::new(&broken_output, "fr")]);

    assert!(fs::read_to_string(output_root.join("Strings.fr.resx"))?.contains("<value>SAVE</value>"));
    assert_eq!(
        fs::read_to_string(output_root.join("i18n/app.fr.json"))?,
        "{\n  \"greeting\": \"HELLO\",\n  \"farewell\": \"BYE\"\n}"
    );
    assert!(!output_root.join("notes.txt").exists());
    Ok(())
}

/// Test that a directory with no resource files is a successful no-op
#[tokio::test]
async fn test_run_withEmptyDirectory_shouldTranslateNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("empty");
    fs::create_dir_all(&input)?;
    let provider = MockProvider::working();
    let controller = common::test_controller(temp_dir.path(), provider.clone());

    let summary = controller.run(&input, "de").await?;

    assert_eq!(summary.translated, 0);
    assert!(summary.failed.is_empty());
    assert_eq!(provider.request_count(), 0);
    Ok(())
}

/// Test that several files in flight at once all land in the mirrored tree
#[tokio::test]
async fn test_run_withConcurrentFiles_shouldTranslateEveryFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("res");
    for i in 0..6 {
        common::create_test_json(&input, &format!("part{}/page{}.json", i % 2, i))?;
    }
    let mut config = common::test_config(temp_dir.path());
    config.concurrent_files = 3;
    let provider = MockProvider::working();
    let controller = Controller::with_provider(config, provider.clone());

    let summary = controller.run(&input, "es").await?;

    assert_eq!(summary.translated, 6);
    assert_eq!(provider.request_count(), 6);
    for i in 0..6 {
        let output = temp_dir.path().join(format!("res_es/part{}/page{}.es.json", i % 2, i));
        assert!(output.exists(), "missing {:?}", output);
    }
    assert!(controller.ledger().list_all()?.is_empty());
    Ok(())
}

/// Test that every file falls back when the backend is down, without stopping the run
#[tokio::test]
async fn test_run_withFailingBackend_shouldRecordEveryFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("res");
    common::create_test_json(&input, "a.json")?;
    common::create_test_resx(&input, "b.resx")?;
    let controller = common::test_controller(temp_dir.path(), MockProvider::failing());

    let summary = controller.run(&input, "it").await?;

    assert_eq!(summary.translated, 0);
    assert_eq!(summary.failed.len(), 2);
    let recorded = controller.ledger().list_all()?;
    assert_eq!(recorded.len(), 2);
    assert!(recorded.iter().all(|r| r.language == "it"));
    Ok(())
}

/// Test that concurrent failures each append one whole ledger line
#[tokio::test]
async fn test_run_withConcurrentFailures_shouldWriteOneLinePerFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("res");
    let count = 12;
    for i in 0..count {
        common::create_test_json(&input, &format!("group{}/strings_{}.json", i % 3, "x".repeat(i + 1)))?;
    }
    let mut config = common::test_config(temp_dir.path());
    config.concurrent_files = 4;
    let controller = Controller::with_provider(config, MockProvider::failing());

    let summary = controller.run(&input, "nl").await?;

    assert_eq!(summary.failed.len(), count);
    let content = fs::read_to_string(controller.ledger().path())?;
    assert_eq!(content.lines().count(), count);
    assert!(content.lines().all(|l| FailureRecord::parse_line(l).is_some()));

    let recorded: HashSet<PathBuf> = controller
        .ledger()
        .list_all()?
        .into_iter()
        .map(|r| r.path)
        .collect();
    let expected: HashSet<PathBuf> = summary.failed.iter().cloned().collect();
    assert_eq!(recorded.len(), count);
    assert_eq!(recorded, expected);
    Ok(())
}

/// Test that a cancelled directory run still leaves every mirrored output and records each file
#[tokio::test]
async fn test_run_whenCancelled_shouldFallBackForEveryFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("res");
    for name in ["a.json", "b.json", "c.json"] {
        common::create_test_json(&input, name)?;
    }
    let token = CancellationToken::new();
    let controller = common::test_controller(temp_dir.path(), MockProvider::slow(10_000))
        .with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });
    let err = controller.run(&input, "fr").await.unwrap_err();
    canceller.await?;

    assert!(matches!(err, AppError::Translation(TranslationError::Cancelled)));
    for name in ["a", "b", "c"] {
        let output = temp_dir.path().join(format!("res_fr/{}.fr.json", name));
        let source = input.join(format!("{}.json", name));
        assert_eq!(fs::read(&output)?, fs::read(&source)?, "missing or changed {:?}", output);
    }
    assert_eq!(controller.ledger().list_all()?.len(), 3);
    Ok(())
}
