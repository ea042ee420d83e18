/*!
 * Tests for the fallback path, the failure ledger and the retry pass.
 */

use anyhow::Result;
use std::fs;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::common;
use resxai::app_controller::FileOutcome;
use resxai::errors::{AppError, TranslationError};
use resxai::ledger::FailureRecord;
use resxai::providers::mock::MockProvider;

/// Test that an always-failing backend leaves a byte-identical copy and one ledger record
#[tokio::test]
async fn test_run_withFailingBackend_shouldCopySourceAndRecordOnce() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_resx(temp_dir.path(), "Strings.resx")?;
    let provider = MockProvider::failing();
    let controller = common::test_controller(temp_dir.path(), provider.clone());

    let summary = controller.run(&source, "fr").await?;

    let output = temp_dir.path().join("Strings.fr.resx");
    assert_eq!(summary.translated, 0);
    assert_eq!(summary.failed, vec![output.clone()]);
    assert_eq!(fs::read(&output)?, fs::read(&source)?);
    assert_eq!(controller.ledger().list_all()?, vec![FailureRecord::new(&output, "fr")]);
    assert_eq!(provider.request_count(), 5);
    Ok(())
}

/// Test that a malformed reply takes the same fallback
#[tokio::test]
async fn test_translateAndSave_withMalformedReply_shouldFallBack() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_json(temp_dir.path(), "app.json")?;
    let output = temp_dir.path().join("app.fr.json");
    let controller = common::test_controller(temp_dir.path(), MockProvider::malformed());

    let outcome = controller.translate_and_save(&source, &output, "fr").await?;

    assert!(matches!(outcome, FileOutcome::FellBack(_)));
    assert_eq!(fs::read(&output)?, fs::read(&source)?);
    assert_eq!(controller.ledger().list_all()?.len(), 1);
    Ok(())
}

/// Test that an unparseable source file takes the same fallback
#[tokio::test]
async fn test_translateAndSave_withMalformedSource_shouldFallBack() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_file(temp_dir.path(), "broken.resx", "<root><data name=\"A\"><value>x</root>")?;
    let output = temp_dir.path().join("broken.fr.resx");
    let provider = MockProvider::working();
    let controller = common::test_controller(temp_dir.path(), provider.clone());

    let outcome = controller.translate_and_save(&source, &output, "fr").await?;

    assert!(matches!(outcome, FileOutcome::FellBack(_)));
    assert_eq!(fs::read(&output)?, fs::read(&source)?);
    assert_eq!(provider.request_count(), 0);
    Ok(())
}

/// Test that two retry passes with a working backend leave the ledger empty
#[tokio::test]
async fn test_retryFailed_runTwiceWithWorkingBackend_shouldEmptyLedger() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_json(temp_dir.path(), "app.json")?;

    let failing = common::test_controller(temp_dir.path(), MockProvider::failing());
    failing.run(&source, "fr").await?;
    assert_eq!(failing.ledger().list_all()?.len(), 1);

    let working = common::test_controller(temp_dir.path(), MockProvider::working());
    let first = working.retry_failed().await?;
    assert_eq!(first.succeeded.len(), 1);
    assert!(working.ledger().list_all()?.is_empty());

    let second = working.retry_failed().await?;
    assert_eq!(second.attempted(), 0);
    assert!(working.ledger().list_all()?.is_empty());

    // The fallback copy was translated in place
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("app.fr.json"))?,
        "{\n  \"greeting\": \"HELLO\",\n  \"farewell\": \"BYE\"\n}"
    );
    Ok(())
}

/// Test that records still failing stay and vanished files are dropped
#[tokio::test]
async fn test_retryFailed_withMixedRecords_shouldKeepOnlyStillFailing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let present = common::create_test_json(temp_dir.path(), "present.fr.json")?;
    let ledger_path = temp_dir.path().join("failed_translations.log");
    fs::write(
        &ledger_path,
        format!(
            "{}|fr\n{}|fr\n{}|fr\n",
            present.display(),
            temp_dir.path().join("gone.fr.json").display(),
            temp_dir.path().join("notes.txt").display()
        ),
    )?;

    let controller = common::test_controller(temp_dir.path(), MockProvider::failing());
    let summary = controller.retry_failed().await?;

    assert_eq!(summary.still_failing, vec![FailureRecord::new(&present, "fr")]);
    assert_eq!(summary.dropped.len(), 2);
    assert_eq!(controller.ledger().list_all()?, summary.still_failing);
    Ok(())
}

/// Test that a cancelled run still leaves the fallback copy and reports cancellation
#[tokio::test]
async fn test_run_whenCancelled_shouldFallBackAndStop() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_json(temp_dir.path(), "app.json")?;
    let token = CancellationToken::new();
    let controller = common::test_controller(temp_dir.path(), MockProvider::slow(10_000))
        .with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });
    let err = controller.run(&source, "fr").await.unwrap_err();
    canceller.await?;

    assert!(matches!(err, AppError::Translation(TranslationError::Cancelled)));
    assert!(err.is_fatal_for_run());
    let output = temp_dir.path().join("app.fr.json");
    assert_eq!(fs::read(&output)?, fs::read(&source)?);
    assert_eq!(controller.ledger().list_all()?.len(), 1);
    Ok(())
}

/// Test that an interrupted retry pass leaves the ledger as it was
#[tokio::test]
async fn test_retryFailed_whenCancelled_shouldLeaveLedgerUnchanged() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let target = common::create_test_json(temp_dir.path(), "app.fr.json")?;
    let ledger_path = temp_dir.path().join("failed_translations.log");
    let content = format!("{0}|fr\n{0}|de\n", target.display());
    fs::write(&ledger_path, &content)?;

    let token = CancellationToken::new();
    token.cancel();
    let controller = common::test_controller(temp_dir.path(), MockProvider::working())
        .with_cancellation(token);

    let err = controller.retry_failed().await.unwrap_err();

    assert!(matches!(err, AppError::Translation(TranslationError::Cancelled)));
    assert_eq!(fs::read_to_string(&ledger_path)?, content);
    Ok(())
}

/// Test that an unwritable ledger still leaves the untranslated copy in place
#[tokio::test]
async fn test_translateAndSave_withUnwritableLedger_shouldStillWriteOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = common::create_test_json(temp_dir.path(), "app.json")?;
    let output = temp_dir.path().join("app.fr.json");
    let ledger_dir = temp_dir.path().join("ledger_is_a_dir");
    fs::create_dir_all(&ledger_dir)?;

    let mut config = common::test_config(temp_dir.path());
    config.ledger_path = ledger_dir;
    let controller = resxai::Controller::with_provider(config, MockProvider::failing());

    let err = controller.translate_and_save(&source, &output, "fr").await.unwrap_err();

    assert!(matches!(err, AppError::Ledger(_)));
    assert!(err.is_fatal_for_run());
    assert_eq!(fs::read(&output)?, fs::read(&source)?);
    Ok(())
}
