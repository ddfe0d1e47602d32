mod common;

use common::{origin, rules, FakeLauncher, ScriptedBrowser};
use haraj_core::{Credentials, PHONE_UNDEFINED};
use haraj_rules::RevealRules;
use haraj_scraper::{AuthenticatedRevealer, PhoneRevealer, RevealOutcome, RevealSettings, RevealStep};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const LISTING: &str = "https://haraj.com.sa/11/toyota-camry";

fn reveal_rules() -> RevealRules {
    rules().reveal
}

fn settings(reuse_session: bool) -> RevealSettings {
    RevealSettings {
        wait_timeout: Duration::from_millis(50),
        poll_interval: Duration::from_millis(1),
        reuse_session,
    }
}

fn revealer(
    browser: &Arc<ScriptedBrowser>,
    reuse_session: bool,
) -> (AuthenticatedRevealer, Arc<FakeLauncher>) {
    let launcher = Arc::new(FakeLauncher::new(browser.clone()));
    let revealer = AuthenticatedRevealer::new(
        launcher.clone(),
        reveal_rules(),
        Credentials::new("0500000000", "s3cret"),
        origin(),
        settings(reuse_session),
    );
    (revealer, launcher)
}

#[tokio::test]
async fn test_full_sequence_reveals_phone() {
    let rules = reveal_rules();
    let browser = Arc::new(
        ScriptedBrowser::new().with_texts(&rules.revealed_phone, &["تواصل", "0551234567"]),
    );
    let (revealer, launcher) = revealer(&browser, true);

    let outcome = revealer.attempt(LISTING).await;
    assert_eq!(outcome, RevealOutcome::Success("0551234567".to_string()));
    assert_eq!(launcher.launches(), 1);

    let log = browser.log();
    assert_eq!(log[0], "navigate https://haraj.com.sa");
    assert!(log.contains(&format!("fill {} 0500000000", rules.username)));
    assert!(log.contains(&format!("fill {} s3cret", rules.password)));
    assert!(log.contains(&format!("wait {} invisible", rules.modal_container)));
    assert!(log.contains(&format!("navigate {LISTING}")));
    assert!(log.contains(&format!("click {}", rules.contact_button)));

    // kept for the next reveal until the run finishes
    assert_eq!(browser.closes(), 0);
    revealer.finish().await;
    assert_eq!(browser.closes(), 1);
}

/// Log sink shared between the subscriber and the assertions.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_revealed_number_stays_out_of_logs() {
    let logs = CapturedLogs::default();
    let sink = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || sink.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let rules = reveal_rules();
    let browser =
        Arc::new(ScriptedBrowser::new().with_texts(&rules.revealed_phone, &["0551234567"]));
    let (revealer, _) = revealer(&browser, false);

    assert_eq!(revealer.reveal(LISTING).await, "0551234567");

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("revealed phone"));
    assert!(output.contains(LISTING));
    assert!(!output.contains("0551234567"));
}

#[tokio::test]
async fn test_failed_step_yields_sentinel_and_releases_browser() {
    let rules = reveal_rules();
    let browser = Arc::new(ScriptedBrowser::new().without(&rules.login_modal));
    let (revealer, launcher) = revealer(&browser, true);

    match revealer.attempt(LISTING).await {
        RevealOutcome::Failed { step, .. } => assert_eq!(step, RevealStep::AwaitLoginModal),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(browser.closes(), 1);
    assert_eq!(browser.count("fill"), 0);

    assert_eq!(revealer.reveal(LISTING).await, PHONE_UNDEFINED);
    assert_eq!(launcher.launches(), 2);
    assert_eq!(browser.closes(), 2);
}

#[tokio::test]
async fn test_placeholder_that_never_changes_fails_extraction() {
    let rules = reveal_rules();
    let browser = Arc::new(ScriptedBrowser::new().with_texts(&rules.revealed_phone, &["تواصل"]));
    let (revealer, _) = revealer(&browser, true);

    match revealer.attempt(LISTING).await {
        RevealOutcome::Failed { step, .. } => assert_eq!(step, RevealStep::ExtractPhone),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(browser.closes(), 1);
}

#[tokio::test]
async fn test_empty_text_falls_back_to_tel_link() {
    let rules = reveal_rules();
    let phone_link = rules.phone_link.clone().expect("phone link locator");
    let browser = Arc::new(
        ScriptedBrowser::new()
            .with_texts(&rules.revealed_phone, &[""])
            .with_attribute(&phone_link, "href", "tel:0553334444"),
    );
    let (revealer, _) = revealer(&browser, true);

    assert_eq!(revealer.reveal(LISTING).await, "0553334444");
}

#[tokio::test]
async fn test_value_without_digits_fails_validation() {
    let rules = reveal_rules();
    let browser = Arc::new(
        ScriptedBrowser::new().with_texts(&rules.revealed_phone, &["contact via chat"]),
    );
    let (revealer, _) = revealer(&browser, true);

    match revealer.attempt(LISTING).await {
        RevealOutcome::Failed { step, .. } => assert_eq!(step, RevealStep::Validate),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_session_reuse_logs_in_once() {
    let rules = reveal_rules();
    let browser = Arc::new(
        ScriptedBrowser::new().with_texts(&rules.revealed_phone, &["0551234567"]),
    );
    let (revealer, launcher) = revealer(&browser, true);

    assert_eq!(revealer.reveal(LISTING).await, "0551234567");
    assert_eq!(
        revealer.reveal("https://haraj.com.sa/12/sofa").await,
        "0551234567"
    );

    assert_eq!(launcher.launches(), 1);
    assert_eq!(browser.count(&format!("fill {}", rules.username)), 1);
    assert!(browser
        .log()
        .contains(&"navigate https://haraj.com.sa/12/sofa".to_string()));

    revealer.finish().await;
    assert_eq!(browser.closes(), 1);
}

#[tokio::test]
async fn test_without_reuse_every_reveal_logs_in() {
    let rules = reveal_rules();
    let browser = Arc::new(
        ScriptedBrowser::new().with_texts(&rules.revealed_phone, &["0551234567"]),
    );
    let (revealer, launcher) = revealer(&browser, false);

    revealer.reveal(LISTING).await;
    revealer.reveal(LISTING).await;

    assert_eq!(launcher.launches(), 2);
    assert_eq!(browser.count(&format!("fill {}", rules.username)), 2);
    assert_eq!(browser.closes(), 2);

    revealer.finish().await;
    assert_eq!(browser.closes(), 2);
}
