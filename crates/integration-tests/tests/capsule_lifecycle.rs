//! End-to-end tests for sealing a capsule and opening it later.
//!
//! The stub backend and the client share one manual clock, so "later" is a
//! clock advance rather than a wait.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use chrono::TimeDelta;

use time_capsule_client::ClientError;
use time_capsule_core::{ANONYMOUS_AUTHOR, CapsuleBody, CapsuleDraft, DraftError};
use time_capsule_integration_tests::{StubBackend, epoch};

const WAIT: Duration = Duration::from_secs(5);

fn draft(open_in: TimeDelta) -> CapsuleDraft {
    CapsuleDraft {
        title: "Letter to 2031".to_string(),
        content: "Did the garden survive?".to_string(),
        open_time: epoch() + open_in,
        author: Some("Mira".to_string()),
    }
}

// =============================================================================
// Create + lookup
// =============================================================================

#[tokio::test]
async fn test_sealed_capsule_shows_countdown_then_content() {
    let stub = StubBackend::spawn().await;
    let state = stub.app_state();
    let clock = stub.clock();

    let created = state
        .gateway()
        .create_capsule(draft(TimeDelta::hours(1)))
        .await
        .unwrap();
    clock.advance(Duration::from_secs(61));

    let mut screen = state
        .viewer()
        .open(created.capsule_code.as_str())
        .await
        .unwrap();

    let countdown = *screen.display().countdown().unwrap();
    assert_eq!(countdown.days, 0);
    assert_eq!(countdown.hours, 0);
    assert_eq!(countdown.minutes, 58);
    assert_eq!(countdown.seconds, 59);
    assert!(screen.display().content().is_none());
    assert!(screen.capsule().content.is_none());
    assert_eq!(screen.display().author, "Mira");

    clock.advance(Duration::from_secs(3600));
    let opened = tokio::time::timeout(WAIT, screen.wait_open())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(opened.content(), Some("Did the garden survive?"));
    assert!(!screen.is_counting_down());
    // One lookup plus exactly one follow-up fetch after unsealing.
    assert_eq!(stub.capsule_fetches(), 2);
}

#[tokio::test]
async fn test_open_capsule_shows_content_immediately() {
    let stub = StubBackend::spawn().await;
    let state = stub.app_state();
    let code = stub.seed("Old news", "It already happened", epoch() - TimeDelta::days(1));

    let mut screen = state.viewer().open(&code).await.unwrap();

    assert_eq!(screen.display().content(), Some("It already happened"));
    assert_eq!(screen.display().author, ANONYMOUS_AUTHOR);
    assert!(!screen.is_counting_down());
    assert!(screen.next().await.unwrap().is_none());
    assert_eq!(stub.capsule_fetches(), 1);
}

#[tokio::test]
async fn test_countdown_ticks_while_sealed() {
    let stub = StubBackend::spawn().await;
    let state = stub.app_state();
    let clock = stub.clock();
    let code = stub.seed("Soon", "Now", epoch() + TimeDelta::days(2));

    let mut screen = state.viewer().open(&code).await.unwrap();
    assert_eq!(screen.display().countdown().unwrap().days, 2);

    clock.advance(Duration::from_secs(86_400 + 3_600));
    let display = tokio::time::timeout(WAIT, screen.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    match &display.body {
        CapsuleBody::Countdown(countdown) => {
            assert_eq!(countdown.days, 0);
            assert_eq!(countdown.hours, 23);
        }
        other => panic!("expected countdown, got {other:?}"),
    }
    assert_eq!(stub.capsule_fetches(), 1);
}

#[tokio::test]
async fn test_dropping_screen_stops_polling() {
    let stub = StubBackend::spawn().await;
    let state = stub.app_state();
    let code = stub.seed("Soon", "Now", epoch() + TimeDelta::seconds(30));

    let screen = state.viewer().open(&code).await.unwrap();
    drop(screen);

    stub.clock().advance(Duration::from_secs(60));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(stub.capsule_fetches(), 1);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_malformed_code_is_rejected_locally() {
    let stub = StubBackend::spawn().await;
    let state = stub.app_state();

    for code in ["ab12cd34", "AB12CD3", "", "AB12-D34"] {
        let err = state.viewer().open(code).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidFormat(_)), "{code:?}");
    }
    assert_eq!(stub.capsule_fetches(), 0);
}

#[tokio::test]
async fn test_unknown_code_is_not_found() {
    let stub = StubBackend::spawn().await;
    let state = stub.app_state();

    let err = state.viewer().open("ZZZZ9999").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!state.session().is_authenticated());
}

#[tokio::test]
async fn test_invalid_draft_is_rejected_locally() {
    let stub = StubBackend::spawn().await;
    let state = stub.app_state();

    let mut bad = draft(TimeDelta::hours(-1));
    bad.title = "  ".to_string();

    let err = state.gateway().create_capsule(bad).await.unwrap_err();
    let errors = match err {
        ClientError::InvalidDraft(errors) => errors,
        other => panic!("expected draft errors, got {other:?}"),
    };
    assert!(errors.contains(&DraftError::TitleMissing));
    assert!(errors.contains(&DraftError::OpenTimeNotInFuture));
    assert!(!stub.contains("CAPS0001"));
}

#[tokio::test]
async fn test_blank_author_is_sent_as_anonymous() {
    let stub = StubBackend::spawn().await;
    let state = stub.app_state();

    let mut anonymous = draft(TimeDelta::minutes(5));
    anonymous.author = Some("   ".to_string());
    let created = state.gateway().create_capsule(anonymous).await.unwrap();

    let capsule = state
        .gateway()
        .get_capsule(&created.capsule_code)
        .await
        .unwrap();
    assert_eq!(capsule.author, None);
    assert_eq!(capsule.display_author(), ANONYMOUS_AUTHOR);
}
