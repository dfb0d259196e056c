mod common;

use std::time::Duration;

use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

use common::{driver, driver_with, MockElement, MockSession};
use stepdriver::config::Capability;
use stepdriver::driver::{ElementOutcome, WaitCondition};
use stepdriver::error::HarnessError;
use stepdriver::selectors::Selector;
use stepdriver::session::SessionError;

fn sel(raw: &str) -> Selector {
    Selector::parse(raw)
}

// ── Waiting ─────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_visible_at_first_poll_after_transition() {
    let session = MockSession::new();
    session.add("#banner", [MockElement::new("hi").visible_at(1200)]);
    let driver = driver(&session);

    let start = Instant::now();
    assert_ok!(
        driver
            .wait_until_visible(&sel("#banner"), Duration::from_millis(5000))
            .await
    );
    assert_eq!(start.elapsed(), Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn test_never_visible_times_out_at_budget() {
    let session = MockSession::new();
    session.add("#banner", [MockElement::new("hi").hidden()]);
    let driver = driver(&session);

    let start = Instant::now();
    let err = driver
        .wait_until_visible(&sel("#banner"), Duration::from_millis(5000))
        .await
        .unwrap_err();

    assert_eq!(start.elapsed(), Duration::from_millis(5000));
    match err {
        HarnessError::Timeout {
            selector,
            condition,
            timeout,
            ..
        } => {
            assert_eq!(selector, "#banner");
            assert_eq!(condition, WaitCondition::Visible);
            assert_eq!(timeout, Duration::from_millis(5000));
        }
        other => panic!("expected timeout, got {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_wait_until_gone_returns_within_one_interval() {
    let session = MockSession::new();
    session.add(".spinner", [MockElement::new("").removed_at(1300)]);
    let driver = driver(&session);

    let start = Instant::now();
    assert_ok!(driver.wait_until_gone(&sel(".spinner")).await);
    assert_eq!(start.elapsed(), Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn test_wait_until_gone_times_out_at_ceiling() {
    let session = MockSession::new();
    session.add(".spinner", [MockElement::new("")]);
    let driver = driver(&session);

    let start = Instant::now();
    let err = driver.wait_until_gone(&sel(".spinner")).await.unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Timeout {
            condition: WaitCondition::Gone,
            ..
        }
    ));
    assert_eq!(start.elapsed(), Duration::from_secs(120));
}

#[tokio::test(start_paused = true)]
async fn test_element_exists_is_a_single_check() {
    let session = MockSession::new();
    session.add("#late", [MockElement::new("x").appearing_at(100)]);
    let driver = driver(&session);

    assert!(!driver.element_exists(&sel("#late")).await.unwrap());
    assert_eq!(session.state().existence_checks, 1);
}

// ── Text ────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_get_text_returns_last_non_empty_match() {
    let session = MockSession::new();
    session.add(
        ".row",
        [
            MockElement::new(""),
            MockElement::new("first"),
            MockElement::new("  "),
            MockElement::new("second"),
            MockElement::new(""),
        ],
    );
    let driver = driver(&session);

    let text = driver
        .get_text(&sel(".row"), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(text, "second");
}

#[tokio::test(start_paused = true)]
async fn test_get_text_waits_for_async_text() {
    let session = MockSession::new();
    session.add("#greeting", [MockElement::new("")]);
    session.add("#greeting", [MockElement::new("Welcome").appearing_at(2000)]);
    let driver = driver(&session);

    let start = Instant::now();
    let text = driver
        .get_text(&sel("#greeting"), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(text, "Welcome");
    assert_eq!(start.elapsed(), Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn test_get_text_never_returns_empty() {
    let session = MockSession::new();
    session.add("#greeting", [MockElement::new("")]);
    let driver = driver(&session);

    let start = Instant::now();
    let err = driver
        .get_text(&sel("#greeting"), Duration::from_secs(3))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Timeout {
            condition: WaitCondition::HasText,
            ..
        }
    ));
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_get_text_skips_unreadable_match() {
    let session = MockSession::new();
    session.add(
        ".msg",
        [
            MockElement::new("stale").unreadable(SessionError::Stale(".msg[0]".into())),
            MockElement::new("hello"),
        ],
    );
    let driver = driver(&session);

    let start = Instant::now();
    let text = driver
        .get_text(&sel(".msg"), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(text, "hello");
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_get_text_is_trimmed() {
    let session = MockSession::new();
    session.add("#total", [MockElement::new("\n  42 items \t")]);
    let driver = driver(&session);

    let text = driver
        .get_text(&sel("#total"), Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(text, "42 items");
}

#[tokio::test(start_paused = true)]
async fn test_should_see_text_reports_mismatch() {
    let session = MockSession::new();
    session.add("#msg", [MockElement::new("Bad password")]);
    let driver = driver(&session);

    assert_ok!(driver.should_see_text(&sel("#msg"), "password").await);
    let err = driver.should_see_text(&sel("#msg"), "Welcome").await.unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Assertion { ref expected, ref actual, .. }
            if expected == "Welcome" && actual == "Bad password"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_should_see_value_reads_input_value() {
    let session = MockSession::new();
    session.add("#email", [MockElement::new("").with_value("a@b.c")]);
    let driver = driver(&session);

    assert_ok!(driver.should_see_value(&sel("#email"), "a@b.c").await);
    assert_err!(driver.should_see_value(&sel("#email"), "x@y.z").await);
}

#[tokio::test(start_paused = true)]
async fn test_title_assertion() {
    let session = MockSession::new();
    session.set_title("Hacker News");
    let driver = driver(&session);

    assert_ok!(driver.should_have_title("Hacker").await);
    assert!(matches!(
        driver.should_have_title("Lobsters").await,
        Err(HarnessError::Assertion { .. })
    ));
}

// ── Clicking ────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_click_all_matching_survives_a_failing_element() {
    let session = MockSession::new();
    session.add(
        "a.more",
        [
            MockElement::new("1"),
            MockElement::new("2").failing_clicks([SessionError::Stale("a.more[1]".into())]),
            MockElement::new("3"),
        ],
    );
    let driver = driver(&session);

    let outcome = driver.click_all_matching(&sel("a.more")).await.unwrap();

    let state = session.state();
    assert_eq!(state.click_attempts, vec!["a.more[0]", "a.more[1]", "a.more[2]"]);
    assert_eq!(state.clicks, vec!["a.more[0]", "a.more[2]"]);
    assert_eq!(outcome.matched(), 3);
    assert_eq!(outcome.clicked(), 2);
    assert_eq!(outcome.failed(), 1);
    assert!(matches!(outcome.outcomes[1], ElementOutcome::Failed(_)));
}

#[tokio::test(start_paused = true)]
async fn test_click_all_matching_skips_hidden_elements() {
    let session = MockSession::new();
    session.add(
        ".btn",
        [MockElement::new("a").hidden(), MockElement::new("b")],
    );
    let driver = driver(&session);

    let outcome = driver.click_all_matching(&sel(".btn")).await.unwrap();
    assert_eq!(outcome.outcomes, vec![ElementOutcome::Hidden, ElementOutcome::Clicked]);
    assert_eq!(session.state().click_attempts, vec![".btn[1]"]);
}

#[tokio::test(start_paused = true)]
async fn test_click_all_matching_with_no_matches_is_empty() {
    let session = MockSession::new();
    let driver = driver(&session);

    let outcome = driver.click_all_matching(&sel(".none")).await.unwrap();
    assert_eq!(outcome.matched(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_click_retries_transient_failures_with_backoff() {
    let session = MockSession::new();
    session.add(
        "#submit",
        [MockElement::new("Go").failing_clicks([
            SessionError::Intercepted("#submit[0]".into()),
            SessionError::Stale("#submit[0]".into()),
        ])],
    );
    let driver = driver(&session);

    let start = Instant::now();
    assert_ok!(driver.click(&sel("#submit")).await);

    assert_eq!(start.elapsed(), Duration::from_secs(4));
    let state = session.state();
    assert_eq!(state.click_attempts.len(), 3);
    assert_eq!(state.clicks, vec!["#submit[0]"]);
    assert_eq!(state.pauses, vec![Duration::from_secs(2); 2]);
}

#[tokio::test(start_paused = true)]
async fn test_click_gives_up_after_bound() {
    let session = MockSession::new();
    session.add(
        "#submit",
        [MockElement::new("Go").failing_clicks(
            std::iter::repeat(SessionError::Intercepted("#submit[0]".into())).take(5),
        )],
    );
    let driver = driver(&session);

    let err = driver.click(&sel("#submit")).await.unwrap_err();
    match err {
        HarnessError::ClickFailed {
            selector,
            attempts,
            source,
        } => {
            assert_eq!(selector, "#submit");
            assert_eq!(attempts, 3);
            assert!(matches!(source, SessionError::Intercepted(_)));
        }
        other => panic!("expected click failure, got {other}"),
    }
    assert_eq!(session.state().click_attempts.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_click_does_not_retry_protocol_errors() {
    let session = MockSession::new();
    session.add(
        "#submit",
        [MockElement::new("Go").failing_clicks([SessionError::protocol("target closed")])],
    );
    let driver = driver(&session);

    let err = driver.click(&sel("#submit")).await.unwrap_err();
    assert!(matches!(err, HarnessError::ClickFailed { attempts: 1, .. }));
}

#[tokio::test(start_paused = true)]
async fn test_click_waits_for_visibility_first() {
    let session = MockSession::new();
    session.add("#submit", [MockElement::new("Go").appearing_at(600).visible_at(1100)]);
    let driver = driver(&session);

    let start = Instant::now();
    assert_ok!(driver.click(&sel("#submit")).await);
    // exists at the 1000ms poll, visible at the next one
    assert_eq!(start.elapsed(), Duration::from_millis(1500));
    assert_eq!(session.state().click_attempts.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_click_if_exists_skips_absent_element() {
    let session = MockSession::new();
    let driver = driver(&session);

    let start = Instant::now();
    assert!(!driver.click_if_exists(&sel("#cookies")).await.unwrap());
    assert_eq!(start.elapsed(), Duration::from_secs(3));
    assert!(session.state().click_attempts.is_empty());

    session.add("#cookies", [MockElement::new("Accept")]);
    assert!(driver.click_if_exists(&sel("#cookies")).await.unwrap());
    assert_eq!(session.state().clicks, vec!["#cookies[0]"]);
}

#[tokio::test(start_paused = true)]
async fn test_click_element_with_text() {
    let session = MockSession::new();
    session.add(
        "li",
        [
            MockElement::new("Apple"),
            MockElement::new("Banana"),
            MockElement::new("Pineapple"),
        ],
    );
    let driver = driver(&session);

    assert_eq!(driver.click_element_with_text(&sel("li"), "apple").await.unwrap(), 1);
    assert_eq!(session.state().clicks, vec!["li[2]"]);
}

#[tokio::test(start_paused = true)]
async fn test_first_clickable_skips_hidden() {
    let session = MockSession::new();
    session.add(".opt", [MockElement::new("a").hidden(), MockElement::new("b")]);
    let driver = driver(&session);

    let first = driver.first_clickable(&sel(".opt")).await.unwrap().unwrap();
    assert_eq!(first.index, 1);
    assert!(driver.first_clickable(&sel(".none")).await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_trigger_event_dispatches_through_script() {
    let session = MockSession::new();
    session.add("#menu", [MockElement::new("Menu")]);
    session.set_script_result(serde_json::json!(1));
    let driver = driver(&session);

    assert_eq!(driver.trigger_event(&sel("#menu"), "click").await.unwrap(), 1);
    let state = session.state();
    assert_eq!(state.scripts.len(), 1);
    assert!(state.scripts[0].contains("jQuery"));
    assert!(state.scripts[0].contains("\"click\""));
    assert!(state.click_attempts.is_empty());
}

// ── Input ───────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_fill_text_overwrites() {
    let session = MockSession::new();
    session.add("#user", [MockElement::new("").with_value("old")]);
    let driver = driver(&session);

    assert_ok!(driver.fill_text(&sel("#user"), "alice").await);
    assert_eq!(session.value_of("#user").as_deref(), Some("alice"));
}

#[tokio::test(start_paused = true)]
async fn test_clear_text_on_empty_field_succeeds() {
    let session = MockSession::new();
    session.add("#user", [MockElement::new("")]);
    let driver = driver(&session);

    assert_ok!(driver.clear_text(&sel("#user")).await);
    assert_ok!(driver.clear_text(&sel("#user")).await);
    assert_eq!(session.value_of("#user").as_deref(), Some(""));
}

#[tokio::test(start_paused = true)]
async fn test_fill_text_waits_for_enabled() {
    let session = MockSession::new();
    session.add("#user", [MockElement::new("").disabled()]);
    let driver = driver(&session);

    let err = driver.fill_text(&sel("#user"), "alice").await.unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Timeout {
            condition: WaitCondition::Enabled,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_send_enter_focuses_then_presses() {
    let session = MockSession::new();
    session.add("#search", [MockElement::new("")]);
    let driver = driver(&session);

    assert_ok!(driver.send_enter(&sel("#search")).await);
    let state = session.state();
    assert_eq!(state.keys, vec!["Enter"]);
    assert!(state.scripts[0].contains("focus()"));
}

// ── Navigation and tabs ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_navigate_maximizes_on_desktop() {
    let session = MockSession::new();
    let driver = driver(&session);

    assert_ok!(driver.navigate("https://example.com/login").await);
    let state = session.state();
    assert_eq!(state.navigations, vec!["https://example.com/login"]);
    assert_eq!(state.maximized, 1);
}

#[tokio::test(start_paused = true)]
async fn test_navigate_skips_maximize_on_mobile() {
    let session = MockSession::new();
    let driver = driver_with(&session, Capability::new("android_chrome"));

    assert_ok!(driver.navigate("https://example.com/login").await);
    let state = session.state();
    assert_eq!(state.navigations.len(), 1);
    assert_eq!(state.maximized, 0);
}

#[tokio::test(start_paused = true)]
async fn test_switch_tab_rereads_tab_list() {
    let session = MockSession::new();
    let driver = driver(&session);

    assert!(matches!(
        driver.switch_tab(1).await,
        Err(HarnessError::TabNotFound { index: 1, open: 1 })
    ));

    session.add_tab("tab-1");
    assert_ok!(driver.switch_tab(1).await);
    assert_eq!(session.state().active_tab, "tab-1");

    assert_ok!(driver.switch_tab(0).await);
    assert_eq!(session.state().active_tab, "tab-0");
}

#[tokio::test(start_paused = true)]
async fn test_reload_and_settle() {
    let session = MockSession::new();
    let driver = driver(&session);

    assert_ok!(driver.reload().await);
    driver.settle().await;
    driver.wait_seconds(2).await;

    let state = session.state();
    assert_eq!(state.reloads, 1);
    assert_eq!(
        state.pauses,
        vec![Duration::from_millis(1500), Duration::from_secs(2)]
    );
}

// ── Tabs, dialogs and pointer ───────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_open_tab_continues_in_new_tab() {
    let session = MockSession::new();
    let driver = driver(&session);

    assert_ok!(driver.open_tab("https://example.com/help").await);
    {
        let state = session.state();
        assert_eq!(state.opened_urls, vec!["https://example.com/help"]);
        assert_eq!(state.active_tab, "tab-1");
    }

    assert_ok!(driver.switch_tab(0).await);
    assert_eq!(session.state().active_tab, "tab-0");
}

#[tokio::test(start_paused = true)]
async fn test_accept_and_dismiss_alert_after_delay() {
    let session = MockSession::new();
    let driver = driver(&session);

    session.raise_dialog();
    let start = Instant::now();
    assert_ok!(driver.accept_alert(None).await);
    assert_eq!(start.elapsed(), Duration::from_secs(3));

    session.raise_dialog();
    assert_ok!(driver.dismiss_alert(Some(Duration::from_secs(1))).await);

    let state = session.state();
    assert_eq!(state.dialogs, vec![true, false]);
    assert_eq!(
        state.pauses,
        vec![Duration::from_secs(3), Duration::from_secs(1)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_alert_without_dialog_fails() {
    let session = MockSession::new();
    let driver = driver(&session);

    let err = driver.accept_alert(None).await.unwrap_err();
    assert!(matches!(err, HarnessError::Session(SessionError::Protocol(_))));
    assert!(session.state().dialogs.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_move_to_element_waits_for_it() {
    let session = MockSession::new();
    session.add("#menu", [MockElement::new("Menu").appearing_at(1000)]);
    let driver = driver(&session);

    let start = Instant::now();
    assert_ok!(driver.move_to_element(&sel("#menu"), 5.0, 10.0).await);
    assert_eq!(start.elapsed(), Duration::from_millis(1000));
    assert_eq!(
        session.state().pointer_moves,
        vec![("#menu[0]".to_string(), 5.0, 10.0)]
    );
}
