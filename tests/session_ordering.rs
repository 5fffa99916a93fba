//! Session controller integration tests
//!
//! Drives `ChatSession` against the in-process fake backend to check turn
//! ordering, topic resets, feedback toggling and failure containment.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rand::Rng;

use chatline::backend::fake::FakeBackend;
use chatline::backend::{ChatResponse, WireSender};
use chatline::diagnostics::DiagnosticEvent;
use chatline::session::{
    Attachments, Feedback, Image, Message, PromptRefresh, Rating, Reference, Sender,
    SessionStatus, TurnOutcome,
};

mod common;

/// Rapid sends with random backend latency still produce user messages in
/// call order followed by replies in the same order.
#[tokio::test]
async fn test_rapid_sends_keep_reply_order() {
    const TURNS: usize = 8;

    let backend = Arc::new(FakeBackend::new());
    {
        let mut rng = rand::rng();
        for i in 0..TURNS {
            let latency = Duration::from_millis(rng.random_range(0..40));
            backend.set_latency(format!("message {}", i), latency);
        }
    }
    let (session, diagnostics) = common::fake_session(&backend);

    let tickets: Vec<_> = (0..TURNS)
        .map(|i| session.send(&format!("message {}", i)).expect("non-blank input"))
        .collect();

    // user messages are visible immediately, in call order
    let messages = session.messages();
    assert_eq!(messages.len(), TURNS);
    for (i, message) in messages.iter().enumerate() {
        assert_eq!(message.sender(), Sender::User);
        assert_eq!(message.text(), format!("message {}", i));
    }
    assert_eq!(session.status(), SessionStatus::AwaitingResponse);

    let outcomes = join_all(tickets.into_iter().map(|t| t.outcome())).await;
    for (i, outcome) in outcomes.iter().enumerate() {
        assert_eq!(*outcome, TurnOutcome::Replied { index: TURNS + i });
    }

    let messages = session.messages();
    assert_eq!(messages.len(), 2 * TURNS);
    for i in 0..TURNS {
        let reply = &messages[TURNS + i];
        assert_eq!(reply.sender(), Sender::Assistant);
        assert_eq!(reply.text(), format!("echo: message {}", i));
    }
    assert_eq!(session.status(), SessionStatus::Idle);
    assert_eq!(diagnostics.failures(), 0);
}

/// A slow first reply does not let a fast second reply overtake it.
#[tokio::test]
async fn test_slow_first_reply_is_not_overtaken() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_delayed_reply(ChatResponse::text("first"), Duration::from_millis(80));
    backend.push_reply(ChatResponse::text("second"));
    let (session, _) = common::fake_session(&backend);

    let a = session.send("one").unwrap();
    let b = session.send("two").unwrap();
    assert_eq!(b.outcome().await, TurnOutcome::Replied { index: 3 });
    assert_eq!(a.outcome().await, TurnOutcome::Replied { index: 2 });

    let texts: Vec<_> = session
        .messages()
        .iter()
        .map(|m| m.text().to_string())
        .collect();
    assert_eq!(texts, vec!["one", "two", "first", "second"]);
}

/// Each request carries the history as it stood before its user message.
#[tokio::test]
async fn test_request_history_excludes_current_message() {
    let backend = Arc::new(FakeBackend::new());
    let (session, _) = common::fake_session(&backend);

    session.send("Hello").unwrap().outcome().await;
    session.send("Again").unwrap().outcome().await;

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].message, "Hello");
    assert!(requests[0].history.is_empty());

    assert_eq!(requests[1].message, "Again");
    let senders: Vec<_> = requests[1].history.iter().map(|h| h.sender).collect();
    assert_eq!(senders, vec![WireSender::User, WireSender::Ai]);
    assert_eq!(requests[1].history[1].text, "echo: Hello");
}

/// A plain reply lands as an unrated assistant message with no attachments.
#[tokio::test]
async fn test_hello_round_trip() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_reply(
        ChatResponse::text("Hi there")
            .with_images(Vec::new())
            .with_references(Vec::new()),
    );
    let (session, _) = common::fake_session(&backend);

    session.send("Hello").unwrap().outcome().await;
    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0], Message::user("Hello"));
    assert_eq!(messages[1], Message::assistant("Hi there", Attachments::None));
    assert_eq!(messages[1].feedback(), Feedback::None);
}

/// Blank input appends nothing and never reaches the backend.
#[tokio::test]
async fn test_blank_input_is_ignored() {
    let backend = Arc::new(FakeBackend::new());
    let (session, _) = common::fake_session(&backend);

    assert!(session.send("").is_none());
    assert!(session.send("   \n\t").is_none());
    assert!(session.messages().is_empty());
    assert_eq!(backend.chat_calls(), 0);
}

/// A reply held across a topic reset never lands in the new conversation.
#[tokio::test]
async fn test_reset_discards_in_flight_reply() {
    let backend = Arc::new(FakeBackend::with_prompts(vec!["Fresh start".into()]));
    let gate = backend.push_held_reply(ChatResponse::text("stale"));
    let (session, diagnostics) = common::fake_session(&backend);

    let ticket = session.send("old topic").unwrap();
    backend.wait_for_chat_calls(1).await;

    assert_eq!(session.reset_topic().await, PromptRefresh::Updated);
    gate.release();

    assert_eq!(ticket.outcome().await, TurnOutcome::Discarded);
    assert!(session.messages().is_empty());
    assert_eq!(session.prompts(), vec!["Fresh start"]);
    assert_eq!(session.status(), SessionStatus::Idle);
    assert!(diagnostics
        .events()
        .iter()
        .any(|e| matches!(e, DiagnosticEvent::TurnDiscarded { .. })));

    // the new topic works normally
    let fresh = session.send("new topic").unwrap();
    assert_eq!(fresh.outcome().await, TurnOutcome::Replied { index: 1 });
    assert_eq!(session.messages()[1].text(), "echo: new topic");
}

/// Follow-up prompts carried by a reply from the previous topic never
/// replace the prompts fetched for the new one.
#[tokio::test]
async fn test_stale_reply_prompts_are_not_applied() {
    let backend = Arc::new(FakeBackend::with_prompts(vec!["fresh".into()]));
    let gate = backend.push_held_reply(
        ChatResponse::text("stale").with_suggested_prompts(vec!["stale prompt".into()]),
    );
    let (session, _) = common::fake_session(&backend);

    let ticket = session.send("old topic").unwrap();
    backend.wait_for_chat_calls(1).await;

    assert_eq!(session.reset_topic().await, PromptRefresh::Updated);
    gate.release();

    assert_eq!(ticket.outcome().await, TurnOutcome::Discarded);
    assert_eq!(session.prompts(), vec!["fresh"]);
    assert!(session.messages().is_empty());
}

/// A prompt fetch that resolves after the chat was cleared is dropped.
#[tokio::test]
async fn test_prompt_fetch_superseded_by_clear() {
    let backend = Arc::new(FakeBackend::with_prompts(vec!["fetched".into()]));
    let gate = backend.hold_prompt_fetch();
    let (session, diagnostics) = common::fake_session(&backend);
    let session = session.with_initial_prompts(vec!["seed".into()]);

    let (refresh, ()) = tokio::join!(session.initialize(), async {
        backend.wait_for_prompt_calls(1).await;
        session.clear_conversation();
        gate.release();
    });

    assert_eq!(refresh, PromptRefresh::Superseded);
    assert_eq!(session.prompts(), vec!["seed"]);
    assert!(diagnostics.events().is_empty());

    // a fetch for the current topic applies normally
    assert_eq!(session.initialize().await, PromptRefresh::Updated);
    assert_eq!(session.prompts(), vec!["fetched"]);
}

/// Turns still queued behind an in-flight turn are skipped after a reset.
#[tokio::test]
async fn test_reset_skips_queued_turns() {
    let backend = Arc::new(FakeBackend::new());
    let _gate = backend.push_held_reply(ChatResponse::text("never"));
    let (session, _) = common::fake_session(&backend);

    let first = session.send("first").unwrap();
    let second = session.send("second").unwrap();
    backend.wait_for_chat_calls(1).await;

    session.clear_conversation();

    assert_eq!(first.outcome().await, TurnOutcome::Discarded);
    assert_eq!(second.outcome().await, TurnOutcome::Discarded);
    assert_eq!(backend.chat_calls(), 1);
    assert!(session.messages().is_empty());
}

/// A topic reset triggers exactly one prompt fetch.
#[tokio::test]
async fn test_reset_fetches_prompts_once() {
    let backend = Arc::new(FakeBackend::with_prompts(vec!["A".into(), "B".into()]));
    let (session, _) = common::fake_session(&backend);

    session.send("Hello").unwrap().outcome().await;
    let generation = session.generation();

    session.reset_topic().await;
    assert_eq!(backend.prompt_calls(), 1);
    assert_eq!(session.generation(), generation + 1);
    assert_eq!(session.prompts(), vec!["A", "B"]);
}

/// Failed prompt fetches keep the previous list and are reported.
#[tokio::test]
async fn test_prompt_fetch_failure_keeps_previous_prompts() {
    let backend = Arc::new(FakeBackend::with_prompts(vec!["New".into()]));
    backend.fail_prompt_fetches(1);
    let (session, diagnostics) = common::fake_session(&backend);
    let session = session.with_initial_prompts(vec!["Old".into()]);

    assert_eq!(session.initialize().await, PromptRefresh::Failed);
    assert_eq!(session.prompts(), vec!["Old"]);
    assert!(matches!(
        diagnostics.events().last(),
        Some(DiagnosticEvent::PromptRefreshFailed { .. })
    ));

    assert_eq!(session.initialize().await, PromptRefresh::Updated);
    assert_eq!(session.prompts(), vec!["New"]);
}

/// A failed turn leaves the user message without a reply and the session
/// keeps working.
#[tokio::test]
async fn test_backend_failure_is_contained() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_failure("backend unavailable");
    let (session, diagnostics) = common::fake_session(&backend);

    let outcome = session.send("Hello").unwrap().outcome().await;
    assert!(
        matches!(outcome, TurnOutcome::Failed { ref error } if error.contains("backend unavailable"))
    );
    assert_eq!(session.messages().len(), 1);
    assert_eq!(session.status(), SessionStatus::Idle);
    assert_eq!(diagnostics.failures(), 1);

    let outcome = session.send("Hello again").unwrap().outcome().await;
    assert_eq!(outcome, TurnOutcome::Replied { index: 2 });
}

/// Reply attachments and follow-up prompts are applied with the reply.
#[tokio::test]
async fn test_reply_attachments_and_prompts() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_reply(
        ChatResponse::text("Here you go")
            .with_images(vec![Image {
                url: "https://img.example.com/a.png".into(),
                source: "example.com".into(),
            }])
            .with_references(vec![Reference::document("Manual", "https://docs.example.com/m.pdf")])
            .with_suggested_prompts(vec!["Tell me more".into()]),
    );
    backend.push_reply(ChatResponse::text("No prompts this time"));
    let (session, _) = common::fake_session(&backend);
    let session = session.with_initial_prompts(vec!["Start".into()]);

    session.send("Show me").unwrap().outcome().await;
    let reply = &session.messages()[1];
    assert_eq!(reply.images().len(), 1);
    assert_eq!(reply.references()[0].title, "Manual");
    assert_eq!(session.prompts(), vec!["Tell me more"]);

    // absent suggested prompts leave the list unchanged
    session.send("More").unwrap().outcome().await;
    assert_eq!(session.prompts(), vec!["Tell me more"]);
}

/// Feedback toggles between up, down and none and ignores user messages.
#[tokio::test]
async fn test_feedback_toggling() {
    let backend = Arc::new(FakeBackend::new());
    let (session, _) = common::fake_session(&backend);
    session.send("Hello").unwrap().outcome().await;

    assert_eq!(session.toggle_feedback(1, Rating::Up), Some(Feedback::Up));
    assert_eq!(session.toggle_feedback(1, Rating::Up), Some(Feedback::None));
    assert_eq!(session.toggle_feedback(1, Rating::Up), Some(Feedback::Up));
    assert_eq!(session.toggle_feedback(1, Rating::Down), Some(Feedback::Down));
    assert_eq!(session.toggle_feedback(1, Rating::Down), Some(Feedback::None));
    assert_eq!(session.messages()[1].feedback(), Feedback::None);

    assert_eq!(session.toggle_feedback(0, Rating::Up), None);
    assert_eq!(session.toggle_feedback(7, Rating::Up), None);
    assert_eq!(session.messages().len(), 2);
}

/// Picking a suggested prompt behaves exactly like typing it.
#[tokio::test]
async fn test_select_prompt_sends_text() {
    let backend = Arc::new(FakeBackend::new());
    let (session, _) = common::fake_session(&backend);

    session
        .select_prompt("What can you do?")
        .unwrap()
        .outcome()
        .await;
    let messages = session.messages();
    assert_eq!(messages[0].text(), "What can you do?");
    assert_eq!(messages[1].text(), "echo: What can you do?");
}

/// Subscribers see a new revision after each mutation.
#[tokio::test]
async fn test_subscribers_are_notified() {
    let backend = Arc::new(FakeBackend::new());
    let (session, _) = common::fake_session(&backend);
    let mut revisions = session.subscribe();
    let start = *revisions.borrow_and_update();

    let ticket = session.send("Hello").unwrap();
    assert!(revisions.has_changed().unwrap());
    ticket.outcome().await;

    let after_reply = *revisions.borrow_and_update();
    assert!(after_reply >= start + 2);

    session.clear_conversation();
    assert!(*revisions.borrow_and_update() > after_reply);
}
