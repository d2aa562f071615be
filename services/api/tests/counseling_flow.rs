//! End-to-end flows through the session, conversation and journal tasks,
//! backed by the in-memory profile store and scripted model fakes.

mod common;

use api_lib::{
    adapters::InMemoryProfileStore,
    config::Config,
    error::InteractionError,
    web::{
        conversation_task::{send_message, SaveStatus},
        journal_task::{history, past_entries, record_entry},
        rest::build_trend_response,
        state::AppState,
        trend::{render_trend, TrendChart},
    },
};
use axum::http::StatusCode;
use common::{app_state, ScriptedGenerator, SlowStore};
use counsel_core::{
    domain::{ChatLine, ConversationTurn, Mood},
    ports::{PortError, PortResult, ProfileStore},
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct Harness {
    app: AppState,
    store: Arc<InMemoryProfileStore>,
    generator: Arc<ScriptedGenerator>,
}

async fn harness(replies: Vec<PortResult<String>>) -> Harness {
    let store = Arc::new(InMemoryProfileStore::new());
    store.create_profile("a@x.com", "hash").await.unwrap();
    let generator = Arc::new(ScriptedGenerator::with(replies));
    let config = Config {
        generation_timeout: Duration::from_secs(5),
        ..Config::default()
    };
    let app = app_state(store.clone(), generator.clone(), config);
    Harness {
        app,
        store,
        generator,
    }
}

async fn stored_conversations(store: &InMemoryProfileStore) -> Vec<ConversationTurn> {
    let id = store.find_profile_by_email("a@x.com").await.unwrap().unwrap().id;
    store.get_conversations(id).await.unwrap().unwrap()
}

#[tokio::test]
async fn message_to_cbt_therapist_is_shown_and_saved() {
    let h = harness(vec![Ok("Let's examine that thought together.".to_string())]).await;
    let session = h.app.sessions.login("a@x.com").await;
    let mut state = session.state.lock().await;

    let sent = send_message(&h.app, &mut state, "CBT Therapist", "I feel stuck", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(sent.save, SaveStatus::Saved);
    assert_eq!(
        state.conversation_history(),
        &[
            ChatLine::new("User", "I feel stuck"),
            ChatLine::new("CBT Therapist", "Let's examine that thought together."),
        ]
    );
    assert_eq!(
        stored_conversations(&h.store).await,
        vec![ConversationTurn {
            counselor: "CBT Therapist".to_string(),
            user_message: "I feel stuck".to_string(),
            ai_response: "Let's examine that thought together.".to_string(),
        }]
    );

    let prompts = h.generator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with("You are a virtual CBT Therapist."));
    assert!(prompts[0].ends_with("User: I feel stuck\nAI Counselor:"));
}

#[tokio::test]
async fn conversation_log_only_grows() {
    let replies = (0..3).map(|n| Ok(format!("reply {}", n))).collect();
    let h = harness(replies).await;
    let session = h.app.sessions.login("a@x.com").await;
    let mut state = session.state.lock().await;

    for n in 0..3 {
        let before = stored_conversations(&h.store).await;
        send_message(&h.app, &mut state, "Empathetic Listener", &format!("message {}", n), &CancellationToken::new())
            .await
            .unwrap();
        let after = stored_conversations(&h.store).await;
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(&after[..before.len()], &before[..]);
    }
    assert_eq!(state.conversation_history().len(), 6);
}

#[tokio::test]
async fn failed_generation_can_be_retried() {
    let h = harness(vec![
        Err(PortError::Unavailable("503 Service Unavailable".to_string())),
        Ok("Take a slow breath.".to_string()),
    ])
    .await;
    let session = h.app.sessions.login("a@x.com").await;
    let mut state = session.state.lock().await;

    let err = send_message(&h.app, &mut state, "Mindfulness Coach", "I'm anxious", &CancellationToken::new())
        .await
        .unwrap_err();
    let pending = err.pending_input().map(str::to_string).unwrap();
    assert!(err.is_retryable());
    assert!(state.conversation_history().is_empty());
    assert!(stored_conversations(&h.store).await.is_empty());

    let sent = send_message(&h.app, &mut state, "Mindfulness Coach", &pending, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(sent.turn.user_message, "I'm anxious");
    assert_eq!(stored_conversations(&h.store).await.len(), 1);
}

#[tokio::test]
async fn promotion_entry_is_logged_as_happy() {
    let h = harness(vec![]).await;
    let session = h.app.sessions.login("a@x.com").await;
    let mut state = session.state.lock().await;

    let entry = record_entry(&h.app, &mut state, "Today was amazing, I got a promotion!")
        .await
        .unwrap();
    assert_eq!(entry.mood, Mood::Happy);
    assert_eq!(entry.mood.label(), "Happy 😊");
    assert!(entry.sentiment > 0.0);

    // Written and read back through the stored JSON representation.
    let logs = history(&h.app, &mut state).await.unwrap();
    assert_eq!(logs, vec![entry]);
}

#[tokio::test]
async fn whitespace_entry_writes_nothing() {
    let h = harness(vec![]).await;
    let session = h.app.sessions.login("a@x.com").await;
    let mut state = session.state.lock().await;

    let err = record_entry(&h.app, &mut state, "  ").await.unwrap_err();
    assert!(matches!(err, InteractionError::Validation(_)));
    assert!(history(&h.app, &mut state).await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_history_shows_placeholder() {
    let h = harness(vec![]).await;
    let session = h.app.sessions.login("a@x.com").await;
    let mut state = session.state.lock().await;

    let logs = history(&h.app, &mut state).await.unwrap();
    let trend = build_trend_response(&logs);
    assert!(trend.points.is_empty());
    assert!(trend.svg.is_none());
    assert_eq!(trend.message.as_deref(), Some("No mood history available yet."));
}

#[tokio::test]
async fn neutral_then_negative_entries_chart_in_order() {
    let h = harness(vec![]).await;
    let session = h.app.sessions.login("a@x.com").await;
    let mut state = session.state.lock().await;

    record_entry(&h.app, &mut state, "ok").await.unwrap();
    record_entry(&h.app, &mut state, "terrible day").await.unwrap();

    let logs = history(&h.app, &mut state).await.unwrap();
    assert_eq!(logs.iter().map(|e| e.entry.as_str()).collect::<Vec<_>>(), ["ok", "terrible day"]);
    assert_eq!(logs[0].mood, Mood::Neutral);
    assert_eq!(logs[1].mood, Mood::Sad);

    let trend = build_trend_response(&logs);
    let points: Vec<(u32, f64)> = trend.points.iter().map(|p| (p.entry, p.sentiment)).collect();
    assert_eq!(points, vec![(1, 0.0), (2, -0.4767)]);
    assert!(trend.svg.is_some());
    assert!(matches!(render_trend(&[0.0, -0.4767]).unwrap(), TrendChart::Svg(_)));

    let newest_first = past_entries(&h.app, &mut state).await.unwrap();
    assert_eq!(newest_first[0].entry, "terrible day");
}

#[tokio::test]
async fn logout_discards_the_session_but_not_the_journal() {
    let h = harness(vec![Ok("I'm listening.".to_string())]).await;

    let session = h.app.sessions.login("a@x.com").await;
    {
        let mut state = session.state.lock().await;
        send_message(&h.app, &mut state, "Empathetic Listener", "hello", &CancellationToken::new())
            .await
            .unwrap();
        record_entry(&h.app, &mut state, "terrible day").await.unwrap();
    }

    assert!(h.app.sessions.logout(&session.id).await);
    assert!(h.app.sessions.get(&session.id).await.is_none());
    assert!(session.shutdown.is_cancelled());

    let again = h.app.sessions.login("a@x.com").await;
    let mut state = again.state.lock().await;
    assert!(state.conversation_history().is_empty());
    assert_eq!(history(&h.app, &mut state).await.unwrap().len(), 1);
}

#[tokio::test]
async fn stalled_store_hands_the_entry_back() {
    let store = Arc::new(SlowStore::new(Duration::from_secs(5)));
    let profile = store.create_profile("a@x.com", "hash").await.unwrap();
    let config = Config {
        store_timeout: Duration::from_millis(50),
        ..Config::default()
    };
    let app = app_state(store.clone(), Arc::new(ScriptedGenerator::with(vec![])), config);
    let session = app.sessions.login("a@x.com").await;
    let mut state = session.state.lock().await;

    let err = record_entry(&app, &mut state, "terrible day").await.unwrap_err();
    assert!(matches!(
        err,
        InteractionError::Persistence { source: PortError::Timeout(_), .. }
    ));
    assert!(err.is_retryable());
    assert_eq!(err.pending_input(), Some("terrible day"));
    assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(store.get_mood_logs(profile.id).await.unwrap(), Some(vec![]));
}
