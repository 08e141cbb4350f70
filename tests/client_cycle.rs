//! Client check cycle against a mock site.

use std::sync::Arc;
use std::time::Duration;

use predictions::client::{AppContext, IndexLoad, PollOutcome, Poller};
use predictions::error::AppError;
use predictions::models::Config;
use predictions::notify::{DispatchOutcome, LogSink, StaticPrompt};
use predictions::storage::{LocalStorage, ReadStateStore};
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn post(date: &str, notes: &[&str]) -> Value {
    json!({
        "date": date,
        "folder": date,
        "title": format!("Outlook {date}"),
        "format": "md",
        "path": format!("predictions/BTC/{date}/post.md"),
        "tags": [],
        "notes": notes.iter().map(|t| json!({
            "time": t,
            "title": "Update",
            "path": format!("predictions/BTC/{date}/notes/{}.md", t.replace(':', "-")),
        })).collect::<Vec<_>>(),
    })
}

fn index(stamp: &str, posts: Vec<Value>) -> Value {
    json!({
        "lastUpdated": stamp,
        "symbols": {
            "BTC": { "name": "Bitcoin", "description": "", "icon": "", "posts": posts }
        }
    })
}

async fn serve_index(server: &MockServer, body: Value) {
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn context(server: &MockServer, state_dir: &TempDir) -> (Arc<AppContext>, LocalStorage) {
    let mut config = Config::default();
    config.site.base_url = server.uri();
    let storage = LocalStorage::new(state_dir.path());
    let context = AppContext::connect(config, Arc::new(storage.clone()), Arc::new(LogSink))
        .await
        .unwrap();
    (Arc::new(context), storage)
}

#[tokio::test]
async fn cold_start_then_new_post_then_mark_read() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let (ctx, storage) = context(&server, &tmp).await;

    serve_index(&server, index("t1", vec![post("2026-02-16", &[])])).await;
    assert_eq!(ctx.load_index().await.unwrap(), IndexLoad::Replaced);

    // First visit: nothing reported, baseline persisted
    assert!(!ctx.check_for_updates().await.unwrap().has_updates());
    let baseline = storage.load_read_state().await.unwrap().unwrap();
    let mark = baseline.mark("BTC").unwrap();
    assert_eq!(mark.date, "2026-02-16");
    assert_eq!(mark.note_time, "");

    assert!(!ctx.check_for_updates().await.unwrap().has_updates());

    serve_index(
        &server,
        index("t2", vec![post("2026-02-17", &[]), post("2026-02-16", &[])]),
    )
    .await;
    assert_eq!(ctx.load_index().await.unwrap(), IndexLoad::Replaced);
    let updates = ctx.check_for_updates().await.unwrap();
    assert!(updates.new_posts.contains("BTC"));
    assert!(ctx.is_symbol_updated("BTC").await);

    assert!(ctx.mark_symbol_read("BTC").await.unwrap());
    assert!(!ctx.is_symbol_updated("BTC").await);
    assert!(!ctx.check_for_updates().await.unwrap().has_updates());
    let state = storage.load_read_state().await.unwrap().unwrap();
    assert_eq!(state.mark("BTC").unwrap().date, "2026-02-17");
}

#[tokio::test]
async fn new_note_is_reported_as_note_only() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let (ctx, _storage) = context(&server, &tmp).await;

    serve_index(&server, index("t1", vec![post("2026-02-16", &["2026-02-16T14:30"])])).await;
    ctx.load_index().await.unwrap();
    ctx.check_for_updates().await.unwrap();

    serve_index(
        &server,
        index(
            "t2",
            vec![post("2026-02-16", &["2026-02-16T14:30", "2026-02-16T15:00"])],
        ),
    )
    .await;
    ctx.load_index().await.unwrap();
    let updates = ctx.check_for_updates().await.unwrap();
    assert!(updates.new_notes.contains("BTC"));
    assert!(updates.new_posts.is_empty());

    ctx.mark_all_read().await.unwrap();
    assert!(!ctx.has_updates().await);
    assert!(!ctx.check_for_updates().await.unwrap().has_updates());
}

#[tokio::test]
async fn repeated_polls_notify_once() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let (ctx, _storage) = context(&server, &tmp).await;
    ctx.request_permission(&StaticPrompt::new(true)).await;

    serve_index(&server, index("t1", vec![post("2026-02-16", &[])])).await;
    let poller = Poller::new(ctx.clone());
    poller.poll_once().await.unwrap();

    serve_index(&server, index("t2", vec![post("2026-02-17", &[])])).await;
    let first = poller.poll_once().await.unwrap();
    let second = poller.poll_once().await.unwrap();

    match first {
        PollOutcome::Completed {
            load: IndexLoad::Replaced,
            dispatch: Some(DispatchOutcome::Sent(notification)),
            ..
        } => {
            assert_eq!(notification.tag, "ich-trading-update");
            assert!(notification.body.contains("BTC"));
        }
        other => panic!("unexpected first poll: {other:?}"),
    }
    match second {
        PollOutcome::Completed {
            load: IndexLoad::Unchanged,
            dispatch: Some(DispatchOutcome::Duplicate),
            ..
        } => {}
        other => panic!("unexpected second poll: {other:?}"),
    }
}

#[tokio::test]
async fn overlapping_poll_is_skipped() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let (ctx, _storage) = context(&server, &tmp).await;

    Mock::given(method("GET"))
        .and(path("/index.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(index("t1", vec![post("2026-02-16", &[])]))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let poller = Poller::new(ctx.clone());
    let (first, second) = tokio::join!(poller.poll_once(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        poller.poll_once().await
    });

    assert!(matches!(
        first.unwrap(),
        PollOutcome::Completed {
            load: IndexLoad::Replaced,
            ..
        }
    ));
    assert_eq!(second.unwrap(), PollOutcome::Skipped);

    // The flag is released once the first poll finishes
    assert!(matches!(
        poller.poll_once().await.unwrap(),
        PollOutcome::Completed {
            load: IndexLoad::Unchanged,
            ..
        }
    ));
}

#[tokio::test]
async fn failed_poll_does_not_block_the_next() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let (ctx, _storage) = context(&server, &tmp).await;
    let poller = Poller::new(ctx.clone());

    Mock::given(method("GET"))
        .and(path("/index.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    assert!(poller.poll_once().await.is_err());

    serve_index(&server, index("t1", vec![post("2026-02-16", &[])])).await;
    assert!(matches!(
        poller.poll_once().await.unwrap(),
        PollOutcome::Completed {
            load: IndexLoad::Replaced,
            ..
        }
    ));
}

#[tokio::test]
async fn only_first_load_surfaces_errors() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let (ctx, _storage) = context(&server, &tmp).await;

    Mock::given(method("GET"))
        .and(path("/index.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let err = ctx.load_index().await.unwrap_err();
    assert!(matches!(err, AppError::Fetch { .. }));

    serve_index(&server, index("t1", vec![post("2026-02-16", &[])])).await;
    assert_eq!(ctx.load_index().await.unwrap(), IndexLoad::Replaced);

    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    assert_eq!(ctx.load_index().await.unwrap(), IndexLoad::KeptPrevious);
    assert_eq!(ctx.index().await.unwrap().last_updated, "t1");
}

#[tokio::test]
async fn markdown_goes_through_the_site() {
    let server = MockServer::start().await;
    let tmp = TempDir::new().unwrap();
    let (ctx, _storage) = context(&server, &tmp).await;

    Mock::given(method("GET"))
        .and(path("/predictions/BTC/2026-02-16/post.md"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Outlook"))
        .mount(&server)
        .await;

    let body = ctx
        .load_markdown("predictions/BTC/2026-02-16/post.md")
        .await
        .unwrap();
    assert_eq!(body, "# Outlook");

    assert!(ctx.load_markdown("predictions/missing.md").await.is_err());
}
