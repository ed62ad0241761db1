use axum::http::StatusCode;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;
use tradepost::api;
use tradepost::catalog::MemoryCatalog;
use tradepost::db::init_db;
use tradepost::domain::{CatalogItem, Demand, ManualClock, UserId, Value};
use tradepost::engine::SideEffects;
use tradepost::{ItemId, Repository, TradeEngine, TradeEvents, TradeItemDraft};

struct TestApp {
    app: axum::Router,
    engine: Arc<TradeEngine>,
    events: Arc<TradeEvents>,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let catalog = MemoryCatalog::new().with_item(CatalogItem {
        id: ItemId::new("pearl"),
        name: "Pearl".to_string(),
        image: "pearl.png".to_string(),
        base_value: Value::from_str("3").unwrap(),
        demand: Demand::Low,
        allowed_mutations: BTreeMap::new(),
        allowed_traits: BTreeMap::new(),
    });

    let clock = Arc::new(ManualClock::new(1_000_000));
    let events = Arc::new(TradeEvents::new());
    let effects = SideEffects::new(repo.clone(), clock.clone());
    let engine = Arc::new(TradeEngine::new(
        repo,
        Arc::new(catalog),
        events.clone(),
        effects,
        clock,
        60_000,
    ));

    let app = api::create_router(api::AppState {
        engine: engine.clone(),
        events: events.clone(),
    });

    TestApp {
        app,
        engine,
        events,
        _temp: temp_dir,
    }
}

fn draft() -> TradeItemDraft {
    TradeItemDraft {
        item_id: ItemId::new("pearl"),
        mutation_id: None,
        trait_ids: vec![],
    }
}

#[tokio::test]
async fn test_events_stream_opens_for_existing_trade() {
    let test_app = setup_test_app().await;
    let trade = test_app
        .engine
        .post(&UserId::new("owner"), &[draft()], &[draft()])
        .await
        .unwrap();

    let req = axum::http::Request::builder()
        .method("GET")
        .uri(format!("/v1/trades/{}/events", trade.id))
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = test_app.app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/event-stream"
    );
}

#[tokio::test]
async fn test_events_stream_404_leaves_no_channel_behind() {
    let test_app = setup_test_app().await;

    let req = axum::http::Request::builder()
        .method("GET")
        .uri("/v1/trades/00000000-0000-4000-8000-000000000000/events")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = test_app.app.oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(test_app.events.channel_count(), 0);
}
