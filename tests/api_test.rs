use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use bettrack_backend::config::{AppConfig, Plan};
use bettrack_backend::repository::BetRepository;
use bettrack_backend::state::AppState;
use bettrack_backend::store::{self, BetStore, Mutation};
use bettrack_backend::types::{BetResult, NewBet, SettleBet};
use bettrack_backend::{app, db};

async fn test_app(config: AppConfig) -> (Router, AppState) {
    let pool = db::memory().await.unwrap();
    let state = AppState::new(pool, config);
    (app(state.clone()), state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };

    let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn bet_body(sport: &str, date: &str, stake: f64) -> Value {
    json!({
        "sport": sport,
        "team": "Chiefs",
        "opponent": "Bills",
        "bet_type": "moneyline",
        "odds": -110,
        "stake": stake,
        "date": date,
    })
}

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app(AppConfig::default()).await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_create_settle_and_stats() {
    let (app, _) = test_app(AppConfig::default()).await;

    let (status, first) =
        send_json(&app, Method::POST, "/bets", Some(bet_body("NFL", "2024-01-01", 10.0))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(first.get("result").is_none());

    let (_, second) =
        send_json(&app, Method::POST, "/bets", Some(bet_body("NFL", "2024-01-02", 10.0))).await;

    let first_id = first["id"].as_str().unwrap();
    let second_id = second["id"].as_str().unwrap();

    let (status, settled) = send_json(
        &app,
        Method::PUT,
        &format!("/bets/{}", first_id),
        Some(json!({ "result": "win", "payout": 19 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settled["result"], "win");

    let (status, _) = send_json(
        &app,
        Method::PUT,
        &format!("/bets/{}", second_id),
        Some(json!({ "result": "loss" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, report) = send_json(&app, Method::GET, "/bets/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["totals"]["total_bets"], 2);
    assert_eq!(report["totals"]["win_rate"], 50.0);
    assert_eq!(report["totals"]["total_staked"], 20.0);
    assert_eq!(report["totals"]["net_profit"], -1.0);
    assert_eq!(report["totals"]["roi"], -5.0);
    assert_eq!(report["streaks"]["current_streak"], -1);
    assert_eq!(report["by_sport"][0]["sport"], "NFL");
    assert_eq!(report["by_month"][0]["month"], "2024-01");
}

#[tokio::test]
async fn test_validation_errors() {
    let (app, _) = test_app(AppConfig::default()).await;

    let (status, body) =
        send_json(&app, Method::POST, "/bets", Some(bet_body("NFL", "2024-01-01", 0.0))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("stake"));

    let (_, bet) =
        send_json(&app, Method::POST, "/bets", Some(bet_body("NFL", "2024-01-01", 5.0))).await;
    let (status, _) = send_json(
        &app,
        Method::PUT,
        &format!("/bets/{}", bet["id"].as_str().unwrap()),
        Some(json!({ "result": "loss", "payout": 12 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_resettling_as_push_returns_the_stake() {
    let (app, _) = test_app(AppConfig::default()).await;

    let (_, bet) =
        send_json(&app, Method::POST, "/bets", Some(bet_body("NFL", "2024-01-01", 5.0))).await;
    let uri = format!("/bets/{}", bet["id"].as_str().unwrap());

    let (status, _) =
        send_json(&app, Method::PUT, &uri, Some(json!({ "result": "win", "payout": 50 }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, pushed) = send_json(&app, Method::PUT, &uri, Some(json!({ "result": "push" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pushed["result"], "push");
    assert_eq!(pushed["payout"], 5.0);

    let (status, _) =
        send_json(&app, Method::PUT, &uri, Some(json!({ "result": "push", "payout": 50 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, csv) = send(&app, Method::GET, "/bets/export", None).await;
    let csv = String::from_utf8(csv).unwrap();
    assert!(csv.lines().nth(1).unwrap().contains("\"push\",\"5\",\"0.00\""));
}

#[tokio::test]
async fn test_missing_bet_is_not_found() {
    let (app, _) = test_app(AppConfig::default()).await;

    let (status, body) = send_json(&app, Method::DELETE, "/bets/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Bet not found");

    let (status, _) = send_json(
        &app,
        Method::PUT,
        "/bets/nope",
        Some(json!({ "result": "push", "payout": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_free_plan_limit() {
    let config = AppConfig {
        free_plan_limit: 2,
        ..AppConfig::default()
    };
    let (app, _) = test_app(config).await;

    for day in 1..=2 {
        let (status, _) = send_json(
            &app,
            Method::POST,
            "/bets",
            Some(bet_body("NBA", &format!("2024-02-0{}", day), 5.0)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) =
        send_json(&app, Method::POST, "/bets", Some(bet_body("NBA", "2024-02-03", 5.0))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("Free plan limit"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_free_plan_limit_holds_under_concurrent_creates() {
    let config = AppConfig {
        free_plan_limit: 1,
        ..AppConfig::default()
    };
    let (app, state) = test_app(config).await;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move {
                send(&app, Method::POST, "/bets", Some(bet_body("NBA", "2024-02-01", 5.0)))
                    .await
                    .0
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        let status = handle.await.unwrap();
        if status == StatusCode::CREATED {
            created += 1;
        } else {
            assert_eq!(status, StatusCode::FORBIDDEN);
        }
    }

    assert_eq!(created, 1);
    assert_eq!(state.bets().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_pro_plan_is_unlimited() {
    let config = AppConfig {
        plan: Plan::Pro,
        free_plan_limit: 1,
        ..AppConfig::default()
    };
    let (app, _) = test_app(config).await;

    for _ in 0..3 {
        let (status, _) =
            send_json(&app, Method::POST, "/bets", Some(bet_body("NBA", "2024-02-01", 5.0))).await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

#[tokio::test]
async fn test_list_filters_and_pagination() {
    let (app, _) = test_app(AppConfig::default()).await;

    for (sport, day) in [("NFL", 1), ("NBA", 2), ("NFL", 3)] {
        send_json(
            &app,
            Method::POST,
            "/bets",
            Some(bet_body(sport, &format!("2024-03-0{}", day), 5.0)),
        )
        .await;
    }

    let (status, page) = send_json(&app, Method::GET, "/bets?sport=NFL&limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["bets"].as_array().unwrap().len(), 1);
    assert_eq!(page["pagination"]["total"], 2);
    assert_eq!(page["pagination"]["pages"], 2);
    // newest first
    assert_eq!(page["bets"][0]["date"], "2024-03-03");

    let (_, page) = send_json(&app, Method::GET, "/bets?result=win", None).await;
    assert_eq!(page["pagination"]["total"], 0);

    let (_, page) = send_json(&app, Method::GET, "/bets?limit=500", None).await;
    assert_eq!(page["pagination"]["limit"], 100);
    assert_eq!(page["bets"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_delete_and_export() {
    let (app, _) = test_app(AppConfig::default()).await;

    let (_, bet) =
        send_json(&app, Method::POST, "/bets", Some(bet_body("MLB", "2024-04-01", 7.5))).await;
    send_json(&app, Method::POST, "/bets", Some(bet_body("NHL", "2024-04-02", 3.0))).await;

    let (status, body) = send_json(
        &app,
        Method::DELETE,
        &format!("/bets/{}", bet["id"].as_str().unwrap()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Bet deleted successfully");

    let (status, csv) = send(&app, Method::GET, "/bets/export", None).await;
    assert_eq!(status, StatusCode::OK);
    let csv = String::from_utf8(csv).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("\"2024-04-02\",\"NHL\""));
    assert!(lines[1].contains("\"Pending\""));
}

#[tokio::test]
async fn test_optimistic_store_against_repository() {
    let (_, state) = test_app(AppConfig::default()).await;
    let repo: BetRepository = state.bets();

    let draft = NewBet {
        sport: "NFL".to_string(),
        team: "Eagles".to_string(),
        opponent: "Giants".to_string(),
        bet_type: bettrack_backend::types::BetType::Spread,
        odds: 120.0,
        stake: 25.0,
        date: chrono::NaiveDate::from_ymd_opt(2024, 9, 8).unwrap(),
        notes: None,
    };

    let local = store::apply(BetStore::default(), &repo, Mutation::Create(draft))
        .await
        .unwrap();
    let id = local.bets()[0].id.clone();
    assert!(!id.starts_with(store::TEMP_ID_PREFIX));
    assert!(repo.find(&id).await.unwrap().is_some());

    // a settle the server rejects leaves the local copy untouched
    let rollback = store::apply(
        local.clone(),
        &repo,
        Mutation::Settle {
            id: id.clone(),
            patch: SettleBet { result: Some(BetResult::Loss), payout: Some(3.0) },
        },
    )
    .await
    .unwrap_err();
    assert_eq!(rollback.store.bets(), local.bets());

    // deleting a bet the server doesn't know about is rolled back too
    let rollback = store::apply(local.clone(), &repo, Mutation::Delete { id: "ghost".to_string() })
        .await
        .unwrap_err();
    assert!(rollback.error.is_not_found());

    let local = store::apply(local, &repo, Mutation::Delete { id: id.clone() })
        .await
        .unwrap();
    assert!(local.bets().is_empty());
    assert_eq!(repo.count().await.unwrap(), 0);
}
