use acd_core::{ingest, Expansion, Keyspace, MemoryStore, Store};
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use server::{build_app, AppState};

fn tiny_index() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let lines = ["Otto Mustermann", "Ottilie Bauer", "Wolfgang Maier"].map(|l| Ok::<_, std::io::Error>(l.to_string()));
    ingest(&*store, &Keyspace::default(), &Expansion::default(), lines).unwrap();
    store
}

fn app(store: Arc<MemoryStore>, admin_token: Option<&str>) -> Router {
    build_app(AppState {
        store,
        keys: Keyspace::default(),
        admin_token: admin_token.map(str::to_owned),
    })
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Bytes) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn complete_intersects_terms() {
    let (status, body) = call(app(tiny_index(), None), get("/complete?q=ott%20tto")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["total_hits"], 1);
    assert_eq!(json["results"][0], "Otto Mustermann");
    assert_eq!(json["terms"], serde_json::json!(["ott", "tto"]));
}

#[tokio::test]
async fn single_term_returns_every_match() {
    let (status, body) = call(app(tiny_index(), None), get("/complete?q=OT")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let results: Vec<&str> = json["results"].as_array().unwrap().iter().map(|v| v.as_str().unwrap()).collect();
    assert_eq!(results, vec!["Otto Mustermann", "Ottilie Bauer"]);
}

#[tokio::test]
async fn empty_query_is_a_bad_request() {
    let (status, _) = call(app(tiny_index(), None), get("/complete?q=%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn doc_lookup_and_not_found() {
    let (status, body) = call(app(tiny_index(), None), get("/doc/2")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["text"], "Ottilie Bauer");

    let (status, _) = call(app(tiny_index(), None), get("/doc/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn clean_requires_the_admin_token() {
    let store = tiny_index();
    let post = |token: Option<&str>| {
        let mut req = Request::post("/admin/clean");
        if let Some(t) = token {
            req = req.header("X-ADMIN-TOKEN", t);
        }
        req.body(Body::empty()).unwrap()
    };

    let (status, _) = call(app(store.clone(), None), post(Some("secret"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(app(store.clone(), Some("secret")), post(Some("wrong"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(store.exists("acd.dcs").unwrap());

    let (status, body) = call(app(store.clone(), Some("secret")), post(Some("secret"))).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["documents_removed"], true);
    assert!(!store.exists("acd.dcs").unwrap());
}
