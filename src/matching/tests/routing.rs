use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::matching::router;
use crate::matching::service::MatchService;

#[tokio::test]
async fn submit_route_returns_partition_for_valid_payload() {
    let (service, _) = build_service();
    let app = router_with_service(service);

    let payload = json!({
        "locale": "fr-FR",
        "profile": { "age": 60, "diabetic": false, "cardiac_history": true }
    });

    let response = app
        .oneshot(
            axum::http::Request::post("/api/v1/matches")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&payload).expect("payload encodes"),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert!(body.get("submission_id").is_some());
    assert_eq!(
        body.get("matches")
            .and_then(|matches| matches.as_array())
            .map(|matches| matches.len()),
        Some(2)
    );
    assert_eq!(
        body.get("exclusions")
            .and_then(|exclusions| exclusions.as_array())
            .map(|exclusions| exclusions.len()),
        Some(1)
    );
}

#[tokio::test]
async fn submit_handler_rejects_malformed_locale() {
    let (service, _) = build_service();
    let service = Arc::new(service);

    let response =
        router::submit_handler(State(service), axum::Json(request("english"))).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body
        .get("error")
        .and_then(|error| error.as_str())
        .unwrap_or_default()
        .contains("locale"));
}

#[tokio::test]
async fn submit_handler_rejects_mistyped_answers() {
    let (service, _) = build_service();
    let service = Arc::new(service);

    let mut bad = request("fr-FR");
    bad.profile = bad.profile.with_answer(
        "age",
        crate::matching::domain::AnswerValue::Text("sixty".to_string()),
    );

    let response = router::submit_handler(State(service), axum::Json(bad)).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn submit_handler_maps_store_outage_to_internal_error() {
    let service = Arc::new(MatchService::new(
        Arc::new(catalog()),
        engine(),
        Arc::new(UnavailableRepository),
    ));

    let response =
        router::submit_handler(State(service), axum::Json(request("fr-FR"))).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn status_route_returns_view_for_stored_submission() {
    let (service, _) = build_service();
    let service = Arc::new(service);
    let record = service.submit(request("fr-FR")).expect("submission succeeds");

    let response = router::status_handler(
        State(service),
        axum::extract::Path(record.submission_id.0.clone()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(
        body.get("submission_id").and_then(|id| id.as_str()),
        Some(record.submission_id.0.as_str())
    );
    assert_eq!(body.get("status"), Some(&json!("complete")));
    assert_eq!(body.get("matched"), Some(&json!(2)));
    assert_eq!(body.get("excluded"), Some(&json!(1)));
}

#[tokio::test]
async fn status_route_returns_not_found_for_unknown_submission() {
    let (service, _) = build_service();
    let app = router_with_service(service);

    let response = app
        .oneshot(
            axum::http::Request::get("/api/v1/matches/sub-999999")
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
