use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod auth;
pub mod docs;
mod extract;
pub mod health;
pub mod participant;
pub mod public;
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(public::router())
        .merge(auth::router())
        .merge(participant::router())
        .merge(admin::router(state.clone()));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use futures::StreamExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        dao::models::Role,
        test_support::{memory_state, seed_account},
    };

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn login(app: &Router, username: &str, password: &str) -> String {
        let (status, body) = send(
            app.clone(),
            post_json(
                "/auth/login",
                None,
                json!({ "username": username, "password": password }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn admin_routes_require_admin_session() {
        let (state, store) = memory_state().await;
        seed_account(&store, "admin_1", "admin-pass", Role::Admin, None).await;
        seed_account(&store, "judge_1", "judge-pass", Role::Judge, None).await;
        let app = router(state);

        let (status, _) = send(
            app.clone(),
            post_json("/admin/contest/start", None, json!({ "durationHours": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let judge = login(&app, "judge_1", "judge-pass").await;
        let (status, _) = send(
            app.clone(),
            post_json(
                "/admin/contest/start",
                Some(&judge),
                json!({ "durationHours": 2 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let admin = login(&app, "admin_1", "admin-pass").await;
        let (status, body) = send(
            app.clone(),
            post_json(
                "/admin/contest/start",
                Some(&admin),
                json!({ "durationHours": 2 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "RUNNING");

        let (status, _) = send(
            app,
            post_json(
                "/admin/contest/start",
                Some(&admin),
                json!({ "durationHours": 2 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn public_routes_serve_status_and_leaderboard() {
        let (state, _store) = memory_state().await;
        let app = router(state);

        let (status, body) = send(
            app.clone(),
            Request::get("/contest/status").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "PENDING");
        assert!(body["startTime"].is_null());
        assert!(body["serverTime"].is_string());

        let (status, body) = send(
            app.clone(),
            Request::get("/leaderboard").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["isFrozen"], false);
        assert_eq!(body["meta"]["limit"], 5);

        let (status, body) = send(
            app,
            Request::get("/leaderboard?page=0").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn draw_route_reports_exhaustion_as_success() {
        let (state, store) = memory_state().await;
        seed_account(&store, "admin_1", "admin-pass", Role::Admin, None).await;
        let team = crate::test_support::seed_team(&store, "Otters", 0).await;
        let app = router(state);
        let admin = login(&app, "admin_1", "admin-pass").await;

        send(
            app.clone(),
            post_json(
                "/admin/contest/start",
                Some(&admin),
                json!({ "durationHours": 1 }),
            ),
        )
        .await;

        let (status, body) = send(
            app.clone(),
            post_json("/draw", Some(&admin), json!({ "teamId": team.id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "exhausted": true }));

        let (status, _) = send(
            app,
            post_json("/draw", Some(&admin), json!({ "teamId": "garbage" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_query_gets_json_error_body() {
        let (state, _store) = memory_state().await;
        let app = router(state);

        let (status, body) = send(
            app,
            Request::get("/leaderboard?page=abc").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().starts_with("bad request"));
    }

    #[tokio::test]
    async fn contest_stream_opens_with_handshake() {
        let (state, _store) = memory_state().await;
        let app = router(state);

        let response = app
            .oneshot(Request::get("/sse/contest").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );

        let mut frames = response.into_body().into_data_stream();
        let first = frames.next().await.unwrap().unwrap();
        let text = String::from_utf8(first.to_vec()).unwrap();
        assert!(text.contains("event: handshake"));
        assert!(text.contains("\"degraded\":false"));
    }
}
