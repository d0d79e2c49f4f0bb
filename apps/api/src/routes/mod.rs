pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::scoring::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/fit-score", post(handlers::handle_fit_score))
        .route(
            "/api/v1/fit-score/batch",
            post(handlers::handle_fit_score_batch),
        )
        .route("/api/v1/skills", get(handlers::handle_get_skills))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::embedding::testing::{unreachable_loader, LetterEmbedder};
    use crate::embedding::{Embedder, EmbeddingError, EmbeddingProvider};
    use crate::scoring::fit::FitScorer;
    use crate::scoring::skill_library::SkillLibrary;

    fn test_config() -> Config {
        Config {
            port: 0,
            rust_log: "info".to_string(),
            skills_path: "skills.json".into(),
            embedding_model_path: "missing-model".into(),
            embedding_model_id: "intfloat/e5-base-v2".to_string(),
            embedding_onnx_file: "onnx/model.onnx".to_string(),
            model_hub_url: "http://127.0.0.1:9".to_string(),
            model_hub_max_retries: 1,
            inference_timeout: Duration::from_secs(10),
            preload_embedding_model: false,
        }
    }

    fn test_state(provider: EmbeddingProvider) -> AppState {
        AppState {
            config: test_config(),
            scorer: Arc::new(FitScorer::new(Arc::new(SkillLibrary::default()))),
            embeddings: Arc::new(provider),
        }
    }

    fn app_with_letters() -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let embedder: Arc<dyn Embedder> = Arc::new(LetterEmbedder);
        let provider = EmbeddingProvider::preloaded(unreachable_loader(dir.path()), embedder);
        (build_router(test_state(provider)), dir)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = app_with_letters();
        let (status, body) = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["embedding_model"], "loaded");
    }

    #[tokio::test]
    async fn test_get_skills_returns_loaded_library() {
        let (app, _dir) = app_with_letters();
        let (status, body) =
            send(app, Request::get("/api/v1/skills").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"python": ["django", "flask", "pytorch"], "sql": ["postgresql", "mysql"]})
        );
    }

    #[tokio::test]
    async fn test_fit_score_single() {
        let (app, _dir) = app_with_letters();
        let request = post_json(
            "/api/v1/fit-score",
            json!({
                "resume_text": "Flask services on PostgreSQL for 4 years",
                "jd_text": "Python and SQL required\nAt least 5 years"
            }),
        );
        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::OK);
        let details = &body["details"];
        assert_eq!(details["matched_skills"], json!(["python", "sql"]));
        assert_eq!(details["missing_skills"], json!([]));
        assert_eq!(details["experience"]["required"], 5.0);
        assert_eq!(details["experience"]["found"], 4.0);
        assert_eq!(details["experience"]["score"], 85.0);
        assert!(body["overall_score"].is_number());
    }

    #[tokio::test]
    async fn test_fit_score_accepts_empty_texts() {
        let (app, _dir) = app_with_letters();
        let request = post_json("/api/v1/fit-score", json!({"resume_text": "", "jd_text": ""}));
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["overall_score"], 60.0);
    }

    #[tokio::test]
    async fn test_fit_score_rejects_malformed_body() {
        let (app, _dir) = app_with_letters();
        let request = post_json("/api/v1/fit-score", json!({"resume_text": "only one field"}));
        let (status, _) = send(app, request).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_batch_keys_in_order() {
        let (app, _dir) = app_with_letters();
        let request = post_json(
            "/api/v1/fit-score/batch",
            json!({
                "resumes": ["Python, MySQL", "Java"],
                "jd_text": "Must have Python and SQL"
            }),
        );
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();

        let body: Value = serde_json::from_str(&text).unwrap();
        let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
        assert!(text.find("\"resume_1\"").unwrap() < text.find("\"resume_2\"").unwrap());
        assert_eq!(body["resume_1"]["details"]["missing_skills"], json!([]));
        assert_eq!(
            body["resume_2"]["details"]["missing_skills"],
            json!(["python", "sql"])
        );
        assert_eq!(body["resume_2"]["details"]["matched_skills"], json!([]));
    }

    #[tokio::test]
    async fn test_unavailable_model_is_503() {
        let dir = tempfile::tempdir().unwrap();
        let provider = EmbeddingProvider::new(unreachable_loader(dir.path()));
        let app = build_router(test_state(provider));

        let request = post_json(
            "/api/v1/fit-score",
            json!({"resume_text": "Python", "jd_text": "Python required"}),
        );
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "MODEL_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_skills_available_without_model() {
        let dir = tempfile::tempdir().unwrap();
        let provider = EmbeddingProvider::new(unreachable_loader(dir.path()));
        let app = build_router(test_state(provider));

        let (status, _) =
            send(app.clone(), Request::get("/api/v1/skills").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(body["embedding_model"], "not_loaded");
    }

    /// Sleeps on every call, like a real model busy with inference.
    struct SlowEmbedder(Duration);

    impl Embedder for SlowEmbedder {
        fn name(&self) -> &str {
            "slow"
        }

        fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            std::thread::sleep(self.0);
            LetterEmbedder.embed(texts)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_do_not_queue_behind_one_model() {
        // Each request embeds twice: 8 requests run back to back would need ~2.4s.
        let dir = tempfile::tempdir().unwrap();
        let embedder: Arc<dyn Embedder> = Arc::new(SlowEmbedder(Duration::from_millis(150)));
        let mut state = test_state(EmbeddingProvider::preloaded(
            unreachable_loader(dir.path()),
            embedder,
        ));
        state.config.inference_timeout = Duration::from_secs(1);
        let app = build_router(state);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let app = app.clone();
                let request = post_json(
                    "/api/v1/fit-score",
                    json!({"resume_text": format!("resume {i}"), "jd_text": "Python required"}),
                );
                tokio::spawn(async move { send(app, request).await })
            })
            .collect();

        for handle in handles {
            let (status, body) = handle.await.unwrap();
            assert_eq!(status, StatusCode::OK, "body: {body}");
        }
    }
}
