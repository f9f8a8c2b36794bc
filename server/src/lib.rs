use std::{sync::Arc, time::Instant};

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Request},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::server_state::ServerState;

pub mod auth;
pub mod config;
pub mod core;
pub mod error;
pub mod guide;
pub mod routes;
pub mod server_state;
pub mod services;

/// Scanned images and journey photos come straight from phone cameras.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn app(state: Arc<ServerState>) -> Router {
    use routes::{auth, journeys, landmarks, narration, places, scan, trips};

    Router::new()
        .route("/", get(index))
        .route("/auth/login", get(auth::login))
        .route("/auth/login/callback", get(auth::callback))
        .route("/auth/user", get(auth::current_user))
        .route("/auth/verify-token", get(auth::verify_token))
        .route("/auth/logout", post(auth::logout))
        .route("/trips", get(trips::get_trips).post(trips::create_trip))
        .route("/trips/{trip_id}", get(trips::get_trip).put(trips::update_trip).delete(trips::delete_trip))
        .route("/trips/{trip_id}/complete", post(trips::complete_trip))
        .route("/journeys/history", get(journeys::history))
        .route("/journeys/history.gpx", get(journeys::history_gpx))
        .route("/journeys/{journey_id}", delete(journeys::delete_journey))
        .route("/journeys/{journey_id}/photos", post(journeys::upload_photos))
        .route("/journeys/{journey_id}/photos/{photo_id}", get(journeys::get_photo))
        .route("/detect_landmark/", post(scan::detect_landmark))
        .route("/generate_summary/", post(narration::generate_summary))
        .route("/download_audio/", get(narration::download_audio))
        .route("/api/ask", post(narration::ask))
        .route("/api/history", get(narration::history))
        .route("/nearby_places/", get(places::nearby_places))
        .route("/generate_map/", get(places::generate_map))
        .route("/landmarks", get(landmarks::list))
        .route("/landmarks/search", get(landmarks::search))
        .route("/landmarks/suggestions", get(landmarks::suggestions))
        .route("/landmarks/{slug}", get(landmarks::get_landmark))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors(&state.config.frontend_url))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn index() -> Json<Value> {
    Json(json!({ "message": "Tourism API is running" }))
}

fn cors(frontend_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(frontend_url) {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!("FRONTEND_URL {frontend_url:?} is not a valid origin, cross-origin requests will be refused");
            cors
        }
    }
}

async fn log_request(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::debug!("{} {} -> {} in {:?}", method, path, response.status(), started.elapsed());
    response
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Bytes},
        http::{header::LOCATION, Request, StatusCode},
    };
    use chrono::Utc;
    use histoury_data_management::DataManager;
    use histoury_lib::{
        language::Language,
        recognition::{resolve_label, RecognizedLandmark},
        user::{GoogleProfile, User},
    };
    use tempdir::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        auth::google::IdentityProvider,
        config::Config,
        services::{places::tests::FakePlaces, ChatMessage, ChatModel, LandmarkDetector, ServiceError, SpeechSynthesizer},
    };

    struct FakeIdentity;

    #[async_trait]
    impl IdentityProvider for FakeIdentity {
        async fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<String, ServiceError> {
            Ok(format!("https://accounts.example.com/auth?redirect_uri={redirect_uri}&state={state}"))
        }

        async fn exchange_code(&self, code: &str, _redirect_uri: &str) -> Result<GoogleProfile, ServiceError> {
            if code == "good-code" {
                Ok(profile("asha@example.com"))
            } else {
                Err(ServiceError::Upstream("invalid_grant".to_string()))
            }
        }
    }

    struct FakeDetector {
        source: &'static str,
        label: Option<&'static str>,
    }

    #[async_trait]
    impl LandmarkDetector for FakeDetector {
        fn source(&self) -> &'static str {
            self.source
        }

        async fn detect(&self, _image: &[u8]) -> Result<Option<RecognizedLandmark>, ServiceError> {
            Ok(self.label.and_then(resolve_label))
        }
    }

    struct BrokenDetector;

    #[async_trait]
    impl LandmarkDetector for BrokenDetector {
        fn source(&self) -> &'static str {
            "vision"
        }

        async fn detect(&self, _image: &[u8]) -> Result<Option<RecognizedLandmark>, ServiceError> {
            Err(ServiceError::Upstream("PERMISSION_DENIED".to_string()))
        }
    }

    /// Answers every request with `answer` and remembers what it was asked.
    struct FakeChat {
        answer: Option<&'static str>,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl FakeChat {
        fn answering(answer: &'static str) -> Self {
            Self { answer: Some(answer), requests: Mutex::new(Vec::new()) }
        }

        fn failing() -> Self {
            Self { answer: None, requests: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl ChatModel for FakeChat {
        async fn complete(&self, messages: &[ChatMessage], _max_tokens: u32) -> Result<String, ServiceError> {
            self.requests.lock().unwrap().push(messages.to_vec());
            self.answer
                .map(str::to_string)
                .ok_or(ServiceError::Upstream("rate limited".to_string()))
        }
    }

    struct FakeSpeech;

    #[async_trait]
    impl SpeechSynthesizer for FakeSpeech {
        async fn synthesize(&self, _text: &str, _language: Language) -> Result<Vec<u8>, ServiceError> {
            Ok(b"ID3-fake-mp3".to_vec())
        }
    }

    fn profile(email: &str) -> GoogleProfile {
        GoogleProfile {
            google_id: format!("google-{email}"),
            email: email.to_string(),
            display_name: "Asha".to_string(),
            profile_picture_url: "https://example.com/asha.png".to_string(),
        }
    }

    async fn test_state(dir: &TempDir) -> ServerState {
        let data_manager = DataManager::start_in_memory(dir.path().join("media")).await.unwrap();
        let mut state = ServerState::new(Config::for_tests(dir.path().to_path_buf()), data_manager).unwrap();

        state.identity = Box::new(FakeIdentity);
        state.detectors = vec![
            Box::new(BrokenDetector) as Box<dyn LandmarkDetector>,
            Box::new(FakeDetector { source: "model", label: Some("tajmahal") }),
        ];
        state.chat = Box::new(FakeChat::answering("The Taj Mahal was commissioned in 1632."));
        state.speech = Box::new(FakeSpeech);
        state.places = Box::new(FakePlaces);
        state
    }

    async fn signed_in(state: &ServerState, email: &str) -> (User, String) {
        let user = state.data_manager.upsert_user(&profile(email)).await.unwrap();
        let token = state.tokens.issue(&user, Utc::now());
        (user, token)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, to_bytes(response.into_body(), usize::MAX).await.unwrap())
    }

    fn json_body(bytes: &Bytes) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(uri).header("host", "localhost:5000");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn with_json(method: Method, uri: &str, token: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart(uri: &str, token: Option<&str>, parts: &[(&str, &str, &str, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (field, file_name, content_type, bytes) in parts {
            body.extend_from_slice(format!(
                "--BOUNDARY\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            ).as_bytes());
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(b"--BOUNDARY--\r\n");

        let mut builder = Request::post(uri).header(CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn index_reports_running() {
        let dir = TempDir::new("histoury").unwrap();
        let app = app(Arc::new(test_state(&dir).await));

        let (status, body) = send(&app, get("/", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["message"], "Tourism API is running");
    }

    #[tokio::test]
    async fn bearer_token_is_required() {
        let dir = TempDir::new("histoury").unwrap();
        let state = Arc::new(test_state(&dir).await);
        let app = app(state.clone());

        let (status, body) = send(&app, get("/trips", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(&body)["message"], "Token is missing");

        let (status, body) = send(&app, get("/trips", Some("not.a.token"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(&body)["message"], "Invalid token");

        let (mut ghost, _) = signed_in(&state, "ghost@example.com").await;
        ghost.user_id = "no-such-user".to_string();
        let ghost_token = state.tokens.issue(&ghost, Utc::now());
        let (status, body) = send(&app, get("/auth/user", Some(&ghost_token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(&body)["message"], "User not found");

        let (user, token) = signed_in(&state, "asha@example.com").await;
        let (status, body) = send(&app, get("/auth/verify-token", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert_eq!(body["valid"], true);
        assert_eq!(body["user"]["user_id"], user.user_id.as_str());
    }

    #[tokio::test]
    async fn login_round_trip() {
        let dir = TempDir::new("histoury").unwrap();
        let state = Arc::new(test_state(&dir).await);
        let app = app(state.clone());

        let response = app.clone().oneshot(get("/auth/login", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = response.headers()[LOCATION].to_str().unwrap().to_string();
        assert!(location.contains("redirect_uri=http://localhost:5000/auth/login/callback"));
        let login_state = location.rsplit("state=").next().unwrap().to_string();

        let callback = format!("/auth/login/callback?code=good-code&state={login_state}");
        let response = app.clone().oneshot(get(&callback, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        let location = response.headers()[LOCATION].to_str().unwrap().to_string();
        let token = location.strip_prefix("http://localhost:3000/auth/callback?token=").unwrap();

        let claims = state.tokens.verify(token, Utc::now()).unwrap();
        assert_eq!(claims.email, "asha@example.com");

        // The state was spent by the first callback
        let response = app.clone().oneshot(get(&callback, None)).await.unwrap();
        assert_eq!(response.headers()[LOCATION], "http://localhost:3000/login?error=auth_failed");
    }

    #[tokio::test]
    async fn failed_code_exchange_redirects_to_login() {
        let dir = TempDir::new("histoury").unwrap();
        let state = Arc::new(test_state(&dir).await);
        let app = app(state.clone());

        let login_state = state.pending_logins.issue(Utc::now()).await;
        let response = app.oneshot(get(&format!("/auth/login/callback?code=bad&state={login_state}"), None)).await.unwrap();
        assert_eq!(response.headers()[LOCATION], "http://localhost:3000/login?error=auth_failed");
    }

    #[tokio::test]
    async fn trip_lifecycle() {
        let dir = TempDir::new("histoury").unwrap();
        let state = Arc::new(test_state(&dir).await);
        let app = app(state.clone());
        let (_, token) = signed_in(&state, "asha@example.com").await;

        let (status, body) = send(&app, with_json(Method::POST, "/trips", &token, json!({ "lat": 27.17, "lng": 78.04 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&body)["message"], "Missing required fields: description, place_name");

        let (status, body) = send(&app, with_json(Method::POST, "/trips", &token, json!({
            "lat": 27.1751,
            "lng": 78.0421,
            "description": "Sunrise visit",
            "place_name": "Taj Mahal",
            "start_date": "2025-02-01T06:00:00Z",
            "end_date": "2025-02-02T06:00:00Z",
        }))).await;
        assert_eq!(status, StatusCode::OK);
        let trip_id = json_body(&body)["trip_id"].as_str().unwrap().to_string();

        let (_, body) = send(&app, get("/trips", Some(&token))).await;
        assert_eq!(json_body(&body).as_array().unwrap().len(), 1);

        let uri = format!("/trips/{trip_id}");
        let (status, body) = send(&app, with_json(Method::PUT, &uri, &token, json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json_body(&body)["updated_at"].is_null());

        let (status, body) = send(&app, with_json(Method::PUT, &uri, &token, json!({ "description": "Moonlight visit" }))).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert_eq!(body["description"], "Moonlight visit");
        assert!(!body["updated_at"].is_null());

        let (status, _) = send(&app, with_json(Method::PUT, &uri, &token, json!({ "end_date": "2025-01-01T00:00:00Z" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, with_json(Method::PUT, &uri, &token, json!({ "end_date": null }))).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert!(body["end_date"].is_null());
        assert!(!body["updated_at"].is_null());

        let (_, body) = send(&app, get(&uri, Some(&token))).await;
        assert!(json_body(&body)["end_date"].is_null());

        let (status, body) = send(&app, with_json(Method::POST, &format!("{uri}/complete"), &token, json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert_eq!(body["message"], "Trip marked as completed and moved to journeys");
        let journey_id = body["journey_id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, get(&uri, Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(&body)["message"], "Trip not found or does not belong to user");

        let (_, body) = send(&app, get("/journeys/history", Some(&token))).await;
        let journeys = json_body(&body);
        assert_eq!(journeys.as_array().unwrap().len(), 1);
        assert_eq!(journeys[0]["journey_id"], journey_id.as_str());
        assert_eq!(journeys[0]["description"], "Moonlight visit");

        let (status, body) = send(&app, get("/journeys/history.gpx", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body.to_vec()).unwrap().contains("<name>Taj Mahal</name>"));

        let request = Request::delete(format!("/journeys/{journey_id}"))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, get("/journeys/history", Some(&token))).await;
        assert!(json_body(&body).as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn trips_are_private() {
        let dir = TempDir::new("histoury").unwrap();
        let state = Arc::new(test_state(&dir).await);
        let app = app(state.clone());
        let (_, owner) = signed_in(&state, "asha@example.com").await;
        let (_, other) = signed_in(&state, "ravi@example.com").await;

        let (_, body) = send(&app, with_json(Method::POST, "/trips", &owner, json!({
            "lat": 12.3052, "lng": 76.6552, "description": "Dasara", "place_name": "Mysore Palace",
        }))).await;
        let trip_id = json_body(&body)["trip_id"].as_str().unwrap().to_string();

        let (status, _) = send(&app, get(&format!("/trips/{trip_id}"), Some(&other))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let request = Request::delete(format!("/trips/{trip_id}"))
            .header(AUTHORIZATION, format!("Bearer {other}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&app, get("/trips", Some(&other))).await;
        assert!(json_body(&body).as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn journey_photos() {
        let dir = TempDir::new("histoury").unwrap();
        let state = Arc::new(test_state(&dir).await);
        let app = app(state.clone());
        let (user, token) = signed_in(&state, "asha@example.com").await;

        let (_, body) = send(&app, with_json(Method::POST, "/trips", &token, json!({
            "lat": 26.9239, "lng": 75.8267, "description": "Pink city", "place_name": "Hawa Mahal",
        }))).await;
        let trip_id = json_body(&body)["trip_id"].as_str().unwrap().to_string();
        let journey = state.data_manager.complete_trip(&user.user_id, &trip_id).await.unwrap();
        let photos_uri = format!("/journeys/{}/photos", journey.journey_id);

        let (status, _) = send(&app, multipart(&photos_uri, Some(&token), &[("photo", "notes.txt", "text/plain", b"hello")])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // A valid photo next to a rejected one attaches nothing
        let (status, body) = send(&app, multipart(&photos_uri, Some(&token), &[
            ("photo", "front.png", "image/png", b"PNG-front"),
            ("photo", "logo.svg", "image/svg+xml", b"<svg/>"),
        ])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&body)["message"], "logo.svg is not a supported image");
        assert!(state.data_manager.get_journey(&user.user_id, &journey.journey_id).await.unwrap().photos.is_empty());

        let (status, body) = send(&app, multipart(&photos_uri, Some(&token), &[
            ("photo", "front.png", "image/png", b"PNG-front"),
            ("photo", "side.jpg", "image/jpeg", b"JPG-side"),
        ])).await;
        assert_eq!(status, StatusCode::OK);
        let stored = json_body(&body);
        assert_eq!(stored.as_array().unwrap().len(), 2);
        let url = stored[0]["url"].as_str().unwrap().to_string();

        let response = app.clone().oneshot(get(&url, Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "image/png");
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(to_bytes(response.into_body(), usize::MAX).await.unwrap(), &b"PNG-front"[..]);

        let (_, other) = signed_in(&state, "ravi@example.com").await;
        let (status, _) = send(&app, get(&url, Some(&other))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&app, get("/journeys/history", Some(&token))).await;
        assert_eq!(json_body(&body)[0]["photos"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn detection_falls_through_to_next_detector() {
        let dir = TempDir::new("histoury").unwrap();
        let app = app(Arc::new(test_state(&dir).await));

        let (status, body) = send(&app, multipart("/detect_landmark/", None, &[("image", "taj.jpg", "image/jpeg", b"JPEG")])).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert_eq!(body["name"], "Taj Mahal");
        assert_eq!(body["lat"], 27.1751);
        assert_eq!(body["source"], "model");
        assert_eq!(body["slug"], "taj-mahal");

        assert!(dir.path().join("media").join("uploads").read_dir().unwrap().next().is_some());
    }

    #[tokio::test]
    async fn unrecognized_images_are_not_found() {
        let dir = TempDir::new("histoury").unwrap();
        let mut state = test_state(&dir).await;
        state.detectors = vec![Box::new(FakeDetector { source: "model", label: Some("not a landmark") }) as Box<dyn LandmarkDetector>];
        let app = app(Arc::new(state));

        let (status, body) = send(&app, multipart("/detect_landmark/", None, &[("image", "cat.jpg", "image/jpeg", b"JPEG")])).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(&body)["message"], "Landmark not recognized");

        let (status, _) = send(&app, multipart("/detect_landmark/", None, &[("other", "cat.jpg", "image/jpeg", b"JPEG")])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn summary_is_narrated_and_downloadable() {
        let dir = TempDir::new("histoury").unwrap();
        let app = app(Arc::new(test_state(&dir).await));

        let request = Request::post("/generate_summary/")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("landmark=Taj+Mahal&language=hi"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert_eq!(body["summary"], "The Taj Mahal was commissioned in 1632.");
        assert_eq!(body["audio_file"], "summary_taj-mahal_hi.mp3");

        let response = app.clone().oneshot(get("/download_audio/?path=../../summary_taj-mahal_hi.mp3", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "audio/mpeg");
        assert_eq!(to_bytes(response.into_body(), usize::MAX).await.unwrap(), &b"ID3-fake-mp3"[..]);

        let (status, _) = send(&app, get("/download_audio/?path=missing.mp3", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, get("/download_audio/?path=..", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn summary_rejects_unknown_language_and_reports_model_failure() {
        let dir = TempDir::new("histoury").unwrap();
        let mut state = test_state(&dir).await;
        state.chat = Box::new(FakeChat::failing());
        let app = app(Arc::new(state));

        let form = |body: &'static str| Request::post("/generate_summary/")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send(&app, form("landmark=Taj+Mahal&language=fr")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&body)["message"], "Unsupported language: fr");

        let (status, _) = send(&app, form("language=en")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, form("landmark=Taj+Mahal")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn guide_answers_with_context() {
        let dir = TempDir::new("histoury").unwrap();
        let chat = Arc::new(FakeChat::answering("It took about 22 years."));

        struct SharedChat(Arc<FakeChat>);

        #[async_trait]
        impl ChatModel for SharedChat {
            async fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String, ServiceError> {
                self.0.complete(messages, max_tokens).await
            }
        }

        let mut state = test_state(&dir).await;
        state.chat = Box::new(SharedChat(chat.clone()));
        let app = app(Arc::new(state));

        let ask = |prompt: &str, language: &str| Request::post("/api/ask")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "prompt": prompt, "language": language }).to_string()))
            .unwrap();

        let (status, body) = send(&app, ask("How long did the Taj Mahal take to build?", "kn")).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert_eq!(body["text"], "It took about 22 years.");
        let audio_url = body["audio_url"].as_str().unwrap();
        assert!(audio_url.starts_with("/download_audio/?path="));
        assert!(audio_url.ends_with("_kn.mp3"));

        let (status, _) = send(&app, get(audio_url, None)).await;
        assert_eq!(status, StatusCode::OK);

        send(&app, ask("Who designed it?", "en")).await;
        {
            let requests = chat.requests.lock().unwrap();
            assert_eq!(requests.len(), 2);
            assert!(requests[1][1].content.contains("How long did the Taj Mahal take to build?"));
        }

        let (_, body) = send(&app, get("/api/history", None)).await;
        let history = json_body(&body);
        assert_eq!(history.as_array().unwrap().len(), 2);
        assert_eq!(history[0]["language"], "kn");
        assert_eq!(history[1]["prompt"], "Who designed it?");

        let (status, _) = send(&app, ask("Bonjour", "fr")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn guide_failure_is_reported_in_band() {
        let dir = TempDir::new("histoury").unwrap();
        let mut state = test_state(&dir).await;
        state.chat = Box::new(FakeChat::failing());
        let app = app(Arc::new(state));

        let request = Request::post("/api/ask")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"prompt": "Hello", "language": "ta"}"#))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert_eq!(body["text"], "Error: rate limited");
        assert!(body["audio_url"].is_null());

        let (_, body) = send(&app, get("/api/history", None)).await;
        assert!(json_body(&body).as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn nearby_places_and_map() {
        let dir = TempDir::new("histoury").unwrap();
        let app = app(Arc::new(test_state(&dir).await));

        let (status, body) = send(&app, get("/nearby_places/?lat=22.5448&lng=88.3426", None)).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_body(&body);
        assert_eq!(body["landmark_location"]["lat"], 22.5448);
        let places = body["nearby_places"].as_array().unwrap();
        assert_eq!(places.len(), 7);
        assert_eq!(places[0]["type"], "atm");
        assert!(places[0]["route_url"].as_str().unwrap().contains("travelmode=transit"));

        let response = app.clone().oneshot(get("/generate_map/?lat=22.5448&lng=88.3426&radius=500", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        let html = String::from_utf8(to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap();
        assert!(html.contains("You are here"));
        assert!(html.contains("&lt;near&gt;"));

        let (status, _) = send(&app, get("/nearby_places/?lat=95&lng=88.3426", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, get("/nearby_places/?lat=abc&lng=88.3426", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn landmark_catalog() {
        let dir = TempDir::new("histoury").unwrap();
        let app = app(Arc::new(test_state(&dir).await));

        let (_, body) = send(&app, get("/landmarks", None)).await;
        assert_eq!(json_body(&body).as_array().unwrap().len(), 12);

        let (_, body) = send(&app, get("/landmarks/search?q=temple", None)).await;
        let results = json_body(&body);
        let slugs: Vec<&str> = results.as_array().unwrap().iter().map(|r| r["slug"].as_str().unwrap()).collect();
        assert_eq!(slugs, ["sun-temple", "golden-temple", "meenakshi-temple", "khajuraho-temples"]);
        assert!(results[0]["excerpt"].as_str().unwrap().chars().count() <= 83);

        let (_, body) = send(&app, get("/landmarks/search?q=ta", None)).await;
        assert!(json_body(&body).as_array().unwrap().is_empty());

        let (_, body) = send(&app, get("/landmarks/suggestions", None)).await;
        assert_eq!(json_body(&body)[2]["name"], "Hawa Mahal");

        let (status, body) = send(&app, get("/landmarks/hawa-mahal", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["location"], "Jaipur, Rajasthan");

        let (status, _) = send(&app, get("/landmarks/atlantis", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn logout_acknowledges() {
        let dir = TempDir::new("histoury").unwrap();
        let app = app(Arc::new(test_state(&dir).await));

        let request = Request::post("/auth/logout").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body)["message"], "Logged out successfully");
    }
}
