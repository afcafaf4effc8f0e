use std::sync::Arc;

use axum::{response::Response, http::{Request, request::Builder}, body::Body};
use golf_admin_entities::mock::{self, MockFederation, MockOption};
use golf_admin_server::mail::RecordingMailer;
use golf_admin_server::state::AppState;
use http_body::Body as _;
use sea_orm::DatabaseConnection;
use tower::Service;


pub struct FixtureOptions {
    pub mock_federation: bool,
    pub mock_options: MockOption,
    pub failing_addresses: Vec<String>,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        FixtureOptions {
            mock_federation: true,
            mock_options: MockOption {
                deterministic_uuids: true,
                ..Default::default()
            },
            failing_addresses: vec![],
        }
    }
}

pub struct Fixture {
    pub app: axum::Router,
    pub db: DatabaseConnection,
    pub mailer: Arc<RecordingMailer>,
    pub mock: Option<MockFederation>,
}

pub struct APIResponse {
    response: Response,
}

impl APIResponse {
    pub fn status(&self) -> axum::http::StatusCode {
        self.response.status()
    }

    #[allow(dead_code)]
    pub fn header(&self, name: &str) -> Option<String> {
        self.response.headers().get(name).and_then(|v| v.to_str().ok()).map(|v| v.to_string())
    }

    async fn bytes(&mut self) -> Vec<u8> {
        let mut buf = Vec::new();

        let body = self.response.body_mut();

        while let Some(next) = body.data().await {
            buf.extend_from_slice(&next.unwrap());
        }
        buf
    }

    #[allow(dead_code)]
    pub async fn json<T: serde::de::DeserializeOwned>(&mut self) -> T {
        let buf = self.bytes().await;
        serde_json::from_slice(&buf).unwrap_or_else(|e| panic!("Invalid response body {}: {}", String::from_utf8_lossy(&buf), e))
    }

    #[allow(dead_code)]
    pub async fn text(&mut self) -> String {
        String::from_utf8(self.bytes().await).unwrap()
    }
}

impl From<Response> for APIResponse {
    fn from(response: Response) -> Self {
        Self {
            response,
        }
    }
}

impl Fixture {
    pub async fn new(options: FixtureOptions) -> Self {
        let mailer = Arc::new(RecordingMailer::failing_for(options.failing_addresses));
        let state = AppState::new_test_app_with_mailer(mailer.clone()).await;
        let mock = if options.mock_federation {
            Some(mock::make_mock_federation_with_options(&state.db, options.mock_options).await.unwrap())
        }
        else {
            None
        };
        let db = state.db.clone();

        Self {
            app: golf_admin_server::app_with_state(state).await,
            db,
            mailer,
            mock,
        }
    }

    #[allow(dead_code)]
    pub async fn default() -> Self {
        Self::new(FixtureOptions::default()).await
    }

    #[allow(dead_code)]
    pub async fn empty() -> Self {
        Self::new(FixtureOptions { mock_federation: false, ..Default::default() }).await
    }

    #[allow(dead_code)]
    pub fn mock(&self) -> &MockFederation {
        self.mock.as_ref().expect("Fixture was created without mock data")
    }

    fn get_base_request(&self) -> Builder {
        Request::builder()
    }

    async fn send(&mut self, request: Request<Body>) -> APIResponse {
        self.app
            .call(request)
            .await
            .unwrap().into()
    }

    #[allow(dead_code)]
    pub async fn get(&mut self, path: &str) -> APIResponse {
        let request = self.get_base_request()
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn delete(&mut self, path: &str) -> APIResponse {
        let request = self.get_base_request()
            .method("DELETE")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn post_json_no_body(&mut self, path: &str) -> APIResponse {
        let request = self.get_base_request()
            .method("POST")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn post_json<T>(&mut self, path: &str, body: T) -> APIResponse where T: serde::Serialize {
        self.send_json("POST", path, body).await
    }

    #[allow(dead_code)]
    pub async fn put_json<T>(&mut self, path: &str, body: T) -> APIResponse where T: serde::Serialize {
        self.send_json("PUT", path, body).await
    }

    async fn send_json<T>(&mut self, method: &str, path: &str, body: T) -> APIResponse where T: serde::Serialize {
        let request = self.get_base_request()
            .method(method)
            .header("Content-Type", "application/json")
            .uri(path)
            .body(
                Body::from(
                    serde_json::to_string(&body).unwrap()
                )
            )
            .unwrap();
        self.send(request).await
    }
}
