//! In-process mock of the DataFileUtil and auth services

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, TRANSFER_ENCODING};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use datafileutil_client::{AuthToken, ClientConfig, DataFileUtilClient};
use datafileutil_rpc::{Method, RpcResponse, ServerError};
use serde_json::{json, Value};

pub const GOOD_TOKEN: &str = "good-token";
pub const TEST_USER: &str = "tester";
pub const TEST_PASSWORD: &str = "hunter2";

pub type Reply = (StatusCode, String);
type Responder = Box<dyn Fn(&Value) -> Reply + Send + Sync>;

/// One request as the mock service saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub authorization: Option<String>,
    pub chunked: bool,
    pub body: Value,
}

struct MockState {
    responder: Responder,
    delay: Option<Duration>,
    requests: Mutex<Vec<Recorded>>,
}

pub struct MockService {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockService {
    pub async fn start(responder: impl Fn(&Value) -> Reply + Send + Sync + 'static) -> Self {
        Self::start_with_delay(None, responder).await
    }

    pub async fn start_with_delay(
        delay: Option<Duration>,
        responder: impl Fn(&Value) -> Reply + Send + Sync + 'static,
    ) -> Self {
        let state = Arc::new(MockState {
            responder: Box::new(responder),
            delay,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/", post(rpc))
            .route("/auth/api/V2/token", get(token))
            .route("/auth/api/legacy/KBase/Sessions/Login", post(login))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn auth_url(&self) -> String {
        format!("http://{}/auth/", self.addr)
    }

    /// Configuration pointing at this mock, plain http allowed
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.url())
            .unwrap()
            .with_auth_url(self.auth_url())
            .unwrap()
            .with_insecure_http(true)
    }

    /// A client holding a token the mock accepts
    pub async fn client(&self) -> DataFileUtilClient {
        let config = self.config().with_token(AuthToken::new(GOOD_TOKEN));
        DataFileUtilClient::with_config(config).await.unwrap()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests().pop().expect("no request reached the mock")
    }
}

async fn rpc(State(state): State<Arc<MockState>>, headers: HeaderMap, body: Bytes) -> impl axum::response::IntoResponse {
    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }

    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state.requests.lock().unwrap().push(Recorded {
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        chunked: headers.contains_key(TRANSFER_ENCODING),
        body: request.clone(),
    });

    let (status, reply) = (state.responder)(&request);
    (status, [(CONTENT_TYPE, "application/json")], reply)
}

async fn token(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(GOOD_TOKEN) => (StatusCode::OK, Json(json!({"user": TEST_USER, "type": "Login"}))),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"httpcode": 401, "message": "Invalid token"}})),
        ),
    }
}

async fn login(Form(form): Form<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    let user = form.get("user_id").map(String::as_str);
    let password = form.get("password").map(String::as_str);
    if user == Some(TEST_USER) && password == Some(TEST_PASSWORD) {
        (StatusCode::OK, Json(json!({"token": GOOD_TOKEN, "user_id": TEST_USER})))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad credentials"})))
    }
}

/// Successful envelope carrying `result`
pub fn ok(result: Vec<Value>) -> Reply {
    encode(StatusCode::OK, &RpcResponse::success(result))
}

/// Fault envelope, sent with HTTP 500 the way the service does
pub fn fault(code: i64, message: &str) -> Reply {
    let error = ServerError {
        code,
        name: "JSONRPCError".to_string(),
        message: message.to_string(),
        error: Some("Traceback (most recent call last):\n  ...".to_string()),
    };
    encode(StatusCode::INTERNAL_SERVER_ERROR, &RpcResponse::fault(error))
}

fn encode(status: StatusCode, response: &RpcResponse) -> Reply {
    (status, serde_json::to_string(response).unwrap())
}

/// Method named in a recorded request body
pub fn method_of(request: &Value) -> Option<Method> {
    request["method"].as_str().and_then(Method::from_name)
}
