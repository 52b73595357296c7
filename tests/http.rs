use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use reqwest::{redirect::Policy, Client};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::sleep;

// ---------------------------------------------------------------------------
// Mock of the remote admin API
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Remote {
    revenue_fails: AtomicBool,
    token_revoked: AtomicBool,
    users: Mutex<Vec<Value>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl Remote {
    fn record(&self, path: &str, body: &Value) {
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), body.clone()));
    }

    fn requests_to(&self, path: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn authorized(&self, body: &Value) -> bool {
        body["adminToken"] == "T1" && !self.token_revoked.load(Ordering::SeqCst)
    }
}

async fn remote_login(State(remote): State<Arc<Remote>>, Json(body): Json<Value>) -> Response {
    remote.record("login", &body);
    if body["email"] == "a@x.com" && body["password"] == "pw" {
        Json(json!({ "token": "T1", "userName": "Admin" })).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid" }))).into_response()
    }
}

async fn remote_revenue(State(remote): State<Arc<Remote>>, Json(body): Json<Value>) -> Response {
    remote.record("revenue", &body);
    if !remote.authorized(&body) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if remote.revenue_fails.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({
        "totalRevenue": 1500,
        "totalUsers": 2,
        "monthlyRevenue": [
            { "month": "Jan", "totalRevenue": 600 },
            { "month": "Feb", "totalRevenue": 900 }
        ]
    }))
    .into_response()
}

async fn remote_users(State(remote): State<Arc<Remote>>, Json(body): Json<Value>) -> Response {
    remote.record("users", &body);
    if !remote.authorized(&body) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let users = remote.users.lock().unwrap().clone();
    Json(json!({ "users": users })).into_response()
}

async fn remote_user_details(
    State(remote): State<Arc<Remote>>,
    Json(body): Json<Value>,
) -> Response {
    remote.record("details", &body);
    if !remote.authorized(&body) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let name = match body["userId"].as_str() {
        Some("u1") => "Asha Verma",
        Some("u2") => "Ravi Kumar",
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    let user_id = body["userId"].clone();
    Json(json!({
        "userId": user_id,
        "name": name,
        "email": format!("{}@x.com", user_id.as_str().unwrap_or_default()),
        "credits": 40,
        "totalPayments": 998,
        "payments": [{
            "_id": "p1",
            "userId": user_id,
            "orderId": "order_1",
            "paymentId": "pay_1",
            "amount": 499,
            "createdAt": "2025-03-14T12:00:00.000Z"
        }]
    }))
    .into_response()
}

async fn spawn_remote() -> (String, Arc<Remote>) {
    let remote = Arc::new(Remote::default());
    let app = Router::new()
        .route("/api/users/admin/login", post(remote_login))
        .route("/api/data/admin/revenue-summary", post(remote_revenue))
        .route("/api/data/admin/getusers", post(remote_users))
        .route("/api/data/admin/user-details", post(remote_user_details))
        .with_state(Arc::clone(&remote));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), remote)
}

// ---------------------------------------------------------------------------
// The console binary
// ---------------------------------------------------------------------------

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn pick_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_session_path() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "admin_console_http_{}_{}.json",
        std::process::id(),
        nanos
    ));
    path
}

fn client() -> Client {
    Client::builder().redirect(Policy::none()).build().unwrap()
}

async fn wait_until_ready(base_url: &str) {
    let client = client();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/login")).send().await {
            if resp.status().is_success() || resp.status().is_redirection() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_console(api_url: &str, session_path: &PathBuf) -> TestServer {
    spawn_console_with(api_url, session_path, &[]).await
}

async fn spawn_console_with(
    api_url: &str,
    session_path: &PathBuf,
    extra_env: &[(&str, &str)],
) -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_admin_console"))
        .env("PORT", port.to_string())
        .env("ADMIN_API_URL", api_url)
        .env("ADMIN_SESSION_PATH", session_path)
        .env("RUST_LOG", "info")
        .envs(extra_env.iter().copied())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn console");

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn login(server: &TestServer, email: &str, password: &str) -> reqwest::Response {
    client()
        .post(format!("{}/login", server.base_url))
        .form(&[("email", email), ("password", password)])
        .send()
        .await
        .unwrap()
}

async fn get(server: &TestServer, path: &str) -> reqwest::Response {
    client()
        .get(format!("{}{path}", server.base_url))
        .send()
        .await
        .unwrap()
}

async fn post_form(server: &TestServer, path: &str) -> reqwest::Response {
    client()
        .post(format!("{}{path}", server.base_url))
        .send()
        .await
        .unwrap()
}

fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .expect("missing location header")
        .to_str()
        .unwrap()
        .to_string()
}

fn stored_session(path: &PathBuf) -> Option<Value> {
    let bytes = std::fs::read(path).ok()?;
    serde_json::from_slice(&bytes).ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_valid_login_opens_dashboard_and_sends_token() {
    let (api_url, remote) = spawn_remote().await;
    let session_path = unique_session_path();
    let server = spawn_console(&api_url, &session_path).await;

    let before = get(&server, "/dashboard").await;
    assert_eq!(before.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&before), "/login");

    let resp = login(&server, "a@x.com", "pw").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Login successful! Redirecting..."));
    assert!(body.contains("url=/dashboard"));

    let stored = stored_session(&session_path).expect("session file written");
    assert_eq!(stored["adminToken"], "T1");
    assert_eq!(stored["userName"], "Admin");

    let dashboard = get(&server, "/dashboard").await;
    assert_eq!(dashboard.status(), StatusCode::OK);
    let body = dashboard.text().await.unwrap();
    assert!(body.contains("Welcome, Admin"));
    assert!(body.contains(r#"id="total-revenue">₹1500<"#));
    assert!(body.contains(r#"id="total-users">2<"#));
    assert_eq!(body.matches(r#"class="bar""#).count(), 2);

    let users = get(&server, "/dashboard?tab=users").await;
    assert_eq!(users.status(), StatusCode::OK);
    assert_eq!(remote.requests_to("users"), vec![json!({ "adminToken": "T1" })]);

    let root = get(&server, "/").await;
    assert_eq!(location(&root), "/dashboard");

    let _ = std::fs::remove_file(&session_path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_invalid_login_shows_inline_error() {
    let (api_url, _remote) = spawn_remote().await;
    let session_path = unique_session_path();
    let server = spawn_console(&api_url, &session_path).await;

    let resp = login(&server, "a@x.com", "wrong").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Invalid credentials"));
    assert!(!body.contains("http-equiv"));

    assert!(stored_session(&session_path).is_none());
    let dashboard = get(&server, "/dashboard").await;
    assert_eq!(dashboard.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&dashboard), "/login");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_empty_fields_never_reach_remote() {
    let (api_url, remote) = spawn_remote().await;
    let session_path = unique_session_path();
    let server = spawn_console(&api_url, &session_path).await;

    let resp = login(&server, "  ", "pw").await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp.text().await.unwrap().contains("Email and password are required"));
    assert!(remote.requests_to("login").is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_logout_clears_session() {
    let (api_url, _remote) = spawn_remote().await;
    let session_path = unique_session_path();
    let server = spawn_console(&api_url, &session_path).await;

    login(&server, "a@x.com", "pw").await;
    assert!(stored_session(&session_path).is_some());

    let resp = post_form(&server, "/logout").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
    assert!(!session_path.exists());

    let dashboard = get(&server, "/dashboard?tab=users").await;
    assert_eq!(location(&dashboard), "/login");

    // logging out twice is harmless
    let again = post_form(&server, "/logout").await;
    assert_eq!(location(&again), "/login");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_failed_refresh_keeps_previous_totals() {
    let (api_url, remote) = spawn_remote().await;
    let session_path = unique_session_path();
    let server = spawn_console(&api_url, &session_path).await;
    login(&server, "a@x.com", "pw").await;

    let first = get(&server, "/dashboard").await.text().await.unwrap();
    assert!(first.contains(r#"id="total-revenue">₹1500<"#));

    let ok = post_form(&server, "/dashboard/refresh").await;
    assert_eq!(location(&ok), "/dashboard?tab=dashboard&ack=1");
    let acknowledged = get(&server, &location(&ok)).await.text().await.unwrap();
    assert!(acknowledged.contains("Data refreshed!"));

    remote.revenue_fails.store(true, Ordering::SeqCst);
    let failed = post_form(&server, "/dashboard/refresh").await;
    assert_eq!(location(&failed), "/dashboard?tab=dashboard");

    let stale = get(&server, "/dashboard").await.text().await.unwrap();
    assert!(stale.contains(r#"id="total-revenue">₹1500<"#));
    assert!(stale.contains("Could not load revenue summary"));
    assert!(!stale.contains("Data refreshed!"));

    let _ = std::fs::remove_file(&session_path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_users_list_and_detail_overlay() {
    let (api_url, remote) = spawn_remote().await;
    let session_path = unique_session_path();
    let server = spawn_console(&api_url, &session_path).await;
    login(&server, "a@x.com", "pw").await;

    let empty = get(&server, "/dashboard?tab=users").await.text().await.unwrap();
    assert_eq!(empty.matches(r#"class="empty-row""#).count(), 1);
    assert_eq!(empty.matches(r#"class="user-row""#).count(), 0);

    *remote.users.lock().unwrap() = vec![
        json!({ "userId": "u1", "email": "u1@x.com" }),
        json!({ "userId": "u2", "email": "u2@x.com" }),
    ];
    let refreshed = post_form(&server, "/dashboard/users/refresh?sidebar=closed").await;
    assert_eq!(
        location(&refreshed),
        "/dashboard?tab=users&sidebar=closed&ack=1"
    );
    let list = get(&server, &location(&refreshed)).await.text().await.unwrap();
    assert_eq!(list.matches(r#"class="user-row""#).count(), 2);
    assert!(list.contains("Users refreshed!"));

    let first = get(&server, "/dashboard/users/u1").await.text().await.unwrap();
    assert!(first.contains(r#"role="dialog""#));
    assert!(first.contains("Asha Verma"));
    assert!(first.contains("pay_1"));

    let second = get(&server, "/dashboard/users/u2").await.text().await.unwrap();
    assert!(second.contains("Ravi Kumar"));
    assert!(!second.contains("Asha Verma"));
    assert_eq!(
        remote.requests_to("details").last().unwrap(),
        &json!({ "adminToken": "T1", "userId": "u2" })
    );

    let missing = get(&server, "/dashboard/users/nobody").await.text().await.unwrap();
    assert!(!missing.contains(r#"role="dialog""#));
    assert!(missing.contains("Could not load user details"));
    assert_eq!(missing.matches(r#"class="user-row""#).count(), 2);

    let dismissed = get(&server, "/dashboard?tab=users").await.text().await.unwrap();
    assert!(!dismissed.contains(r#"role="dialog""#));

    let _ = std::fs::remove_file(&session_path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_returning_to_users_tab_refetches_roster() {
    let (api_url, remote) = spawn_remote().await;
    let session_path = unique_session_path();
    let server = spawn_console(&api_url, &session_path).await;
    login(&server, "a@x.com", "pw").await;

    let empty = get(&server, "/dashboard?tab=users").await.text().await.unwrap();
    assert_eq!(empty.matches(r#"class="user-row""#).count(), 0);

    *remote.users.lock().unwrap() = vec![json!({ "userId": "u1", "email": "u1@x.com" })];
    get(&server, "/dashboard").await;
    let back = get(&server, "/dashboard?tab=users").await.text().await.unwrap();

    assert_eq!(remote.requests_to("users").len(), 2);
    assert_eq!(back.matches(r#"class="user-row""#).count(), 1);

    let _ = std::fs::remove_file(&session_path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_first_users_load_is_not_acknowledged() {
    let (api_url, _remote) = spawn_remote().await;
    let session_path = unique_session_path();
    let server = spawn_console(&api_url, &session_path).await;
    login(&server, "a@x.com", "pw").await;

    let first = post_form(&server, "/dashboard/users/refresh").await;
    assert_eq!(location(&first), "/dashboard?tab=users");

    let second = post_form(&server, "/dashboard/users/refresh").await;
    assert_eq!(location(&second), "/dashboard?tab=users&ack=1");

    let _ = std::fs::remove_file(&session_path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_rejected_token_ends_session() {
    let (api_url, remote) = spawn_remote().await;
    let session_path = unique_session_path();
    let server = spawn_console(&api_url, &session_path).await;
    login(&server, "a@x.com", "pw").await;

    remote.token_revoked.store(true, Ordering::SeqCst);
    let resp = get(&server, "/dashboard").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login?expired=1");
    assert!(!session_path.exists());

    let page = get(&server, "/login?expired=1").await.text().await.unwrap();
    assert!(page.contains("Your session has expired"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_rejected_token_keeps_session_when_expiry_disabled() {
    let (api_url, remote) = spawn_remote().await;
    let session_path = unique_session_path();
    let server = spawn_console_with(
        &api_url,
        &session_path,
        &[("ADMIN_LOGOUT_ON_UNAUTHORIZED", "false")],
    )
    .await;
    login(&server, "a@x.com", "pw").await;

    remote.token_revoked.store(true, Ordering::SeqCst);
    let resp = get(&server, "/dashboard").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Could not load revenue summary"));

    let stored = stored_session(&session_path).expect("session file kept");
    assert_eq!(stored["adminToken"], "T1");
    let login_page = get(&server, "/login").await;
    assert_eq!(location(&login_page), "/dashboard");

    let _ = std::fs::remove_file(&session_path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_session_survives_restart() {
    let (api_url, _remote) = spawn_remote().await;
    let session_path = unique_session_path();

    {
        let server = spawn_console(&api_url, &session_path).await;
        login(&server, "a@x.com", "pw").await;
    }

    let server = spawn_console(&api_url, &session_path).await;
    let login_page = get(&server, "/login").await;
    assert_eq!(location(&login_page), "/dashboard");

    let dashboard = get(&server, "/dashboard").await;
    assert_eq!(dashboard.status(), StatusCode::OK);
    assert!(dashboard.text().await.unwrap().contains("Welcome, Admin"));

    let _ = std::fs::remove_file(&session_path);
}
