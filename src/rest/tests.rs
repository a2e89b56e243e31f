use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::{router, AppState};
use crate::auth::{self, SESSION_COOKIE, TOKEN_HEADER};
use crate::storage::{SqliteStorage, StorageWrite};
use crate::types::UserForm;

const ADMIN_EMAIL: &str = "admin@example.org";
const ADMIN_PASSWORD: &str = "correct horse";

struct Harness {
    _dir: tempfile::TempDir,
    storage: SqliteStorage,
    app: Router,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = SqliteStorage::new(dir.path().join("medialog.db"));
        storage.init().unwrap();
        let app = router(AppState::new(storage.clone()));
        let harness = Self {
            _dir: dir,
            storage,
            app,
        };
        harness.add_user(ADMIN_EMAIL, ADMIN_PASSWORD, true, true);
        harness
    }

    fn add_user(&self, email: &str, password: &str, admin: bool, api: bool) -> i64 {
        let form = UserForm {
            email: email.to_string(),
            password: password.to_string(),
            is_admin: admin,
            can_access_api: api,
            ..Default::default()
        };
        let user = auth::new_user(&form, 0, Utc::now()).unwrap();
        self.storage.insert_user(&user).unwrap()
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body.to_vec())
    }

    async fn json(&self, req: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = self.send(req).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    async fn api_token(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .json(request(
                Method::POST,
                &format!("/api/v0/users/{email}/login?password={password}"),
                None,
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn session(&self, email: &str, password: &str) -> String {
        let (status, headers, _) = self
            .send(form(
                "/users/authenticate",
                None,
                &format!("email={email}&password={password}"),
            ))
            .await;
        assert_eq!(status, StatusCode::FOUND);
        let cookie = headers
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        cookie.split(';').next().unwrap().to_string()
    }
}

fn request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(TOKEN_HEADER, token);
    }
    builder.body(Body::empty()).unwrap()
}

fn with_json(method: Method, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(TOKEN_HEADER, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn browser(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

/// Repository → resource → accession, returning their ids.
async fn seed_hierarchy(h: &Harness, token: &str) -> (i64, i64, i64) {
    let (status, repo) = h
        .json(with_json(
            Method::POST,
            "/api/v0/repositories",
            token,
            json!({"slug": "fales", "title": "Fales Library"}),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{repo}");
    let repo_id = repo["id"].as_i64().unwrap();

    let (status, resource) = h
        .json(with_json(
            Method::POST,
            "/api/v0/resources",
            token,
            json!({"title": "Papers", "collection_code": "MSS.001", "repository_id": repo_id}),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{resource}");
    let resource_id = resource["id"].as_i64().unwrap();

    let (status, accession) = h
        .json(with_json(
            Method::POST,
            "/api/v0/accessions",
            token,
            json!({"accession_num": "2024.001", "resource_id": resource_id}),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{accession}");
    (repo_id, resource_id, accession["id"].as_i64().unwrap())
}

fn entry_body(accession_id: i64, media_id: u32) -> Value {
    json!({
        "accession_id": accession_id,
        "media_id": media_id,
        "mediatype": "mediatype_floppy_3_5",
        "stock_size_num": 1.44,
        "stock_unit": "MB",
    })
}

#[tokio::test]
async fn info_needs_no_token() {
    let h = Harness::new();
    let (status, body) = h.json(request(Method::GET, "/api/v0", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "medialog");
    assert_eq!(body["api_version"], "v0");
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let h = Harness::new();
    let (status, body) = h.json(request(Method::GET, "/nowhere", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "endpoint not found");
}

#[tokio::test]
async fn api_rejects_missing_and_unknown_tokens() {
    let h = Harness::new();
    let (status, _) = h
        .json(request(Method::GET, "/api/v0/repositories", None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = h
        .json(request(Method::GET, "/api/v0/repositories", Some("bogus")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn api_login_and_logout() {
    let h = Harness::new();

    let (status, _) = h
        .json(request(
            Method::POST,
            &format!("/api/v0/users/{ADMIN_EMAIL}/login"),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = h
        .json(request(
            Method::POST,
            &format!("/api/v0/users/{ADMIN_EMAIL}/login?password=wrong"),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = h
        .json(request(
            Method::POST,
            "/api/v0/users/nobody@example.org/login?password=x",
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = h.api_token(ADMIN_EMAIL, "correct%20horse").await;
    let (status, _) = h
        .json(request(Method::GET, "/api/v0/vocabularies", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = h
        .json(request(Method::DELETE, "/api/v0/logout", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = h
        .json(request(Method::GET, "/api/v0/vocabularies", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn new_login_invalidates_previous_api_token() {
    let h = Harness::new();
    let first = h.api_token(ADMIN_EMAIL, "correct%20horse").await;
    let second = h.api_token(ADMIN_EMAIL, "correct%20horse").await;
    let (status, _) = h
        .json(request(Method::GET, "/api/v0/repositories", Some(&first)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = h
        .json(request(Method::GET, "/api/v0/repositories", Some(&second)))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn api_login_requires_api_access() {
    let h = Harness::new();
    h.add_user("viewer@example.org", "pw", false, false);
    let (status, body) = h
        .json(request(
            Method::POST,
            "/api/v0/users/viewer@example.org/login?password=pw",
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "user is not allowed to access the api");
}

#[tokio::test]
async fn records_crud_and_navigation() {
    let h = Harness::new();
    let token = h.api_token(ADMIN_EMAIL, "correct%20horse").await;
    let (repo_id, resource_id, accession_id) = seed_hierarchy(&h, &token).await;

    let (status, list) = h
        .json(request(
            Method::GET,
            &format!("/api/v0/resources?repository_id={repo_id}"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, first) = h
        .json(with_json(
            Method::POST,
            "/api/v0/entries",
            &token,
            entry_body(accession_id, 0),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{first}");
    assert_eq!(first["media_id"], 1);
    assert_eq!(first["resource_id"], resource_id);
    assert_eq!(first["repository_id"], repo_id);

    let (status, _) = h
        .json(with_json(
            Method::POST,
            "/api/v0/entries",
            &token,
            entry_body(accession_id, 1),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, second) = h
        .json(with_json(
            Method::POST,
            "/api/v0/entries",
            &token,
            entry_body(accession_id, 2),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let first_id = first["id"].as_str().unwrap();
    let (status, next) = h
        .json(request(
            Method::GET,
            &format!("/api/v0/entries/{first_id}/next"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next["id"], second["id"]);
    let (status, _) = h
        .json(request(
            Method::GET,
            &format!("/api/v0/entries/{first_id}/previous"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = h
        .json(request(
            Method::PATCH,
            &format!("/api/v0/entries/{first_id}/update_location?location=sl_attic"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, moved) = h
        .json(request(
            Method::PATCH,
            &format!("/api/v0/entries/{first_id}/update_location?location=sl_rStar"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["location"], "sl_rStar");

    let (status, copy) = h
        .json(request(
            Method::POST,
            &format!("/api/v0/entries/{first_id}/clone"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(copy["media_id"], 3);
    assert_ne!(copy["id"], first["id"]);

    let (status, _) = h
        .json(request(
            Method::DELETE,
            &format!("/api/v0/entries/{first_id}"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = h
        .json(request(
            Method::GET,
            &format!("/api/v0/entries/{first_id}"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_input_is_bad_request() {
    let h = Harness::new();
    let token = h.api_token(ADMIN_EMAIL, "correct%20horse").await;

    for uri in [
        "/api/v0/repositories/abc",
        "/api/v0/entries/not-a-uuid",
        "/api/v0/entries?page=0",
        "/api/v0/entries?sort=color",
        "/api/v0/reports/summary?start_date=2024&end_date=20240101",
    ] {
        let (status, body) = h.json(request(Method::GET, uri, Some(&token))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}: {body}");
    }

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v0/repositories")
        .header(TOKEN_HEADER, &token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = h.json(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = h
        .json(with_json(
            Method::POST,
            "/api/v0/repositories",
            &token,
            json!({"slug": "", "title": "untitled"}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "slug is required");
}

#[tokio::test]
async fn deleting_a_parent_with_children_is_rejected() {
    let h = Harness::new();
    let token = h.api_token(ADMIN_EMAIL, "correct%20horse").await;
    let (repo_id, _, _) = seed_hierarchy(&h, &token).await;
    let (status, _) = h
        .json(request(
            Method::DELETE,
            &format!("/api/v0/repositories/{repo_id}"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = h
        .json(request(
            Method::DELETE,
            "/api/v0/repositories/9999",
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn slew_pagination_and_summary() {
    let h = Harness::new();
    let token = h.api_token(ADMIN_EMAIL, "correct%20horse").await;
    let (_, resource_id, accession_id) = seed_hierarchy(&h, &token).await;

    let (status, _) = h
        .json(with_json(
            Method::POST,
            &format!("/api/v0/accessions/{accession_id}/slew"),
            &token,
            json!({"num_objects": 0, "mediatype": "mediatype_zip", "media_stock_size": 100, "media_stock_unit": "MB"}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = h
        .json(with_json(
            Method::POST,
            &format!("/api/v0/accessions/{accession_id}/slew"),
            &token,
            json!({"num_objects": 3, "mediatype": "mediatype_zip", "media_stock_size": 100, "media_stock_unit": "MB", "box_num": 4}),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    let media_ids: Vec<i64> = created
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["media_id"].as_i64().unwrap())
        .collect();
    assert_eq!(media_ids, vec![1, 2, 3]);
    assert_eq!(created[0]["box_number"], "4");

    let (status, page) = h
        .json(request(
            Method::GET,
            &format!("/api/v0/resources/{resource_id}/entries?page=2&page_size=2"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["last_page"], 2);
    assert_eq!(page["this_page"], 2);
    assert_eq!(page["results"].as_array().unwrap().len(), 1);
    assert_eq!(page["results"][0]["media_id"], 3);

    let (status, ids) = h
        .json(request(
            Method::GET,
            &format!("/api/v0/accessions/{accession_id}/entries?all_ids=true"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids.as_array().unwrap().len(), 3);

    let (status, summary) = h
        .json(request(
            Method::GET,
            &format!("/api/v0/resources/{resource_id}/summary"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["totals"]["count"], 3);
    assert_eq!(summary["totals"]["size"], 300_000_000.0);
    assert_eq!(summary["summaries"][0]["mediatype"], "mediatype_zip");
}

#[tokio::test]
async fn resource_csv_export() {
    let h = Harness::new();
    let token = h.api_token(ADMIN_EMAIL, "correct%20horse").await;
    let (_, resource_id, accession_id) = seed_hierarchy(&h, &token).await;
    h.json(with_json(
        Method::POST,
        "/api/v0/entries",
        &token,
        entry_body(accession_id, 0),
    ))
    .await;

    let (status, headers, body) = h
        .send(request(
            Method::GET,
            &format!("/api/v0/resources/{resource_id}/csv"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"fales_MSS.001.csv\""
    );
    let text = String::from_utf8(body).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().contains("media_id"));
    let row = lines.next().unwrap();
    assert!(row.contains("fales"));
    assert!(row.contains("3.5 in. Floppy Disk"));
    assert!(lines.next().is_none());
}

#[tokio::test]
async fn date_range_report() {
    let h = Harness::new();
    let token = h.api_token(ADMIN_EMAIL, "correct%20horse").await;
    let (repo_id, _, accession_id) = seed_hierarchy(&h, &token).await;
    h.json(with_json(
        Method::POST,
        "/api/v0/entries",
        &token,
        entry_body(accession_id, 0),
    ))
    .await;

    let today = Utc::now().format("%Y%m%d").to_string();
    let (status, report) = h
        .json(request(
            Method::GET,
            &format!("/api/v0/reports/summary?start_date={today}&end_date={today}"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{report}");
    assert_eq!(report["repository"], "all");
    assert_eq!(report["repository_id"], 0);
    assert_eq!(report["totals"]["count"], 1);

    let (status, report) = h
        .json(request(
            Method::GET,
            &format!(
                "/api/v0/reports/summary?start_date={today}&end_date={today}&repository_id={repo_id}&is_refreshed=true"
            ),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["repository"], "fales");
    assert_eq!(report["totals"]["count"], 0);

    let (status, _) = h
        .json(request(
            Method::GET,
            "/api/v0/reports/summary?start_date=20240201&end_date=20240101",
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn browser_session_lifecycle() {
    let h = Harness::new();

    let (status, _) = h.json(request(Method::GET, "/", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = h
        .send(form(
            "/users/authenticate",
            None,
            &format!("email={ADMIN_EMAIL}&password=nope"),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = h.session(ADMIN_EMAIL, "correct+horse").await;
    assert!(cookie.starts_with(&format!("{SESSION_COOKIE}=")));

    let (status, dashboard) = h.json(browser("/", &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["user"]["email"], ADMIN_EMAIL);
    assert_eq!(dashboard["counts"]["users"], 1);

    let (status, dump) = h.json(browser("/sessions/dump", &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dump["is_admin"], true);

    // Session tokens do not open the API.
    let session_token = cookie.split_once('=').unwrap().1;
    let (status, _) = h
        .json(request(
            Method::GET,
            "/api/v0/repositories",
            Some(session_token),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, headers, _) = h.send(browser("/users/logout", &cookie)).await;
    assert_eq!(status, StatusCode::FOUND);
    assert!(headers[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .contains("Max-Age=0"));
    let (status, _) = h.json(browser("/", &cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn delete_sessions_logs_out_browsers() {
    let h = Harness::new();
    let cookie = h.session(ADMIN_EMAIL, "correct+horse").await;
    let token = h.api_token(ADMIN_EMAIL, "correct%20horse").await;

    let (status, _) = h
        .json(request(Method::DELETE, "/api/v0/delete_sessions", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = h.json(browser("/", &cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = h
        .json(request(Method::GET, "/api/v0/repositories", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn user_administration() {
    let h = Harness::new();
    let admin = h.session(ADMIN_EMAIL, "correct+horse").await;

    let (status, created) = h
        .json(form(
            "/users/create",
            Some(&admin),
            "email=tech%40example.org&password=s3cret&can_access_api=true",
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    let tech_id = created["id"].as_i64().unwrap();
    assert!(created.get("encrypted_password").is_none());

    let tech = h.session("tech%40example.org", "s3cret").await;
    let (status, _) = h.json(browser("/users", &tech)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = h
        .json(browser(&format!("/users/{tech_id}/make_admin"), &tech))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = h
        .json(form("/users/1/reset_password", Some(&tech), "password=x"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = h
        .json(form(
            &format!("/users/{tech_id}/reset_password"),
            Some(&tech),
            "password=n3w",
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, users) = h.json(browser("/users", &admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);

    let (status, updated) = h
        .json(browser(&format!("/users/{tech_id}/revoke_api"), &admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["can_access_api"], false);

    let (status, updated) = h
        .json(browser(&format!("/users/{tech_id}/deactivate"), &admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["is_active"], false);

    let (status, _) = h.json(browser("/", &tech)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _, _) = h
        .send(form(
            "/users/authenticate",
            None,
            "email=tech%40example.org&password=n3w",
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn browser_report_range_and_csv() {
    let h = Harness::new();
    let token = h.api_token(ADMIN_EMAIL, "correct%20horse").await;
    let (_, _, accession_id) = seed_hierarchy(&h, &token).await;
    h.json(with_json(
        Method::POST,
        "/api/v0/entries",
        &token,
        entry_body(accession_id, 0),
    ))
    .await;
    let cookie = h.session(ADMIN_EMAIL, "correct+horse").await;

    let now = Utc::now();
    let body = format!(
        "start-year={y}&start-month={m}&start-day={d}&end-year={y}&end-month={m}&end-day={d}&repository-id=0",
        y = now.format("%Y"),
        m = now.format("%m"),
        d = now.format("%d"),
    );
    let (status, report) = h.json(form("/reports/range", Some(&cookie), &body)).await;
    assert_eq!(status, StatusCode::OK, "{report}");
    assert_eq!(report["totals"]["count"], 1);

    let (status, headers, csv) = h.send(form("/reports/csv", Some(&cookie), &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"report.csv\""
    );
    assert_eq!(String::from_utf8(csv).unwrap().lines().count(), 2);

    let (status, _) = h
        .json(form(
            "/reports/range",
            Some(&cookie),
            "start-year=2024&start-month=13&start-day=1&end-year=2024&end-month=1&end-day=1",
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn slew_rejects_oversized_and_invalid_requests() {
    let h = Harness::new();
    let token = h.api_token(ADMIN_EMAIL, "correct%20horse").await;
    let (_, resource_id, accession_id) = seed_hierarchy(&h, &token).await;
    let uri = format!("/api/v0/accessions/{accession_id}/slew");

    for num_objects in [u64::from(u32::MAX), 1001] {
        let (status, body) = h
            .json(with_json(
                Method::POST,
                &uri,
                &token,
                json!({"num_objects": num_objects, "mediatype": "mediatype_zip", "media_stock_size": 100, "media_stock_unit": "MB"}),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(body["message"].as_str().unwrap().contains("1000"));
    }

    let (status, _) = h
        .json(with_json(
            Method::POST,
            &uri,
            &token,
            json!({"num_objects": 2, "mediatype": "", "media_stock_size": 100, "media_stock_unit": "MB"}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, page) = h
        .json(request(
            Method::GET,
            &format!("/api/v0/resources/{resource_id}/entries"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 0);
}

async fn repository_entry_count(h: &Harness, token: &str, repo: i64) -> u64 {
    let (status, summary) = h
        .json(request(
            Method::GET,
            &format!("/api/v0/repositories/{repo}/summary"),
            Some(token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    summary["totals"]["count"].as_u64().unwrap()
}

#[tokio::test]
async fn moving_a_resource_carries_its_entries() {
    let h = Harness::new();
    let token = h.api_token(ADMIN_EMAIL, "correct%20horse").await;
    let (repo_a, resource_id, accession_id) = seed_hierarchy(&h, &token).await;
    h.json(with_json(
        Method::POST,
        "/api/v0/entries",
        &token,
        entry_body(accession_id, 0),
    ))
    .await;

    let (status, repo_b) = h
        .json(with_json(
            Method::POST,
            "/api/v0/repositories",
            &token,
            json!({"slug": "tamwag", "title": "Tamiment Library"}),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let repo_b = repo_b["id"].as_i64().unwrap();

    let (status, moved) = h
        .json(with_json(
            Method::PUT,
            &format!("/api/v0/resources/{resource_id}"),
            &token,
            json!({"title": "Papers", "collection_code": "MSS.001", "repository_id": repo_b}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{moved}");
    assert_eq!(moved["repository_id"], repo_b);

    assert_eq!(repository_entry_count(&h, &token, repo_b).await, 1);
    assert_eq!(repository_entry_count(&h, &token, repo_a).await, 0);

    let (status, body) = h
        .json(request(
            Method::DELETE,
            &format!("/api/v0/repositories/{repo_a}"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[tokio::test]
async fn moving_an_accession_carries_its_entries() {
    let h = Harness::new();
    let token = h.api_token(ADMIN_EMAIL, "correct%20horse").await;
    let (repo_a, resource_a, accession_id) = seed_hierarchy(&h, &token).await;
    let (_, entry) = h
        .json(with_json(
            Method::POST,
            "/api/v0/entries",
            &token,
            entry_body(accession_id, 0),
        ))
        .await;

    let (_, repo_b) = h
        .json(with_json(
            Method::POST,
            "/api/v0/repositories",
            &token,
            json!({"slug": "tamwag", "title": "Tamiment Library"}),
        ))
        .await;
    let repo_b = repo_b["id"].as_i64().unwrap();
    let (_, resource_b) = h
        .json(with_json(
            Method::POST,
            "/api/v0/resources",
            &token,
            json!({"title": "Records", "collection_code": "TAM.001", "repository_id": repo_b}),
        ))
        .await;
    let resource_b = resource_b["id"].as_i64().unwrap();

    let (status, _) = h
        .json(with_json(
            Method::PUT,
            &format!("/api/v0/accessions/{accession_id}"),
            &token,
            json!({"accession_num": "2024.001", "resource_id": resource_b}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, moved) = h
        .json(request(
            Method::GET,
            &format!("/api/v0/entries/{}", entry["id"].as_str().unwrap()),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["resource_id"], resource_b);
    assert_eq!(moved["repository_id"], repo_b);

    let (_, old) = h
        .json(request(
            Method::GET,
            &format!("/api/v0/resources/{resource_a}/entries"),
            Some(&token),
        ))
        .await;
    assert_eq!(old["total"], 0);
    let (status, _) = h
        .json(request(
            Method::DELETE,
            &format!("/api/v0/resources/{resource_a}"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = h
        .json(request(
            Method::DELETE,
            &format!("/api/v0/repositories/{repo_a}"),
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn find_entry_by_media_id() {
    let h = Harness::new();
    let token = h.api_token(ADMIN_EMAIL, "correct%20horse").await;
    let (_, resource_id, accession_id) = seed_hierarchy(&h, &token).await;
    let (_, created) = h
        .json(with_json(
            Method::POST,
            "/api/v0/entries",
            &token,
            entry_body(accession_id, 5),
        ))
        .await;

    let (status, found) = h
        .json(with_json(
            Method::POST,
            "/api/v0/entries/find",
            &token,
            json!({"resource_id": resource_id, "media_id": 5}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{found}");
    assert_eq!(found["id"], created["id"]);

    let (status, _) = h
        .json(with_json(
            Method::POST,
            "/api/v0/entries/find",
            &token,
            json!({"resource_id": resource_id, "media_id": 6}),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = h
        .json(with_json(
            Method::POST,
            "/api/v0/entries/find",
            &token,
            json!({"resource_id": resource_id + 100, "media_id": 5}),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn entries_csv_filters_by_mediatype() {
    let h = Harness::new();
    let token = h.api_token(ADMIN_EMAIL, "correct%20horse").await;
    let (_, _, accession_id) = seed_hierarchy(&h, &token).await;
    h.json(with_json(
        Method::POST,
        "/api/v0/entries",
        &token,
        entry_body(accession_id, 0),
    ))
    .await;
    let mut zip = entry_body(accession_id, 0);
    zip["mediatype"] = json!("mediatype_zip");
    h.json(with_json(Method::POST, "/api/v0/entries", &token, zip))
        .await;

    let (status, headers, body) = h
        .send(request(Method::GET, "/api/v0/entries/csv", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"medialog_entries.csv\""
    );
    assert_eq!(String::from_utf8(body).unwrap().lines().count(), 3);

    let (status, _, body) = h
        .send(request(
            Method::GET,
            "/api/v0/entries/csv?filter=mediatype_zip",
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    let rows: Vec<&str> = text.lines().skip(1).collect();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].contains("Zip Disk"));
}
