//! API route tests against a mocked Microsoft Graph and OAuth endpoint

use bytes::Bytes;
use clap::Parser;
use http_body_util::{BodyExt, Full};
use hyper::header::HeaderValue;
use hyper::{HeaderMap, Method, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_test::assert_ok;
use wiremock::matchers::{
    body_string_contains, header, method, path, path_regex, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

use odindex::auth::hash_token;
use odindex::config::Args;
use odindex::server::route;
use odindex::store::{MemoryKv, TokenStore};
use odindex::AppState;

const ACCESS_TOKEN: &str = "graph-access";

fn args(server: &MockServer, extra: &[&str]) -> Args {
    let drive = format!("{}/drive", server.uri());
    let token = format!("{}/token", server.uri());
    let mut argv = vec![
        "odindex",
        "--drive-api",
        drive.as_str(),
        "--auth-api",
        token.as_str(),
        "--client-id",
        "cid",
        "--client-secret",
        "secret",
        "--max-items",
        "100",
        "--cache-control-header",
        "max-age=0, s-maxage=60",
    ];
    argv.extend_from_slice(extra);
    Args::try_parse_from(argv).unwrap()
}

async fn state(server: &MockServer, extra: &[&str]) -> AppState {
    let store = TokenStore::new(Arc::new(MemoryKv::new()));
    store
        .store_tokens(ACCESS_TOKEN, 3600, "graph-refresh")
        .await
        .unwrap();
    AppState::with_store(args(server, extra), store).unwrap()
}

async fn state_without_tokens(server: &MockServer) -> AppState {
    let store = TokenStore::new(Arc::new(MemoryKv::new()));
    AppState::with_store(args(server, &[]), store).unwrap()
}

async fn get(state: &AppState, target: &str) -> Response<Full<Bytes>> {
    get_with(state, target, HeaderMap::new()).await
}

async fn get_with(state: &AppState, target: &str, headers: HeaderMap) -> Response<Full<Bytes>> {
    let (path, query) = match target.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (target, None),
    };
    route(state, &Method::GET, path, query, &headers).await
}

async fn body_bytes(response: Response<Full<Bytes>>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn body_json(response: Response<Full<Bytes>>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn location(response: &Response<Full<Bytes>>) -> &str {
    response.headers()["location"].to_str().unwrap()
}

// ============================================================================
// raw / name
// ============================================================================

#[tokio::test]
async fn test_raw_redirects_to_download_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2FDocs%2Fa%20b.pdf"))
        .and(header("authorization", "Bearer graph-access"))
        .and(query_param("select", "id,size,@microsoft.graph.downloadUrl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "01A",
            "size": 3,
            "@microsoft.graph.downloadUrl": "https://dl.example/a.pdf?tempauth=x"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = state(&server, &[]).await;
    let response = get(&state, "/api/raw?path=%2FDocs%2Fa%20b.pdf").await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "https://dl.example/a.pdf?tempauth=x");
    assert_eq!(response.headers()["cache-control"], "max-age=0, s-maxage=60");
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(response.headers()["access-control-allow-methods"], "GET, OPTIONS");
}

#[tokio::test]
async fn test_raw_without_token_is_forbidden() {
    let server = MockServer::start().await;
    let state = state_without_tokens(&server).await;

    let response = get(&state, "/api/raw?path=/a.txt").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await, json!({ "error": "No access token." }));
}

#[tokio::test]
async fn test_raw_rejects_unfilled_path_placeholder() {
    let server = MockServer::start().await;
    let state = state(&server, &[]).await;

    let response = get(&state, "/api/raw?path=%5B...path%5D").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({ "error": "No path specified." }));
}

#[tokio::test]
async fn test_raw_proxy_serves_bytes() {
    let server = MockServer::start().await;
    let download = format!("{}/dl/notes.txt", server.uri());
    Mock::given(method("GET"))
        .and(path("/drive/root:%2Fnotes.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "01B",
            "size": 5,
            "@microsoft.graph.downloadUrl": download
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dl/notes.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("hello", "text/plain; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let state = state(&server, &[]).await;
    let response = get(&state, "/api/raw?path=/notes.txt&proxy=1").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/plain; charset=utf-8");
    assert_eq!(response.headers()["content-length"], "5");
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(body_bytes(response).await, Bytes::from_static(b"hello"));
}

#[tokio::test]
async fn test_raw_forwards_graph_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2Fmissing.txt"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": "itemNotFound", "message": "Item does not exist" }
        })))
        .mount(&server)
        .await;

    let state = state(&server, &[]).await;
    let response = get(&state, "/api/raw?path=/missing.txt").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        body_json(response).await["error"]["error"]["code"],
        "itemNotFound"
    );
}

#[tokio::test]
async fn test_raw_without_download_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2FFolder"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "01C", "size": 0 })))
        .mount(&server)
        .await;

    let state = state(&server, &[]).await;
    let response = get(&state, "/api/raw?path=/Folder/").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await, json!({ "error": "No download url found." }));
}

#[tokio::test]
async fn test_name_route_behaves_like_raw() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2Fa%2Fclip.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@microsoft.graph.downloadUrl": "https://dl.example/clip"
        })))
        .mount(&server)
        .await;

    let state = state(&server, &[]).await;
    let response = get(&state, "/api/name/renamed.mp4?path=/a/clip.mp4").await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "https://dl.example/clip");
}

#[tokio::test]
async fn test_base_directory_scopes_paths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2FPublic%2Fetc%2Fpasswd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@microsoft.graph.downloadUrl": "https://dl.example/p"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = state(&server, &["--base-directory", "/Public"]).await;
    let response = get(&state, "/api/raw?path=/../../etc/passwd").await;
    assert_eq!(response.status(), StatusCode::FOUND);
}

// ============================================================================
// Protected routes
// ============================================================================

async fn mount_password(server: &MockServer, password: &str) {
    let download = format!("{}/dl/password", server.uri());
    Mock::given(method("GET"))
        .and(path("/drive/root:%2Fprivate%2F.password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@microsoft.graph.downloadUrl": download,
            "file": {}
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dl/password"))
        .respond_with(ResponseTemplate::new(200).set_body_string(password))
        .mount(server)
        .await;
}

async fn mount_private_file(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/drive/root:%2FPrivate%2Fdoc.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@microsoft.graph.downloadUrl": "https://dl.example/doc"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_protected_route_requires_password() {
    let server = MockServer::start().await;
    mount_password(&server, "hunter2\n").await;
    mount_private_file(&server).await;

    let state = state(&server, &["--protected-routes", "/Private"]).await;

    let response = get(&state, "/api/raw?path=/Private/doc.pdf").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({ "error": "Password required." }));

    let response = get(&state, "/api/raw?path=/Private/doc.pdf&odpt=wrong").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_accepts_header_token() {
    let server = MockServer::start().await;
    mount_password(&server, "hunter2\n").await;
    mount_private_file(&server).await;

    let state = state(&server, &["--protected-routes", "/Private"]).await;
    let mut headers = HeaderMap::new();
    headers.insert(
        "od-protected-token",
        HeaderValue::from_str(&hash_token("hunter2")).unwrap(),
    );

    // Header wins over a wrong query value
    let response = get_with(&state, "/api/raw?path=/Private/doc.pdf&odpt=wrong", headers).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "https://dl.example/doc");
    assert_eq!(response.headers()["cache-control"], "no-cache");
}

#[tokio::test]
async fn test_protected_route_accepts_query_token() {
    let server = MockServer::start().await;
    mount_password(&server, "hunter2").await;
    mount_private_file(&server).await;

    let state = state(&server, &["--protected-routes", "/Private"]).await;
    let target = format!("/api/raw?path=/Private/doc.pdf&odpt={}", hash_token("hunter2"));
    let response = get(&state, &target).await;
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_protected_route_without_password_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2Fprivate%2F.password"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": "itemNotFound" }
        })))
        .mount(&server)
        .await;

    let state = state(&server, &["--protected-routes", "/Private"]).await;
    let response = get(&state, "/api/raw?path=/Private/doc.pdf").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "You didn't set a password." })
    );
}

#[tokio::test]
async fn test_protected_route_lookup_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2Fprivate%2F.password"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let state = state(&server, &["--protected-routes", "/Private"]).await;
    let response = get(&state, "/api/thumbnail?path=/Private/doc.pdf").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({ "error": "Internal server error." }));
}

// ============================================================================
// Token refresh
// ============================================================================

#[tokio::test]
async fn test_expired_access_token_is_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=old-refresh"))
        .and(body_string_contains("client_id=cid"))
        .and(body_string_contains("client_secret=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": "fresh-access",
            "refresh_token": "new-refresh"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/items/01ABC"))
        .and(header("authorization", "Bearer fresh-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "01ABC",
            "name": "a.txt",
            "parentReference": { "path": "/drive/root:/Docs" }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let store = TokenStore::new(Arc::new(MemoryKv::new()));
    store.store_tokens("stale", 0, "old-refresh").await.unwrap();
    let state = AppState::with_store(args(&server, &[]), store.clone()).unwrap();

    let response = get(&state, "/api/item?id=01ABC").await;
    assert_eq!(response.status(), StatusCode::OK);

    let tokens = assert_ok!(store.get_tokens().await);
    assert_eq!(tokens.access_token.as_deref(), Some("fresh-access"));
    assert_eq!(tokens.refresh_token.as_deref(), Some("new-refresh"));

    // Second request reuses the stored token without refreshing
    let response = get(&state, "/api/item?id=01ABC").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_incomplete_refresh_reply_yields_no_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "only-access",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let store = TokenStore::new(Arc::new(MemoryKv::new()));
    store.store_tokens("stale", 0, "old-refresh").await.unwrap();
    let state = AppState::with_store(args(&server, &[]), store.clone()).unwrap();

    let response = get(&state, "/api/search?q=cats").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let tokens = store.get_tokens().await.unwrap();
    assert_eq!(tokens.refresh_token.as_deref(), Some("old-refresh"));
}

#[tokio::test]
async fn test_rejected_refresh_is_internal_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .mount(&server)
        .await;

    let store = TokenStore::new(Arc::new(MemoryKv::new()));
    store.store_tokens("stale", 0, "revoked").await.unwrap();
    let state = AppState::with_store(args(&server, &[]), store).unwrap();

    let response = get(&state, "/api/raw?path=/a.txt").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ============================================================================
// item / search / thumbnail
// ============================================================================

#[tokio::test]
async fn test_item_rejects_invalid_id() {
    let server = MockServer::start().await;
    let state = state(&server, &[]).await;

    let response = get(&state, "/api/item?id=01ABC%2F..").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({ "error": "Invalid driveItem ID." }));
}

#[tokio::test]
async fn test_item_returns_graph_payload() {
    let server = MockServer::start().await;
    let payload = json!({
        "id": "01XYZ",
        "name": "report.docx",
        "parentReference": { "driveId": "d1", "path": "/drive/root:/Work" }
    });
    Mock::given(method("GET"))
        .and(path("/drive/items/01XYZ"))
        .and(query_param("select", "id,name,parentReference"))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload.clone()))
        .mount(&server)
        .await;

    let state = state(&server, &[]).await;
    let response = get(&state, "/api/item?id=01XYZ&id=ignored").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, payload);
}

#[tokio::test]
async fn test_search_sanitizes_and_returns_hits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/drive/root:%2FPublic:/search\(q='it''s%20a%20cat'\)$"))
        .and(query_param("select", "id,name,file,folder,parentReference"))
        .and(query_param("top", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "id": "1", "name": "cat.jpg", "file": {} }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = state(&server, &["--base-directory", "/Public"]).await;
    let response = get(&state, "/api/search?q=it's+a%2Fcat").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!([{ "id": "1", "name": "cat.jpg", "file": {} }])
    );
}

#[tokio::test]
async fn test_thumbnail_redirects_to_requested_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2FPhotos%2Fa.jpg:/thumbnails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{
                "id": "0",
                "small": { "url": "https://thumb.example/s", "width": 96, "height": 96 },
                "medium": { "url": "https://thumb.example/m", "width": 176, "height": 176 },
                "large": { "url": "https://thumb.example/l", "width": 800, "height": 800 }
            }]
        })))
        .mount(&server)
        .await;

    let state = state(&server, &[]).await;

    let response = get(&state, "/api/thumbnail?path=/Photos/a.jpg").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "https://thumb.example/m");

    let response = get(&state, "/api/thumbnail?path=/Photos/a.jpg&size=large").await;
    assert_eq!(location(&response), "https://thumb.example/l");
    assert_eq!(response.headers()["cache-control"], "max-age=0, s-maxage=60");
}

#[tokio::test]
async fn test_thumbnail_validation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2Fdata.bin:/thumbnails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .mount(&server)
        .await;

    let state = state(&server, &[]).await;

    let response = get(&state, "/api/thumbnail?path=/a.jpg&size=huge").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({ "error": "Invalid size." }));

    let response = get(&state, "/api/thumbnail?path=[...path]").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(&state, "/api/thumbnail?path=/data.bin").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "The item doesn't have a valid thumbnail." })
    );
}

#[tokio::test]
async fn test_root_thumbnails_have_no_colon() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/root/thumbnails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "medium": { "url": "https://thumb.example/root" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = state(&server, &[]).await;
    let response = get(&state, "/api/thumbnail").await;
    assert_eq!(location(&response), "https://thumb.example/root");
}

// ============================================================================
// Folder index and preview
// ============================================================================

#[tokio::test]
async fn test_index_lists_folder_with_next_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2FMusic"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "01M", "name": "Music", "folder": { "childCount": 150 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2FMusic:/children"))
        .and(query_param("$top", "100"))
        .and(query_param("$orderby", "name desc"))
        .and(query_param_is_missing("$skipToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "id": "1", "name": "a.mp3", "file": {} }],
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/me/drive/root:/Music:/children?$top=100&$skiptoken=UGFnZTI"
        })))
        .mount(&server)
        .await;

    let state = state(&server, &[]).await;
    let response = get(&state, "/api?path=/Music&sort=name%20desc").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["next"], "UGFnZTI");
    assert_eq!(body["folder"]["value"][0]["name"], "a.mp3");
}

#[tokio::test]
async fn test_index_returns_file_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2Freadme.md"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "01R", "name": "readme.md", "size": 12, "file": { "mimeType": "text/markdown" }
        })))
        .mount(&server)
        .await;

    let state = state(&server, &[]).await;
    let body = body_json(get(&state, "/api?path=/readme.md").await).await;
    assert_eq!(body["file"]["name"], "readme.md");
    assert!(body.get("folder").is_none());
}

#[tokio::test]
async fn test_preview_video_collects_subtitles_across_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2FShows%2Fep1.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "01V", "name": "ep1.mp4", "file": { "mimeType": "video/mp4" },
            "video": { "width": 1280, "height": 720 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2FShows:/children"))
        .and(query_param_is_missing("$skipToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "name": "ep1.mp4" }, { "name": "ep1.vtt" }, { "name": "ep2.vtt" }],
            "@odata.nextLink": "https://graph/children?$top=100&$skiptoken=p2"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2FShows:/children"))
        .and(query_param("$skipToken", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "name": "EP1.en.vtt" }]
        })))
        .mount(&server)
        .await;

    let state = state(&server, &[]).await;
    let mut headers = HeaderMap::new();
    headers.insert("host", HeaderValue::from_static("index.local"));
    headers.insert("sec-ch-prefers-color-scheme", HeaderValue::from_static("\"dark\""));

    let response = get_with(&state, "/api/preview?path=/Shows/ep1.mp4", headers).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["kind"], "video");
    assert_eq!(body["theme"], "dark");
    assert_eq!(body["video"]["ratio"], "1280:720");
    assert_eq!(body["video"]["videoUrl"], "/api/raw?path=/Shows/ep1.mp4");
    assert_eq!(
        body["video"]["directLink"],
        "http://index.local/api/raw?path=/Shows/ep1.mp4"
    );

    let subtitles = body["video"]["subtitles"].as_array().unwrap();
    assert_eq!(subtitles.len(), 2);
    assert_eq!(subtitles[0]["label"], "Default");
    assert_eq!(subtitles[0]["srclang"], "und");
    assert_eq!(subtitles[0]["src"], "/api/raw?path=/Shows/ep1.vtt&proxy=true");
    assert_eq!(subtitles[1]["label"], "en");
    assert_eq!(subtitles[1]["default"], false);
}

#[tokio::test]
async fn test_preview_rejects_folders() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2FShows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Shows", "folder": {}
        })))
        .mount(&server)
        .await;

    let state = state(&server, &[]).await;
    let response = get(&state, "/api/preview?path=/Shows").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Preview is only available for files." })
    );
}

#[tokio::test]
async fn test_index_raw_flag_delegates_to_raw() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2Fa.txt"))
        .and(query_param("select", "id,size,@microsoft.graph.downloadUrl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@microsoft.graph.downloadUrl": "https://dl.example/a"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = state(&server, &[]).await;
    let response = get(&state, "/api?path=/a.txt&raw=true").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "https://dl.example/a");
}

#[tokio::test]
async fn test_index_rejects_unfilled_path_placeholder() {
    let server = MockServer::start().await;
    let state = state(&server, &[]).await;

    let response = get(&state, "/api?path=%5B...path%5D").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({ "error": "No path specified." }));

    let response = get(&state, "/api/preview?path=%5B...path%5D").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_index_protected_folder() {
    let server = MockServer::start().await;
    mount_password(&server, "hunter2").await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2FPrivate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "01P", "name": "Private", "folder": { "childCount": 1 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2FPrivate:/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "id": "1", "name": "doc.pdf", "file": {} }]
        })))
        .mount(&server)
        .await;

    let state = state(&server, &["--protected-routes", "/Private"]).await;

    let response = get(&state, "/api?path=/Private").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({ "error": "Password required." }));

    let target = format!("/api?path=/Private&odpt={}", hash_token("hunter2"));
    let response = get(&state, &target).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["cache-control"], "no-cache");
    assert_eq!(body_json(response).await["folder"]["value"][0]["name"], "doc.pdf");
}

#[tokio::test]
async fn test_preview_protected_file() {
    let server = MockServer::start().await;
    mount_password(&server, "hunter2").await;
    Mock::given(method("GET"))
        .and(path("/drive/root:%2FPrivate%2Fdoc.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "01D", "name": "doc.pdf", "file": { "mimeType": "application/pdf" }
        })))
        .mount(&server)
        .await;

    let state = state(&server, &["--protected-routes", "/Private"]).await;

    let response = get(&state, "/api/preview?path=/Private/doc.pdf").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut headers = HeaderMap::new();
    headers.insert(
        "od-protected-token",
        HeaderValue::from_str(&hash_token("hunter2")).unwrap(),
    );
    let response = get_with(&state, "/api/preview?path=/Private/doc.pdf", headers).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["cache-control"], "no-cache");
    assert_eq!(body_json(response).await["name"], "doc.pdf");
}

#[tokio::test]
async fn test_root_protected_route_guards_whole_drive() {
    let server = MockServer::start().await;
    let download = format!("{}/dl/root-password", server.uri());
    Mock::given(method("GET"))
        .and(path("/drive/root:%2F.password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@microsoft.graph.downloadUrl": download,
            "file": {}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dl/root-password"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hunter2"))
        .mount(&server)
        .await;

    let state = state(&server, &["--protected-routes", "/"]).await;
    let response = get(&state, "/api/raw?path=/Secret/tax.pdf").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({ "error": "Password required." }));
}

// ============================================================================
// Missing or unreadable tokens
// ============================================================================

#[tokio::test]
async fn test_search_and_item_without_token_are_forbidden() {
    let server = MockServer::start().await;
    let state = state_without_tokens(&server).await;

    let response = get(&state, "/api/search?q=cats").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await, json!({ "error": "No access token." }));

    let response = get(&state, "/api/item?id=01ABC").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await, json!({ "error": "No access token." }));

    // The id is validated before the token is looked up
    let response = get(&state, "/api/item?id=..%2F01ABC").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_token_store_failure_is_internal_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/accounts/acct/storage/kv/namespaces/ns/values/"))
        .and(header("authorization", "Bearer cf-token"))
        .respond_with(ResponseTemplate::new(500).set_body_string("kv unavailable"))
        .mount(&server)
        .await;

    let cf_base = server.uri();
    let state = AppState::new(args(
        &server,
        &[
            "--token-store",
            "cloudflare",
            "--cf-api-base",
            cf_base.as_str(),
            "--cf-account-id",
            "acct",
            "--cf-namespace-id",
            "ns",
            "--cf-api-token",
            "cf-token",
        ],
    ))
    .unwrap();

    let response = get(&state, "/api/raw?path=/a.txt").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({ "error": "Internal server error." }));

    let response = get(&state, "/api?path=/").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ============================================================================
// Service endpoints
// ============================================================================

#[tokio::test]
async fn test_health_and_version() {
    let server = MockServer::start().await;
    let state = state(&server, &[]).await;

    let health = body_json(get(&state, "/health").await).await;
    assert_eq!(health["healthy"], true);
    assert_eq!(health["token_store"], "memory");

    let version = body_json(get(&state, "/version").await).await;
    assert_eq!(version["service"], "odindex");
}

#[tokio::test]
async fn test_preflight_and_not_found() {
    let server = MockServer::start().await;
    let state = state(&server, &[]).await;

    let response = route(&state, &Method::OPTIONS, "/api/raw", None, &HeaderMap::new()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");

    let response = get(&state, "/api/unknown").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = route(&state, &Method::POST, "/api/raw", None, &HeaderMap::new()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
