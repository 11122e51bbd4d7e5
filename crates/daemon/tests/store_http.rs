//! End-to-end tests of the store routes over an in-memory catalog and a
//! temporary blob directory.

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use chrono::Utc;
use tempfile::TempDir;
use tower::ServiceExt;

use artifactorial_daemon::http_server::router;
use artifactorial_daemon::{Database, ServiceState};
use common::prelude::{BlobStore, Directory, Owner, StorePath};

const README: &[u8] = b"some sort of test data";

struct Fixture {
    router: Router,
    state: ServiceState,
    user1: String,
    user2: String,
    user3: String,
    inactive: String,
    _blobs: TempDir,
}

async fn write_blob(root: &TempDir, key: &str, data: &[u8]) {
    let path = root.path().join(key);
    tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    tokio::fs::write(path, data).await.unwrap();
}

async fn setup() -> Fixture {
    let url = url::Url::parse("sqlite::memory:").unwrap();
    let db = Database::connect(&url).await.unwrap();

    let u1 = db.create_user("user1", true).await.unwrap();
    let u2 = db.create_user("user2", true).await.unwrap();
    let u3 = db.create_user("user3", true).await.unwrap();
    let u4 = db.create_user("user4", true).await.unwrap();
    let group = db.create_group("group").await.unwrap();
    for member in [u2, u3, u4] {
        db.add_member(member, group).await.unwrap();
    }
    db.set_user_active(u4, false).await.unwrap();

    let directories = [
        Directory::new("/pub", Owner::User(u1), true).unwrap(),
        Directory::new("/pub/debian", Owner::User(u1), true).unwrap(),
        Directory::new("/private/user1", Owner::User(u1), false).unwrap(),
        Directory::new("/private/user2", Owner::User(u2), false).unwrap(),
        Directory::new("/private/group", Owner::Group(group), false).unwrap(),
        Directory::unchecked(
            StorePath::parse("/anonymous").unwrap(),
            Owner::Anonymous,
            false,
        ),
    ];
    for directory in &directories {
        db.create_directory(directory).await.unwrap();
    }

    let blobs = tempfile::tempdir().unwrap();
    let files: [(&str, &str, &[u8]); 6] = [
        ("/pub/debian", "README.txt", README),
        ("/pub", "debian-7.iso", b"not really an iso"),
        ("/private/user1", "my-cv.pdf", b"%PDF-1.4 cv"),
        ("/private/user2", "foo.jpg", b"\xff\xd8\xff\xe0 jpeg"),
        ("/private/group", "foo/bar.doc", b"word document"),
        ("/anonymous", "a/b.c", b"int main() { return 0; }\n"),
    ];
    for (directory, filename, data) in files {
        let artifact = db
            .create_artifact(directory, filename, true, data.len() as u64, Utc::now())
            .await
            .unwrap();
        write_blob(&blobs, artifact.key(), data).await;
    }
    // recorded, never written
    db.create_artifact("/pub", "missing.iso", true, 1024, Utc::now())
        .await
        .unwrap();

    let user1 = db.create_token(u1, "").await.unwrap().secret;
    let user2 = db.create_token(u2, "").await.unwrap().secret;
    let user3 = db.create_token(u3, "").await.unwrap().secret;
    let inactive = db.create_token(u4, "").await.unwrap().secret;

    let state = ServiceState::new(db, BlobStore::new(blobs.path()).with_chunk_size(4))
        .await
        .unwrap();

    Fixture {
        router: router(state.clone()),
        state,
        user1,
        user2,
        user3,
        inactive,
        _blobs: blobs,
    }
}

async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

async fn get(router: &Router, uri: &str) -> Response<Body> {
    send(router, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::get(uri)
        .header(header::ACCEPT, "application/json")
        .body(Body::empty())
        .unwrap();
    let response = send(router, request).await;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if status == StatusCode::OK {
        serde_json::from_slice(&bytes).unwrap()
    } else {
        serde_json::Value::Null
    };
    (status, value)
}

async fn body(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

fn with_token(uri: &str, token: &str) -> String {
    format!("{}?token={}", uri, token)
}

fn header_str<'a>(response: &'a Response<Body>, name: &str) -> &'a str {
    response.headers().get(name).unwrap().to_str().unwrap()
}

#[tokio::test]
async fn test_root_listing_per_principal() {
    let fx = setup().await;

    for uri in ["/artifacts", "/artifacts/"] {
        let (status, listing) = get_json(&fx.router, uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listing["directory"], "/");
        assert_eq!(listing["directories"], serde_json::json!(["pub"]));
    }

    for token in [&fx.user1, &fx.user2, &fx.user3] {
        let (status, listing) = get_json(&fx.router, &with_token("/artifacts/", token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            listing["directories"],
            serde_json::json!(["anonymous", "private", "pub"])
        );
    }
}

#[tokio::test]
async fn test_inactive_token_is_anonymous() {
    let fx = setup().await;

    let (_, anonymous) = get_json(&fx.router, "/artifacts/").await;
    let (_, inactive) = get_json(&fx.router, &with_token("/artifacts/", &fx.inactive)).await;
    assert_eq!(anonymous, inactive);

    let response = get(
        &fx.router,
        &with_token("/artifacts/private/group/foo/bar.doc", &fx.inactive),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_private_listing() {
    let fx = setup().await;

    let (status, _) = get_json(&fx.router, "/artifacts/private/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listing) = get_json(&fx.router, &with_token("/artifacts/private/", &fx.user1)).await;
    assert_eq!(listing["directories"], serde_json::json!(["user1"]));

    let (_, listing) = get_json(&fx.router, &with_token("/artifacts/private/", &fx.user2)).await;
    assert_eq!(listing["directories"], serde_json::json!(["group", "user2"]));

    let (_, listing) = get_json(&fx.router, &with_token("/artifacts/private/", &fx.user3)).await;
    assert_eq!(listing["directories"], serde_json::json!(["group"]));

    let (status, _) =
        get_json(&fx.router, &with_token("/artifacts/private/user1/", &fx.user2)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_public_listing_files_and_size() {
    let fx = setup().await;

    let (status, listing) = get_json(&fx.router, "/artifacts/pub/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["directory"], "/pub");
    assert_eq!(listing["directories"], serde_json::json!(["debian"]));
    assert_eq!(
        listing["files"],
        serde_json::json!([["debian-7.iso", 17], ["missing.iso", 1024]])
    );
    assert_eq!(listing["size"], 17 + 1024 + README.len());

    let (_, listing) = get_json(&fx.router, "/artifacts/pub/debian/").await;
    assert_eq!(listing["files"], serde_json::json!([["README.txt", 22]]));
    assert_eq!(listing["size"], 22);
}

#[tokio::test]
async fn test_html_listing() {
    let fx = setup().await;

    let request = Request::get("/artifacts/pub/")
        .header(header::ACCEPT, "text/html,application/xhtml+xml")
        .body(Body::empty())
        .unwrap();
    let response = send(&fx.router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, "content-type"),
        "text/html; charset=utf-8"
    );
    let html = String::from_utf8(body(response).await).unwrap();
    assert!(html.contains("Index of /pub"));
    assert!(html.contains("href=\"/artifacts/pub/debian/\""));
    assert!(html.contains("debian-7.iso"));
}

#[tokio::test]
async fn test_head_listing_has_headers_and_no_body() {
    let fx = setup().await;

    let full = get(&fx.router, "/artifacts/pub/").await;
    let full_length = header_str(&full, "content-length").to_string();

    let request = Request::head("/artifacts/pub/").body(Body::empty()).unwrap();
    let response = send(&fx.router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, "content-length"), full_length);
    assert!(body(response).await.is_empty());
}

#[tokio::test]
async fn test_file_access_matrix() {
    let fx = setup().await;
    let cases: [(&str, Option<&str>, StatusCode); 12] = [
        ("/artifacts/private/user1/my-cv.pdf", None, StatusCode::FORBIDDEN),
        ("/artifacts/private/user1/my-cv.pdf", Some(fx.user1.as_str()), StatusCode::OK),
        ("/artifacts/private/user1/my-cv.pdf", Some(fx.user2.as_str()), StatusCode::FORBIDDEN),
        ("/artifacts/private/user2/foo.jpg", Some(fx.user2.as_str()), StatusCode::OK),
        ("/artifacts/private/user2/foo.jpg", Some(fx.user3.as_str()), StatusCode::FORBIDDEN),
        ("/artifacts/private/group/foo/bar.doc", Some(fx.user2.as_str()), StatusCode::OK),
        ("/artifacts/private/group/foo/bar.doc", Some(fx.user3.as_str()), StatusCode::OK),
        ("/artifacts/private/group/foo/bar.doc", Some(fx.user1.as_str()), StatusCode::FORBIDDEN),
        ("/artifacts/anonymous/a/b.c", None, StatusCode::FORBIDDEN),
        ("/artifacts/anonymous/a/b.c", Some(fx.user3.as_str()), StatusCode::OK),
        ("/artifacts/private/user1/nope.pdf", None, StatusCode::NOT_FOUND),
        ("/artifacts/elsewhere/file.txt", Some(fx.user1.as_str()), StatusCode::NOT_FOUND),
    ];

    for (uri, token, expected) in cases {
        let uri = match token {
            Some(token) => with_token(uri, token),
            None => uri.to_string(),
        };
        let response = get(&fx.router, &uri).await;
        assert_eq!(response.status(), expected, "GET {}", uri);
    }
}

#[tokio::test]
async fn test_content_headers() {
    let fx = setup().await;
    let cases = [
        ("/artifacts/private/user1/my-cv.pdf", &fx.user1, "application/pdf", 11),
        ("/artifacts/private/user2/foo.jpg", &fx.user2, "image/jpeg", 9),
        ("/artifacts/private/group/foo/bar.doc", &fx.user2, "application/msword", 13),
        ("/artifacts/pub/debian-7.iso", &fx.user1, "application/x-iso9660-image", 17),
        ("/artifacts/anonymous/a/b.c", &fx.user1, "text/x-csrc", 25),
    ];

    for (uri, token, content_type, length) in cases {
        let response = get(&fx.router, &with_token(uri, token)).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
        assert_eq!(header_str(&response, "content-type"), content_type);
        assert_eq!(header_str(&response, "content-length"), length.to_string());
        assert_eq!(body(response).await.len(), length);
    }
}

#[tokio::test]
async fn test_checksum_and_head() {
    let fx = setup().await;

    let response = get(&fx.router, "/artifacts/pub/debian/README.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, "content-md5"), "YArp1jBLXZOePcEBkVNsWA==");
    assert_eq!(header_str(&response, "content-type"), "text/plain");
    let get_headers = response.headers().clone();
    assert_eq!(body(response).await, README);

    let request = Request::head("/artifacts/pub/debian/README.txt")
        .body(Body::empty())
        .unwrap();
    let response = send(&fx.router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    for name in ["content-md5", "content-type", "content-length"] {
        assert_eq!(response.headers().get(name), get_headers.get(name), "{}", name);
    }
    assert!(body(response).await.is_empty());
}

#[tokio::test]
async fn test_range_request_has_no_checksum() {
    let fx = setup().await;

    let request = Request::get("/artifacts/pub/debian/README.txt")
        .header(header::RANGE, "bytes=0-3")
        .body(Body::empty())
        .unwrap();
    let response = send(&fx.router, request).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert!(response.headers().get("content-md5").is_none());
    assert_eq!(body(response).await, b"some");
}

#[tokio::test]
async fn test_bearer_header() {
    let fx = setup().await;

    let request = Request::get("/artifacts/private/user1/my-cv.pdf")
        .header(header::AUTHORIZATION, format!("Bearer {}", fx.user1))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&fx.router, request).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_only_get_and_head() {
    let fx = setup().await;

    for method in [
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::OPTIONS,
    ] {
        for uri in ["/artifacts/", "/artifacts/pub/debian/README.txt", "/artifacts/nowhere"] {
            let request = Request::builder()
                .method(method.clone())
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let response = send(&fx.router, request).await;
            assert_eq!(
                response.status(),
                StatusCode::METHOD_NOT_ALLOWED,
                "{} {}",
                method,
                uri
            );
            assert_eq!(header_str(&response, "allow"), "GET, HEAD");
        }
    }
}

#[tokio::test]
async fn test_escaping_paths_are_not_found() {
    let fx = setup().await;

    for uri in [
        "/artifacts/../etc/passwd",
        "/artifacts/pub/../../etc/passwd",
        "/artifacts/pub/%2e%2e/%2e%2e/etc/passwd",
    ] {
        let response = get(&fx.router, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {}", uri);
    }

    // collapses to a real artifact
    let response = get(&fx.router, "/artifacts/pub/./debian//README.txt").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_blob_is_server_error() {
    let fx = setup().await;

    let response = get(&fx.router, "/artifacts/pub/missing.iso").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_refresh_picks_up_new_directory() {
    let fx = setup().await;

    let (status, _) = get_json(&fx.router, "/artifacts/released/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let db = fx.state.database();
    let directory = Directory::new("/released", Owner::Anonymous, true).unwrap();
    db.create_directory(&directory).await.unwrap();
    db.create_artifact("/released", "v1.tar.gz", true, 3, Utc::now())
        .await
        .unwrap();
    fx.state.catalog().refresh().await.unwrap();

    let (status, listing) = get_json(&fx.router, "/artifacts/released/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["files"], serde_json::json!([["v1.tar.gz", 3]]));
}

#[tokio::test]
async fn test_deleting_owner_removes_their_directories() {
    let fx = setup().await;

    let uri = with_token("/artifacts/private/user2/", &fx.user1);
    assert_eq!(get(&fx.router, &uri).await.status(), StatusCode::FORBIDDEN);

    let db = fx.state.database();
    sqlx::query("DELETE FROM users WHERE username = ?")
        .bind("user2")
        .execute(&**db)
        .await
        .unwrap();
    fx.state.catalog().refresh().await.unwrap();

    for uri in ["/artifacts/private/user2/", "/artifacts/private/user2/foo.jpg"] {
        for token in [&fx.user1, &fx.user3] {
            let response = get(&fx.router, &with_token(uri, token)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        }
        assert_eq!(get(&fx.router, uri).await.status(), StatusCode::NOT_FOUND);
    }

    let (_, listing) = get_json(&fx.router, &with_token("/artifacts/private/", &fx.user1)).await;
    assert_eq!(listing["directories"], serde_json::json!(["user1"]));
}

#[tokio::test]
async fn test_deleting_group_removes_its_directories() {
    let fx = setup().await;

    let uri = with_token("/artifacts/private/group/foo/bar.doc", &fx.user2);
    assert_eq!(get(&fx.router, &uri).await.status(), StatusCode::OK);

    let db = fx.state.database();
    sqlx::query("DELETE FROM groups WHERE name = ?")
        .bind("group")
        .execute(&**db)
        .await
        .unwrap();
    fx.state.catalog().refresh().await.unwrap();

    for token in [&fx.user1, &fx.user2] {
        let uri = with_token("/artifacts/private/group/foo/bar.doc", token);
        let response = get(&fx.router, &uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_undecodable_path() {
    let fx = setup().await;

    for uri in ["/artifacts/pub/%FF", "/artifacts/pub/%FF/", "/artifacts/%C3%28.txt"] {
        let response = get(&fx.router, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "GET {}", uri);

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = send(&fx.router, request).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "POST {}", uri);
        assert_eq!(header_str(&response, "allow"), "GET, HEAD");
    }
}

#[tokio::test]
async fn test_status_and_fallback() {
    let fx = setup().await;

    assert_eq!(get(&fx.router, "/_status/livez").await.status(), StatusCode::OK);
    assert_eq!(get(&fx.router, "/_status/readyz").await.status(), StatusCode::OK);
    assert_eq!(get(&fx.router, "/elsewhere").await.status(), StatusCode::NOT_FOUND);
}
