mod common;

use axum::{
    Router,
    body::Body,
    http::{
        Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{ADMIN_PASSWORD, ADMIN_USER, Harness, MAX_IMAGE_BYTES, html_with_words};

const BOUNDARY: &str = "bravespace-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: Vec<u8>,
    },
}

fn multipart(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.expect("router responds")
}

async fn json_body(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn authed(method: Method, uri: &str, token: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
}

fn multipart_request(method: Method, uri: &str, token: &str, parts: &[Part<'_>]) -> Request<Body> {
    authed(method, uri, token)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart(parts)))
        .expect("request")
}

async fn login(router: &Router) -> String {
    let response = send(
        router,
        Request::builder()
            .method(Method::POST)
            .uri("/api/admin/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "username": ADMIN_USER, "password": ADMIN_PASSWORD }).to_string(),
            ))
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    body["token"].as_str().expect("token").to_string()
}

async fn create_tag(router: &Router, token: &str, name: &str) -> Response {
    send(
        router,
        authed(Method::POST, "/api/admin/tags", token)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "name": name }).to_string()))
            .expect("request"),
    )
    .await
}

#[tokio::test]
async fn health_reports_no_content() {
    let harness = Harness::new();
    let response = send(&harness.router(), get("/health")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn admin_routes_require_a_session() {
    let harness = Harness::new();
    let router = harness.router();

    let response = send(&router, get("/api/admin/posts")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "unauthorized");

    let response = send(
        &router,
        authed(Method::GET, "/api/admin/posts", "bsa_forged")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let harness = Harness::new();
    let response = send(
        &harness.router(),
        Request::builder()
            .method(Method::POST)
            .uri("/api/admin/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "username": ADMIN_USER, "password": "guess" }).to_string(),
            ))
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_without_configured_credentials_is_unavailable() {
    let harness = Harness::with_credentials(None);
    let response = send(
        &harness.router(),
        Request::builder()
            .method(Method::POST)
            .uri("/api/admin/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "username": "a", "password": "b" }).to_string(),
            ))
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "login_disabled");
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let harness = Harness::new();
    let router = harness.router();
    let token = login(&router).await;

    let response = send(
        &router,
        authed(Method::POST, "/api/admin/logout", &token)
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &router,
        authed(Method::GET, "/api/admin/tags", &token)
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tags_are_created_once_per_slug() {
    let harness = Harness::new();
    let router = harness.router();
    let token = login(&router).await;

    let response = create_tag(&router, &token, "Financial Literacy").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let tag = json_body(response).await;
    assert_eq!(tag["slug"], "financial-literacy");

    let response = create_tag(&router, &token, "financial literacy!").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "duplicate");

    let response = create_tag(&router, &token, "  ").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let tags = json_body(send(&router, get("/api/tags")).await).await;
    assert_eq!(tags.as_array().expect("array").len(), 1);
}

#[tokio::test]
async fn published_post_round_trip_through_the_api() {
    let harness = Harness::new();
    let router = harness.router();
    let token = login(&router).await;

    let tag = json_body(create_tag(&router, &token, "Community").await).await;
    let tag_id = tag["id"].as_str().expect("tag id").to_string();
    let content = html_with_words(250);

    let response = send(
        &router,
        multipart_request(
            Method::POST,
            "/api/admin/posts",
            &token,
            &[
                Part::Text("title", "Beach cleanup"),
                Part::Text("content", &content),
                Part::Text("author", "Ama"),
                Part::Text("action", "publish"),
                Part::Text("tag_ids", &tag_id),
                Part::File {
                    name: "image",
                    filename: "cover.png",
                    content_type: "image/png",
                    data: vec![1, 2, 3, 4],
                },
            ],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let post = json_body(response).await;
    assert_eq!(post["published"], true);
    let post_id = post["id"].as_str().expect("post id").to_string();
    let image_url = post["featured_image_url"].as_str().expect("url").to_string();

    let listing = json_body(send(&router, get(&format!("/api/posts?tag={tag_id}"))).await).await;
    assert_eq!(listing["selected_tag"], tag_id.as_str());
    let posts = listing["posts"].as_array().expect("posts");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["read_time_label"], "2 min read");
    assert_eq!(posts[0]["tags"][0]["name"], "Community");

    let key = image_url.rsplit('/').next().expect("key");
    let response = send(&router, get(&format!("/uploads/blog-images/{key}"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).expect("content type"),
        "image/png"
    );

    let response = send(
        &router,
        authed(Method::POST, &format!("/api/admin/posts/{post_id}/toggle"), &token)
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["published"], false);

    let response = send(&router, get(&format!("/api/posts/{post_id}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &router,
        authed(Method::DELETE, &format!("/api/admin/posts/{post_id}"), &token)
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&router, get(&format!("/uploads/blog-images/{key}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_title_is_a_validation_error() {
    let harness = Harness::new();
    let router = harness.router();
    let token = login(&router).await;

    let response = send(
        &router,
        multipart_request(
            Method::POST,
            "/api/admin/posts",
            &token,
            &[
                Part::Text("content", "<p>body</p>"),
                Part::Text("author", "Ama"),
            ],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "validation_error");
    assert!(
        body["error"]["hint"]
            .as_str()
            .expect("hint")
            .contains("title")
    );
    assert!(harness.store.posts().await.is_empty());
}

#[tokio::test]
async fn oversized_image_is_payload_too_large() {
    let harness = Harness::new();
    let router = harness.router();
    let token = login(&router).await;

    let response = send(
        &router,
        multipart_request(
            Method::POST,
            "/api/admin/posts",
            &token,
            &[
                Part::Text("title", "Big"),
                Part::Text("content", "<p>body</p>"),
                Part::Text("author", "Ama"),
                Part::File {
                    name: "image",
                    filename: "huge.png",
                    content_type: "image/png",
                    data: vec![0; MAX_IMAGE_BYTES as usize + 1],
                },
            ],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(harness.store.posts().await.is_empty());
}

#[tokio::test]
async fn malformed_identifiers_are_bad_requests() {
    let harness = Harness::new();
    let router = harness.router();

    let response = send(&router, get("/api/posts?tag=not-a-uuid")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&router, get("/api/posts/not-a-uuid")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&router, get("/uploads/unknown-bucket/key.png")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn founders_and_gallery_through_the_api() {
    let harness = Harness::new();
    let router = harness.router();
    let token = login(&router).await;

    let response = send(
        &router,
        multipart_request(
            Method::POST,
            "/api/admin/founders",
            &token,
            &[
                Part::Text("name", "Kwame"),
                Part::Text("description", "Runs the mentoring circle."),
                Part::Text("sort_order", "1"),
                Part::File {
                    name: "image",
                    filename: "kwame.jpg",
                    content_type: "image/jpeg",
                    data: vec![9; 16],
                },
            ],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let founder = json_body(response).await;
    let founder_id = founder["id"].as_str().expect("id").to_string();

    let response = send(
        &router,
        multipart_request(
            Method::PUT,
            &format!("/api/admin/founders/{founder_id}"),
            &token,
            &[
                Part::Text("name", "Kwame Asante"),
                Part::Text("description", "Runs the mentoring circle."),
                Part::Text("sort_order", "first"),
            ],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let founders = json_body(send(&router, get("/api/founders")).await).await;
    assert_eq!(founders[0]["name"], "Kwame");

    let response = send(
        &router,
        multipart_request(
            Method::POST,
            "/api/admin/gallery",
            &token,
            &[
                Part::File {
                    name: "files",
                    filename: "one.png",
                    content_type: "image/png",
                    data: vec![1; 8],
                },
                Part::File {
                    name: "files",
                    filename: "two.png",
                    content_type: "image/png",
                    data: vec![2; 8],
                },
            ],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let images = json_body(response).await;
    assert_eq!(images.as_array().expect("images").len(), 2);
    assert_eq!(images[1]["alt_text"], "two");

    let gallery = json_body(send(&router, get("/api/gallery")).await).await;
    assert_eq!(gallery.as_array().expect("gallery").len(), 2);

    let response = send(
        &router,
        multipart_request(
            Method::POST,
            "/api/admin/gallery",
            &token,
            &[Part::Text("caption", "no files here")],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
