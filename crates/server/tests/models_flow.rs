use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use service::storage::local::LocalFileStore;
use tower::Service;
use uuid::Uuid;

use server::routes::{self, auth};

const BOUNDARY: &str = "----market-test-boundary";
const PUBLIC_URL: &str = "http://localhost:8080";

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

struct TestApp {
    app: Router,
    db: DatabaseConnection,
    storage_root: PathBuf,
}

async fn build_app() -> anyhow::Result<TestApp> {
    let db = models::db::connect_in_memory().await?;
    let storage_root = std::env::temp_dir().join(format!("market_flow_{}", Uuid::new_v4()));
    let store = Arc::new(LocalFileStore::new(storage_root.clone(), &format!("{PUBLIC_URL}/storage")));
    let state = auth::ServerState::new(
        db.clone(),
        store,
        auth::ServerAuthConfig { jwt_secret: "test-secret".into(), token_ttl_hours: 1 },
        PUBLIC_URL,
        storage_root.clone(),
        26 * 1024 * 1024,
    );
    Ok(TestApp { app: routes::build_router(state, cors()), db, storage_root })
}

async fn body_json(resp: axum::response::Response) -> anyhow::Result<Value> {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn post_json(app: &mut Router, uri: &str, body: Value) -> anyhow::Result<axum::response::Response> {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body)?))?;
    Ok(app.call(req).await?)
}

/// Register + login; returns (user id, bearer token).
async fn login(app: &mut Router) -> anyhow::Result<(String, String)> {
    let email = format!("seller_{}@example.com", Uuid::new_v4());
    let resp = post_json(app, "/auth/register", json!({"email": email, "name": "Seller", "username": "seller", "password": "S3curePass!"})).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = post_json(app, "/auth/login", json!({"email": email, "password": "S3curePass!"})).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await?;
    Ok((body["user_id"].as_str().unwrap_or_default().to_string(), body["token"].as_str().unwrap_or_default().to_string()))
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes());
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, data) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n")
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

async fn post_model(app: &mut Router, token: Option<&str>, parts: &[Part<'_>]) -> anyhow::Result<axum::response::Response> {
    let mut req = Request::builder()
        .method("POST")
        .uri("/models")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(t) = token {
        req = req.header("authorization", format!("Bearer {t}"));
    }
    Ok(app.call(req.body(Body::from(multipart_body(parts)))?).await?)
}

async fn get(app: &mut Router, uri: &str) -> anyhow::Result<axum::response::Response> {
    Ok(app.call(Request::builder().uri(uri).body(Body::empty())?).await?)
}

#[tokio::test]
async fn test_create_car_listing() -> anyhow::Result<()> {
    let mut t = build_app().await?;
    let category = models::category::create(&t.db, "Vehicles", "vehicles").await?;
    let (user_id, token) = login(&mut t.app).await?;

    let cat_id = category.id.to_string();
    let resp = post_model(
        &mut t.app,
        Some(&token),
        &[
            Part::Text("title", "Car"),
            Part::Text("price", "10"),
            Part::Text("category_id", &cat_id),
            Part::Text("description", ""),
            Part::File("file", "car.zip", b"PK\x03\x04zip"),
            Part::File("preview_image_url", "car.png", b"\x89PNG"),
            Part::File("texture_url", "", b""),
        ],
    )
    .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await?;
    assert_eq!(body["message"], "Model created successfully!");
    let model = &body["model"];
    assert_eq!(model["title"], "Car");
    assert_eq!(model["category"]["id"], json!(category.id));
    assert_eq!(model["author"]["id"], json!(user_id));
    assert!(model["description"].is_null());
    assert!(model["texture_url"].is_null());

    let id = model["id"].as_i64().unwrap();
    let folder = format!("author_{user_id}/model_{id}");
    assert_eq!(model["file_url"], json!(format!("{PUBLIC_URL}/storage/{folder}/archive.zip")));
    assert_eq!(model["preview_image_url"], json!(format!("{PUBLIC_URL}/storage/{folder}/preview.png")));

    // stored file is served back under /storage
    let resp = get(&mut t.app, &format!("/storage/{folder}/archive.zip")).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    assert_eq!(&bytes[..], b"PK\x03\x04zip");

    let resp = get(&mut t.app, &format!("/models/{id}")).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await?["author"]["username"], "seller");

    let _ = tokio::fs::remove_dir_all(&t.storage_root).await;
    Ok(())
}

#[tokio::test]
async fn test_unknown_category_is_422() -> anyhow::Result<()> {
    let mut t = build_app().await?;
    let (_, token) = login(&mut t.app).await?;

    let resp = post_model(
        &mut t.app,
        Some(&token),
        &[
            Part::Text("title", "Car"),
            Part::Text("price", "10"),
            Part::Text("category_id", "999999"),
            Part::File("file", "car.zip", b"PK"),
            Part::File("preview_image_url", "car.png", b"png"),
        ],
    )
    .await?;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(resp).await?;
    assert_eq!(body["errors"]["category_id"][0], "The selected category id is invalid.");
    assert_eq!(models::model_listing::count(&t.db).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_missing_files_and_negative_price_write_nothing() -> anyhow::Result<()> {
    let mut t = build_app().await?;
    let category = models::category::create(&t.db, "Props", "props").await?;
    let (_, token) = login(&mut t.app).await?;

    let cat_id = category.id.to_string();
    let resp = post_model(
        &mut t.app,
        Some(&token),
        &[Part::Text("title", "Chair"), Part::Text("price", "-3"), Part::Text("category_id", &cat_id)],
    )
    .await?;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = body_json(resp).await?["errors"].clone();
    assert_eq!(errors["file"][0], "The file field is required.");
    assert_eq!(errors["preview_image_url"][0], "The preview image url field is required.");
    assert_eq!(errors["price"][0], "The price field must be at least 0.");

    assert_eq!(models::model_listing::count(&t.db).await?, 0);
    assert!(tokio::fs::metadata(&t.storage_root).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_wrong_extension_is_422() -> anyhow::Result<()> {
    let mut t = build_app().await?;
    let category = models::category::create(&t.db, "Props", "props").await?;
    let (_, token) = login(&mut t.app).await?;

    let cat_id = category.id.to_string();
    let resp = post_model(
        &mut t.app,
        Some(&token),
        &[
            Part::Text("title", "Chair"),
            Part::Text("price", "1"),
            Part::Text("category_id", &cat_id),
            Part::File("file", "chair.exe", b"MZ"),
            Part::File("preview_image_url", "chair.gif", b"GIF"),
        ],
    )
    .await?;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = body_json(resp).await?["errors"].clone();
    assert_eq!(errors["file"][0], "The file field must be a file of type: zip, rar.");
    assert_eq!(errors["preview_image_url"][0], "The preview image url field must be a file of type: png, jpg, jpeg.");
    Ok(())
}

#[tokio::test]
async fn test_write_routes_require_token() -> anyhow::Result<()> {
    let mut t = build_app().await?;

    let resp = post_model(&mut t.app, None, &[Part::Text("title", "Car")]).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = post_model(&mut t.app, Some("not-a-jwt"), &[Part::Text("title", "Car")]).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = get(&mut t.app, "/auth/me").await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // reads stay public
    let resp = get(&mut t.app, "/models").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_index_paginates_newest_first() -> anyhow::Result<()> {
    let mut t = build_app().await?;
    let category = models::category::create(&t.db, "Vehicles", "vehicles").await?;
    let author = models::user::create(&t.db, "bulk@example.com", "Bulk", None).await?;
    for i in 0..25 {
        let new = models::model_listing::NewModelListing {
            author_id: author.id,
            title: format!("Model {i}"),
            description: None,
            price: 1.0,
            category_id: category.id,
            end_date: None,
        };
        models::model_listing::insert_metadata(&t.db, new).await?;
    }

    let first = body_json(get(&mut t.app, "/models").await?).await?;
    let data = first["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(data.len(), 20);
    assert_eq!(first["per_page"], 20);
    assert_eq!(first["path"], format!("{PUBLIC_URL}/models"));
    assert!(first["prev_cursor"].is_null());
    assert_eq!(data[0]["title"], "Model 24");
    assert_eq!(data[0]["author"]["name"], "Bulk");
    assert_eq!(data[0]["category"]["code"], "vehicles");
    // index projection omits texture/fbx urls
    assert!(data[0].get("texture_url").is_none());

    let next = first["next_cursor"].as_str().unwrap_or_default().to_string();
    assert_eq!(first["next_page_url"], format!("{PUBLIC_URL}/models?cursor={next}"));
    let second = body_json(get(&mut t.app, &format!("/models?cursor={next}")).await?).await?;
    let data2 = second["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(data2.len(), 5);
    assert_eq!(data2[4]["title"], "Model 0");
    assert!(second["next_cursor"].is_null());
    assert!(second["prev_cursor"].is_string());

    let prev = second["prev_cursor"].as_str().unwrap_or_default().to_string();
    let back = body_json(get(&mut t.app, &format!("/models?cursor={prev}")).await?).await?;
    assert_eq!(back["data"], first["data"]);
    Ok(())
}

#[tokio::test]
async fn test_show_update_destroy() -> anyhow::Result<()> {
    let mut t = build_app().await?;
    let (_, token) = login(&mut t.app).await?;

    let resp = get(&mut t.app, "/models/12345").await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = Request::builder()
        .method("PUT")
        .uri("/models/1")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())?;
    assert_eq!(t.app.call(req).await?.status(), StatusCode::NOT_IMPLEMENTED);

    let req = Request::builder()
        .method("DELETE")
        .uri("/models/1")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())?;
    assert_eq!(t.app.call(req).await?.status(), StatusCode::NOT_IMPLEMENTED);

    let req = Request::builder().method("DELETE").uri("/models/1").body(Body::empty())?;
    assert_eq!(t.app.call(req).await?.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
