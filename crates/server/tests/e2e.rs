use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use service::storage::local::LocalFileStore;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use server::routes::{self, auth};

fn cors() -> CorsLayer { CorsLayer::very_permissive() }

struct TestApp {
    base_url: String,
    category_id: i64,
}

async fn start_server() -> anyhow::Result<TestApp> {
    let db = models::db::connect_in_memory().await?;
    let category = models::category::create(&db, "Characters", "characters").await?;

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    let root = std::env::temp_dir().join(format!("market_e2e_{}", Uuid::new_v4()));
    let store = Arc::new(LocalFileStore::new(root.clone(), &format!("{base_url}/storage")));
    let state = auth::ServerState::new(
        db,
        store,
        auth::ServerAuthConfig { jwt_secret: "test-secret".into(), token_ttl_hours: 1 },
        &base_url,
        root,
        26 * 1024 * 1024,
    );
    let app: Router = routes::build_router(state, cors());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url, category_id: category.id })
}

#[tokio::test]
async fn e2e_upload_then_download() -> anyhow::Result<()> {
    let app = start_server().await?;
    let client = reqwest::Client::new();

    let email = format!("e2e_{}@example.com", Uuid::new_v4());
    let res = client
        .post(format!("{}/auth/register", app.base_url))
        .json(&json!({"email": email, "name": "E2E", "password": "E2ePassword!"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let login: Value = client
        .post(format!("{}/auth/login", app.base_url))
        .json(&json!({"email": email, "password": "E2ePassword!"}))
        .send()
        .await?
        .json()
        .await?;
    let token = login["token"].as_str().unwrap_or_default().to_string();

    let archive = vec![7u8; 64 * 1024];
    let form = Form::new()
        .text("title", "Knight")
        .text("description", "low poly knight")
        .text("price", "4.5")
        .text("category_id", app.category_id.to_string())
        .text("end_date", "2999-01-01")
        .part("file", Part::bytes(archive.clone()).file_name("knight.rar"))
        .part("preview_image_url", Part::bytes(b"jpeg".to_vec()).file_name("knight.JPG"))
        .part("model_fbx", Part::bytes(b"fbx".to_vec()).file_name("knight.fbx"));
    let res = client
        .post(format!("{}/models", app.base_url))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let created: Value = res.json().await?;
    let model = &created["model"];
    assert_eq!(model["price"], 4.5);
    assert_eq!(model["end_date"], "2999-01-01");
    let fbx_url = model["model_fbx_url"].as_str().unwrap_or_default().to_string();
    assert!(fbx_url.ends_with("/model.fbx"));
    assert!(model["preview_image_url"].as_str().unwrap_or_default().ends_with("/preview.jpg"));

    let file_url = model["file_url"].as_str().unwrap_or_default().to_string();
    assert!(file_url.ends_with("/archive.rar"));
    let downloaded = client.get(&file_url).send().await?.bytes().await?;
    assert_eq!(downloaded.len(), archive.len());

    let page: Value = client.get(format!("{}/models", app.base_url)).send().await?.json().await?;
    assert_eq!(page["data"][0]["title"], "Knight");
    assert!(page["next_cursor"].is_null());
    Ok(())
}

#[tokio::test]
async fn e2e_oversized_preview_is_rejected() -> anyhow::Result<()> {
    let app = start_server().await?;
    let client = reqwest::Client::new();
    let email = format!("e2e_{}@example.com", Uuid::new_v4());
    client
        .post(format!("{}/auth/register", app.base_url))
        .json(&json!({"email": email, "name": "E2E", "password": "E2ePassword!"}))
        .send()
        .await?;
    let login: Value = client
        .post(format!("{}/auth/login", app.base_url))
        .json(&json!({"email": email, "password": "E2ePassword!"}))
        .send()
        .await?
        .json()
        .await?;
    let token = login["token"].as_str().unwrap_or_default().to_string();

    let form = Form::new()
        .text("title", "Huge")
        .text("price", "1")
        .text("category_id", app.category_id.to_string())
        .part("file", Part::bytes(b"PK".to_vec()).file_name("huge.zip"))
        .part("preview_image_url", Part::bytes(vec![0u8; 3 * 1024 * 1024]).file_name("huge.png"));
    let res = client.post(format!("{}/models", app.base_url)).bearer_auth(&token).multipart(form).send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await?;
    assert_eq!(
        body["errors"]["preview_image_url"][0],
        "The preview image url field must not be greater than 2048 kilobytes."
    );
    Ok(())
}
