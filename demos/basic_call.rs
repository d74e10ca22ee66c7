//! Basic example demonstrating envelope-decoded GET and POST requests.
//!
//! This example shows how to:
//! - Create a client bound to one backend
//! - Describe requests with `RequestSpec` and typed query values
//! - Send JSON bodies, flattened or nested under a key
//! - Read raw bytes and loosely-typed JSON
//!
//! Point `NETSPEC_BASE_URL` at a backend that answers with
//! `{"code": 1, "data": ...}` envelopes.
//!
//! Run with: `cargo run --example basic_call`

use netspec::{Client, Error, RequestSpec};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Article {
    id: u64,
    title: String,
}

#[derive(Debug, Serialize)]
struct Draft {
    title: String,
    tags: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("netspec=debug,basic_call=info")
        .init();

    let base_url =
        std::env::var("NETSPEC_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    let client = Client::builder().base_url(&base_url)?.build()?;

    println!("=== GET with typed queries ===");
    // GET /v1/articles?page=2&published=true
    let articles = RequestSpec::get("articles")
        .add_query("page", Some(2))
        .add_query("published", Some(true))
        .add_query("author", None::<&str>);
    let page: Vec<Article> = client.net_request(articles).await?;
    println!("Fetched {} articles", page.len());
    println!();

    println!("=== POST with a nested typed body ===");
    // POST /v2/articles with {"draft": {...}, "notify": false}
    let draft = Draft {
        title: "Hello".to_string(),
        tags: vec!["intro".to_string()],
    };
    let create = RequestSpec::post("articles")
        .change_version(Some("v2"))
        .add_typed_body(&draft, Some("draft"))
        .add_body([("notify", false)]);
    let created: Article = client.net_request(create).await?;
    println!("Created article {}: {}", created.id, created.title);
    println!();

    println!("=== Raw and loose modes ===");
    let bytes = client
        .net_data_request(RequestSpec::get("articles/export").without_version())
        .await?;
    println!("Export is {} bytes", bytes.len());

    let health = client.net_default_request(RequestSpec::get("health")).await?;
    println!("Health: {}", health);

    Ok(())
}
