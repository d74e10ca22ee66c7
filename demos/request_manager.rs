//! Example demonstrating a request manager.
//!
//! This example shows how to:
//! - Inject an auth header into every request
//! - Observe failures before callers see them
//! - Detach the manager by dropping it
//! - Cancel a dispatched request
//!
//! Run with: `cargo run --example request_manager`

use http::HeaderValue;
use netspec::{Client, ConcreteRequest, Error, RequestManager, RequestSpec};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Session {
    token: HeaderValue,
    failures: AtomicUsize,
}

impl RequestManager for Session {
    fn configure(&self, mut request: ConcreteRequest) -> ConcreteRequest {
        request
            .headers_mut()
            .insert(http::header::AUTHORIZATION, self.token.clone());
        request
    }

    fn error_handle(&self, request: &ConcreteRequest, error: &Error) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        if error.code() == Some(401) {
            eprintln!("Session expired while calling {}", request.url());
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("netspec=info")
        .init();

    let base_url =
        std::env::var("NETSPEC_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    let session = Arc::new(Session {
        token: HeaderValue::from_static("Bearer demo-token"),
        failures: AtomicUsize::new(0),
    });
    let client = Client::builder()
        .base_url(&base_url)?
        .request_manager(Arc::<Session>::downgrade(&session))
        .build()?;

    println!("=== Inspecting the assembled request ===");
    let request = client.assemble(RequestSpec::get("me"))?;
    println!("{} {}", request.method(), request.url());
    println!("Authorization: {:?}", request.header("authorization"));
    println!();

    println!("=== Failures reach the manager first ===");
    match client
        .net_request::<serde_json::Value>(RequestSpec::get("me"))
        .await
    {
        Ok(me) => println!("Signed in as {}", me),
        Err(Error::ServerReported { code, message }) => {
            println!("Backend refused ({}): {}", code, message)
        }
        Err(e) => println!("Request failed: {}", e),
    }
    println!(
        "Failures seen by the session: {}",
        session.failures.load(Ordering::Relaxed)
    );
    println!();

    println!("=== Cancelling a dispatched request ===");
    let feed = client.dispatch::<serde_json::Value>(RequestSpec::get("feed"));
    feed.cancel();
    println!("Feed result: {:?}", feed.await.map(|_| ()));
    println!();

    println!("=== Dropping the manager detaches it ===");
    drop(session);
    let request = client.assemble(RequestSpec::get("me"))?;
    println!("Authorization: {:?}", request.header("authorization"));

    Ok(())
}
