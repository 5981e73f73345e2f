use atelier_api::app;

#[tokio::main]
async fn main() {
    atelier_observability::init();

    let router = app::build_app().await;

    let addr = std::env::var("ATELIER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|error| panic!("failed to bind {addr}: {error}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, router).await.unwrap();
}
