use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = std::env::var("WORDGAME_MOCK_ADDR").unwrap_or_else(|_| "127.0.0.1:9080".to_string());
    let listener = TcpListener::bind(&addr).await?;
    mock_server::run(listener).await
}
