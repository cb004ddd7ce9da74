#[tokio::main]
async fn main() {
    if let Err(e) = game_hub_be::start_server().await {
        eprintln!("Failed to start server: {}", e);
        std::process::exit(1);
    }
}
