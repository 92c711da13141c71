#[tokio::main]
async fn main() {
    if let Err(e) = scrumboard_backend::run().await {
        log::error!("scrumboard-backend failed: {}", e);
        eprintln!("scrumboard-backend failed: {}", e);
        std::process::exit(1);
    }
}
