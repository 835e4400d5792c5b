#[tokio::main]
async fn main() {
    if let Err(e) = compass_lib::run().await {
        eprintln!("compass: {}", e);
        std::process::exit(1);
    }
}
