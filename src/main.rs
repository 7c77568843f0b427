#[tokio::main]
async fn main() {
    if let Err(e) = medrec_lib::run().await {
        tracing::error!("Startup failed: {e}");
        eprintln!("medrec: {e}");
        std::process::exit(1);
    }
}
