#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = prepline_rust::run().await {
        eprintln!("prepline-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
