#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = elamid_api::run().await {
        eprintln!("elamid-api fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
