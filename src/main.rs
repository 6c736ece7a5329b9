use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    remindbot::cli::run().await
}
