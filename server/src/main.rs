#[tokio::main]
async fn main() -> anyhow::Result<()> {
    haraj_server::run().await
}
