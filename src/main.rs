#[tokio::main]
async fn main() -> anyhow::Result<()> {
    studysync_lib::run().await
}
