#[tokio::main]
async fn main() -> anyhow::Result<()> {
    voxgram::run().await
}
