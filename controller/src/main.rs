mod backend;
mod hardware;
mod host;
mod link;
mod publisher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
