// PreventAI entry point

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    preventai_lib::run().await
}
