#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    lib_emoji_trail::init().await
}
