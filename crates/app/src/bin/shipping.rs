#[tokio::main]
async fn main() {
    app::main_for(app::SHIPPING).await
}
