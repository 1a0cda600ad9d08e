#[tokio::main]
async fn main() {
    app::main_for(app::BILLING).await
}
