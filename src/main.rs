mod application;
mod domain;
mod infrastructure;
mod presentation;

use infrastructure::{AppContainer, LibraryConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = LibraryConfig::load()?;
    let container = AppContainer::new(config)?;

    container.create_http_server().run().await
}
