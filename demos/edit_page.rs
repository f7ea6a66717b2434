//! Log in and write a page
//!
//! Credentials and the target wiki are read from environment variables:
//! - MEDIAWIKI_API_URL (e.g. https://test.wikipedia.org/w/api.php)
//! - MEDIAWIKI_USERNAME / MEDIAWIKI_PASSWORD (a bot password works too)
//!
//! Usage:
//!   MEDIAWIKI_API_URL=... MEDIAWIKI_USERNAME=... MEDIAWIKI_PASSWORD=... \
//!     RUST_LOG=mediawiki_api=debug cargo run --example edit_page -- "Sandbox" "Hello"

use mediawiki_api::{MediawikiClient, Params};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let api_url = std::env::var("MEDIAWIKI_API_URL")?;
    let username = std::env::var("MEDIAWIKI_USERNAME")?;
    let password = std::env::var("MEDIAWIKI_PASSWORD")?;

    let mut args = std::env::args().skip(1);
    let title = args.next().unwrap_or_else(|| "Sandbox".to_string());
    let text = args.next().unwrap_or_else(|| "Hello from mediawiki-api".to_string());

    let client = MediawikiClient::builder(api_url)
        .user_agent("mediawiki-api-demo/0.1")
        .build()?;

    client.log_in(&username, &password).await?;
    println!("Logged in as {}", username);

    let options = Params::new().with("summary", "demo edit").with("bot", true);
    let response = client.create_page_with(&title, &text, options).await?;
    println!("Edit result: {}", response.data());
    for warning in response.warnings() {
        eprintln!("warning: {}", warning);
    }

    let wikitext = client.get_wikitext(&title).await?;
    println!("Current wikitext of {}:\n{}", title, wikitext);

    Ok(())
}
