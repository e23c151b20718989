//! Example: List recently saved documents with focused content
//!
//! Run with: READWISE_TOKEN=... cargo run -p readkit --example recent_documents -- 2024-05-01 rust
//!
//! The first argument is the `addedAfter` date, the rest are content keywords.

use readkit::{ListingResult, ReaderError, Tool};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), ReaderError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let added_after = args.next().unwrap_or_else(|| "2024-01-01".to_string());
    let keywords: Vec<String> = args.collect();

    let token = std::env::var("READWISE_TOKEN").unwrap_or_default();
    let tool = Tool::builder().token(token).build()?;

    let mut request = json!({
        "addedAfter": added_after,
        "limit": 3,
        "withFullContent": true,
        "contentMaxLength": 2000,
    });
    if !keywords.is_empty() {
        request["contentFilterKeywords"] = json!(keywords);
    }

    println!("ReadKit recent documents");
    println!("========================\n");

    let output = tool.call("readwise_list_documents", request).await?;
    println!("{}", output.render());

    // The listing API is also usable directly
    let params = serde_json::from_value(json!({"addedAfter": added_after}))
        .map_err(|e| ReaderError::InvalidArgument(e.to_string()))?;
    let listing: ListingResult = readkit::listing::list_documents(
        tool.client(),
        &Default::default(),
        &params,
        &Default::default(),
    )
    .await?;
    println!("\n{} document(s) saved after {}", listing.count, added_after);

    Ok(())
}
