//! Example: Export a user's friends and print the JSON report
//!
//! Run with: ACCESS_TOKEN=... cargo run -p friendkit --example export_to_stdout -- <user_id>
//!
//! This example drives the whole pipeline against the live VK API.

use friendkit::{export_friends, JsonFraming, ReportFormat, SinkOptions, VkFriendsClient};
use std::env;

#[tokio::main]
async fn main() {
    let token = env::var("ACCESS_TOKEN").unwrap_or_default();
    let user_id = match env::args().nth(1) {
        Some(id) => id,
        None => {
            eprintln!("Usage: export_to_stdout <user_id>");
            std::process::exit(1);
        }
    };

    let client = match VkFriendsClient::builder(token, user_id).build() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let base = env::temp_dir().join("friendkit-example");
    let options = SinkOptions {
        json_framing: JsonFraming::Strict,
    };
    let result = match ReportFormat::Json.create_sink(&base, &options) {
        Ok(mut sink) => export_friends(&client, sink.as_mut(), 1000).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(summary) => {
            let path = ReportFormat::Json.report_path(&base);
            match std::fs::read_to_string(&path) {
                Ok(content) => println!("{}", content),
                Err(e) => eprintln!("Error reading {}: {}", path.display(), e),
            }
            println!(
                "\n{} of {} friends exported in {} requests",
                summary.written, summary.total, summary.pages
            );
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
