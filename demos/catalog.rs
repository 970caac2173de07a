//! Builds a small user catalog, prints it in digest order, then looks up and removes entries.
//!
//! Run with: `RUST_LOG=hashed_index=trace cargo run --example catalog`

use std::error::Error;

use hashed_index::prelude::*;
use serde_json::{json, Value};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut catalog: HashedIndex<Value> = HashedIndex::new();

    catalog.insert("user1", json!({"name": "Alice", "age": 30}));
    catalog.insert("user2", json!({"name": "Bob", "age": 25}));
    catalog.insert("user3", json!({"name": "Charlie", "age": 35}));

    println!("Database Index:");
    catalog.display()?;

    let search_key = "user2";
    println!(
        "\nSearch Result for {search_key}: {}",
        render(catalog.search(search_key))
    );

    catalog.delete("user1");
    println!("\nAfter deleting user1:");
    catalog.display()?;

    println!(
        "\nSearch Result for deleted user1: {}",
        render(catalog.search("user1"))
    );

    Ok(())
}

fn render(value: Option<&Value>) -> String {
    value.map_or_else(|| "None".to_string(), Value::to_string)
}
