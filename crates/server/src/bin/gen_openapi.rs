//! Print the OpenAPI document as JSON, e.g. `cargo run --bin gen-openapi > openapi.json`.

use server::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() {
    match ApiDoc::openapi().to_pretty_json() {
        Ok(doc) => println!("{doc}"),
        Err(e) => {
            eprintln!("Failed to serialize OpenAPI document: {e}");
            std::process::exit(1);
        }
    }
}
