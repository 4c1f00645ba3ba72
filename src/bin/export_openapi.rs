//! Write the gateway's OpenAPI document as JSON
//!
//! Usage:
//!   export_openapi                 # stdout
//!   export_openapi --output FILE   # file

use anyhow::Context;
use ingest_gate::gateway::openapi::ApiDoc;
use utoipa::OpenApi;

fn output_path() -> Option<String> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--output" || arg == "-o" {
            return args.next();
        }
    }
    None
}

fn main() -> anyhow::Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("serializing OpenAPI document")?;

    match output_path() {
        Some(path) => {
            std::fs::write(&path, &json).with_context(|| format!("writing {path}"))?;
            eprintln!("OpenAPI document written to {path}");
        }
        None => println!("{json}"),
    }
    Ok(())
}
