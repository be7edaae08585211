//! Info command - shows the backend and per-collection record counts.

use orderable::record::Filter;

use crate::backend::backend_label;
use crate::cli::InfoArgs;
use crate::output::{OutputFormat, print_table};
use crate::session::Session;

/// Run the info command
pub async fn run(args: &InfoArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(&args.backend_config).await?;
    let backend_str = backend_label(&args.backend_config);
    let key_length = session.services.orderable.key_space().length();

    let mut counts = Vec::new();
    for collection in session.backend.collections().await? {
        let records = session.backend.query(&collection, &Filter::All).await?;
        counts.push((collection, records.len()));
    }

    match format {
        OutputFormat::Human => {
            println!("Backend:     {backend_str}");
            println!("Key length:  {key_length}");
            println!();
            if counts.is_empty() {
                println!("No collections found.");
            } else {
                let rows: Vec<Vec<String>> = counts
                    .iter()
                    .map(|(name, count)| vec![name.clone(), count.to_string()])
                    .collect();
                print_table(&["COLLECTION", "RECORDS"], &rows);
            }
        }
        OutputFormat::Json => {
            let collections: serde_json::Map<String, serde_json::Value> = counts
                .into_iter()
                .map(|(name, count)| (name, count.into()))
                .collect();
            let value = serde_json::json!({
                "backend": backend_str,
                "key_length": key_length,
                "collections": collections,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }

    session.close().await
}
