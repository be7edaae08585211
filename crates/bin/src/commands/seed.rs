//! Seed command - replaces the demo collections with fixture data.

use orderable::fixtures;

use crate::cli::SeedArgs;
use crate::output::{OutputFormat, print_json, print_table};
use crate::session::Session;

/// Run the seed command
pub async fn run(args: &SeedArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(&args.backend_config).await?;
    let report = fixtures::seed(&session.services).await?;
    session.close().await?;

    match format {
        OutputFormat::Human => {
            let mut rows = vec![
                vec![fixtures::ORDERABLE_JOIN.to_string(), "Join A".to_string(), report.join_a.to_string()],
                vec![fixtures::ORDERABLE_JOIN.to_string(), "Join B".to_string(), report.join_b.to_string()],
            ];
            for (title, id) in ["A", "B", "C", "D"].iter().zip(&report.orderable) {
                rows.push(vec![fixtures::ORDERABLE.to_string(), title.to_string(), id.to_string()]);
            }
            for (i, id) in report.posts.iter().enumerate() {
                rows.push(vec![
                    fixtures::NON_UNIQUE_SORT.to_string(),
                    format!("Post {i}"),
                    id.to_string(),
                ]);
            }
            print_table(&["COLLECTION", "TITLE", "ID"], &rows);
        }
        OutputFormat::Json => print_json(&report)?,
    }

    Ok(())
}
