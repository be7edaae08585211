//! Maintenance commands - rebalance and backfill a domain.

use orderable::order::RebalanceReport;

use crate::cli::DomainArgs;
use crate::output::{OutputFormat, print_json};
use crate::session::Session;

fn print_report(
    verb: &str,
    report: &RebalanceReport,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Human => println!(
            "{verb} {}: {} items, {} rewritten",
            report.domain, report.items, report.rewritten
        ),
        OutputFormat::Json => print_json(report)?,
    }
    Ok(())
}

/// Run the rebalance command
pub async fn rebalance(
    args: &DomainArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(&args.backend_config).await?;
    let domain = Session::domain(args.ordering, args.group.clone());
    let report = session.service(args.ordering).rebalance(&domain).await?;
    session.close().await?;

    print_report("Rebalanced", &report, format)
}

/// Run the backfill command
pub async fn backfill(
    args: &DomainArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(&args.backend_config).await?;
    let domain = Session::domain(args.ordering, args.group.clone());
    let report = session.service(args.ordering).backfill(&domain).await?;
    session.close().await?;

    print_report("Backfilled", &report, format)
}
