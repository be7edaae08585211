//! List command - prints an ordering.

use crate::cli::ListArgs;
use crate::output::{OutputFormat, print_items};
use crate::session::Session;

/// Run the list command
pub async fn run(args: &ListArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(&args.backend_config).await?;
    let service = session.service(args.ordering);

    let items = match &args.group {
        Some(group) => {
            let domain = Session::domain(args.ordering, Some(group.clone()));
            service.list_ordered(&domain).await?.collect()
        }
        None => service.list_all().await?,
    };
    print_items(&items, format)?;

    session.close().await
}
