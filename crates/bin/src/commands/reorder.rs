//! Move commands - reposition records inside or across domains.

use orderable::order::Committed;

use crate::cli::{MoveArgs, MoveToGroupArgs};
use crate::output::{OutputFormat, print_json, print_table};
use crate::session::Session;

fn print_committed(
    committed: &[Committed],
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Human => {
            let rows: Vec<Vec<String>> = committed
                .iter()
                .map(|c| {
                    vec![
                        c.id.to_string(),
                        c.domain.to_string(),
                        c.value.to_string(),
                        c.rewritten.to_string(),
                    ]
                })
                .collect();
            print_table(&["ID", "DOMAIN", "VALUE", "REWRITTEN"], &rows);
        }
        OutputFormat::Json => print_json(committed)?,
    }
    Ok(())
}

/// Run the move command
pub async fn run_move(
    args: &MoveArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(&args.backend_config).await?;
    let service = session.service(args.ordering);

    let committed = match args.ids.as_slice() {
        [id] => vec![service.move_item(id, args.to.clone()).await?],
        ids => service.move_many(ids, args.to.clone()).await?,
    };
    session.close().await?;

    print_committed(&committed, format)
}

/// Run the move-to-group command
pub async fn run_move_to_group(
    args: &MoveToGroupArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(&args.backend_config).await?;
    let committed = session
        .service(args.ordering)
        .move_to_group(&args.id, args.group.clone(), args.to.clone())
        .await?;
    session.close().await?;

    print_committed(&[committed], format)
}
