use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Add the accounts of an SNS notification to the catalog")]
pub(crate) struct AddAccountCommand {
    #[arg(long, short, help = "SNS event JSON file. Reads stdin when omitted.")]
    pub event: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Write the entities of an SQS event to the catalog")]
pub(crate) struct AddEntityCommand {
    #[arg(long, short, help = "SQS event JSON file. Reads stdin when omitted.")]
    pub event: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Remove an entity from the catalog")]
pub(crate) struct RemoveEntityCommand {
    #[arg(long, short, help = "Entity JSON file. Reads stdin when omitted.")]
    pub entity: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Build the entity of a single resource and write it to the catalog")]
pub(crate) struct SyncResourceCommand {
    #[arg(
        long,
        short,
        help = "Resource JSON file tagged with `resource_type`. Reads stdin when omitted."
    )]
    pub resource: Option<PathBuf>,

    #[arg(long, help = "Print the entity instead of writing it")]
    pub dry_run: bool,
}
