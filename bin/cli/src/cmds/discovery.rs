use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Build the entities of queued accounts and publish them")]
pub(crate) struct ProcessAccountCommand {
    #[arg(long, short, help = "SQS event JSON file. Reads stdin when omitted.")]
    pub event: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Build the entity of a newly created S3 bucket and publish it")]
pub(crate) struct ProcessBucketCommand {
    #[arg(long, short, help = "EventBridge CreateBucket event JSON file. Reads stdin when omitted.")]
    pub event: Option<PathBuf>,

    #[arg(long, short, help = "Snapshot of account resources")]
    pub snapshot: PathBuf,
}

#[derive(Parser, Debug)]
#[command(about = "Build and publish the entities of the ECS clusters of queued accounts")]
pub(crate) struct ProcessEcsClustersCommand {
    #[arg(long, short, help = "SQS event JSON file. Reads stdin when omitted.")]
    pub event: Option<PathBuf>,

    #[arg(long, short, help = "Snapshot of account resources")]
    pub snapshot: PathBuf,
}

#[derive(Parser, Debug)]
#[command(about = "Build and publish the entities of the VPCs of queued accounts")]
pub(crate) struct ProcessVpcsCommand {
    #[arg(long, short, help = "SQS event JSON file. Reads stdin when omitted.")]
    pub event: Option<PathBuf>,

    #[arg(long, short, help = "Snapshot of account resources")]
    pub snapshot: PathBuf,
}

#[derive(Parser, Debug)]
#[command(about = "Announce the S3 buckets of queued accounts on the event bus")]
pub(crate) struct ListAccountBucketsCommand {
    #[arg(long, short, help = "SQS event JSON file. Reads stdin when omitted.")]
    pub event: Option<PathBuf>,

    #[arg(long, short, help = "Snapshot of account resources")]
    pub snapshot: PathBuf,
}
