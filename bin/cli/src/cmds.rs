use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cmds::catalog::{
    AddAccountCommand, AddEntityCommand, RemoveEntityCommand, SyncResourceCommand,
};
use crate::cmds::discovery::{
    ListAccountBucketsCommand, ProcessAccountCommand, ProcessBucketCommand,
    ProcessEcsClustersCommand, ProcessVpcsCommand,
};

pub mod catalog;
pub mod discovery;

#[derive(Debug, Parser)]
#[command(name = "catalog-sync", about = "Keep the software catalog in step with AWS resources")]
pub struct Opt {
    #[arg(
        long,
        help = "Prints a verbose output during the program execution",
        global = true
    )]
    pub debug: bool,

    #[arg(long, help = "Emit logs as JSON lines", global = true)]
    pub log_json: bool,

    #[arg(
        long,
        short,
        help = "TOML file with settings. Environment variables take precedence.",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        help = "Attempt every record of a batch and report all failures at the end",
        global = true
    )]
    pub continue_on_error: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    AddAccountToCatalog(AddAccountCommand),
    AddEntityToCatalog(AddEntityCommand),
    ListAccountS3Buckets(ListAccountBucketsCommand),
    ProcessAccount(ProcessAccountCommand),
    ProcessCreatedS3Bucket(ProcessBucketCommand),
    ProcessEcsClusters(ProcessEcsClustersCommand),
    ProcessVpcs(ProcessVpcsCommand),
    RemoveEntityFromCatalog(RemoveEntityCommand),
    SyncResource(SyncResourceCommand),
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use crate::cmds::{Command, Opt};

    #[test]
    fn verify_cli() {
        Opt::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let opt = Opt::try_parse_from([
            "catalog-sync",
            "process-vpcs",
            "--snapshot",
            "snapshot.json",
            "--continue-on-error",
            "--log-json",
        ])
        .unwrap();

        assert!(opt.continue_on_error);
        assert!(opt.log_json);
        assert!(matches!(opt.cmd, Command::ProcessVpcs(ref cmd) if cmd.event.is_none()));
    }
}
