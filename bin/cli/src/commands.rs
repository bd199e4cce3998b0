use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use catalog_client::Client;
use resource_collector::events::{self, S3BucketEvent, SnsEvent, SqsEvent};
use resource_collector::{
    handlers, BatchPolicy, BatchReport, CrossAccountRole, Settings, SyncOrchestrator,
};
use software_catalog::{Entity, ResourceDescriptor};
use tracing::info;

use crate::cmds::{Command, Opt};
use crate::lister::SnapshotLister;
use crate::publisher::JsonLinesPublisher;

/// Settings and flags shared by every command.
pub(crate) struct App {
    settings: Settings,
    policy: BatchPolicy,
}

impl App {
    pub fn new(settings: Settings, continue_on_error: bool) -> Self {
        let policy = if continue_on_error {
            BatchPolicy::ContinueOnError
        } else {
            BatchPolicy::AbortOnFirstError
        };

        Self { settings, policy }
    }

    fn orchestrator(&self) -> Result<SyncOrchestrator<Client, Client>> {
        self.settings.validate()?;
        let client = self.settings.catalog_client()?;

        Ok(SyncOrchestrator::new(client.clone(), client).with_policy(self.policy))
    }

    fn entity_publisher(&self) -> Result<JsonLinesPublisher<io::Stdout>> {
        self.settings.validate_entity_queue()?;
        Ok(JsonLinesPublisher::new(&self.settings, io::stdout()))
    }

    fn bus_publisher(&self) -> Result<JsonLinesPublisher<io::Stdout>> {
        self.settings.validate_event_bus()?;
        Ok(JsonLinesPublisher::new(&self.settings, io::stdout()))
    }

    fn lister(&self, snapshot: &Path) -> Result<SnapshotLister> {
        let role = CrossAccountRole::new(&self.settings.cross_account_iam_role_name);
        SnapshotLister::from_path(role, snapshot)
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

fn summarize(flow: &str, report: &BatchReport) {
    info!(
        flow,
        attempted = report.attempted,
        succeeded = report.succeeded,
        "Batch complete"
    );
}

pub(crate) fn invoke(opt: Opt) -> Result<Option<String>> {
    let settings = Settings::load(opt.config.as_deref())?;
    let app = App::new(settings, opt.continue_on_error);

    match opt.cmd {
        Command::AddAccountToCatalog(cmd) => {
            let event: SnsEvent = events::parse("SNS event", &read_input(cmd.event.as_deref())?)?;
            let report = handlers::add_account_to_catalog(&app.orchestrator()?, &event)?;
            summarize("add-account-to-catalog", &report);
            Ok(None)
        }
        Command::AddEntityToCatalog(cmd) => {
            let event: SqsEvent = events::parse("SQS event", &read_input(cmd.event.as_deref())?)?;
            let report = handlers::add_entity_to_catalog(&app.orchestrator()?, &event)?;
            summarize("add-entity-to-catalog", &report);
            Ok(None)
        }
        Command::RemoveEntityFromCatalog(cmd) => {
            let entity: Entity = events::parse("entity", &read_input(cmd.entity.as_deref())?)?;
            handlers::remove_entity_from_catalog(&app.orchestrator()?, &entity)?;
            Ok(None)
        }
        Command::SyncResource(cmd) => {
            let resource: ResourceDescriptor =
                events::parse("resource", &read_input(cmd.resource.as_deref())?)?;
            let orchestrator = app.orchestrator()?;

            if cmd.dry_run {
                let entity = orchestrator.prepare(resource.mapping())?;
                return Ok(Some(serde_json::to_string_pretty(&entity)?));
            }

            orchestrator.sync_resource(resource.mapping())?;
            Ok(None)
        }
        Command::ProcessAccount(cmd) => {
            let event: SqsEvent = events::parse("SQS event", &read_input(cmd.event.as_deref())?)?;
            let report =
                handlers::process_account(&app.orchestrator()?, &app.entity_publisher()?, &event)?;
            summarize("process-account", &report);
            Ok(None)
        }
        Command::ProcessCreatedS3Bucket(cmd) => {
            let event: S3BucketEvent =
                events::parse("S3 bucket event", &read_input(cmd.event.as_deref())?)?;
            handlers::process_created_s3_bucket(
                &app.orchestrator()?,
                &app.lister(&cmd.snapshot)?,
                &app.entity_publisher()?,
                &event,
            )?;
            Ok(None)
        }
        Command::ProcessEcsClusters(cmd) => {
            let event: SqsEvent = events::parse("SQS event", &read_input(cmd.event.as_deref())?)?;
            let report = handlers::process_ecs_clusters(
                &app.orchestrator()?,
                &app.lister(&cmd.snapshot)?,
                &app.entity_publisher()?,
                &event,
            )?;
            summarize("process-ecs-clusters", &report);
            Ok(None)
        }
        Command::ProcessVpcs(cmd) => {
            let event: SqsEvent = events::parse("SQS event", &read_input(cmd.event.as_deref())?)?;
            let report = handlers::process_vpcs(
                &app.orchestrator()?,
                &app.lister(&cmd.snapshot)?,
                &app.entity_publisher()?,
                &event,
            )?;
            summarize("process-vpcs", &report);
            Ok(None)
        }
        Command::ListAccountS3Buckets(cmd) => {
            let event: SqsEvent = events::parse("SQS event", &read_input(cmd.event.as_deref())?)?;
            let report = handlers::list_account_s3_buckets(
                app.policy,
                &app.lister(&cmd.snapshot)?,
                &app.bus_publisher()?,
                &event,
            )?;
            summarize("list-account-s3-buckets", &report);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;
    use resource_collector::SyncError;
    use serde_json::{json, Value};
    use serial_test::serial;
    use tempfile::TempDir;
    use testing::MockCatalog;

    use crate::cmds::Opt;
    use crate::commands::invoke;

    const UNSET: [(&str, Option<&str>); 9] = [
        ("AUTH_ENDPOINT", None),
        ("CATALOG_ENDPOINT", None),
        ("CATALOG_TIMEOUT_SECS", None),
        ("CLIENT_ID", None),
        ("CLIENT_SECRET", None),
        ("CROSS_ACCOUNT_IAM_ROLE_NAME", None),
        ("EVENT_BUS_NAME", None),
        ("SERVICE_NAME", None),
        ("SQS_QUEUE_URL", None),
    ];

    fn write_config(dir: &TempDir, mock: &MockCatalog) -> String {
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            format!(
                "catalog_endpoint = \"{}\"\nauth_endpoint = \"{}\"\nclient_id = \"collector\"\nclient_secret = \"s3cr3t\"\n",
                mock.catalog_endpoint(),
                mock.auth_endpoint()
            ),
        )
        .unwrap();

        path.display().to_string()
    }

    fn write_json(dir: &TempDir, name: &str, value: &Value) -> String {
        let path = dir.path().join(name);
        fs::write(&path, value.to_string()).unwrap();
        path.display().to_string()
    }

    fn bucket_resource() -> Value {
        json!({
            "resource_type": "s3_bucket",
            "account_id": "123456789012",
            "region": "us-east-1",
            "bucket_name": "my-bucket",
            "tags": [{"Key": "org:system", "Value": "payments"}]
        })
    }

    fn run(args: &[&str]) -> anyhow::Result<Option<String>> {
        let opt = Opt::try_parse_from(std::iter::once("catalog-sync").chain(args.iter().copied()))
            .unwrap();
        temp_env::with_vars(UNSET, || invoke(opt))
    }

    #[test]
    #[serial]
    fn sync_resource_dry_run_prints_entity() {
        let mock = MockCatalog::start();
        mock.add_system("payments", "team-payments");
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(&dir, &mock);
        let resource = write_json(&dir, "resource.json", &bucket_resource());

        let output = run(&["-c", &config, "sync-resource", "-r", &resource, "--dry-run"])
            .unwrap()
            .unwrap();

        let entity: Value = serde_json::from_str(&output).unwrap();
        assert_eq!("s3-bucket-my-bucket", entity["metadata"]["name"]);
        assert_eq!("team-payments", entity["spec"]["owner"]);
        assert_eq!(1, mock.system_lookups().len());
        assert!(mock.entity_writes().is_empty());
    }

    #[test]
    #[serial]
    fn sync_resource_writes_entity() {
        let mock = MockCatalog::start();
        mock.add_system("payments", "team-payments");
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(&dir, &mock);
        let resource = write_json(&dir, "resource.json", &bucket_resource());

        let output = run(&["-c", &config, "sync-resource", "-r", &resource]).unwrap();

        assert_eq!(None, output);
        let writes = mock.entity_writes();
        assert_eq!(1, writes.len());
        assert_eq!("/catalog/default/resource/s3-bucket-my-bucket", writes[0].path);
    }

    #[test]
    #[serial]
    fn add_entity_to_catalog_writes_each_message() {
        let mock = MockCatalog::start();
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(&dir, &mock);
        let entity = json!({
            "apiVersion": "backstage.io/v1alpha1",
            "kind": "Resource",
            "metadata": {"namespace": "default", "name": "s3-bucket-logs", "title": "logs"},
            "spec": {"owner": "team-a", "system": "api", "type": "s3-bucket", "lifecycle": "created"}
        });
        let event = json!({
            "Records": [{"messageId": "m-1", "body": entity.to_string()}]
        });
        let event = write_json(&dir, "event.json", &event);

        run(&["-c", &config, "add-entity-to-catalog", "-e", &event]).unwrap();

        let writes = mock.entity_writes();
        assert_eq!(1, writes.len());
        assert_eq!("/catalog/default/resource/s3-bucket-logs", writes[0].path);
    }

    #[test]
    #[serial]
    fn missing_catalog_settings() {
        let dir = tempfile::tempdir().unwrap();
        let resource = write_json(&dir, "resource.json", &bucket_resource());

        let err = run(&["sync-resource", "-r", &resource, "--dry-run"]).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::MissingSetting {
                key: "CATALOG_ENDPOINT"
            })
        ));
    }
}
