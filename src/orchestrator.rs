//! Run coordination: configuration loading, task fan-out, log drain
//!
//! Everything fatal happens here, before any task starts: unreadable or
//! malformed config files, an unreadable bootstrap script, and launch-plan
//! entries naming unknown regions all abort the run with a diagnostic.
//! Once tasks are in flight, errors stay confined to their own region.

use crate::addresses::AddressBook;
use crate::config::{self, InstanceGroupRequest, Region};
use crate::launcher::{self, TaskContext};
use crate::logs;
use crate::user_data;
use crate::wait::PollConfig;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Options for one launch run, assembled from the CLI.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Directory holding both configuration files
    pub config_dir: PathBuf,
    /// Launch plan file name inside `config_dir`
    pub launch_profile: String,
    /// Region catalog file name inside `config_dir`
    pub aws_profile: String,
    /// Operator tag embedded in instance names
    pub tag: String,
    /// Overrides the user-data file named by the launch plan
    pub user_data: Option<String>,
}

/// Load both configuration documents, then fan out one launch task per
/// plan entry and wait for all of them.
pub async fn run_launch(opts: LaunchOptions) -> Result<()> {
    let catalog_path = opts.config_dir.join(&opts.aws_profile);
    let catalog = config::load_region_catalog(&catalog_path)?;
    debug!(
        regions = catalog.regions.len(),
        keyfiles = catalog.keyfiles.len(),
        userdata = catalog.userdata.len(),
        "Region catalog loaded"
    );
    trace!(catalog = ?catalog);

    let plan_path = opts.config_dir.join(&opts.launch_profile);
    let plan = config::load_launch_plan(&plan_path)?;
    debug!(
        groups = plan.groups.len(),
        batch = plan.batch,
        "Launch plan loaded"
    );
    trace!(plan = ?plan);

    let user_data_file = opts
        .user_data
        .clone()
        .unwrap_or_else(|| plan.userdata.file.clone());
    let user_data = user_data::load_encoded(Path::new(&user_data_file))?;
    trace!(user_data_b64 = %user_data);

    // Resolve every region up front so a bad plan starts zero tasks.
    let mut entries: Vec<(Arc<Region>, InstanceGroupRequest)> =
        Vec::with_capacity(plan.groups.len());
    for group in &plan.groups {
        let region = config::find_region(&catalog, &group.region_name)
            .with_context(|| format!("launch plan entry for {:?}", group.region_name))?;
        entries.push((Arc::new(region.clone()), group.clone()));
    }

    let stamp = Utc::now().format("%Y-%m-%d_%H_%M_%S").to_string();
    info!(stamp = %stamp, groups = entries.len(), "Starting launch run");

    let (sink, rx) = logs::channel();
    let drain = tokio::spawn(logs::drain(rx));

    let book = AddressBook::new();
    let ctx = TaskContext {
        book: book.clone(),
        log: sink,
        cancel: CancellationToken::new(),
        stamp,
        tag: opts.tag.clone(),
        user_data,
        poll: PollConfig::default(),
    };

    let mut tasks = JoinSet::new();
    for (region, group) in entries {
        let ctx = ctx.clone();
        tasks.spawn(async move {
            let name = region.name.clone();
            (name, launcher::launch_group(region, group, ctx).await)
        });
    }

    // The spawned tasks hold the only remaining sink clones; once they all
    // finish, the channel closes and the drain task exits.
    drop(ctx);

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((region, Ok(()))) => debug!(region = %region, "Launch task finished"),
            Ok((region, Err(e))) => warn!(region = %region, error = ?e, "Launch task failed"),
            Err(e) => warn!(error = ?e, "Launch task panicked"),
        }
    }

    drain.await.context("log drain task failed")?;

    info!(addresses = book.len(), "Launch run complete");
    for (ip, dns) in book.snapshot() {
        debug!(ip = %ip, dns = %dns, "Instance address");
    }

    Ok(())
}
