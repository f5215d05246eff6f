//! Per-group instance launch task
//!
//! One of these runs concurrently for every launch-plan entry. Failures here
//! are terminal for the group alone: they are reported on the shared log
//! channel and returned to the coordinator, which never lets one region's
//! trouble stop its siblings.

use crate::addresses::AddressBook;
use crate::aws::{BatchRequest, Ec2Client};
use crate::config::{self, InstanceGroupRequest, Region};
use crate::logs::LogSink;
use crate::wait::{self, PollConfig};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Time the provider gets to allocate network resources before the first
/// status check.
pub const PROVISION_WARMUP: Duration = Duration::from_secs(60);

/// Everything a launch task needs beyond its region and group. Cloned once
/// per task; the handles inside share state with the coordinator.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Shared address → hostname accumulator
    pub book: AddressBook,
    /// Shared log channel sender
    pub log: LogSink,
    /// Cancels warm-up and polling across all tasks
    pub cancel: CancellationToken,
    /// Run timestamp shared by every instance name in this invocation
    pub stamp: String,
    /// Operator tag embedded in instance names
    pub tag: String,
    /// Base64-encoded bootstrap script
    pub user_data: String,
    /// Bounds for the address polling loop
    pub poll: PollConfig,
}

/// Name tag for a group's instances: region code, operator tag, run stamp.
fn instance_name(code: &str, tag: &str, stamp: &str) -> String {
    format!("{code}-{tag}-{stamp}-1")
}

/// Launch one instance group and collect its public addresses.
///
/// Returns `Err` only for session and submission failures; exhausting the
/// polling window with addresses still missing is silent partial success.
pub async fn launch_group(
    region: Arc<Region>,
    group: InstanceGroupRequest,
    ctx: TaskContext,
) -> Result<()> {
    ctx.log
        .send(format!("launching spot instances in region: {}", region.name));

    let ec2 = match Ec2Client::connect(&region.ext_name).await {
        Ok(client) => client,
        Err(e) => {
            ctx.log.send(format!("{}: aws session error: {e}", region.name));
            return Err(e);
        }
    };

    let image_id = config::find_ami(&region, &group.ami_variant);
    let name_tag = instance_name(&region.code, &ctx.tag, &ctx.stamp);

    let reservation_id = match ec2
        .request_instances(BatchRequest {
            image_id,
            instance_type: &group.instance_type,
            count: group.number,
            key_pair: &region.keypair,
            security_group: &region.vpc.sg,
            name_tag: &name_tag,
            user_data: &ctx.user_data,
        })
        .await
    {
        Ok(id) => id,
        Err(e) => {
            ctx.log.send(format!("{}: run instances error: {e}", region.name));
            return Err(e);
        }
    };

    ctx.log.send(format!(
        "{}: sleeping for {} seconds",
        region.name,
        PROVISION_WARMUP.as_secs()
    ));
    tokio::select! {
        _ = tokio::time::sleep(PROVISION_WARMUP) => {}
        _ = ctx.cancel.cancelled() => {
            ctx.log.send(format!("{}: cancelled during warm-up", region.name));
            return Ok(());
        }
    }

    let outcome = wait::poll_until(
        &ctx.poll,
        Some(&ctx.cancel),
        || async {
            let observed = ec2.describe_reservation(&reservation_id).await?;

            let mut all_addressed = !observed.is_empty();
            for instance in &observed {
                match &instance.public_ip {
                    Some(ip) => {
                        let dns = instance.public_dns.as_deref().unwrap_or_default();
                        if ctx.book.record(ip, dns) {
                            debug!(
                                region = %region.name,
                                instance = %instance.instance_id,
                                ip = %ip,
                                dns = %dns,
                                "Address assigned"
                            );
                        }
                    }
                    None => all_addressed = false,
                }
            }
            Ok(all_addressed)
        },
        "public addresses",
    )
    .await;

    match outcome {
        Ok(result) => {
            debug!(region = %region.name, outcome = ?result, "Polling finished");
        }
        Err(e) => {
            // Keep whatever addresses were already collected
            warn!(region = %region.name, error = ?e, "Polling stopped early");
            ctx.log
                .send(format!("{}: describe instances error: {e}", region.name));
        }
    }

    ctx.log
        .send(format!("{}: {} instances", region.name, ctx.book.len()));
    Ok(())
}
