//! EC2 instance management

use anyhow::{Context, Result};
use aws_sdk_ec2::{
    types::{Filter, InstanceType, ResourceType, Tag, TagSpecification},
    Client,
};
use tracing::{debug, info};

/// EC2 client scoped to one provider region
pub struct Ec2Client {
    client: Client,
    region: String,
}

/// One batch creation request. The provider may satisfy anywhere in
/// [`min_count`, `count`] — this is a capacity-elasticity request, not an
/// exact-count guarantee.
#[derive(Debug)]
pub struct BatchRequest<'a> {
    pub image_id: &'a str,
    pub instance_type: &'a str,
    pub count: i32,
    pub key_pair: &'a str,
    pub security_group: &'a str,
    pub name_tag: &'a str,
    /// Base64-encoded bootstrap script
    pub user_data: &'a str,
}

impl BatchRequest<'_> {
    /// Lower bound handed to the provider: half the desired count, floored.
    pub fn min_count(&self) -> i32 {
        self.count / 2
    }
}

/// Public networking observed for one instance while polling
#[derive(Debug, Clone)]
pub struct InstanceNetworking {
    pub instance_id: String,
    pub public_ip: Option<String>,
    pub public_dns: Option<String>,
}

impl InstanceNetworking {
    /// An instance counts as addressed once it reports a public IP.
    pub fn is_addressed(&self) -> bool {
        self.public_ip.is_some()
    }
}

impl Ec2Client {
    /// Open a session scoped to a provider region code (e.g. "us-east-1").
    pub async fn connect(region: &str) -> Result<Self> {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        let client = Client::new(&config);

        Ok(Self {
            client,
            region: region.to_string(),
        })
    }

    /// Submit one batch creation request and return the reservation id the
    /// provider assigns to it.
    pub async fn request_instances(&self, request: BatchRequest<'_>) -> Result<String> {
        let instance_type: InstanceType = request
            .instance_type
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid instance type: {}", request.instance_type))?;

        info!(
            region = %self.region,
            instance_type = %request.instance_type,
            image = %request.image_id,
            min = request.min_count(),
            max = request.count,
            "Requesting instances"
        );

        let response = self
            .client
            .run_instances()
            .image_id(request.image_id)
            .instance_type(instance_type)
            .min_count(request.min_count())
            .max_count(request.count)
            .key_name(request.key_pair)
            .security_group_ids(request.security_group)
            .user_data(request.user_data)
            .tag_specifications(
                TagSpecification::builder()
                    .resource_type(ResourceType::Instance)
                    .tags(
                        Tag::builder()
                            .key("Name")
                            .value(request.name_tag)
                            .build(),
                    )
                    .build(),
            )
            .send()
            .await
            .with_context(|| format!("RunInstances failed in {}", self.region))?;

        let reservation_id = response
            .reservation_id()
            .context("no reservation id returned")?
            .to_string();

        debug!(
            region = %self.region,
            reservation_id = %reservation_id,
            instances = response.instances().len(),
            "Batch submitted"
        );

        Ok(reservation_id)
    }

    /// Describe the instances belonging to one reservation and report their
    /// public networking.
    pub async fn describe_reservation(
        &self,
        reservation_id: &str,
    ) -> Result<Vec<InstanceNetworking>> {
        let response = self
            .client
            .describe_instances()
            .filters(
                Filter::builder()
                    .name("reservation-id")
                    .values(reservation_id)
                    .build(),
            )
            .send()
            .await
            .with_context(|| format!("DescribeInstances failed in {}", self.region))?;

        let mut observed = Vec::new();
        for reservation in response.reservations() {
            for instance in reservation.instances() {
                observed.push(InstanceNetworking {
                    instance_id: instance.instance_id().unwrap_or_default().to_string(),
                    public_ip: instance
                        .public_ip_address()
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                    public_dns: instance
                        .public_dns_name()
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                });
            }
        }

        Ok(observed)
    }

    /// Region code this client is scoped to.
    pub fn region(&self) -> &str {
        &self.region
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_count_is_half_floored() {
        let request = BatchRequest {
            image_id: "ami-1",
            instance_type: "t3.micro",
            count: 4,
            key_pair: "kp",
            security_group: "sg-1",
            name_tag: "n",
            user_data: "",
        };
        assert_eq!(request.min_count(), 2);

        let odd = BatchRequest { count: 5, ..request };
        assert_eq!(odd.min_count(), 2);
    }

    #[test]
    fn addressed_requires_public_ip() {
        let mut networking = InstanceNetworking {
            instance_id: "i-123".into(),
            public_ip: None,
            public_dns: Some("ec2-1-2-3-4.compute.amazonaws.com".into()),
        };
        assert!(!networking.is_addressed());

        networking.public_ip = Some("1.2.3.4".into());
        assert!(networking.is_addressed());
    }
}
