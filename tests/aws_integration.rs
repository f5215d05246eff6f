//! Integration tests against live AWS
//!
//! These tests require AWS credentials and talk to the real EC2 API. They
//! are ignored by default; run with:
//! `AWS_PROFILE=<profile> cargo test --test aws_integration -- --ignored`

use anyhow::Result;
use spot_launch::aws::Ec2Client;

const TEST_REGION: &str = "us-east-1";

#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn connect_scopes_client_to_region() -> Result<()> {
    let ec2 = Ec2Client::connect(TEST_REGION).await?;
    assert_eq!(ec2.region(), TEST_REGION);
    Ok(())
}

#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn describe_unknown_reservation_is_empty() -> Result<()> {
    let ec2 = Ec2Client::connect(TEST_REGION).await?;

    // A reservation id that cannot exist; the filter simply matches nothing
    let observed = ec2.describe_reservation("r-00000000000000000").await?;
    assert!(observed.is_empty());
    Ok(())
}
