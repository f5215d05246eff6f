//! Integration tests for configuration loading against on-disk fixtures

use anyhow::Result;
use spot_launch::config::{self, CatalogError};
use spot_launch::user_data;
use std::fs;
use tempfile::TempDir;

/// Write a catalog, launch plan, and bootstrap script into one config dir
fn write_fixtures(dir: &TempDir) -> Result<()> {
    fs::write(
        dir.path().join("aws.json"),
        r#"{
            "regions": [
                {
                    "name": "us-east",
                    "ext-name": "us-east-1",
                    "vpc": {"id": "vpc-1", "sg": "sg-1"},
                    "ami": {"default": "ami-default", "al2": "ami-al2"},
                    "keypair": "kp1",
                    "code": "ue"
                },
                {
                    "name": "eu-frankfurt",
                    "ext-name": "eu-central-1",
                    "vpc": {"id": "vpc-9", "sg": "sg-9"},
                    "ami": {"default": "ami-fra"},
                    "keypair": "kp9",
                    "code": "ef"
                }
            ],
            "keyfiles": [{"keypair": "kp1", "keyfile": "keys/kp1.pem"}],
            "userdata": [{"name": "boot", "file": "boot.sh"}]
        }"#,
    )?;

    fs::write(
        dir.path().join("launch-test.json"),
        r#"{
            "launch": [
                {"region": "us-east", "type": "t3.micro", "number": 4},
                {"region": "eu-frankfurt", "type": "m5.large", "number": 1, "ami": "al2"}
            ],
            "userdata": {"name": "boot", "file": "boot.sh"},
            "batch": 50
        }"#,
    )?;

    fs::write(dir.path().join("boot.sh"), "#!/bin/bash\necho hello\n")?;

    Ok(())
}

#[test]
fn full_config_load_and_resolution() -> Result<()> {
    let dir = TempDir::new()?;
    write_fixtures(&dir)?;

    let catalog = config::load_region_catalog(&dir.path().join("aws.json"))?;
    let plan = config::load_launch_plan(&dir.path().join("launch-test.json"))?;

    assert_eq!(catalog.regions.len(), 2);
    assert_eq!(plan.groups.len(), 2);
    assert_eq!(plan.batch, 50);

    // Every plan entry resolves against the catalog
    for group in &plan.groups {
        let region = config::find_region(&catalog, &group.region_name)?;
        assert!(!region.ext_name.is_empty());
    }

    // 4 requested => provider gets min=2, max=4, using the default image
    let first = config::find_region(&catalog, &plan.groups[0].region_name)?;
    assert_eq!(config::find_ami(first, &plan.groups[0].ami_variant), "ami-default");
    assert_eq!(plan.groups[0].number / 2, 2);

    // Frankfurt asked for al2 but the catalog has no al2 image there
    let second = config::find_region(&catalog, &plan.groups[1].region_name)?;
    assert_eq!(config::find_ami(second, &plan.groups[1].ami_variant), "");

    Ok(())
}

#[test]
fn user_data_from_plan_is_encoded() -> Result<()> {
    let dir = TempDir::new()?;
    write_fixtures(&dir)?;

    let plan = config::load_launch_plan(&dir.path().join("launch-test.json"))?;
    let encoded = user_data::load_encoded(&dir.path().join(&plan.userdata.file))?;

    assert_eq!(encoded, "IyEvYmluL2Jhc2gKZWNobyBoZWxsbwo=");
    Ok(())
}

#[test]
fn absent_region_aborts_before_any_launch() -> Result<()> {
    let dir = TempDir::new()?;
    write_fixtures(&dir)?;

    fs::write(
        dir.path().join("launch-bad.json"),
        r#"{
            "launch": [
                {"region": "us-east", "type": "t3.micro", "number": 4},
                {"region": "ap-mars", "type": "t3.micro", "number": 2}
            ],
            "userdata": {"name": "boot", "file": "boot.sh"}
        }"#,
    )?;

    let catalog = config::load_region_catalog(&dir.path().join("aws.json"))?;
    let plan = config::load_launch_plan(&dir.path().join("launch-bad.json"))?;

    // The coordinator resolves every entry before spawning anything, so one
    // bad entry fails the whole plan
    let resolution: Result<Vec<_>, CatalogError> = plan
        .groups
        .iter()
        .map(|g| config::find_region(&catalog, &g.region_name))
        .collect();

    let err = resolution.unwrap_err();
    assert!(err.to_string().contains("ap-mars"));
    Ok(())
}

#[test]
fn missing_bootstrap_script_is_an_error() -> Result<()> {
    let dir = TempDir::new()?;
    write_fixtures(&dir)?;

    let err = user_data::load_encoded(&dir.path().join("no-such.sh")).unwrap_err();
    assert!(err.to_string().contains("no-such.sh"));
    Ok(())
}

#[test]
fn catalog_with_future_fields_still_loads() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(
        dir.path().join("aws.json"),
        r#"{
            "regions": [{"name": "r1", "ext-name": "x", "spot-price-cap": "0.5"}],
            "accounts": []
        }"#,
    )?;

    let catalog = config::load_region_catalog(&dir.path().join("aws.json"))?;
    assert_eq!(catalog.regions[0].name, "r1");
    Ok(())
}
