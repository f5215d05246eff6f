//! Region catalog and launch plan configuration
//!
//! Both documents are JSON files living in a shared config directory. The
//! catalog describes every deployment region once; the launch plan picks
//! regions out of it for a single run.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default region catalog file name inside the config directory
pub const DEFAULT_CATALOG_FILE: &str = "aws.json";

/// Default launch plan file name inside the config directory
pub const DEFAULT_LAUNCH_PROFILE: &str = "launch-1k.json";

/// Catalog lookup errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The launch plan named a region the catalog does not define
    #[error("region not in catalog: {0}")]
    UnknownRegion(String),
}

/// VPC placement for one region
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Vpc {
    /// VPC id
    #[serde(default)]
    pub id: String,

    /// Security group id applied to launched instances
    #[serde(default)]
    pub sg: String,
}

/// Image ids registered for one region
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AmiSet {
    /// Image used when the launch plan names no variant
    #[serde(default)]
    pub default: String,

    /// Amazon Linux 2 alternate, may be unset
    #[serde(default)]
    pub al2: String,
}

/// One deployment region: network, image, and credential metadata
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Region {
    /// Catalog-internal name the launch plan refers to
    #[serde(default)]
    pub name: String,

    /// Provider region code (e.g. "us-east-1")
    #[serde(default, rename = "ext-name")]
    pub ext_name: String,

    #[serde(default)]
    pub vpc: Vpc,

    #[serde(default)]
    pub ami: AmiSet,

    /// Key pair name passed to the creation request
    #[serde(default)]
    pub keypair: String,

    /// Short code embedded in instance name tags
    #[serde(default)]
    pub code: String,
}

/// Key pair to private key file mapping. Loaded for completeness; nothing in
/// the launch path reads it.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(dead_code)]
pub struct KeyFile {
    #[serde(default)]
    pub keypair: String,

    #[serde(default)]
    pub keyfile: String,
}

/// Named bootstrap script reference
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserDataRef {
    #[serde(default)]
    pub name: String,

    /// Path of the plain-text bootstrap script
    #[serde(default)]
    pub file: String,
}

/// The full region catalog document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionCatalog {
    #[serde(default)]
    pub regions: Vec<Region>,

    #[serde(default)]
    pub keyfiles: Vec<KeyFile>,

    #[serde(default)]
    pub userdata: Vec<UserDataRef>,
}

/// One line item of the launch plan: N instances of one type in one region
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceGroupRequest {
    /// Catalog name of the target region
    #[serde(default, rename = "region")]
    pub region_name: String,

    /// EC2 instance type string (e.g. "t3.micro")
    #[serde(default, rename = "type")]
    pub instance_type: String,

    /// Desired instance count; the provider may satisfy anywhere in
    /// [count / 2, count]
    #[serde(default)]
    pub number: i32,

    /// Image variant name, empty for the region default
    #[serde(default, rename = "ami")]
    pub ami_variant: String,
}

/// The launch plan document for one run
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LaunchPlan {
    #[serde(default, rename = "launch")]
    pub groups: Vec<InstanceGroupRequest>,

    /// Bootstrap script shared by every group in the plan
    #[serde(default)]
    pub userdata: UserDataRef,

    /// Batch-size hint; parsed and reported but not used when building
    /// creation requests
    #[serde(default)]
    pub batch: i32,
}

/// Load the region catalog from a JSON file.
///
/// Unknown fields are ignored and absent optional fields take default
/// values; a missing file or malformed document is an error naming the path.
pub fn load_region_catalog(path: &Path) -> Result<RegionCatalog> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("can't read region catalog {}", path.display()))?;

    serde_json::from_str(&raw)
        .with_context(|| format!("can't parse region catalog {}", path.display()))
}

/// Load the launch plan from a JSON file.
pub fn load_launch_plan(path: &Path) -> Result<LaunchPlan> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("can't read launch plan {}", path.display()))?;

    serde_json::from_str(&raw)
        .with_context(|| format!("can't parse launch plan {}", path.display()))
}

/// Find a region by catalog name. Case-sensitive exact match, linear scan;
/// catalogs hold tens of entries at most.
pub fn find_region<'a>(
    catalog: &'a RegionCatalog,
    name: &str,
) -> Result<&'a Region, CatalogError> {
    catalog
        .regions
        .iter()
        .find(|r| r.name == name)
        .ok_or_else(|| CatalogError::UnknownRegion(name.to_string()))
}

/// Select the image id for a variant name.
///
/// `"al2"` picks the alternate image; every other input, including the empty
/// string, falls through to the region default. A variant whose field is
/// unset in the catalog yields the empty string, which surfaces later as a
/// submission failure for that group alone.
pub fn find_ami<'a>(region: &'a Region, variant: &str) -> &'a str {
    match variant {
        "al2" => &region.ami.al2,
        _ => &region.ami.default,
    }
}
