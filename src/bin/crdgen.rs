// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! CRD YAML Generator
//!
//! Generates the `HealthCheck` CRD YAML from the Rust types in src/crd.rs.
//!
//! Usage:
//!   cargo run --bin crdgen
//!
//! The file is written to deploy/crds/ with a generated-file header.

use external_route53::crd::HealthCheck;
use kube::CustomResourceExt;
use std::fs;
use std::path::Path;

const COPYRIGHT_HEADER: &str = "# Copyright (c) 2025 The external-route53 Authors
# SPDX-License-Identifier: MIT
#
# This file is AUTO-GENERATED from src/crd.rs
# DO NOT EDIT MANUALLY - Run `cargo run --bin crdgen` to regenerate
#
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = Path::new("deploy/crds");
    fs::create_dir_all(output_dir)?;

    println!("Generating CRD YAML from src/crd.rs...");

    generate_crd::<HealthCheck>("healthchecks.crd.yaml", output_dir)?;

    println!("✓ Successfully generated CRD YAML in deploy/crds/");
    println!("\nNext step: kubectl apply -f deploy/crds/");

    Ok(())
}

fn generate_crd<T>(filename: &str, output_dir: &Path) -> Result<(), Box<dyn std::error::Error>>
where
    T: CustomResourceExt,
{
    let yaml = serde_yaml::to_string(&T::crd())?;
    let content = format!("{COPYRIGHT_HEADER}{yaml}");

    let output_path = output_dir.join(filename);
    fs::write(&output_path, content)?;

    println!("  ✓ Generated {filename}");

    Ok(())
}
