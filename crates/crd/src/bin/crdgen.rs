//! Generates the merged yaml CRD from rust code.
//! By default this will target the helm chart's `crds` directory!
//! Designed to be used inside of a mise command that sets the `CRDS_DIR` environment variable.
use std::{fs::File, io::Write, path};

use kube::CustomResourceExt;
use kube::core::crd::merge_crds;

#[allow(clippy::unwrap_used)]
fn main() {
    let crd = merge_crds(
        vec![
            platform_crd::v1::PlatformCluster::crd(),
            platform_crd::v2::PlatformCluster::crd(),
            platform_crd::v2alpha1::PlatformCluster::crd(),
        ],
        "v2",
    )
    .unwrap();

    let schema = serde_yaml::to_string(&crd).unwrap();
    let crd_path = path::Path::new(&std::env::var_os("CRDS_DIR").unwrap())
        .join("platformcluster-crd.yaml");
    let mut file = File::create(crd_path).unwrap();
    file.write_all(schema.as_bytes()).unwrap();
}
