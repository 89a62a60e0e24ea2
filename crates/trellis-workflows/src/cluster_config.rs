//! Marshalling of the final cluster config to disk.
//!
//! The last happy-path step of every workflow persists the desired spec
//! so the operator has an authoritative record of what was applied.

use std::path::PathBuf;

use trellis_common::filewriter::FileWriter;
use trellis_common::spec::ClusterSpec;
use trellis_common::{Error, Result, CLUSTER_CONFIG_FILE_SUFFIX};

/// File name the cluster config is written under
pub fn config_file_name(cluster_name: &str) -> String {
    format!("{cluster_name}{CLUSTER_CONFIG_FILE_SUFFIX}")
}

/// Marshal the spec to YAML and persist it through the file writer
pub fn write_cluster_config(spec: &ClusterSpec, writer: &dyn FileWriter) -> Result<PathBuf> {
    let content = serde_yaml::to_string(spec)
        .map_err(|e| Error::serialization_for_kind("ClusterSpec", e.to_string()))?;
    writer.write(&config_file_name(spec.cluster_name()), content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_common::filewriter::DirectoryWriter;
    use trellis_common::spec::{ClusterConfig, GitOpsConfig};

    #[test]
    fn test_written_config_roundtrips() {
        let spec = ClusterSpec {
            cluster: ClusterConfig {
                name: "prod".to_string(),
                kubernetes_version: "1.31".to_string(),
                control_plane_count: 3,
                worker_node_count: 4,
                provider: "vsphere".to_string(),
            },
            gitops: Some(GitOpsConfig {
                repository: "git@github.com:org/fleet.git".to_string(),
                branch: "main".to_string(),
                cluster_config_path: "clusters/prod".to_string(),
            }),
            ..Default::default()
        };

        let root = tempfile::tempdir().unwrap();
        let writer = DirectoryWriter::new(root.path().join("out")).unwrap();
        let path = write_cluster_config(&spec, &writer).unwrap();

        assert!(path.ends_with("prod-cluster-config.yaml"));
        let content = std::fs::read_to_string(&path).unwrap();
        let back: ClusterSpec = serde_yaml::from_str(&content).unwrap();
        assert_eq!(back, spec);
    }
}
