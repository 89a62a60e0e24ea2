//! Shared fixtures for workflow tests: one mock per collaborator, a real
//! directory writer rooted in a temp dir, and a client that never dials.

use std::sync::Arc;

use tempfile::TempDir;

use trellis_common::filewriter::DirectoryWriter;
use trellis_common::spec::{ClusterConfig, ClusterSpec};
use trellis_task::interfaces::{
    MockBootstrapper, MockClientFactory, MockClusterManager, MockGitOpsManager,
    MockPackageInstaller, MockProvider, MockValidator, Validator,
};
use trellis_task::Dependencies;

/// All collaborator mocks for one workflow test. Set expectations, then
/// consume the fixture with [`Fixture::into_deps`].
pub(crate) struct Fixture {
    pub provider: MockProvider,
    pub cluster_manager: MockClusterManager,
    pub bootstrapper: MockBootstrapper,
    pub gitops_manager: MockGitOpsManager,
    pub client_factory: MockClientFactory,
    pub package_installer: MockPackageInstaller,
    pub validator: MockValidator,
}

impl Fixture {
    pub fn new() -> Self {
        trellis_common::telemetry::init("info");
        Self {
            provider: MockProvider::new(),
            cluster_manager: MockClusterManager::new(),
            bootstrapper: MockBootstrapper::new(),
            gitops_manager: MockGitOpsManager::new(),
            client_factory: MockClientFactory::new(),
            package_installer: MockPackageInstaller::new(),
            validator: MockValidator::new(),
        }
    }

    /// Wrap the mocks for workflow construction. The temp dir must stay
    /// alive for as long as the writer is used.
    pub fn into_deps(self) -> (Dependencies, Arc<dyn Validator>, TempDir) {
        let root = tempfile::tempdir().unwrap();
        let writer = Arc::new(DirectoryWriter::new(root.path().join("out")).unwrap());
        let deps = Dependencies {
            provider: Arc::new(self.provider),
            cluster_manager: Arc::new(self.cluster_manager),
            bootstrapper: Arc::new(self.bootstrapper),
            gitops_manager: Arc::new(self.gitops_manager),
            client_factory: Arc::new(self.client_factory),
            package_installer: Arc::new(self.package_installer),
            writer,
        };
        (deps, Arc::new(self.validator), root)
    }
}

/// Minimal self-managed spec for a named cluster
pub(crate) fn test_spec(name: &str) -> ClusterSpec {
    ClusterSpec {
        cluster: ClusterConfig {
            name: name.to_string(),
            kubernetes_version: "1.31".to_string(),
            control_plane_count: 1,
            worker_node_count: 1,
            provider: "docker".to_string(),
        },
        ..Default::default()
    }
}

/// A client that is valid but never dialed by these tests
pub(crate) fn test_client() -> kube::Client {
    let config = kube::Config::new(http::Uri::from_static("http://127.0.0.1:8080"));
    kube::Client::try_from(config).expect("test client")
}
