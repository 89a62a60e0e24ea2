//! Kubernetes client construction from kubeconfig files.
//!
//! The only concrete Kubernetes code in the workflow layer: build a
//! client for a cluster addressed by kubeconfig path and verify the API
//! server answers before any component installation proceeds.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

use trellis_task::interfaces::ClientFactory;
use trellis_common::{Error, Result};

/// Connection timeout for workflow clients; the API server is either
/// local or one network hop away
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Read timeout for workflow clients
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Client factory backed by kubeconfig files on the local filesystem
#[derive(Debug, Clone, Default)]
pub struct KubeClientFactory;

#[async_trait]
impl ClientFactory for KubeClientFactory {
    async fn build_client_from_kubeconfig(&self, kubeconfig_path: &Path) -> Result<Client> {
        let kubeconfig = Kubeconfig::read_from(kubeconfig_path).map_err(|e| {
            Error::internal_with_context(
                "client-factory",
                format!("reading kubeconfig {}: {e}", kubeconfig_path.display()),
            )
        })?;
        let mut config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| {
                Error::internal_with_context(
                    "client-factory",
                    format!("building client config from {}: {e}", kubeconfig_path.display()),
                )
            })?;
        config.connect_timeout = Some(CONNECT_TIMEOUT);
        config.read_timeout = Some(READ_TIMEOUT);

        let client = Client::try_from(config)?;

        // Probe the API server; a cluster whose control plane is not
        // answering must fail here rather than mid-install
        let namespaces: Api<Namespace> = Api::all(client.clone());
        namespaces.list(&ListParams::default().limit(1)).await?;

        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_kubeconfig_is_an_error() {
        let factory = KubeClientFactory;
        let err = match factory
            .build_client_from_kubeconfig(Path::new("/nonexistent/kubeconfig"))
            .await
        {
            Ok(_) => panic!("expected an error building client from a missing kubeconfig"),
            Err(e) => e,
        };
        assert!(err.to_string().contains("kubeconfig"));
    }

    #[tokio::test]
    async fn test_malformed_kubeconfig_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kubeconfig");
        std::fs::write(&path, "not: [valid").unwrap();

        let factory = KubeClientFactory;
        assert!(factory.build_client_from_kubeconfig(&path).await.is_err());
    }
}
