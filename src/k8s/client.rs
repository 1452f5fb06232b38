//! Connection-material resolution for the cluster API client.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::error::ClientError;
use crate::config::Environment;

/// Mount point of the in-cluster service account.
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// In-cluster environment variable naming the API server host.
pub const ENV_SERVICE_HOST: &str = "KUBERNETES_SERVICE_HOST";

/// In-cluster environment variable naming the API server port.
pub const ENV_SERVICE_PORT: &str = "KUBERNETES_SERVICE_PORT";

/// Credentials the client presents to the API server.
#[derive(Debug, Clone)]
pub enum ClusterAuth {
    /// Bearer token.
    Token(String),
    /// Client certificate and key files.
    ClientCert {
        /// Path to the client certificate (PEM).
        cert: PathBuf,
        /// Path to the client private key (PEM).
        key: PathBuf,
    },
}

/// Certificate authority material used to verify the API server.
#[derive(Debug, Clone)]
pub enum CaMaterial {
    /// CA bundle on disk.
    File(PathBuf),
    /// Base64 CA data carried inline by the kubeconfig.
    Inline(String),
}

/// A cluster API client with its connection material resolved.
#[derive(Debug, Clone)]
pub struct ClusterClient {
    server: String,
    auth: ClusterAuth,
    ca: Option<CaMaterial>,
}

impl ClusterClient {
    /// Build a client from an explicit kubeconfig, or from the ambient
    /// in-cluster service account when no kubeconfig is given.
    pub fn new(kubeconfig: Option<&Path>, env: &dyn Environment) -> Result<Self, ClientError> {
        match kubeconfig {
            Some(path) => {
                debug!(path = %path.display(), "Building cluster client from kubeconfig");
                Self::from_kubeconfig(path)
            }
            None => {
                debug!("No kubeconfig, using in-cluster credentials");
                Self::in_cluster(env, Path::new(SERVICE_ACCOUNT_DIR))
            }
        }
    }

    /// API server URL.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Credentials presented to the API server.
    pub fn auth(&self) -> &ClusterAuth {
        &self.auth
    }

    /// CA material used to verify the API server, if any.
    pub fn ca(&self) -> Option<&CaMaterial> {
        self.ca.as_ref()
    }

    fn from_kubeconfig(path: &Path) -> Result<Self, ClientError> {
        let contents = fs::read_to_string(path).map_err(|e| ClientError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let kubeconfig: Kubeconfig =
            serde_yaml::from_str(&contents).map_err(|e| ClientError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;

        if kubeconfig.current_context.is_empty() {
            return Err(ClientError::NoCurrentContext);
        }

        let context = kubeconfig
            .contexts
            .iter()
            .find(|c| c.name == kubeconfig.current_context)
            .map(|c| &c.context)
            .ok_or_else(|| ClientError::ContextNotFound(kubeconfig.current_context.clone()))?;

        let cluster = kubeconfig
            .clusters
            .iter()
            .find(|c| c.name == context.cluster)
            .map(|c| &c.cluster)
            .ok_or_else(|| ClientError::ClusterNotFound(context.cluster.clone()))?;

        let user = kubeconfig
            .users
            .iter()
            .find(|u| u.name == context.user)
            .map(|u| &u.user)
            .ok_or_else(|| ClientError::UserNotFound(context.user.clone()))?;

        let auth = if let Some(token) = &user.token {
            ClusterAuth::Token(token.clone())
        } else if let (Some(cert), Some(key)) = (&user.client_certificate, &user.client_key) {
            ClusterAuth::ClientCert {
                cert: cert.clone(),
                key: key.clone(),
            }
        } else {
            return Err(ClientError::MissingCredentials(context.user.clone()));
        };

        let ca = if let Some(path) = &cluster.certificate_authority {
            Some(CaMaterial::File(path.clone()))
        } else {
            cluster
                .certificate_authority_data
                .clone()
                .map(CaMaterial::Inline)
        };

        Ok(Self {
            server: cluster.server.clone(),
            auth,
            ca,
        })
    }

    fn in_cluster(
        env: &dyn Environment,
        service_account_dir: &Path,
    ) -> Result<Self, ClientError> {
        let host = env.var(ENV_SERVICE_HOST).filter(|v| !v.is_empty());
        let port = env.var(ENV_SERVICE_PORT).filter(|v| !v.is_empty());
        let (host, port) = match (host, port) {
            (Some(host), Some(port)) => (host, port),
            _ => return Err(ClientError::NotInCluster),
        };

        let token_path = service_account_dir.join("token");
        let token = fs::read_to_string(&token_path).map_err(|e| ClientError::Read {
            path: token_path,
            source: e,
        })?;

        let ca_path = service_account_dir.join("ca.crt");
        let ca = ca_path.exists().then(|| CaMaterial::File(ca_path));

        Ok(Self {
            server: format!("https://{}:{}", host, port),
            auth: ClusterAuth::Token(token.trim().to_string()),
            ca,
        })
    }
}

/// The subset of the kubeconfig format this tool understands.
#[derive(Debug, Deserialize)]
struct Kubeconfig {
    #[serde(rename = "current-context", default)]
    current_context: String,
    #[serde(default)]
    clusters: Vec<NamedCluster>,
    #[serde(default)]
    contexts: Vec<NamedContext>,
    #[serde(default)]
    users: Vec<NamedUser>,
}

#[derive(Debug, Deserialize)]
struct NamedCluster {
    name: String,
    cluster: ClusterEntry,
}

#[derive(Debug, Deserialize)]
struct ClusterEntry {
    server: String,
    #[serde(rename = "certificate-authority", default)]
    certificate_authority: Option<PathBuf>,
    #[serde(rename = "certificate-authority-data", default)]
    certificate_authority_data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    context: ContextEntry,
}

#[derive(Debug, Deserialize)]
struct ContextEntry {
    cluster: String,
    user: String,
}

#[derive(Debug, Deserialize)]
struct NamedUser {
    name: String,
    user: UserEntry,
}

#[derive(Debug, Deserialize, Default)]
struct UserEntry {
    #[serde(default)]
    token: Option<String>,
    #[serde(rename = "client-certificate", default)]
    client_certificate: Option<PathBuf>,
    #[serde(rename = "client-key", default)]
    client_key: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapEnvironment;
    use tempfile::tempdir;

    const KUBECONFIG_TOKEN: &str = r#"
apiVersion: v1
kind: Config
current-context: dev
clusters:
- name: dev-cluster
  cluster:
    server: https://10.0.0.1:6443
    certificate-authority: /etc/kube/ca.crt
contexts:
- name: dev
  context:
    cluster: dev-cluster
    user: dev-user
users:
- name: dev-user
  user:
    token: s3cr3t
"#;

    fn write_kubeconfig(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("kubeconfig");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_kubeconfig_token_auth() {
        let dir = tempdir().unwrap();
        let path = write_kubeconfig(dir.path(), KUBECONFIG_TOKEN);

        let client = ClusterClient::new(Some(&path), &MapEnvironment::new()).unwrap();

        assert_eq!(client.server(), "https://10.0.0.1:6443");
        assert!(matches!(client.auth(), ClusterAuth::Token(t) if t == "s3cr3t"));
        assert!(matches!(
            client.ca(),
            Some(CaMaterial::File(p)) if p == Path::new("/etc/kube/ca.crt")
        ));
    }

    #[test]
    fn test_kubeconfig_client_cert_auth() {
        let dir = tempdir().unwrap();
        let path = write_kubeconfig(
            dir.path(),
            r#"
current-context: dev
clusters:
- name: dev-cluster
  cluster:
    server: https://10.0.0.1:6443
contexts:
- name: dev
  context:
    cluster: dev-cluster
    user: dev-user
users:
- name: dev-user
  user:
    client-certificate: /etc/kube/cert.pem
    client-key: /etc/kube/key.pem
"#,
        );

        let client = ClusterClient::new(Some(&path), &MapEnvironment::new()).unwrap();

        assert!(matches!(client.auth(), ClusterAuth::ClientCert { .. }));
        assert!(client.ca().is_none());
    }

    #[test]
    fn test_kubeconfig_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing");

        let err = ClusterClient::new(Some(&path), &MapEnvironment::new()).unwrap_err();

        assert!(matches!(err, ClientError::Read { .. }));
    }

    #[test]
    fn test_kubeconfig_dangling_context() {
        let dir = tempdir().unwrap();
        let path = write_kubeconfig(
            dir.path(),
            r#"
current-context: gone
contexts:
- name: dev
  context:
    cluster: dev-cluster
    user: dev-user
"#,
        );

        let err = ClusterClient::new(Some(&path), &MapEnvironment::new()).unwrap_err();

        assert!(matches!(err, ClientError::ContextNotFound(ref name) if name == "gone"));
    }

    #[test]
    fn test_kubeconfig_dangling_cluster() {
        let dir = tempdir().unwrap();
        let path = write_kubeconfig(
            dir.path(),
            r#"
current-context: dev
contexts:
- name: dev
  context:
    cluster: nowhere
    user: dev-user
"#,
        );

        let err = ClusterClient::new(Some(&path), &MapEnvironment::new()).unwrap_err();

        assert!(matches!(err, ClientError::ClusterNotFound(ref name) if name == "nowhere"));
    }

    #[test]
    fn test_kubeconfig_user_without_credentials() {
        let dir = tempdir().unwrap();
        let path = write_kubeconfig(
            dir.path(),
            r#"
current-context: dev
clusters:
- name: dev-cluster
  cluster:
    server: https://10.0.0.1:6443
contexts:
- name: dev
  context:
    cluster: dev-cluster
    user: dev-user
users:
- name: dev-user
  user: {}
"#,
        );

        let err = ClusterClient::new(Some(&path), &MapEnvironment::new()).unwrap_err();

        assert!(matches!(err, ClientError::MissingCredentials(ref name) if name == "dev-user"));
    }

    #[test]
    fn test_in_cluster_credentials() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("token"), "sa-token\n").unwrap();
        fs::write(dir.path().join("ca.crt"), "CERTIFICATE").unwrap();
        let env = MapEnvironment::new()
            .with_var(ENV_SERVICE_HOST, "10.96.0.1")
            .with_var(ENV_SERVICE_PORT, "443");

        let client = ClusterClient::in_cluster(&env, dir.path()).unwrap();

        assert_eq!(client.server(), "https://10.96.0.1:443");
        assert!(matches!(client.auth(), ClusterAuth::Token(t) if t == "sa-token"));
        assert!(client.ca().is_some());
    }

    #[test]
    fn test_not_in_cluster_without_service_env() {
        let err = ClusterClient::new(None, &MapEnvironment::new()).unwrap_err();

        assert!(matches!(err, ClientError::NotInCluster));
    }
}
