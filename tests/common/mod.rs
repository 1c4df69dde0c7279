#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use safeexam::{
    api::{router, Services},
    code::{CodeGenerator, CodeRecord},
    directory::{Authenticator, DirectoryError},
    session::MemorySessionStore,
};
use secrecy::{ExposeSecret, SecretString};
use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, SystemTime},
};
use tokio::{net::TcpListener, task::JoinHandle};

pub const USER: &str = "proctor";
pub const PASSWORD: &str = "s3cret";
pub const CODE: &str = "Zk9";

pub struct StaticCredentials;

#[async_trait]
impl Authenticator for StaticCredentials {
    async fn login(&self, username: &str, password: &SecretString) -> Result<bool, DirectoryError> {
        Ok(username == USER && password.expose_secret() == PASSWORD)
    }
}

pub struct FixedCode;

impl CodeGenerator for FixedCode {
    fn generate(&self) -> CodeRecord {
        CodeRecord {
            value: CODE.to_string(),
            expires_at: SystemTime::now() + Duration::from_secs(720),
        }
    }
}

/// A server listening on an ephemeral loopback port.
pub struct TestServer {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(prefix: Option<&str>) -> Result<Self> {
        let services = Services::new(
            Arc::new(StaticCredentials),
            Arc::new(FixedCode),
            MemorySessionStore::new(Duration::from_secs(3600)),
        );
        let app = router(services, prefix);

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            let _ = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await;
        });

        Ok(Self {
            base_url: format!("http://{addr}{}", prefix.unwrap_or_default()),
            handle,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
