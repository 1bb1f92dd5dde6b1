use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Default HTTP port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 5001;

/// Runtime configuration for inwardd.
///
/// Built once at startup from the CLI (flags or environment). Relative
/// paths are resolved against the working directory at that moment, so a
/// later `chdir` does not move the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// IP address to bind.
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Absolute path of the ledger workbook.
    pub ledger_path: PathBuf,

    /// Directory served for every path without a route (the form UI).
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            ledger_path: PathBuf::from(inward_ledger::EXPORT_FILE_NAME),
            static_dir: PathBuf::from("public"),
        }
    }
}

impl ServerConfig {
    /// Resolve `ledger_path` and `static_dir` against `base` when relative.
    pub fn resolve(mut self, base: &Path) -> Self {
        self.ledger_path = resolve_path(base, &self.ledger_path);
        self.static_dir = resolve_path(base, &self.static_dir);
        self
    }

    /// Socket address to listen on.
    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| anyhow::anyhow!("invalid listen address {}: {}", addr, e))
    }
}

fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
