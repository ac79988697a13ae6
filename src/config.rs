use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::error::ConfigError;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "agri_chat",
    version,
    about = "Live chat relay and message history for the farmer/buyer marketplace"
)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "AGRI_CHAT_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    /// Directory served for non-API paths
    #[arg(long, env = "AGRI_CHAT_STATIC_DIR", default_value = "public", value_name = "DIR")]
    pub static_dir: PathBuf,

    /// PEM certificate chain; enables HTTPS/WSS together with --tls-key
    #[arg(long, env = "AGRI_CHAT_TLS_CERT", value_name = "FILE", requires = "tls_key")]
    pub tls_cert: Option<PathBuf>,

    /// PEM PKCS#8 private key
    #[arg(long, env = "AGRI_CHAT_TLS_KEY", value_name = "FILE", requires = "tls_cert")]
    pub tls_key: Option<PathBuf>,

    /// Default log filter, overridden by RUST_LOG
    #[arg(long, env = "AGRI_CHAT_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl Config {
    /// TLS material if configured and readable. Problems are logged and
    /// reported as `None` so the server can fall back to plain HTTP.
    pub fn tls(&self) -> Option<TlsPaths> {
        let (cert, key) = match (&self.tls_cert, &self.tls_key) {
            (Some(cert), Some(key)) => (cert.clone(), key.clone()),
            _ => return None,
        };

        match check_tls_material(&cert, &key) {
            Ok(()) => Some(TlsPaths { cert, key }),
            Err(e) => {
                log::error!("{}", e);
                None
            }
        }
    }
}

fn open(path: &Path) -> Result<BufReader<File>, ConfigError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| ConfigError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Verifies both files hold at least one PEM item of the expected kind.
pub fn check_tls_material(cert: &Path, key: &Path) -> Result<(), ConfigError> {
    let certs = rustls_pemfile::certs(&mut open(cert)?)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| ConfigError::Pem {
            path: cert.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(ConfigError::Empty {
            kind: "certificate",
            path: cert.to_path_buf(),
        });
    }

    let keys = rustls_pemfile::pkcs8_private_keys(&mut open(key)?)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| ConfigError::Pem {
            path: key.to_path_buf(),
            source,
        })?;
    if keys.is_empty() {
        return Err(ConfigError::Empty {
            kind: "PKCS#8 private key",
            path: key.to_path_buf(),
        });
    }

    Ok(())
}
