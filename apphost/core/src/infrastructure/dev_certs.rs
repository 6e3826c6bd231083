// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::domain::app_config::DevCertsConfig;
use crate::domain::certificate::{CertificateMaterial, DeveloperCertificateService};

const CERT_FILE: &str = "cert.pem";
const KEY_FILE: &str = "key.pem";
const PFX_FILE: &str = "cert.pfx";

/// Developer certificate read from a directory holding `cert.pem`,
/// `key.pem` and optionally `cert.pfx`.
#[derive(Debug, Clone)]
pub struct FileDeveloperCertificateService {
    use_for_https: bool,
    directory: Option<PathBuf>,
    pfx_password: Option<String>,
}

impl FileDeveloperCertificateService {
    pub fn new(use_for_https: bool, directory: Option<PathBuf>, pfx_password: Option<String>) -> Self {
        Self {
            use_for_https,
            directory,
            pfx_password,
        }
    }

    pub fn from_config(config: &DevCertsConfig) -> Self {
        Self::new(
            config.use_for_https,
            config.resolved_directory(),
            config.pfx_password.clone(),
        )
    }

    fn load(&self, dir: &Path) -> Option<CertificateMaterial> {
        let certificate_path = dir.join(CERT_FILE);
        let key_path = dir.join(KEY_FILE);
        if !certificate_path.is_file() || !key_path.is_file() {
            warn!(
                "Developer certificate not found in {:?} (expected {} and {})",
                dir, CERT_FILE, KEY_FILE
            );
            return None;
        }

        let pfx = dir.join(PFX_FILE);
        // A keystore is only usable together with its password.
        let (pfx_path, password) = match (&self.pfx_password, pfx.is_file()) {
            (Some(password), true) => (Some(pfx), Some(password.clone())),
            _ => (None, None),
        };

        debug!("Using developer certificate from {:?}", dir);
        Some(CertificateMaterial {
            certificate_path,
            key_path,
            pfx_path,
            password,
        })
    }
}

impl DeveloperCertificateService for FileDeveloperCertificateService {
    /// HTTPS is only the default when a usable certificate is on disk.
    fn use_for_https(&self) -> bool {
        if !self.use_for_https {
            return false;
        }
        let available = self.certificate().is_some();
        if !available {
            warn!("Developer certificate unavailable; resources default to HTTP");
        }
        available
    }

    fn certificate(&self) -> Option<CertificateMaterial> {
        self.directory.as_deref().and_then(|dir| self.load(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"-----BEGIN TEST-----").unwrap();
    }

    #[test]
    fn test_missing_directory_has_no_certificate() {
        let service = FileDeveloperCertificateService::new(true, None, None);
        assert!(!service.use_for_https());
        assert!(service.certificate().is_none());
    }

    #[test]
    fn test_empty_directory_disables_https_default() {
        let dir = tempfile::tempdir().unwrap();
        let service = FileDeveloperCertificateService::new(true, Some(dir.path().to_path_buf()), None);
        assert!(!service.use_for_https());

        write(dir.path(), CERT_FILE);
        write(dir.path(), KEY_FILE);
        assert!(service.use_for_https());
    }

    #[test]
    fn test_disabled_policy_ignores_certificate() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), CERT_FILE);
        write(dir.path(), KEY_FILE);

        let service = FileDeveloperCertificateService::new(false, Some(dir.path().to_path_buf()), None);
        assert!(!service.use_for_https());
        assert!(service.certificate().is_some());
    }

    #[test]
    fn test_pem_pair() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), CERT_FILE);
        write(dir.path(), KEY_FILE);

        let service = FileDeveloperCertificateService::new(true, Some(dir.path().to_path_buf()), None);
        let material = service.certificate().unwrap();
        assert_eq!(material.certificate_path, dir.path().join(CERT_FILE));
        assert!(material.pfx_path.is_none());
        assert!(material.password.is_none());
    }

    #[test]
    fn test_pfx_requires_password() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), CERT_FILE);
        write(dir.path(), KEY_FILE);
        write(dir.path(), PFX_FILE);

        let without = FileDeveloperCertificateService::new(true, Some(dir.path().to_path_buf()), None);
        assert!(without.certificate().unwrap().password.is_none());

        let with = FileDeveloperCertificateService::new(
            true,
            Some(dir.path().to_path_buf()),
            Some("changeit".to_string()),
        );
        let material = with.certificate().unwrap();
        assert_eq!(material.pfx_path, Some(dir.path().join(PFX_FILE)));
        assert_eq!(material.password.as_deref(), Some("changeit"));
    }
}
