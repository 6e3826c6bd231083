// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTPS certificate annotations, the developer certificate policy and the
//! context handed to certificate-configuration callbacks.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::environment::EnvironmentValue;
use crate::domain::error::AppHostError;
use crate::domain::volume::VolumeMount;

/// Directory inside the container where certificate files are mounted.
pub const CONTAINER_CERTIFICATE_DIR: &str = "/etc/apphost/certs";

/// Certificate files on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateMaterial {
    pub certificate_path: PathBuf,
    pub key_path: PathBuf,
    pub pfx_path: Option<PathBuf>,
    /// Password protecting the PFX keystore, if any.
    pub password: Option<String>,
}

/// Per-resource override of the developer certificate policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpsCertificateAnnotation {
    pub use_developer_certificate: Option<bool>,
    pub certificate: Option<CertificateMaterial>,
}

/// Ambient policy deciding whether development resources get HTTPS.
pub trait DeveloperCertificateService: Send + Sync {
    /// Default for resources that carry no annotation of their own.
    fn use_for_https(&self) -> bool;

    /// The developer certificate, if one is available on this machine.
    fn certificate(&self) -> Option<CertificateMaterial>;
}

/// Decide whether a resource should expose HTTPS.
///
/// Without an annotation the ambient default applies. With one, an explicit
/// `use_developer_certificate` replaces the default, and an explicit
/// certificate enables HTTPS regardless of the flag.
pub fn should_enable_https(
    annotation: Option<&HttpsCertificateAnnotation>,
    developer_default: bool,
) -> bool {
    match annotation {
        None => developer_default,
        Some(annotation) => {
            annotation.use_developer_certificate.unwrap_or(developer_default)
                || annotation.certificate.is_some()
        }
    }
}

/// Pick the certificate a resource should be served with: its own explicit
/// certificate first, then the developer certificate unless opted out.
pub fn select_certificate(
    annotation: Option<&HttpsCertificateAnnotation>,
    developer: &dyn DeveloperCertificateService,
) -> Option<CertificateMaterial> {
    match annotation {
        Some(HttpsCertificateAnnotation { certificate: Some(cert), .. }) => Some(cert.clone()),
        Some(HttpsCertificateAnnotation { use_developer_certificate: Some(false), .. }) => None,
        _ => developer.certificate(),
    }
}

/// Context passed to certificate-configuration callbacks. Paths are the
/// container-side locations of the mounted files.
#[derive(Debug)]
pub struct HttpsCertificateConfigurationContext {
    pub certificate_path: String,
    pub key_path: String,
    pub pfx_path: String,
    pub password: Option<EnvironmentValue>,
    pub environment_variables: BTreeMap<String, EnvironmentValue>,
    pub arguments: Vec<String>,
    mounts: Vec<VolumeMount>,
}

impl HttpsCertificateConfigurationContext {
    pub fn for_container(material: &CertificateMaterial) -> Self {
        let mut mounts = vec![
            container_mount(&material.certificate_path, "cert.pem"),
            container_mount(&material.key_path, "key.pem"),
        ];
        if let Some(pfx) = &material.pfx_path {
            mounts.push(container_mount(pfx, "cert.pfx"));
        }

        Self {
            certificate_path: format!("{}/cert.pem", CONTAINER_CERTIFICATE_DIR),
            key_path: format!("{}/key.pem", CONTAINER_CERTIFICATE_DIR),
            pfx_path: format!("{}/cert.pfx", CONTAINER_CERTIFICATE_DIR),
            password: material.password.clone().map(EnvironmentValue::Literal),
            environment_variables: BTreeMap::new(),
            arguments: Vec::new(),
            mounts,
        }
    }

    /// Read-only bind mounts that make the files visible at the context paths.
    pub fn mounts(&self) -> &[VolumeMount] {
        &self.mounts
    }
}

fn container_mount(host: &Path, file_name: &str) -> VolumeMount {
    VolumeMount::bind(
        host.to_string_lossy(),
        format!("{}/{}", CONTAINER_CERTIFICATE_DIR, file_name),
        true,
    )
}

pub type CertificateConfigurationCallback = Arc<
    dyn Fn(&mut HttpsCertificateConfigurationContext) -> Result<(), AppHostError> + Send + Sync,
>;
