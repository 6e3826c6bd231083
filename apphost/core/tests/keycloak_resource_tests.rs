// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use apphost_core::application::builder::{AppHostOptions, DistributedApplication, DistributedApplicationBuilder};
use apphost_core::application::keycloak::{KeycloakHostingExt, DATA_VOLUME_TARGET};
use apphost_core::application::manifest::ManifestResource;
use apphost_core::domain::certificate::{CertificateMaterial, DeveloperCertificateService};
use apphost_core::domain::endpoint::{UriScheme, UrlDisplayLocation};
use apphost_core::domain::error::AppHostError;
use apphost_core::domain::execution::ExecutionMode;
use apphost_core::domain::parameter::{ParameterResource, ParameterValues};
use apphost_core::domain::resource::Resource;
use apphost_core::domain::runtime::{ContainerLaunchSpec, PortAllocator, RuntimeError};
use apphost_core::infrastructure::FileDeveloperCertificateService;

struct DevCerts {
    use_for_https: bool,
    certificate: Option<CertificateMaterial>,
}

impl DeveloperCertificateService for DevCerts {
    fn use_for_https(&self) -> bool {
        self.use_for_https
    }

    fn certificate(&self) -> Option<CertificateMaterial> {
        self.certificate.clone()
    }
}

struct SequentialPorts(AtomicU16);

impl PortAllocator for SequentialPorts {
    fn allocate(&self) -> Result<u16, RuntimeError> {
        Ok(self.0.fetch_add(1, Ordering::SeqCst))
    }
}

fn pem_certificate() -> CertificateMaterial {
    CertificateMaterial {
        certificate_path: PathBuf::from("/home/dev/certs/cert.pem"),
        key_path: PathBuf::from("/home/dev/certs/key.pem"),
        pfx_path: None,
        password: None,
    }
}

fn pfx_certificate() -> CertificateMaterial {
    CertificateMaterial {
        pfx_path: Some(PathBuf::from("/home/dev/certs/cert.pfx")),
        password: Some("s3cret".to_string()),
        ..pem_certificate()
    }
}

fn builder(mode: ExecutionMode) -> DistributedApplicationBuilder {
    let mut values = HashMap::new();
    values.insert("admin".to_string(), "root".to_string());
    DistributedApplicationBuilder::new(AppHostOptions {
        app_name: "IdentityDemo".to_string(),
        app_dir: PathBuf::from("/work/identity-demo"),
        mode,
        parameter_values: ParameterValues::new(values),
    })
}

fn launch(app: &DistributedApplication, certs: DevCerts) -> Result<Vec<ContainerLaunchSpec>, AppHostError> {
    app.prepare_launch(
        Arc::new(certs),
        &SequentialPorts(AtomicU16::new(50000)),
        &CancellationToken::new(),
    )
}

fn keycloak_spec(specs: &[ContainerLaunchSpec]) -> &ContainerLaunchSpec {
    specs
        .iter()
        .find(|s| s.resource_name == "keycloak")
        .expect("keycloak launch spec")
}

#[test]
fn test_pinned_https_port_when_developer_certificate_enabled() {
    let mut builder = builder(ExecutionMode::Run);
    builder
        .add_keycloak_fixed_https_port("keycloak", Some(8080), Some(8093), None, None)
        .unwrap();
    let app = builder.build();

    let specs = launch(
        &app,
        DevCerts {
            use_for_https: true,
            certificate: Some(pem_certificate()),
        },
    )
    .unwrap();
    let spec = keycloak_spec(&specs);

    let https = spec.endpoint("https").expect("https endpoint");
    assert_eq!(https.host_port, 8093);
    assert_eq!(https.target_port, 8443);
    assert_eq!(https.scheme, UriScheme::Https);
    assert_eq!(spec.endpoint("http").unwrap().host_port, 8080);
    assert_eq!(spec.endpoint("management").unwrap().scheme, UriScheme::Https);
    assert_eq!(spec.environment.get("KC_HTTPS_PORT").map(String::as_str), Some("8443"));
    assert_eq!(
        spec.environment.get("KC_HTTPS_CERTIFICATE_FILE").map(String::as_str),
        Some("/etc/apphost/certs/cert.pem")
    );
    assert!(spec.volumes.iter().any(|v| v.target == "/etc/apphost/certs/key.pem" && v.read_only));
    assert_eq!(spec.health_probes.len(), 1);
    assert!(spec.health_probes[0].url.starts_with("https://localhost:"));
    assert!(spec.health_probes[0].url.ends_with("/health/ready"));
}

#[test]
fn test_no_https_endpoint_when_developer_certificate_disabled() {
    let mut builder = builder(ExecutionMode::Run);
    builder
        .add_keycloak_fixed_https_port("keycloak", Some(8080), Some(8093), None, None)
        .unwrap();
    let app = builder.build();

    let specs = launch(
        &app,
        DevCerts {
            use_for_https: false,
            certificate: Some(pem_certificate()),
        },
    )
    .unwrap();
    let spec = keycloak_spec(&specs);

    assert!(spec.endpoint("https").is_none());
    assert!(spec.endpoints.iter().all(|e| e.host_port != 8093));
    assert_eq!(spec.endpoint("management").unwrap().scheme, UriScheme::Http);
    assert!(!spec.environment.contains_key("KC_HTTPS_PORT"));
    assert!(!spec.environment.keys().any(|k| k.starts_with("KC_HTTPS_")));
}

#[test]
fn test_resource_annotation_overrides_developer_default() {
    let mut builder = builder(ExecutionMode::Run);
    builder
        .add_keycloak_fixed_https_port("keycloak", None, Some(8093), None, None)
        .unwrap()
        .with_developer_certificate();
    let app = builder.build();

    let specs = launch(
        &app,
        DevCerts {
            use_for_https: false,
            certificate: Some(pem_certificate()),
        },
    )
    .unwrap();

    assert_eq!(keycloak_spec(&specs).endpoint("https").unwrap().host_port, 8093);
}

#[test]
fn test_opt_out_annotation_suppresses_https() {
    let mut builder = builder(ExecutionMode::Run);
    builder
        .add_keycloak_fixed_https_port("keycloak", None, Some(8093), None, None)
        .unwrap()
        .without_https_certificate();
    let app = builder.build();

    let specs = launch(
        &app,
        DevCerts {
            use_for_https: true,
            certificate: Some(pem_certificate()),
        },
    )
    .unwrap();

    assert!(keycloak_spec(&specs).endpoint("https").is_none());
}

#[test]
fn test_explicit_certificate_enables_https() {
    let mut builder = builder(ExecutionMode::Run);
    builder
        .add_keycloak_fixed_https_port("keycloak", None, None, None, None)
        .unwrap()
        .with_https_certificate(pfx_certificate());
    let app = builder.build();

    let specs = launch(
        &app,
        DevCerts {
            use_for_https: false,
            certificate: None,
        },
    )
    .unwrap();
    let spec = keycloak_spec(&specs);

    let https = spec.endpoint("https").expect("https endpoint");
    assert!(https.host_port >= 50000);
    assert_eq!(
        spec.environment.get("KC_HTTPS_KEY_STORE_FILE").map(String::as_str),
        Some("/etc/apphost/certs/cert.pfx")
    );
    assert_eq!(spec.environment.get("KC_HTTPS_KEY_STORE_TYPE").map(String::as_str), Some("pkcs12"));
    assert_eq!(
        spec.environment.get("KC_HTTPS_KEY_STORE_PASSWORD").map(String::as_str),
        Some("s3cret")
    );
}

#[test]
fn test_certificate_environment_sets_are_exclusive() {
    for (material, keystore) in [(pem_certificate(), false), (pfx_certificate(), true)] {
        let mut builder = builder(ExecutionMode::Run);
        builder
            .add_keycloak_fixed_https_port("keycloak", None, None, None, None)
            .unwrap();
        let app = builder.build();

        let specs = launch(
            &app,
            DevCerts {
                use_for_https: true,
                certificate: Some(material),
            },
        )
        .unwrap();
        let env = &keycloak_spec(&specs).environment;

        let pem_set = env.contains_key("KC_HTTPS_CERTIFICATE_FILE")
            || env.contains_key("KC_HTTPS_CERTIFICATE_KEY_FILE");
        let keystore_set = env.contains_key("KC_HTTPS_KEY_STORE_FILE")
            || env.contains_key("KC_HTTPS_KEY_STORE_TYPE")
            || env.contains_key("KC_HTTPS_KEY_STORE_PASSWORD");

        assert_eq!(keystore_set, keystore);
        assert_eq!(pem_set, !keystore);
    }
}

#[test]
fn test_bootstrap_admin_environment() {
    let mut builder = builder(ExecutionMode::Run);
    let username = builder.add_parameter("admin", false).unwrap();
    builder
        .add_keycloak_fixed_https_port("keycloak", None, None, Some(username), None)
        .unwrap();
    let app = builder.build();

    let specs = launch(
        &app,
        DevCerts {
            use_for_https: false,
            certificate: None,
        },
    )
    .unwrap();
    let env = &keycloak_spec(&specs).environment;

    assert_eq!(env.get("KC_BOOTSTRAP_ADMIN_USERNAME").map(String::as_str), Some("root"));
    assert_eq!(env.get("KC_HEALTH_ENABLED").map(String::as_str), Some("true"));
    assert_eq!(env.get("KC_BOOTSTRAP_ADMIN_PASSWORD").map(String::len), Some(22));
}

#[test]
fn test_username_defaults_to_admin() {
    let mut builder = builder(ExecutionMode::Run);
    builder
        .add_keycloak_fixed_https_port("keycloak", None, None, None, None)
        .unwrap();
    let app = builder.build();

    let specs = launch(
        &app,
        DevCerts {
            use_for_https: false,
            certificate: None,
        },
    )
    .unwrap();

    assert_eq!(
        keycloak_spec(&specs)
            .environment
            .get("KC_BOOTSTRAP_ADMIN_USERNAME")
            .map(String::as_str),
        Some("admin")
    );
}

#[test]
fn test_generated_password_parameter_is_named_after_resource() {
    let mut builder = builder(ExecutionMode::Run);
    let keycloak = builder
        .add_keycloak_fixed_https_port("identity", None, None, None, None)
        .unwrap();

    let resource = keycloak.resource();
    let resource = resource.read();
    let password = resource.admin_password_parameter();
    assert!(password.name().contains("identity"));
    assert_eq!(password.name(), "identity-password");
    assert!(password.is_secret());
    drop(resource);

    let app = builder.build();
    assert!(app.parameters().iter().any(|p| p.name() == "identity-password"));
}

#[test]
fn test_supplied_password_is_used() {
    let mut builder = builder(ExecutionMode::Run);
    let password = ParameterResource::configured("kc-admin-password", true);
    let keycloak = builder
        .add_keycloak_fixed_https_port("keycloak", None, None, None, Some(password))
        .unwrap();

    assert_eq!(
        keycloak.resource().read().admin_password_parameter().name(),
        "kc-admin-password"
    );
    assert!(builder.build().parameters().iter().all(|p| p.name() != "keycloak-password"));
}

#[test]
fn test_arguments_end_with_import_realm() {
    for (mode, first) in [(ExecutionMode::Run, "start-dev"), (ExecutionMode::Publish, "start")] {
        let mut builder = builder(mode);
        let keycloak = builder
            .add_keycloak_fixed_https_port("keycloak", None, None, None, None)
            .unwrap();

        let args = keycloak.resource().read().container().args.clone();
        assert_eq!(args, vec![first.to_string(), "--import-realm".to_string()]);
    }
}

#[test]
fn test_publish_mode_never_adds_https() {
    let mut builder = builder(ExecutionMode::Publish);
    builder
        .add_keycloak_fixed_https_port("keycloak", Some(8080), Some(8093), None, None)
        .unwrap();

    assert_eq!(builder.eventing().pending_before_start(), 0);

    let app = builder.build();
    let manifest = app.publish_manifest().unwrap();
    match manifest.resources.get("keycloak") {
        Some(ManifestResource::Container { image, args, env, bindings, .. }) => {
            assert_eq!(image, "quay.io/keycloak/keycloak:26.4");
            assert_eq!(args.last().map(String::as_str), Some("--import-realm"));
            assert!(!bindings.contains_key("https"));
            assert_eq!(bindings["http"].port, Some(8080));
            assert_eq!(
                env.get("KC_BOOTSTRAP_ADMIN_PASSWORD").map(String::as_str),
                Some("{keycloak-password.value}")
            );
        }
        other => panic!("unexpected manifest entry: {:?}", other),
    }
    assert!(matches!(
        manifest.resources.get("keycloak-password"),
        Some(ManifestResource::Parameter { .. })
    ));
}

#[test]
fn test_management_url_is_details_only() {
    let mut builder = builder(ExecutionMode::Run);
    builder
        .add_keycloak_fixed_https_port("keycloak", None, None, None, None)
        .unwrap();
    let app = builder.build();

    let specs = launch(
        &app,
        DevCerts {
            use_for_https: false,
            certificate: None,
        },
    )
    .unwrap();
    let urls = &keycloak_spec(&specs).urls;

    let management = urls.iter().find(|u| u.endpoint_name == "management").unwrap();
    let http = urls.iter().find(|u| u.endpoint_name == "http").unwrap();
    assert_eq!(management.display_location, UrlDisplayLocation::DetailsOnly);
    assert_eq!(http.display_location, UrlDisplayLocation::SummaryAndDetails);
}

#[test]
fn test_default_data_volume_names_differ_per_resource() {
    let mut builder = builder(ExecutionMode::Run);
    let first = builder
        .add_keycloak_fixed_https_port("keycloak", None, None, None, None)
        .unwrap()
        .with_data_volume(None);
    let second = builder
        .add_keycloak_fixed_https_port("keycloak-two", None, None, None, None)
        .unwrap()
        .with_data_volume(None);

    let first = first.resource().read().container().volumes[0].clone();
    let second = second.resource().read().container().volumes[0].clone();

    assert_ne!(first.source, second.source);
    assert_eq!(first.target, DATA_VOLUME_TARGET);
    assert!(!first.read_only);
    assert!(first.source.starts_with("identitydemo-"));
    assert!(first.source.ends_with("-keycloak-data"));
}

#[test]
fn test_named_data_volume() {
    let mut builder = builder(ExecutionMode::Run);
    let keycloak = builder
        .add_keycloak_fixed_https_port("keycloak", None, None, None, None)
        .unwrap()
        .with_data_volume(Some("kc-data"));

    assert_eq!(keycloak.resource().read().container().volumes[0].source, "kc-data");
}

#[test]
fn test_invalid_and_duplicate_names() {
    let mut builder = builder(ExecutionMode::Run);
    assert!(matches!(
        builder.add_keycloak_fixed_https_port("", None, None, None, None),
        Err(AppHostError::InvalidArgument(_))
    ));
    builder
        .add_keycloak_fixed_https_port("keycloak", None, None, None, None)
        .unwrap();
    assert!(matches!(
        builder.add_keycloak_fixed_https_port("keycloak", None, None, None, None),
        Err(AppHostError::DuplicateResource(_))
    ));
}

#[test]
fn test_cancelled_before_start_adds_no_https_endpoint() {
    let mut builder = builder(ExecutionMode::Run);
    let keycloak = builder
        .add_keycloak_fixed_https_port("keycloak", None, Some(8093), None, None)
        .unwrap();
    let app = builder.build();

    let token = CancellationToken::new();
    token.cancel();
    let result = app.prepare_launch(
        Arc::new(DevCerts {
            use_for_https: true,
            certificate: Some(pem_certificate()),
        }),
        &SequentialPorts(AtomicU16::new(50000)),
        &token,
    );

    assert!(matches!(result, Err(AppHostError::Cancelled)));
    assert!(keycloak.resource().read().container().endpoint("https").is_none());
}

#[test]
fn test_before_start_runs_once() {
    let mut builder = builder(ExecutionMode::Run);
    let keycloak = builder
        .add_keycloak_fixed_https_port("keycloak", None, None, None, None)
        .unwrap();
    let app = builder.build();
    let certs = || DevCerts {
        use_for_https: true,
        certificate: Some(pem_certificate()),
    };

    launch(&app, certs()).unwrap();
    launch(&app, certs()).unwrap();

    let https_count = keycloak
        .resource()
        .read()
        .container()
        .endpoints()
        .iter()
        .filter(|e| e.name == "https")
        .count();
    assert_eq!(https_count, 1);
}

#[test]
fn test_explicit_certificate_beats_opt_out() {
    let mut builder = builder(ExecutionMode::Run);
    builder
        .add_keycloak_fixed_https_port("keycloak", None, Some(8093), None, None)
        .unwrap()
        .without_https_certificate()
        .with_https_certificate(pem_certificate());
    let app = builder.build();

    let specs = launch(
        &app,
        DevCerts {
            use_for_https: false,
            certificate: None,
        },
    )
    .unwrap();
    let spec = keycloak_spec(&specs);

    assert_eq!(spec.endpoint("https").unwrap().host_port, 8093);
    assert_eq!(
        spec.environment.get("KC_HTTPS_CERTIFICATE_FILE").map(String::as_str),
        Some("/etc/apphost/certs/cert.pem")
    );
    assert!(spec
        .volumes
        .iter()
        .any(|v| v.source == "/home/dev/certs/cert.pem" && v.target == "/etc/apphost/certs/cert.pem"));
}

#[test]
fn test_https_without_certificate_fails_launch() {
    let mut builder = builder(ExecutionMode::Run);
    builder
        .add_keycloak_fixed_https_port("keycloak", None, Some(8093), None, None)
        .unwrap();
    let app = builder.build();

    let result = launch(
        &app,
        DevCerts {
            use_for_https: true,
            certificate: None,
        },
    );

    match result {
        Err(AppHostError::Callback { resource, message }) => {
            assert_eq!(resource, "keycloak");
            assert!(message.contains("no certificate"));
        }
        other => panic!("expected a certificate failure, got {:?}", other.map(|specs| specs.len())),
    }
}

#[test]
fn test_empty_certificate_directory_keeps_keycloak_on_http() {
    let dir = tempfile::tempdir().unwrap();
    let mut builder = builder(ExecutionMode::Run);
    builder
        .add_keycloak_fixed_https_port("keycloak", Some(8080), Some(8093), None, None)
        .unwrap();
    let app = builder.build();

    let specs = app
        .prepare_launch(
            Arc::new(FileDeveloperCertificateService::new(true, Some(dir.path().to_path_buf()), None)),
            &SequentialPorts(AtomicU16::new(50000)),
            &CancellationToken::new(),
        )
        .unwrap();
    let spec = keycloak_spec(&specs);

    assert!(spec.endpoint("https").is_none());
    assert!(!spec.environment.keys().any(|k| k.starts_with("KC_HTTPS_")));
    assert!(spec.health_probes[0].url.starts_with("http://localhost:"));
}
