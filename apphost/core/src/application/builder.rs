// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Builders for the application graph.
//!
//! [`DistributedApplicationBuilder`] owns the graph while it is being
//! declared. Each added resource is handed back as a [`ResourceBuilder`], a
//! cheap clonable handle to the same record, so deferred callbacks can keep
//! configuring a resource after declaration.

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::eventing::Eventing;
use crate::domain::certificate::{
    CertificateMaterial, HttpsCertificateAnnotation, HttpsCertificateConfigurationContext,
};
use crate::domain::endpoint::{Endpoint, UriScheme, UrlAnnotation, UrlDisplayLocation};
use crate::domain::environment::{EnvironmentContext, EnvironmentValue};
use crate::domain::error::AppHostError;
use crate::domain::execution::{ApplicationIdentity, ExecutionContext, ExecutionMode};
use crate::domain::parameter::{GenerateParameterDefault, ParameterResource, ParameterValues};
use crate::domain::resource::{validate_resource_name, ContainerImage, ContainerResource, HttpHealthCheck, Resource};
use crate::domain::volume::VolumeMount;

pub type SharedResource = Arc<RwLock<dyn Resource>>;

#[derive(Debug, Clone)]
pub struct AppHostOptions {
    pub app_name: String,
    pub app_dir: PathBuf,
    pub mode: ExecutionMode,
    pub parameter_values: ParameterValues,
}

pub struct DistributedApplicationBuilder {
    identity: ApplicationIdentity,
    execution_context: ExecutionContext,
    resources: Vec<SharedResource>,
    parameters: Vec<ParameterResource>,
    parameter_values: ParameterValues,
    eventing: Eventing,
}

impl DistributedApplicationBuilder {
    pub fn new(options: AppHostOptions) -> Self {
        Self {
            identity: ApplicationIdentity::new(options.app_name, &options.app_dir),
            execution_context: ExecutionContext::new(options.mode),
            resources: Vec::new(),
            parameters: Vec::new(),
            parameter_values: options.parameter_values,
            eventing: Eventing::default(),
        }
    }

    pub fn execution_context(&self) -> ExecutionContext {
        self.execution_context
    }

    pub fn identity(&self) -> &ApplicationIdentity {
        &self.identity
    }

    pub fn eventing(&self) -> &Eventing {
        &self.eventing
    }

    /// Declare a parameter whose value comes from configuration.
    pub fn add_parameter(&mut self, name: &str, secret: bool) -> Result<ParameterResource, AppHostError> {
        validate_resource_name(name)?;
        self.ensure_unique(name)?;

        let parameter = ParameterResource::configured(name, secret);
        self.parameters.push(parameter.clone());
        debug!("Added parameter '{}' (secret: {})", name, secret);
        Ok(parameter)
    }

    /// Declare a secret parameter whose value is generated now with the
    /// default password policy.
    pub fn create_default_password_parameter(&mut self, name: &str) -> Result<ParameterResource, AppHostError> {
        validate_resource_name(name)?;
        self.ensure_unique(name)?;

        let parameter = ParameterResource::generated(name, GenerateParameterDefault::password());
        self.parameters.push(parameter.clone());
        debug!("Generated default password parameter '{}'", name);
        Ok(parameter)
    }

    pub fn add_resource<T: Resource>(&mut self, resource: T) -> Result<ResourceBuilder<T>, AppHostError> {
        let name = resource.name().to_string();
        validate_resource_name(&name)?;
        self.ensure_unique(&name)?;

        let handle = Arc::new(RwLock::new(resource));
        let shared: SharedResource = handle.clone();
        self.resources.push(shared);
        info!("Added resource '{}'", name);

        Ok(ResourceBuilder {
            resource: handle,
            identity: self.identity.clone(),
            execution_context: self.execution_context,
        })
    }

    pub fn add_container(
        &mut self,
        name: &str,
        image: &str,
        tag: &str,
    ) -> Result<ResourceBuilder<ContainerResource>, AppHostError> {
        let mut container = ContainerResource::new(name);
        container.image = ContainerImage::new(image, tag);
        self.add_resource(container)
    }

    pub fn build(self) -> DistributedApplication {
        DistributedApplication {
            identity: self.identity,
            execution_context: self.execution_context,
            resources: self.resources,
            parameters: self.parameters,
            parameter_values: self.parameter_values,
            eventing: self.eventing,
        }
    }

    fn ensure_unique(&self, name: &str) -> Result<(), AppHostError> {
        let taken = self.parameters.iter().any(|p| p.name().eq_ignore_ascii_case(name))
            || self.resources.iter().any(|r| r.read().name().eq_ignore_ascii_case(name));
        if taken {
            return Err(AppHostError::DuplicateResource(name.to_string()));
        }
        Ok(())
    }
}

/// Handle for configuring one resource of the graph.
pub struct ResourceBuilder<T: Resource> {
    resource: Arc<RwLock<T>>,
    identity: ApplicationIdentity,
    execution_context: ExecutionContext,
}

impl<T: Resource> Clone for ResourceBuilder<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
            identity: self.identity.clone(),
            execution_context: self.execution_context,
        }
    }
}

impl<T: Resource> ResourceBuilder<T> {
    pub fn resource(&self) -> Arc<RwLock<T>> {
        self.resource.clone()
    }

    pub fn name(&self) -> String {
        self.resource.read().name().to_string()
    }

    pub fn identity(&self) -> &ApplicationIdentity {
        &self.identity
    }

    pub fn execution_context(&self) -> ExecutionContext {
        self.execution_context
    }

    pub fn with_image(self, image: &str) -> Self {
        self.resource.write().container_mut().image.image = image.to_string();
        self
    }

    pub fn with_image_registry(self, registry: &str) -> Self {
        self.resource.write().container_mut().image.registry = Some(registry.to_string());
        self
    }

    pub fn with_image_tag(self, tag: &str) -> Self {
        self.resource.write().container_mut().image.tag = tag.to_string();
        self
    }

    /// Add an HTTP endpoint. The name defaults to `http`.
    pub fn with_http_endpoint(
        self,
        port: Option<u16>,
        target_port: u16,
        name: Option<&str>,
    ) -> Result<Self, AppHostError> {
        self.with_scheme_endpoint(UriScheme::Http, port, target_port, name, None)
    }

    /// Add an HTTPS endpoint. The name defaults to `https`; `env` receives the
    /// target port inside the container.
    pub fn with_https_endpoint(
        self,
        port: Option<u16>,
        target_port: u16,
        name: Option<&str>,
        env: Option<&str>,
    ) -> Result<Self, AppHostError> {
        self.with_scheme_endpoint(UriScheme::Https, port, target_port, name, env)
    }

    fn with_scheme_endpoint(
        self,
        scheme: UriScheme,
        port: Option<u16>,
        target_port: u16,
        name: Option<&str>,
        env: Option<&str>,
    ) -> Result<Self, AppHostError> {
        let mut endpoint = Endpoint::new(name.unwrap_or(scheme.as_str()), scheme, target_port, port);
        endpoint.env = env.map(str::to_string);
        debug!(
            "Declaring endpoint '{}' ({}) target {} host {:?}",
            endpoint.name, scheme, target_port, port
        );
        self.resource.write().container_mut().add_endpoint(endpoint)?;
        Ok(self)
    }

    /// Mutate an existing endpoint.
    pub fn with_endpoint<F>(self, name: &str, configure: F) -> Result<Self, AppHostError>
    where
        F: FnOnce(&mut Endpoint),
    {
        {
            let mut resource = self.resource.write();
            let container = resource.container_mut();
            let resource_name = container.name().to_string();
            let endpoint = container.endpoint_mut(name).ok_or(AppHostError::EndpointNotFound {
                resource: resource_name,
                endpoint: name.to_string(),
            })?;
            configure(endpoint);
        }
        Ok(self)
    }

    pub fn with_http_health_check(self, endpoint_name: &str, path: &str) -> Result<Self, AppHostError> {
        {
            let mut resource = self.resource.write();
            let container = resource.container_mut();
            if container.endpoint(endpoint_name).is_none() {
                return Err(AppHostError::EndpointNotFound {
                    resource: container.name().to_string(),
                    endpoint: endpoint_name.to_string(),
                });
            }
            container.health_checks.push(HttpHealthCheck {
                endpoint_name: endpoint_name.to_string(),
                path: path.to_string(),
            });
        }
        Ok(self)
    }

    pub fn with_environment<F>(self, callback: F) -> Self
    where
        F: Fn(&mut EnvironmentContext) -> Result<(), AppHostError> + Send + Sync + 'static,
    {
        self.resource.write().container_mut().add_environment_callback(Arc::new(callback));
        self
    }

    pub fn with_environment_value(self, key: &str, value: impl Into<EnvironmentValue>) -> Self {
        let key = key.to_string();
        let value = value.into();
        self.with_environment(move |ctx| {
            ctx.set(key.clone(), value.clone());
            Ok(())
        })
    }

    pub fn with_url_for_endpoint(self, endpoint_name: &str, display_location: UrlDisplayLocation) -> Self {
        let mut resource = self.resource.write();
        let urls = &mut resource.container_mut().urls;
        urls.retain(|u| u.endpoint_name != endpoint_name);
        urls.push(UrlAnnotation {
            endpoint_name: endpoint_name.to_string(),
            display_location,
        });
        drop(resource);
        self
    }

    pub fn with_https_certificate_configuration<F>(self, callback: F) -> Self
    where
        F: Fn(&mut HttpsCertificateConfigurationContext) -> Result<(), AppHostError> + Send + Sync + 'static,
    {
        self.resource.write().container_mut().add_certificate_callback(Arc::new(callback));
        self
    }

    /// Serve HTTPS with an explicit certificate instead of the developer one.
    /// A previous developer-certificate opt-in or opt-out is kept.
    pub fn with_https_certificate(self, certificate: CertificateMaterial) -> Self {
        self.update_certificate_annotation(|annotation| annotation.certificate = Some(certificate))
    }

    /// Use the developer certificate even when the ambient policy is off.
    pub fn with_developer_certificate(self) -> Self {
        self.update_certificate_annotation(|annotation| annotation.use_developer_certificate = Some(true))
    }

    /// Opt this resource out of the developer certificate. An explicit
    /// certificate still enables HTTPS.
    pub fn without_https_certificate(self) -> Self {
        self.update_certificate_annotation(|annotation| annotation.use_developer_certificate = Some(false))
    }

    fn update_certificate_annotation<F>(self, update: F) -> Self
    where
        F: FnOnce(&mut HttpsCertificateAnnotation),
    {
        let mut resource = self.resource.write();
        let container = resource.container_mut();
        let mut annotation = container.https_certificate().cloned().unwrap_or_default();
        update(&mut annotation);
        container.set_https_certificate(annotation);
        drop(resource);
        self
    }

    pub fn with_args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource
            .write()
            .container_mut()
            .args
            .extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_volume(self, name: &str, target: &str, read_only: bool) -> Self {
        self.resource
            .write()
            .container_mut()
            .volumes
            .push(VolumeMount::volume(name, target, read_only));
        self
    }

    pub fn with_bind_mount(self, source: &str, target: &str, read_only: bool) -> Self {
        self.resource
            .write()
            .container_mut()
            .volumes
            .push(VolumeMount::bind(source, target, read_only));
        self
    }
}

/// The built application graph.
pub struct DistributedApplication {
    pub(crate) identity: ApplicationIdentity,
    pub(crate) execution_context: ExecutionContext,
    pub(crate) resources: Vec<SharedResource>,
    pub(crate) parameters: Vec<ParameterResource>,
    pub(crate) parameter_values: ParameterValues,
    pub(crate) eventing: Eventing,
}

impl DistributedApplication {
    pub fn identity(&self) -> &ApplicationIdentity {
        &self.identity
    }

    pub fn execution_context(&self) -> ExecutionContext {
        self.execution_context
    }

    pub fn resources(&self) -> &[SharedResource] {
        &self.resources
    }

    pub fn resource(&self, name: &str) -> Option<SharedResource> {
        self.resources.iter().find(|r| r.read().name() == name).cloned()
    }

    pub fn parameters(&self) -> &[ParameterResource] {
        &self.parameters
    }

    pub fn eventing(&self) -> &Eventing {
        &self.eventing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(mode: ExecutionMode) -> DistributedApplicationBuilder {
        DistributedApplicationBuilder::new(AppHostOptions {
            app_name: "test".to_string(),
            app_dir: PathBuf::from("/tmp/test-apphost"),
            mode,
            parameter_values: ParameterValues::default(),
        })
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut builder = builder(ExecutionMode::Run);
        builder.add_parameter("username", false).unwrap();
        builder.add_container("api", "nginx", "1.27").unwrap();

        assert!(matches!(
            builder.add_container("API", "nginx", "1.27"),
            Err(AppHostError::DuplicateResource(_))
        ));
        assert!(matches!(
            builder.add_parameter("username", false),
            Err(AppHostError::DuplicateResource(_))
        ));
    }

    #[test]
    fn test_resource_builder_configures_shared_record() {
        let mut builder = builder(ExecutionMode::Run);
        let api = builder
            .add_container("api", "nginx", "1.27")
            .unwrap()
            .with_image_registry("docker.io")
            .with_http_endpoint(Some(5000), 80, None)
            .unwrap()
            .with_http_health_check("http", "/health")
            .unwrap()
            .with_args(["--verbose"]);

        let app = builder.build();
        let shared = app.resource("api").unwrap();
        let resource = shared.read();
        let container = resource.container();

        assert_eq!(container.image.reference(), "docker.io/nginx:1.27");
        assert_eq!(container.endpoint("http").unwrap().port, Some(5000));
        assert_eq!(container.health_checks.len(), 1);
        assert_eq!(container.args, vec!["--verbose".to_string()]);
        assert_eq!(api.name(), "api");
    }

    #[test]
    fn test_health_check_requires_endpoint() {
        let mut builder = builder(ExecutionMode::Run);
        let result = builder
            .add_container("api", "nginx", "1.27")
            .unwrap()
            .with_http_health_check("management", "/ready");
        assert!(matches!(result, Err(AppHostError::EndpointNotFound { .. })));
    }

    #[test]
    fn test_with_endpoint_mutates_existing() {
        let mut builder = builder(ExecutionMode::Run);
        let api = builder
            .add_container("api", "nginx", "1.27")
            .unwrap()
            .with_http_endpoint(None, 9000, Some("management"))
            .unwrap()
            .with_endpoint("management", |ep| ep.scheme = UriScheme::Https)
            .unwrap();

        let resource = api.resource();
        assert_eq!(resource.read().endpoint("management").unwrap().scheme, UriScheme::Https);
        assert!(api.with_endpoint("missing", |_| {}).is_err());
    }

    #[test]
    fn test_synthesized_parameter_names_are_validated() {
        let mut builder = builder(ExecutionMode::Run);
        let long_name = format!("{}-password", "k".repeat(58));

        assert!(matches!(
            builder.create_default_password_parameter(&long_name),
            Err(AppHostError::InvalidArgument(_))
        ));
        assert!(builder.create_default_password_parameter("kc-password").is_ok());
    }

    #[test]
    fn test_certificate_annotations_merge() {
        let mut builder = builder(ExecutionMode::Run);
        let api = builder
            .add_container("api", "nginx", "1.27")
            .unwrap()
            .without_https_certificate()
            .with_https_certificate(CertificateMaterial {
                certificate_path: PathBuf::from("/certs/cert.pem"),
                key_path: PathBuf::from("/certs/key.pem"),
                pfx_path: None,
                password: None,
            });

        let resource = api.resource();
        let resource = resource.read();
        let annotation = resource.container().https_certificate().unwrap();
        assert_eq!(annotation.use_developer_certificate, Some(false));
        assert!(annotation.certificate.is_some());
    }
}
