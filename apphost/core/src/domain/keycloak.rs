// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::environment::EnvironmentValue;
use crate::domain::parameter::ParameterResource;
use crate::domain::resource::{ContainerResource, Resource};

const DEFAULT_ADMIN: &str = "admin";

/// The Keycloak identity-provider container.
#[derive(Debug)]
pub struct KeycloakResource {
    container: ContainerResource,
    admin_username: Option<ParameterResource>,
    admin_password: ParameterResource,
}

impl KeycloakResource {
    /// The password parameter is mandatory; callers synthesize one when the
    /// user did not supply it.
    pub fn new(
        name: impl Into<String>,
        admin_username: Option<ParameterResource>,
        admin_password: ParameterResource,
    ) -> Self {
        Self {
            container: ContainerResource::new(name),
            admin_username,
            admin_password,
        }
    }

    pub fn admin_password_parameter(&self) -> &ParameterResource {
        &self.admin_password
    }

    /// Username binding: the parameter if one was supplied, else `admin`.
    pub fn admin_reference(&self) -> EnvironmentValue {
        match &self.admin_username {
            Some(param) => EnvironmentValue::Parameter(param.clone()),
            None => EnvironmentValue::Literal(DEFAULT_ADMIN.to_string()),
        }
    }
}

impl Resource for KeycloakResource {
    fn container(&self) -> &ContainerResource {
        &self.container
    }

    fn container_mut(&mut self) -> &mut ContainerResource {
        &mut self.container
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_reference_defaults_to_literal() {
        let password = ParameterResource::configured("password", true);
        let kc = KeycloakResource::new("keycloak", None, password.clone());
        assert_eq!(kc.admin_reference(), EnvironmentValue::Literal("admin".to_string()));

        let username = ParameterResource::configured("username", false);
        let kc = KeycloakResource::new("keycloak", Some(username.clone()), password);
        assert_eq!(kc.admin_reference(), EnvironmentValue::Parameter(username));
    }
}
