use parlant_console_core::domain::service::{Service, ServiceConfig, ServiceKind, Tool};
use parlant_console_core::ports::ConsoleApi;

use super::{reject, track, SessionError};

/// Editable registration fields. `source` is only meaningful for OpenAPI
/// services.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceDraft {
    pub name: String,
    pub kind: ServiceKind,
    pub url: String,
    pub source: String,
}

impl Default for ServiceDraft {
    fn default() -> Self {
        Self { name: String::new(), kind: ServiceKind::Sdk, url: String::new(), source: String::new() }
    }
}

impl From<&Service> for ServiceDraft {
    fn from(service: &Service) -> Self {
        let source = match service.kind {
            ServiceKind::OpenApi => service.source.clone().unwrap_or_default(),
            ServiceKind::Sdk => String::new(),
        };
        Self { name: service.name.clone(), kind: service.kind, url: service.url.clone(), source }
    }
}

impl ServiceDraft {
    fn to_config(&self) -> Result<ServiceConfig, SessionError> {
        if self.name.trim().is_empty() {
            return Err(SessionError::Validation("Service name is required.".to_string()));
        }
        if self.url.trim().is_empty() {
            return Err(SessionError::Validation("Service URL is required.".to_string()));
        }
        match self.kind {
            ServiceKind::Sdk => Ok(ServiceConfig::Sdk { url: self.url.clone() }),
            ServiceKind::OpenApi if self.source.trim().is_empty() => Err(SessionError::Validation(
                "An OpenAPI service needs a source.".to_string(),
            )),
            ServiceKind::OpenApi => {
                Ok(ServiceConfig::OpenApi { url: self.url.clone(), source: self.source.clone() })
            }
        }
    }
}

pub struct ServicesEditor<A> {
    api: A,
    services: Vec<Service>,
    selected: Option<String>,
    draft: ServiceDraft,
    last_error: Option<String>,
}

impl<A: ConsoleApi> ServicesEditor<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            services: Vec::new(),
            selected: None,
            draft: ServiceDraft::default(),
            last_error: None,
        }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn draft(&self) -> &ServiceDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ServiceDraft {
        &mut self.draft
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub async fn refresh(&mut self) -> Result<&[Service], SessionError> {
        let listed = self.api.list_services().await;
        self.services = track(&mut self.last_error, "list services", listed)?;
        Ok(&self.services)
    }

    pub async fn select(&mut self, name: &str) -> Result<&ServiceDraft, SessionError> {
        let read = self.api.read_service(name).await;
        let service = track(&mut self.last_error, "load service", read)?;
        self.selected = Some(service.name.clone());
        self.draft = ServiceDraft::from(&service);
        Ok(&self.draft)
    }

    pub fn new_service(&mut self) {
        self.selected = None;
        self.draft = ServiceDraft::default();
        self.last_error = None;
    }

    /// Registers or replaces the service named in the draft.
    pub async fn save(&mut self) -> Result<(), SessionError> {
        let config = match self.draft.to_config() {
            Ok(config) => config,
            Err(error) => return reject(&mut self.last_error, error),
        };
        let name = self.draft.name.trim().to_string();

        let updated = self.api.update_service(&name, &config).await;
        track(&mut self.last_error, "save service", updated)?;
        self.selected = Some(name);
        self.refresh().await?;
        Ok(())
    }

    pub async fn delete(&mut self) -> Result<(), SessionError> {
        let Some(name) = self.selected.clone() else {
            return reject(&mut self.last_error, SessionError::NoSelection("service"));
        };

        let deleted = self.api.delete_service(&name).await;
        track(&mut self.last_error, "delete service", deleted)?;
        self.new_service();
        self.refresh().await?;
        Ok(())
    }

    /// Tools a guideline can be associated with.
    pub async fn tools_of(&mut self, name: &str) -> Result<Vec<Tool>, SessionError> {
        let read = self.api.read_service(name).await;
        let service = track(&mut self.last_error, "load service tools", read)?;
        Ok(service.tools)
    }
}

#[cfg(test)]
mod tests {
    use parlant_console_core::domain::service::{Service, ServiceConfig, ServiceKind};

    use super::ServiceDraft;
    use crate::sessions::SessionError;

    #[test]
    fn sdk_draft_ignores_leftover_source() {
        let draft = ServiceDraft {
            name: "billing".to_string(),
            kind: ServiceKind::Sdk,
            url: "http://localhost:8089".to_string(),
            source: "stale.json".to_string(),
        };

        assert_eq!(
            draft.to_config().expect("sdk draft is valid"),
            ServiceConfig::Sdk { url: "http://localhost:8089".to_string() }
        );
    }

    #[test]
    fn openapi_draft_without_source_is_rejected() {
        let draft = ServiceDraft {
            name: "petstore".to_string(),
            kind: ServiceKind::OpenApi,
            url: "https://petstore.example".to_string(),
            source: "  ".to_string(),
        };

        assert!(matches!(draft.to_config(), Err(SessionError::Validation(_))));
        assert!(matches!(ServiceDraft::default().to_config(), Err(SessionError::Validation(_))));
    }

    #[test]
    fn loading_an_sdk_service_drops_source() {
        let service = Service {
            name: "billing".to_string(),
            kind: ServiceKind::Sdk,
            url: "http://localhost:8089".to_string(),
            source: Some("ignored.json".to_string()),
            tools: Vec::new(),
        };

        let draft = ServiceDraft::from(&service);
        assert_eq!(draft.kind, ServiceKind::Sdk);
        assert!(draft.source.is_empty());
    }
}
