//! Pipeline construction.

use super::finalize::finalize_group;
use super::runner::Pipeline;
use crate::core::NodeLabel;
use crate::errors::BuildError;
use crate::messenger::{CliMessengerInterface, MessengerInterface};
use crate::script::{Script, ScriptActor};
use crate::service::{Component, ExtraHandler, Service, ServiceGroup};
use crate::storage::{ContextStorage, MemoryContextStorage};
use std::sync::Arc;
use std::time::Duration;

/// Assembles a [`Pipeline`] from a script and its surrounding services.
///
/// Pre-services run before the actor, post-services after it; the three
/// segments form the root service group, always named `pipeline`. The
/// build performs the one-time tree finalization: every component gets
/// its unique path, sibling name collisions and invalid names are
/// rejected, and the tree must contain exactly one actor.
pub struct PipelineBuilder {
    script: Script,
    start_label: NodeLabel,
    fallback_label: Option<NodeLabel>,
    pre_services: Vec<Component>,
    post_services: Vec<Component>,
    before_handler: Option<ExtraHandler>,
    after_handler: Option<ExtraHandler>,
    timeout: Option<Duration>,
    storage: Option<Arc<dyn ContextStorage>>,
    messenger: Option<Arc<dyn MessengerInterface>>,
}

impl PipelineBuilder {
    /// Starts a builder for the given script and start label.
    #[must_use]
    pub fn new(script: Script, start_label: impl Into<NodeLabel>) -> Self {
        Self {
            script,
            start_label: start_label.into(),
            fallback_label: None,
            pre_services: Vec::new(),
            post_services: Vec::new(),
            before_handler: None,
            after_handler: None,
            timeout: None,
            storage: None,
            messenger: None,
        }
    }

    /// Sets the fallback label (defaults to the start label).
    #[must_use]
    pub fn fallback_label(mut self, label: impl Into<NodeLabel>) -> Self {
        self.fallback_label = Some(label.into());
        self
    }

    /// Appends a component to run before the actor.
    #[must_use]
    pub fn pre_service(mut self, component: impl Into<Component>) -> Self {
        self.pre_services.push(component.into());
        self
    }

    /// Appends a component to run after the actor.
    #[must_use]
    pub fn post_service(mut self, component: impl Into<Component>) -> Self {
        self.post_services.push(component.into());
        self
    }

    /// Installs before-stage extra handlers on the root group.
    #[must_use]
    pub fn before_handler(mut self, handler: ExtraHandler) -> Self {
        self.before_handler = Some(handler);
        self
    }

    /// Installs after-stage extra handlers on the root group.
    #[must_use]
    pub fn after_handler(mut self, handler: ExtraHandler) -> Self {
        self.after_handler = Some(handler);
        self
    }

    /// Sets a timeout on the root group.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the context storage backend (defaults to in-memory).
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn ContextStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the messenger interface (defaults to the console).
    #[must_use]
    pub fn messenger(mut self, messenger: Arc<dyn MessengerInterface>) -> Self {
        self.messenger = Some(messenger);
        self
    }

    /// Builds the pipeline, running tree finalization and label checks.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] for unknown start/fallback labels,
    /// invalid or duplicate component names, and a missing or
    /// duplicated actor.
    pub fn build(self) -> Result<Pipeline, BuildError> {
        if !self.script.contains(&self.start_label) {
            return Err(BuildError::UnknownLabel {
                kind: "start",
                label: self.start_label,
            });
        }
        let fallback_label = self.fallback_label.unwrap_or_else(|| self.start_label.clone());
        if !self.script.contains(&fallback_label) {
            return Err(BuildError::UnknownLabel {
                kind: "fallback",
                label: fallback_label,
            });
        }

        let mut components = self.pre_services;
        components.push(Service::actor(ScriptActor::new(self.script.clone())).into());
        components.extend(self.post_services);

        let mut root = ServiceGroup::new(components).with_name("pipeline");
        if let Some(handler) = self.before_handler {
            root = root.with_before_handler(handler);
        }
        if let Some(handler) = self.after_handler {
            root = root.with_after_handler(handler);
        }
        if let Some(timeout) = self.timeout {
            root = root.with_timeout(timeout);
        }
        root.core_mut().path = ".pipeline".to_string();

        match finalize_group(&mut root, ".pipeline")? {
            0 => return Err(BuildError::ActorNotFound),
            1 => {}
            count => return Err(BuildError::MultipleActors { count }),
        }

        Ok(Pipeline::assemble(
            Component::from(root),
            self.script,
            self.start_label,
            fallback_label,
            self.storage
                .unwrap_or_else(|| Arc::new(MemoryContextStorage::new())),
            self.messenger
                .unwrap_or_else(|| Arc::new(CliMessengerInterface::new())),
        ))
    }
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("start_label", &self.start_label)
            .field("fallback_label", &self.fallback_label)
            .field("pre_services", &self.pre_services.len())
            .field("post_services", &self.post_services.len())
            .finish_non_exhaustive()
    }
}
