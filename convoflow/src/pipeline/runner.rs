//! The pipeline: the top-level turn driver.

use crate::context::{Context, TurnConfig};
use crate::core::{Message, NodeLabel};
use crate::errors::PipelineError;
use crate::messenger::{MessengerInterface, TurnRunner};
use crate::script::Script;
use crate::service::{Component, ExtraHandlerFunction, ExtraHandlerStage, GlobalExtraHandlerKind};
use crate::storage::ContextStorage;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// The assembled conversational pipeline.
///
/// A pipeline owns the finalized component tree (pre-services, the
/// actor, post-services under one root group), the dialog script and
/// its entry labels, and the storage and messenger collaborators. It
/// exclusively decides when a context is loaded and persisted; during a
/// turn the components share the context it hands them.
pub struct Pipeline {
    root: Component,
    script: Script,
    start_label: NodeLabel,
    fallback_label: NodeLabel,
    storage: Arc<dyn ContextStorage>,
    messenger: Arc<dyn MessengerInterface>,
}

impl Pipeline {
    /// Starts a [`PipelineBuilder`](super::PipelineBuilder).
    #[must_use]
    pub fn builder(script: Script, start_label: impl Into<NodeLabel>) -> super::PipelineBuilder {
        super::PipelineBuilder::new(script, start_label)
    }

    pub(crate) fn assemble(
        root: Component,
        script: Script,
        start_label: NodeLabel,
        fallback_label: NodeLabel,
        storage: Arc<dyn ContextStorage>,
        messenger: Arc<dyn MessengerInterface>,
    ) -> Self {
        Self {
            root,
            script,
            start_label,
            fallback_label,
            storage,
            messenger,
        }
    }

    /// The root service group.
    #[must_use]
    pub fn root(&self) -> &Component {
        &self.root
    }

    /// The dialog script.
    #[must_use]
    pub fn script(&self) -> &Script {
        &self.script
    }

    /// The configured start label.
    #[must_use]
    pub fn start_label(&self) -> &NodeLabel {
        &self.start_label
    }

    /// The configured fallback label.
    #[must_use]
    pub fn fallback_label(&self) -> &NodeLabel {
        &self.fallback_label
    }

    /// The context storage collaborator.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn ContextStorage> {
        &self.storage
    }

    /// Attaches an extra handler to every component whose name passes
    /// the whitelist/blacklist filter.
    ///
    /// [`GlobalExtraHandlerKind::BeforeAll`]/[`AfterAll`] attach to the
    /// root group only — sugar for a whitelist of `["pipeline"]`.
    ///
    /// [`AfterAll`]: GlobalExtraHandlerKind::AfterAll
    pub fn add_global_handler(
        &mut self,
        kind: GlobalExtraHandlerKind,
        handler: Arc<dyn ExtraHandlerFunction>,
        whitelist: Option<Vec<String>>,
        blacklist: Option<Vec<String>>,
    ) {
        let (stage, whitelist) = match kind {
            GlobalExtraHandlerKind::Before => (ExtraHandlerStage::Before, whitelist),
            GlobalExtraHandlerKind::After => (ExtraHandlerStage::After, whitelist),
            GlobalExtraHandlerKind::BeforeAll => {
                (ExtraHandlerStage::Before, Some(vec!["pipeline".to_string()]))
            }
            GlobalExtraHandlerKind::AfterAll => {
                (ExtraHandlerStage::After, Some(vec!["pipeline".to_string()]))
            }
        };

        let filter = move |name: &str| {
            whitelist
                .as_ref()
                .map_or(true, |allowed| allowed.iter().any(|entry| entry == name))
                && blacklist
                    .as_ref()
                    .map_or(true, |denied| !denied.iter().any(|entry| entry == name))
        };
        self.root.attach_global_handler(stage, &handler, &filter);
    }

    /// Runs one full turn for the given request.
    ///
    /// Loads (or creates) the context, merges auxiliary overrides,
    /// records the turn's dialog configuration, appends the request,
    /// invokes the root group, clears transient state and persists the
    /// context. Component failures never surface here — only driver
    /// errors (storage) do. Callers inspecting execution states must do
    /// so from an after-stage handler, before the turn-end clear.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError`] if the context storage collaborator
    /// fails to load or persist the context.
    pub async fn run_turn(
        &self,
        request: Message,
        ctx_id: Option<&str>,
        misc_overrides: Option<HashMap<String, serde_json::Value>>,
    ) -> Result<Context, PipelineError> {
        let ctx = match ctx_id {
            None => Context::new(uuid::Uuid::new_v4().to_string()),
            Some(id) => match self.storage.get(id).await? {
                Some(existing) => existing,
                None => Context::new(id),
            },
        };
        debug!(ctx_id = ctx.id(), "turn started");

        if let Some(overrides) = misc_overrides {
            ctx.merge_misc(overrides);
        }
        ctx.framework().set_turn_config(TurnConfig {
            start_label: self.start_label.clone(),
            fallback_label: self.fallback_label.clone(),
        });
        ctx.add_request(request);

        self.root.invoke(&ctx, self).await;

        ctx.framework().clear();
        ctx.touch();
        self.storage.set(ctx.id(), &ctx).await?;
        debug!(ctx_id = ctx.id(), "turn finished");

        Ok(ctx)
    }

    /// Connects the pipeline to its messenger interface and hands it
    /// the turn-runner callback. Blocks for as long as the messenger
    /// keeps the connection open.
    ///
    /// # Errors
    ///
    /// Returns whatever error the messenger's `connect` surfaces.
    pub async fn run(self: Arc<Self>) -> Result<(), PipelineError> {
        let messenger = Arc::clone(&self.messenger);
        let pipeline = Arc::clone(&self);
        let runner: TurnRunner = Arc::new(move |request, ctx_id, misc_overrides| {
            let pipeline = Arc::clone(&pipeline);
            Box::pin(async move {
                pipeline
                    .run_turn(request, ctx_id.as_deref(), misc_overrides)
                    .await
            })
        });
        messenger.connect(runner).await
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("start_label", &self.start_label)
            .field("fallback_label", &self.fallback_label)
            .finish_non_exhaustive()
    }
}
