//! The actor: the component that advances the dialog graph.

use super::Script;
use crate::context::Context;
use crate::core::NodeLabel;
use crate::errors::ServiceError;
use crate::pipeline::Pipeline;
use crate::service::{ServiceHandler, ServiceRuntimeInfo};
use async_trait::async_trait;
use tracing::debug;

/// Advances the dialog graph by one step per turn.
///
/// The actor resolves the current node (the context's last label, or
/// the turn's configured start label on a fresh conversation), picks
/// the first transition whose condition matches the incoming request —
/// falling back to the configured fallback label when none does — and
/// appends the destination's label and response to the context.
#[derive(Debug, Clone)]
pub struct ScriptActor {
    script: Script,
}

impl ScriptActor {
    /// Wraps a dialog script.
    #[must_use]
    pub fn new(script: Script) -> Self {
        Self { script }
    }

    /// The wrapped script.
    #[must_use]
    pub fn script(&self) -> &Script {
        &self.script
    }
}

#[async_trait]
impl ServiceHandler for ScriptActor {
    async fn handle(
        &self,
        ctx: &Context,
        _pipeline: &Pipeline,
        _info: &ServiceRuntimeInfo,
    ) -> Result<(), ServiceError> {
        let config = ctx
            .framework()
            .turn_config()
            .ok_or_else(|| ServiceError::new("dialog turn configuration missing"))?;

        let current = ctx.last_label().unwrap_or_else(|| config.start_label.clone());
        let request = ctx.last_request();

        let next: NodeLabel = self
            .script
            .node(&current)
            .and_then(|node| {
                node.transitions
                    .iter()
                    .find(|transition| transition.cnd.matches(request.as_ref()))
                    .map(|transition| transition.dst.clone())
            })
            .unwrap_or_else(|| config.fallback_label.clone());

        let node = self
            .script
            .node(&next)
            .ok_or_else(|| ServiceError::new(format!("no node for label {next}")))?;

        debug!(from = %current, to = %next, "dialog transition");
        ctx.add_label(next);
        ctx.add_response(node.response.clone());
        Ok(())
    }
}
