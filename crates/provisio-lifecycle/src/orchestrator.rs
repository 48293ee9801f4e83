//! Drives an operation through the eight phases.
//!
//! For each phase: `Before` hooks, then the operation's core logic (skipped
//! for DefaultAction when `skip_default_action` is set), then `After` hooks.
//!
//! Failures in HandleInput, ValidateInput or DefineRoles abort the run. A
//! failure in Bind through AfterAction still runs ReleaseUnmanagedResources
//! before the first error is returned. Whenever a run fails the context's
//! Result is cleared.

use std::sync::Arc;

use provisio_core::ResourceContext;
use tracing::Instrument;

use crate::error::{LifecycleError, Result};
use crate::extension::{ExtensionRegistry, HookTiming};
use crate::phase::{CrudAction, OperationPhases, Phase};

const SETUP_PHASES: [Phase; 3] = [Phase::HandleInput, Phase::ValidateInput, Phase::DefineRoles];
const ACTION_PHASES: [Phase; 4] = [
    Phase::Bind,
    Phase::BeforeAction,
    Phase::DefaultAction,
    Phase::AfterAction,
];

#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    extensions: Arc<ExtensionRegistry>,
}

impl Orchestrator {
    pub fn new(extensions: Arc<ExtensionRegistry>) -> Self {
        Self { extensions }
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    /// Runs `phases` for `action` on `resource`.
    pub async fn run(
        &self,
        resource: &str,
        action: CrudAction,
        phases: &dyn OperationPhases,
        cx: &mut ResourceContext,
    ) -> Result<()> {
        let span = tracing::info_span!(
            target: "lifecycle",
            "lifecycle",
            operation = action.as_str(),
            resource
        );

        async move {
            let outcome = self.run_phases(phases, cx).await;
            if let Err(e) = &outcome {
                cx.clear_result();
                tracing::debug!(
                    target: "lifecycle",
                    error = %e,
                    error_code = e.error_code(),
                    "Operation failed"
                );
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run_phases(
        &self,
        phases: &dyn OperationPhases,
        cx: &mut ResourceContext,
    ) -> Result<()> {
        if cx.is_cancelled() {
            return Err(LifecycleError::Cancelled);
        }

        for phase in SETUP_PHASES {
            self.run_phase(phase, phases, cx).await?;
        }

        let mut failure = None;
        for phase in ACTION_PHASES {
            if let Err(e) = self.run_phase(phase, phases, cx).await {
                failure = Some(e);
                break;
            }
        }

        let released = self
            .run_phase(Phase::ReleaseUnmanagedResources, phases, cx)
            .await;

        match (failure, released) {
            (Some(first), Err(cleanup)) => {
                tracing::error!(
                    target: "lifecycle",
                    error = %cleanup,
                    original_error = %first,
                    "Releasing resources failed after an earlier error"
                );
                Err(first)
            }
            (Some(first), Ok(())) => Err(first),
            (None, released) => released,
        }
    }

    async fn run_phase(
        &self,
        phase: Phase,
        phases: &dyn OperationPhases,
        cx: &mut ResourceContext,
    ) -> Result<()> {
        tracing::trace!(target: "lifecycle", phase = %phase, "Entering phase");

        for hook in self.extensions.hooks(phase, HookTiming::Before) {
            hook.execute(phase, cx).await.map_err(|e| {
                log_hook_failure(hook.name(), phase, &e);
                e
            })?;
        }

        if phase == Phase::DefaultAction && cx.skip_default_action {
            tracing::debug!(target: "lifecycle", "Default action skipped");
        } else {
            phases.run(phase, cx).await?;
        }

        for hook in self.extensions.hooks(phase, HookTiming::After) {
            hook.execute(phase, cx).await.map_err(|e| {
                log_hook_failure(hook.name(), phase, &e);
                e
            })?;
        }

        Ok(())
    }
}

fn log_hook_failure(name: &str, phase: Phase, error: &LifecycleError) {
    tracing::warn!(
        target: "lifecycle",
        extension = name,
        phase = %phase,
        error = %error,
        "Extension failed"
    );
}
