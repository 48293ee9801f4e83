//! Extension hooks that run around the core logic of a phase.

use std::sync::Arc;

use async_trait::async_trait;
use provisio_core::ResourceContext;

use crate::error::Result;
use crate::phase::Phase;

/// A hook registered on one or more phases.
#[async_trait]
pub trait Extension: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn execute(&self, phase: Phase, cx: &mut ResourceContext) -> Result<()>;
}

/// Whether a hook runs before or after the phase's core logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookTiming {
    Before,
    #[default]
    After,
}

struct Registration {
    phase: Phase,
    timing: HookTiming,
    extension: Arc<dyn Extension>,
}

/// Hooks for a resource service, kept in registration order.
#[derive(Default)]
pub struct ExtensionRegistry {
    registrations: Vec<Registration>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `extension` to run after the core logic of `phase`.
    pub fn register(&mut self, phase: Phase, extension: Arc<dyn Extension>) -> &mut Self {
        self.register_with_timing(phase, HookTiming::After, extension)
    }

    pub fn register_with_timing(
        &mut self,
        phase: Phase,
        timing: HookTiming,
        extension: Arc<dyn Extension>,
    ) -> &mut Self {
        tracing::debug!(
            target: "lifecycle",
            extension = extension.name(),
            phase = %phase,
            ?timing,
            "Registered extension"
        );
        self.registrations.push(Registration {
            phase,
            timing,
            extension,
        });
        self
    }

    /// Hooks for `phase` and `timing`, in registration order.
    pub fn hooks(&self, phase: Phase, timing: HookTiming) -> Vec<Arc<dyn Extension>> {
        self.registrations
            .iter()
            .filter(|r| r.phase == phase && r.timing == timing)
            .map(|r| Arc::clone(&r.extension))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries: Vec<String> = self
            .registrations
            .iter()
            .map(|r| format!("{}:{:?}:{}", r.phase, r.timing, r.extension.name()))
            .collect();
        f.debug_struct("ExtensionRegistry")
            .field("registrations", &entries)
            .finish()
    }
}
