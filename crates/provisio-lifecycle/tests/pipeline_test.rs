//! Orchestrator phase-ordering and failure semantics.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{init_test_logging, Journal, Recorder};
use provisio_core::ResourceContext;
use provisio_lifecycle::{
    CrudAction, Extension, ExtensionRegistry, HookTiming, LifecycleError, OperationPhases,
    Orchestrator, Phase,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// Phase strategy that journals each core step and can fail on one.
struct Scripted {
    journal: Journal,
    fail_on: Option<Phase>,
}

impl Scripted {
    fn new(journal: Journal) -> Self {
        Self {
            journal,
            fail_on: None,
        }
    }

    fn step(&self, phase: Phase, cx: &mut ResourceContext) -> Result<(), LifecycleError> {
        self.journal.push(format!("core:{phase}"));
        if phase == Phase::DefaultAction {
            cx.set_result(json!({"written": "core"}));
        }
        if self.fail_on == Some(phase) {
            return Err(LifecycleError::InvalidInput(format!("{phase} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl OperationPhases for Scripted {
    async fn handle_input(&self, cx: &mut ResourceContext) -> Result<(), LifecycleError> {
        self.step(Phase::HandleInput, cx)
    }

    async fn validate_input(&self, cx: &mut ResourceContext) -> Result<(), LifecycleError> {
        self.step(Phase::ValidateInput, cx)
    }

    async fn define_roles(&self, cx: &mut ResourceContext) -> Result<(), LifecycleError> {
        self.step(Phase::DefineRoles, cx)
    }

    async fn bind(&self, cx: &mut ResourceContext) -> Result<(), LifecycleError> {
        self.step(Phase::Bind, cx)
    }

    async fn before_action(&self, cx: &mut ResourceContext) -> Result<(), LifecycleError> {
        self.step(Phase::BeforeAction, cx)
    }

    async fn default_action(&self, cx: &mut ResourceContext) -> Result<(), LifecycleError> {
        self.step(Phase::DefaultAction, cx)
    }

    async fn after_action(&self, cx: &mut ResourceContext) -> Result<(), LifecycleError> {
        self.step(Phase::AfterAction, cx)
    }

    async fn release_unmanaged_resources(
        &self,
        cx: &mut ResourceContext,
    ) -> Result<(), LifecycleError> {
        self.step(Phase::ReleaseUnmanagedResources, cx)
    }
}

/// Extension that writes its own result in DefaultAction.
struct ResultWriter;

#[async_trait]
impl Extension for ResultWriter {
    fn name(&self) -> &str {
        "result-writer"
    }

    async fn execute(&self, _phase: Phase, cx: &mut ResourceContext) -> Result<(), LifecycleError> {
        cx.set_result(json!({"written": "extension"}));
        Ok(())
    }
}

fn with_recorder(recorder: Recorder) -> Orchestrator {
    Orchestrator::new(common::record_everywhere(recorder))
}

#[tokio::test]
async fn phases_run_in_order_with_hooks_after_core() {
    init_test_logging();
    let journal = Journal::default();
    let orchestrator = with_recorder(Recorder::new("hook", journal.clone()));
    let mut cx = ResourceContext::new();

    orchestrator
        .run("notes", CrudAction::List, &Scripted::new(journal.clone()), &mut cx)
        .await
        .unwrap();

    let expected: Vec<String> = Phase::ALL
        .iter()
        .flat_map(|p| [format!("core:{p}"), format!("hook:{p}")])
        .collect();
    assert_eq!(journal.entries(), expected);
    assert_eq!(cx.result(), Some(&json!({"written": "core"})));
}

#[tokio::test]
async fn before_hooks_run_before_core_in_registration_order() {
    let journal = Journal::default();
    let mut registry = ExtensionRegistry::new();
    registry
        .register_with_timing(
            Phase::Bind,
            HookTiming::Before,
            Arc::new(Recorder::new("first", journal.clone())),
        )
        .register_with_timing(
            Phase::Bind,
            HookTiming::Before,
            Arc::new(Recorder::new("second", journal.clone())),
        )
        .register(Phase::Bind, Arc::new(Recorder::new("after", journal.clone())));
    let orchestrator = Orchestrator::new(Arc::new(registry));

    orchestrator
        .run(
            "notes",
            CrudAction::Create,
            &Scripted::new(journal.clone()),
            &mut ResourceContext::new(),
        )
        .await
        .unwrap();

    let entries = journal.entries();
    let bind: Vec<&str> = entries
        .iter()
        .map(String::as_str)
        .filter(|e| e.ends_with(":Bind"))
        .collect();
    assert_eq!(bind, vec!["first:Bind", "second:Bind", "core:Bind", "after:Bind"]);
}

#[tokio::test]
async fn skip_default_action_keeps_extension_result() {
    let journal = Journal::default();
    let mut registry = ExtensionRegistry::new();
    registry.register_with_timing(Phase::DefaultAction, HookTiming::Before, Arc::new(ResultWriter));
    registry.register(
        Phase::DefaultAction,
        Arc::new(Recorder::new("hook", journal.clone())),
    );
    let orchestrator = Orchestrator::new(Arc::new(registry));
    let mut cx = ResourceContext::new();
    cx.skip_default_action = true;

    orchestrator
        .run("notes", CrudAction::GetById, &Scripted::new(journal.clone()), &mut cx)
        .await
        .unwrap();

    assert_eq!(journal.count("core:DefaultAction"), 0);
    assert_eq!(journal.count("hook:DefaultAction"), 1);
    assert_eq!(journal.count("core:AfterAction"), 1);
    assert_eq!(cx.result(), Some(&json!({"written": "extension"})));
}

#[tokio::test]
async fn early_failure_aborts_without_cleanup() {
    for phase in [Phase::HandleInput, Phase::ValidateInput, Phase::DefineRoles] {
        let journal = Journal::default();
        let orchestrator = Orchestrator::default();
        let phases = Scripted {
            journal: journal.clone(),
            fail_on: Some(phase),
        };

        let err = orchestrator
            .run("notes", CrudAction::Patch, &phases, &mut ResourceContext::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LifecycleError::InvalidInput(_)));
        assert_eq!(journal.count("core:ReleaseUnmanagedResources"), 0, "{phase}");
        assert_eq!(journal.entries().last(), Some(&format!("core:{phase}")));
    }
}

#[tokio::test]
async fn late_failure_still_releases_and_clears_result() {
    for phase in [
        Phase::Bind,
        Phase::BeforeAction,
        Phase::DefaultAction,
        Phase::AfterAction,
    ] {
        let journal = Journal::default();
        let orchestrator = Orchestrator::default();
        let phases = Scripted {
            journal: journal.clone(),
            fail_on: Some(phase),
        };
        let mut cx = ResourceContext::new();

        let err = orchestrator
            .run("notes", CrudAction::Patch, &phases, &mut cx)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), format!("Invalid input: {phase} failed"));
        assert_eq!(
            journal.entries().last().map(String::as_str),
            Some("core:ReleaseUnmanagedResources"),
            "{phase}"
        );
        assert!(cx.result().is_none());
    }
}

#[tokio::test]
async fn hook_failure_runs_cleanup_and_returns_hook_error() {
    let journal = Journal::default();
    let orchestrator = with_recorder(
        Recorder::new("hook", journal.clone()).failing_on(Phase::AfterAction),
    );
    let mut cx = ResourceContext::new();

    let err = orchestrator
        .run("notes", CrudAction::Create, &Scripted::new(journal.clone()), &mut cx)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Internal error: hook failed");
    assert_eq!(journal.count("core:ReleaseUnmanagedResources"), 1);
    assert_eq!(journal.count("hook:ReleaseUnmanagedResources"), 1);
    assert!(cx.result().is_none());
}

#[tokio::test]
async fn cleanup_failure_after_earlier_error_returns_earlier_error() {
    let journal = Journal::default();
    let orchestrator = with_recorder(
        Recorder::new("hook", journal.clone()).failing_on(Phase::ReleaseUnmanagedResources),
    );
    let phases = Scripted {
        journal: journal.clone(),
        fail_on: Some(Phase::BeforeAction),
    };

    let err = orchestrator
        .run("notes", CrudAction::Create, &phases, &mut ResourceContext::new())
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::InvalidInput(_)));
}

#[tokio::test]
async fn cleanup_failure_alone_is_returned() {
    let journal = Journal::default();
    let phases = Scripted {
        journal: journal.clone(),
        fail_on: Some(Phase::ReleaseUnmanagedResources),
    };
    let mut cx = ResourceContext::new();

    let err = Orchestrator::default()
        .run("notes", CrudAction::Create, &phases, &mut cx)
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::InvalidInput(_)));
    assert!(cx.result().is_none());
}

#[tokio::test]
async fn cancelled_context_runs_no_phase() {
    let journal = Journal::default();
    let token = CancellationToken::new();
    token.cancel();
    let mut cx = ResourceContext::new().with_cancellation(token);

    let err = Orchestrator::default()
        .run("notes", CrudAction::List, &Scripted::new(journal.clone()), &mut cx)
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::Cancelled));
    assert!(journal.entries().is_empty());
}
