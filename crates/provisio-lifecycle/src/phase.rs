//! Pipeline phases and the per-operation phase strategy.

use std::fmt;

use async_trait::async_trait;
use provisio_core::ResourceContext;

use crate::error::Result;

/// The eight ordered steps every resource operation runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    HandleInput,
    ValidateInput,
    DefineRoles,
    Bind,
    BeforeAction,
    DefaultAction,
    AfterAction,
    ReleaseUnmanagedResources,
}

impl Phase {
    pub const ALL: [Phase; 8] = [
        Phase::HandleInput,
        Phase::ValidateInput,
        Phase::DefineRoles,
        Phase::Bind,
        Phase::BeforeAction,
        Phase::DefaultAction,
        Phase::AfterAction,
        Phase::ReleaseUnmanagedResources,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HandleInput => "HandleInput",
            Self::ValidateInput => "ValidateInput",
            Self::DefineRoles => "DefineRoles",
            Self::Bind => "Bind",
            Self::BeforeAction => "BeforeAction",
            Self::DefaultAction => "DefaultAction",
            Self::AfterAction => "AfterAction",
            Self::ReleaseUnmanagedResources => "ReleaseUnmanagedResources",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations a resource service exposes.
///
/// [`CrudAction::as_str`] is the action name handed to the permission oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrudAction {
    List,
    GetById,
    Create,
    Update,
    Patch,
    Delete,
    GetByIdAndSecret,
}

impl CrudAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::GetById => "get_by_id",
            Self::Create => "create",
            Self::Update => "update",
            Self::Patch => "patch",
            Self::Delete => "delete",
            Self::GetByIdAndSecret => "get_by_id_and_secret_or_default",
        }
    }
}

impl fmt::Display for CrudAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core logic of one operation, one method per phase.
///
/// Every method defaults to doing nothing, so an operation only implements
/// the phases it needs.
#[async_trait]
pub trait OperationPhases: Send + Sync {
    async fn handle_input(&self, _cx: &mut ResourceContext) -> Result<()> {
        Ok(())
    }

    async fn validate_input(&self, _cx: &mut ResourceContext) -> Result<()> {
        Ok(())
    }

    async fn define_roles(&self, _cx: &mut ResourceContext) -> Result<()> {
        Ok(())
    }

    async fn bind(&self, _cx: &mut ResourceContext) -> Result<()> {
        Ok(())
    }

    async fn before_action(&self, _cx: &mut ResourceContext) -> Result<()> {
        Ok(())
    }

    async fn default_action(&self, _cx: &mut ResourceContext) -> Result<()> {
        Ok(())
    }

    async fn after_action(&self, _cx: &mut ResourceContext) -> Result<()> {
        Ok(())
    }

    async fn release_unmanaged_resources(&self, _cx: &mut ResourceContext) -> Result<()> {
        Ok(())
    }

    /// Runs the core logic of `phase`.
    async fn run(&self, phase: Phase, cx: &mut ResourceContext) -> Result<()> {
        match phase {
            Phase::HandleInput => self.handle_input(cx).await,
            Phase::ValidateInput => self.validate_input(cx).await,
            Phase::DefineRoles => self.define_roles(cx).await,
            Phase::Bind => self.bind(cx).await,
            Phase::BeforeAction => self.before_action(cx).await,
            Phase::DefaultAction => self.default_action(cx).await,
            Phase::AfterAction => self.after_action(cx).await,
            Phase::ReleaseUnmanagedResources => self.release_unmanaged_resources(cx).await,
        }
    }
}
