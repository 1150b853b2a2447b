//! Trait definitions for the invoker module.

use async_trait::async_trait;

use super::error::InvokerError;
use super::types::{InvocationContext, InvocationResult, ToolCommand};

/// Something that can run an external tool to completion.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Returns the name of this runner implementation.
    fn name(&self) -> &str;

    /// Runs the command and waits for it to exit.
    ///
    /// A non-zero exit status is returned as `Ok` with
    /// [`InvocationResult::success`] reporting `false`.
    async fn run(
        &self,
        command: ToolCommand,
        ctx: &InvocationContext,
    ) -> Result<InvocationResult, InvokerError>;
}
