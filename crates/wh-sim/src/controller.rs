//! The `Controller` trait: the stepper's extension point for fleet logic.

use crate::{ControlContext, SimResult};

/// Decides what bots do: assigns tasks, plans paths, picks up and sets down
/// pods, and emits domain events.
///
/// Called once per tick after bots have moved.  Only
/// [`on_tick`][Self::on_tick] is required.
///
/// Errors returned from a hook abort the current `step`.  Recoverable
/// conditions such as a missing path should be handled inside the
/// controller (see [`SimError::is_path_not_found`][crate::SimError::is_path_not_found]).
pub trait Controller: Send {
    fn name(&self) -> &'static str {
        "controller"
    }

    /// Called once at the start of `execute`, before the first tick.
    fn on_start(&mut self, _ctx: &mut ControlContext<'_>) -> SimResult<()> {
        Ok(())
    }

    fn on_tick(&mut self, ctx: &mut ControlContext<'_>) -> SimResult<()>;

    /// Called once at the end of `execute`.
    fn on_end(&mut self, _ctx: &mut ControlContext<'_>) -> SimResult<()> {
        Ok(())
    }
}

impl<C: Controller + ?Sized> Controller for Box<C> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn on_start(&mut self, ctx: &mut ControlContext<'_>) -> SimResult<()> {
        (**self).on_start(ctx)
    }

    fn on_tick(&mut self, ctx: &mut ControlContext<'_>) -> SimResult<()> {
        (**self).on_tick(ctx)
    }

    fn on_end(&mut self, ctx: &mut ControlContext<'_>) -> SimResult<()> {
        (**self).on_end(ctx)
    }
}

/// A [`Controller`] that never acts.  Bots only follow paths given to them
/// through the stepper's commands.
pub struct NoopController;

impl Controller for NoopController {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn on_tick(&mut self, _ctx: &mut ControlContext<'_>) -> SimResult<()> {
        Ok(())
    }
}
