//! Handler registration and the frozen chain that runs them.

use super::{ChainContext, ChainError, ChangedFileSet, Handler, Phase};

/// Collects handlers before watching starts.
///
/// Registration is append-only; call [`Registry::build`] to freeze the
/// handlers into a [`CallbackChain`].
#[derive(Default)]
pub struct Registry {
    process: Vec<Box<dyn Handler>>,
    post_process: Vec<Box<dyn Handler>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler to the given phase. Registration order is run order.
    pub fn register(&mut self, phase: Phase, handler: impl Handler + 'static) -> &mut Self {
        self.register_boxed(phase, Box::new(handler))
    }

    pub fn register_boxed(&mut self, phase: Phase, handler: Box<dyn Handler>) -> &mut Self {
        crate::debug_event!("registry", "register", "{:?} {}", phase, handler.name());
        match phase {
            Phase::Process => self.process.push(handler),
            Phase::PostProcess => self.post_process.push(handler),
        }
        self
    }

    /// Number of handlers registered for a phase.
    pub fn len(&self, phase: Phase) -> usize {
        match phase {
            Phase::Process => self.process.len(),
            Phase::PostProcess => self.post_process.len(),
        }
    }

    /// Handler names for a phase, in run order.
    pub fn names(&self, phase: Phase) -> Vec<&str> {
        let handlers = match phase {
            Phase::Process => &self.process,
            Phase::PostProcess => &self.post_process,
        };
        handlers.iter().map(|h| h.name()).collect()
    }

    pub fn build(self) -> CallbackChain {
        CallbackChain {
            process: self.process,
            post_process: self.post_process,
        }
    }
}

/// Immutable, ordered handler pipeline.
pub struct CallbackChain {
    process: Vec<Box<dyn Handler>>,
    post_process: Vec<Box<dyn Handler>>,
}

impl CallbackChain {
    pub fn has_process_handlers(&self) -> bool {
        !self.process.is_empty()
    }

    /// Run the chain over `files`, returning whatever nobody claimed.
    ///
    /// `Process` handlers each see what the previous one left over. The
    /// `PostProcess` phase runs only when `run_post_process` is set and
    /// files remain. No handler is invoked once the set is empty.
    pub async fn call(
        &self,
        files: ChangedFileSet,
        ctx: &ChainContext,
        run_post_process: bool,
    ) -> Result<ChangedFileSet, ChainError> {
        let files = Self::run_phase(&self.process, files, ctx).await?;

        if run_post_process && !files.is_empty() {
            return Self::run_phase(&self.post_process, files, ctx).await;
        }

        Ok(files)
    }

    async fn run_phase(
        handlers: &[Box<dyn Handler>],
        mut files: ChangedFileSet,
        ctx: &ChainContext,
    ) -> Result<ChangedFileSet, ChainError> {
        for handler in handlers {
            if files.is_empty() {
                break;
            }

            let outcome = handler.call(files, ctx).await?;
            if !outcome.is_pass_through() {
                crate::debug_event!(handler.name(), "claimed", "{}", outcome.claimed.join(", "));
            }
            files = outcome.remaining;
        }

        Ok(files)
    }
}
