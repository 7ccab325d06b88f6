//! The watch loop: event source -> debouncer -> callback chain.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tokio::time::Duration;

use super::debouncer::Debouncer;
use super::error::{StartError, WatchError};
use super::source::EventSource;
use crate::chain::{CallbackChain, ChainContext};
use crate::exec::{APP_NAME, Execute, NotificationKind, Notifier};
use crate::logging::LogSink;

/// Watches paths and runs the callback chain on every batch of changes.
///
/// Owns the watermark: the time the last non-empty batch finished. Only
/// files modified after it are reported to the chain.
pub struct Kicker {
    /// Absolute paths to watch.
    paths: Vec<PathBuf>,
    latency: Duration,
    chain: CallbackChain,
    context: ChainContext,
    debouncer: Debouncer,
    notifier: Option<Arc<dyn Notifier>>,
    last_event_processed_at: SystemTime,
}

impl Kicker {
    /// Create a builder for configuring the watcher.
    pub fn builder() -> KickerBuilder {
        KickerBuilder::new()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn last_event_processed_at(&self) -> SystemTime {
        self.last_event_processed_at
    }

    /// Check that watching can start.
    pub fn validate(&self) -> Result<(), StartError> {
        if !self.chain.has_process_handlers() {
            return Err(StartError::NoHandlers);
        }
        if let Some(missing) = self.paths.iter().find(|p| !p.exists()) {
            return Err(StartError::MissingPath(missing.clone()));
        }
        Ok(())
    }

    /// Directories handed to the event source: each path, or its parent
    /// when the path is a file.
    pub fn watch_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .paths
            .iter()
            .map(|path| {
                if path.is_dir() {
                    path.clone()
                } else {
                    path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone())
                }
            })
            .collect();
        dirs.dedup();
        dirs
    }

    /// Handle one batch of changed directories.
    ///
    /// Returns how many changed files were found. The watermark only moves
    /// after a non-empty batch made it through the chain.
    pub async fn process<I, P>(&mut self, dirs: I) -> Result<usize, WatchError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let files = self
            .debouncer
            .changed_files(dirs, self.last_event_processed_at)?;
        if files.is_empty() {
            return Ok(0);
        }

        let count = files.len();
        crate::debug_event!("watcher", "changed", "{}", files.as_slice().join(", "));

        self.chain.call(files, &self.context, true).await?;
        self.finished_processing();
        Ok(count)
    }

    fn finished_processing(&mut self) {
        self.last_event_processed_at = SystemTime::now();
    }

    /// Watch until interrupted with Ctrl-C.
    pub async fn start(self) -> Result<(), WatchError> {
        self.start_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("[watcher] cannot listen for interrupt: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Watch until `shutdown` completes.
    ///
    /// Batches run one at a time. Chain failures are logged and watching
    /// continues. Shutdown also interrupts a batch in progress; the command
    /// it was running is abandoned.
    pub async fn start_until<F>(mut self, shutdown: F) -> Result<(), WatchError>
    where
        F: Future<Output = ()>,
    {
        let display: Vec<String> = self
            .paths
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        self.context
            .log
            .log(&format!("Watching for changes on: {}", display.join(", ")));
        self.context.log.log("");

        let mut source = EventSource::start(&self.watch_dirs(), self.latency)?;

        if let Some(notifier) = &self.notifier {
            notifier.register(APP_NAME, &NotificationKind::ALL);
        }

        // Polled across the whole loop so no interrupt is missed between
        // batches.
        tokio::pin!(shutdown);

        loop {
            let dirs = tokio::select! {
                batch = source.next_batch() => match batch {
                    Some(dirs) => dirs,
                    None => break,
                },
                _ = &mut shutdown => break,
            };

            tokio::select! {
                result = self.process(dirs) => {
                    if let Err(e) = result {
                        tracing::error!("[watcher] {e}");
                    }
                }
                _ = &mut shutdown => break,
            }
        }

        self.context.log.log("Exiting…");
        source.stop();
        Ok(())
    }
}

/// Builder for constructing a [`Kicker`].
pub struct KickerBuilder {
    paths: Vec<PathBuf>,
    latency_ms: u64,
    chain: Option<CallbackChain>,
    executor: Option<Arc<dyn Execute>>,
    log: Option<Arc<dyn LogSink>>,
    notifier: Option<Arc<dyn Notifier>>,
    working_dir: Option<PathBuf>,
}

impl KickerBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            latency_ms: 1000,
            chain: None,
            executor: None,
            log: None,
            notifier: None,
            working_dir: None,
        }
    }

    /// Paths to watch; relative paths resolve against the working directory.
    pub fn paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.paths = paths.into_iter().collect();
        self
    }

    /// Set the event coalescing window in milliseconds.
    pub fn latency_ms(mut self, ms: u64) -> Self {
        self.latency_ms = ms;
        self
    }

    pub fn chain(mut self, chain: CallbackChain) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn Execute>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn log(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn notifier(mut self, notifier: Option<Arc<dyn Notifier>>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Set the working directory (defaults to the current directory).
    pub fn working_dir(mut self, path: PathBuf) -> Self {
        self.working_dir = Some(path);
        self
    }

    /// Build the watcher. The watermark starts at the current time.
    pub fn build(self) -> Result<Kicker, WatchError> {
        let chain = self.chain.ok_or_else(|| WatchError::InitFailed {
            reason: "Callback chain is required".to_string(),
        })?;

        let executor = self.executor.ok_or_else(|| WatchError::InitFailed {
            reason: "Executor is required".to_string(),
        })?;

        let log = self.log.ok_or_else(|| WatchError::InitFailed {
            reason: "Log sink is required".to_string(),
        })?;

        let working_dir = match self.working_dir {
            Some(dir) => dir,
            None => std::env::current_dir().map_err(|e| WatchError::InitFailed {
                reason: format!("Cannot determine working directory: {e}"),
            })?,
        };

        let mut paths: Vec<PathBuf> = if self.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.paths
        };
        for path in &mut paths {
            *path = expand_path(&working_dir, path);
        }

        Ok(Kicker {
            paths,
            latency: Duration::from_millis(self.latency_ms),
            chain,
            context: ChainContext::new(executor, log, working_dir.clone()),
            debouncer: Debouncer::new(working_dir),
            notifier: self.notifier,
            last_event_processed_at: SystemTime::now(),
        })
    }
}

impl Default for KickerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Absolute, `.`-free form of `path` relative to `base`.
fn expand_path(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    std::path::absolute(&joined).unwrap_or(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{FnHandler, HandlerOutcome, Phase, Registry};
    use crate::chain::{ChainError, ChangedFileSet, Handler};
    use crate::fakes::{RecordingExecutor, RecordingLog, RecordingNotifier};
    use crate::recipes::{CouldNotHandle, ExecuteCommand};
    use async_trait::async_trait;
    use std::fs::File;
    use tempfile::TempDir;
    use tokio::sync::Notify;
    use tokio::time::timeout;

    struct Fixture {
        temp: TempDir,
        log: Arc<RecordingLog>,
        executor: Arc<RecordingExecutor>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                temp: TempDir::new().unwrap(),
                log: Arc::new(RecordingLog::new()),
                executor: Arc::new(RecordingExecutor::new()),
            }
        }

        fn root(&self) -> &Path {
            self.temp.path()
        }

        fn kicker(&self, registry: Registry, paths: Vec<PathBuf>) -> Kicker {
            Kicker::builder()
                .paths(paths)
                .chain(registry.build())
                .executor(self.executor.clone())
                .log(self.log.clone())
                .working_dir(self.root().to_path_buf())
                .build()
                .unwrap()
        }

        /// Write a file dated in the future so it beats any watermark.
        fn touch_future(&self, rel: &str) {
            let path = self.root().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            let file = File::create(&path).unwrap();
            file.set_modified(SystemTime::now() + std::time::Duration::from_secs(30))
                .unwrap();
        }
    }

    #[test]
    fn test_build_expands_paths_and_defaults_to_working_dir() {
        let fixture = Fixture::new();
        let kicker = fixture.kicker(Registry::new(), vec![]);
        assert_eq!(kicker.paths(), [fixture.root().to_path_buf()]);

        let kicker = fixture.kicker(
            Registry::new(),
            vec![PathBuf::from("/some/dir"), PathBuf::from("a/relative/path")],
        );
        assert_eq!(
            kicker.paths(),
            [
                PathBuf::from("/some/dir"),
                fixture.root().join("a/relative/path")
            ]
        );
        assert_eq!(kicker.latency(), Duration::from_millis(1000));
    }

    #[test]
    fn test_watermark_starts_at_construction() {
        let before = SystemTime::now();
        let fixture = Fixture::new();
        let kicker = fixture.kicker(Registry::new(), vec![]);
        assert!(kicker.last_event_processed_at() >= before);
        assert!(kicker.last_event_processed_at() <= SystemTime::now());
    }

    #[test]
    fn test_validate_requires_process_handler() {
        let fixture = Fixture::new();
        let mut registry = Registry::new();
        registry.register(Phase::PostProcess, CouldNotHandle);

        let kicker = fixture.kicker(registry, vec![]);
        assert!(matches!(kicker.validate(), Err(StartError::NoHandlers)));
    }

    #[test]
    fn test_validate_rejects_missing_path() {
        let fixture = Fixture::new();
        let mut registry = Registry::new();
        registry.register(Phase::Process, ExecuteCommand::new("ls"));

        let kicker = fixture.kicker(registry, vec![PathBuf::from("/some/file.rb")]);
        let err = kicker.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "The given path `/some/file.rb' does not exist"
        );
    }

    #[test]
    fn test_watch_dirs_use_parent_of_files() {
        let fixture = Fixture::new();
        fixture.touch_future("lib/file.rb");

        let kicker = fixture.kicker(
            Registry::new(),
            vec![PathBuf::from("lib/file.rb"), PathBuf::from(".")],
        );
        assert_eq!(
            kicker.watch_dirs(),
            vec![fixture.root().join("lib"), fixture.root().to_path_buf()]
        );
    }

    #[tokio::test]
    async fn test_process_runs_chain_and_advances_watermark() {
        let fixture = Fixture::new();
        fixture.touch_future("app/models/member.rb");

        let mut registry = Registry::new();
        registry.register(Phase::Process, ExecuteCommand::new("rake test"));
        let mut kicker = fixture.kicker(registry, vec![]);
        let before = kicker.last_event_processed_at();

        let count = kicker
            .process([fixture.root().join("app/models")])
            .await
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(fixture.executor.commands(), vec!["rake test"]);
        assert!(kicker.last_event_processed_at() > before);
    }

    #[tokio::test]
    async fn test_empty_batch_leaves_watermark_alone() {
        let fixture = Fixture::new();
        let file = File::create(fixture.root().join("old.rb")).unwrap();
        file.set_modified(SystemTime::now() - std::time::Duration::from_secs(60))
            .unwrap();

        let mut registry = Registry::new();
        registry.register(Phase::Process, ExecuteCommand::new("rake test"));
        let mut kicker = fixture.kicker(registry, vec![]);
        let before = kicker.last_event_processed_at();

        let count = kicker.process([fixture.root()]).await.unwrap();

        assert_eq!(count, 0);
        assert!(fixture.executor.commands().is_empty());
        assert_eq!(kicker.last_event_processed_at(), before);
    }

    #[tokio::test]
    async fn test_unclaimed_files_reach_fallback() {
        let fixture = Fixture::new();
        fixture.touch_future("Rakefile");
        fixture.touch_future("README");

        let mut registry = Registry::new();
        registry
            .register(
                Phase::Process,
                FnHandler::new("observer", |files, _ctx| Ok(HandlerOutcome::pass(files))),
            )
            .register(Phase::PostProcess, CouldNotHandle);
        let mut kicker = fixture.kicker(registry, vec![]);

        kicker.process([fixture.root()]).await.unwrap();

        assert_eq!(
            fixture.log.lines(),
            vec!["", "Could not handle: README, Rakefile", ""]
        );
    }

    #[tokio::test]
    async fn test_chain_error_keeps_watermark() {
        let fixture = Fixture::new();
        fixture.touch_future("a.rb");

        let mut registry = Registry::new();
        registry.register(
            Phase::Process,
            FnHandler::new("broken", |_files, _ctx| {
                Err(crate::chain::ChainError::handler("broken", "boom"))
            }),
        );
        let mut kicker = fixture.kicker(registry, vec![]);
        let before = kicker.last_event_processed_at();

        let err = kicker.process([fixture.root()]).await.unwrap_err();

        assert!(matches!(err, WatchError::Chain(_)));
        assert_eq!(kicker.last_event_processed_at(), before);
    }

    /// Signals when it starts, then never finishes on its own.
    struct Hang {
        started: Arc<Notify>,
    }

    #[async_trait]
    impl Handler for Hang {
        fn name(&self) -> &str {
            "hang"
        }

        async fn call(
            &self,
            files: ChangedFileSet,
            _ctx: &ChainContext,
        ) -> Result<HandlerOutcome, ChainError> {
            self.started.notify_one();
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok(HandlerOutcome::claim_all(files))
        }
    }

    #[tokio::test]
    async fn test_start_announces_registers_and_exits() {
        let fixture = Fixture::new();
        let notifier = Arc::new(RecordingNotifier::new());

        let mut registry = Registry::new();
        registry.register(Phase::Process, ExecuteCommand::new("rake test"));
        let kicker = Kicker::builder()
            .chain(registry.build())
            .executor(fixture.executor.clone())
            .log(fixture.log.clone())
            .notifier(Some(notifier.clone() as Arc<dyn Notifier>))
            .working_dir(fixture.root().to_path_buf())
            .build()
            .unwrap();
        let root = kicker.paths()[0].display().to_string();

        timeout(
            std::time::Duration::from_secs(5),
            kicker.start_until(tokio::time::sleep(std::time::Duration::from_millis(100))),
        )
        .await
        .expect("watcher did not stop")
        .unwrap();

        assert_eq!(
            fixture.log.lines(),
            vec![format!("Watching for changes on: {root}"), String::new(), "Exiting…".to_string()]
        );
        assert_eq!(
            notifier.registrations(),
            vec![(APP_NAME.to_string(), NotificationKind::ALL.to_vec())]
        );
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_running_batch() {
        let fixture = Fixture::new();
        let started = Arc::new(Notify::new());

        let mut registry = Registry::new();
        registry.register(
            Phase::Process,
            Hang {
                started: started.clone(),
            },
        );
        let kicker = Kicker::builder()
            .latency_ms(50)
            .chain(registry.build())
            .executor(fixture.executor.clone())
            .log(fixture.log.clone())
            .working_dir(fixture.root().to_path_buf())
            .build()
            .unwrap();

        let file = fixture.root().join("app.rb");
        let writer = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            std::fs::write(file, "changed").unwrap();
        });

        let shutdown = {
            let started = started.clone();
            async move { started.notified().await }
        };
        timeout(
            std::time::Duration::from_secs(10),
            kicker.start_until(shutdown),
        )
        .await
        .expect("shutdown did not interrupt the batch")
        .unwrap();
        writer.await.unwrap();

        assert_eq!(fixture.log.lines().last().map(String::as_str), Some("Exiting…"));
    }
}
