//! Settings -> registry -> chain, with the executor and log faked.

use std::path::Path;
use std::sync::Arc;

use kicker::config::Settings;
use kicker::fakes::{RecordingExecutor, RecordingLog};
use kicker::{ChainContext, ChangedFileSet, build_registry};
use tempfile::TempDir;

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, "").unwrap();
}

struct Harness {
    temp: TempDir,
    executor: Arc<RecordingExecutor>,
    log: Arc<RecordingLog>,
}

impl Harness {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
            executor: Arc::new(RecordingExecutor::new()),
            log: Arc::new(RecordingLog::new()),
        }
    }

    fn context(&self) -> ChainContext {
        ChainContext::new(
            self.executor.clone(),
            self.log.clone(),
            self.temp.path().to_path_buf(),
        )
    }
}

#[tokio::test]
async fn test_rails_claims_known_files_and_fallback_reports_rest() {
    let harness = Harness::new();
    touch(harness.temp.path(), "test/unit/member_test.rb");

    let settings = Settings {
        recipes: vec!["rails".to_string()],
        ..Settings::default()
    };
    let chain = build_registry(&settings).unwrap().build();

    let remaining = chain
        .call(
            ChangedFileSet::new(["app/models/member.rb", "/file/1", "/file/2"]),
            &harness.context(),
            true,
        )
        .await
        .unwrap();

    assert_eq!(
        harness.executor.commands(),
        vec!["ruby -I. -Itest -r test/unit/member_test.rb -e ''"]
    );
    assert_eq!(remaining.as_slice(), ["/file/1", "/file/2"]);
    assert_eq!(
        harness.log.lines(),
        vec!["", "Could not handle: /file/1, /file/2", ""]
    );
}

#[tokio::test]
async fn test_execute_command_claims_everything() {
    let harness = Harness::new();

    let settings = Settings {
        execute: vec!["rake test".to_string()],
        recipes: vec!["rails".to_string()],
        ..Settings::default()
    };
    let chain = build_registry(&settings).unwrap().build();

    let remaining = chain
        .call(
            ChangedFileSet::new(["app/models/member.rb", "README"]),
            &harness.context(),
            true,
        )
        .await
        .unwrap();

    assert!(remaining.is_empty());
    assert_eq!(harness.executor.commands(), vec!["rake test"]);
    assert!(harness.log.lines().is_empty());
}

#[tokio::test]
async fn test_declared_recipe_from_toml() {
    let harness = Harness::new();
    touch(harness.temp.path(), "spec/models/user_spec.rb");
    let config = harness.temp.path().join("kick.toml");
    std::fs::write(
        &config,
        r#"
[[recipe]]
name = "specs"
command = "rspec {files}"

[[recipe.rule]]
regex = '^app/(.+)\.rb$'
derive = ["spec/$1_spec.rb"]

[[recipe.rule]]
exact = "Gemfile"
run = "bundle install"
"#,
    )
    .unwrap();

    let settings = Settings::load_from(&config).unwrap();
    let chain = build_registry(&settings).unwrap().build();
    assert!(chain.has_process_handlers());

    let remaining = chain
        .call(
            ChangedFileSet::new(["app/models/user.rb", "Gemfile"]),
            &harness.context(),
            false,
        )
        .await
        .unwrap();

    assert!(remaining.is_empty());
    assert_eq!(
        harness.executor.commands(),
        vec!["bundle install", "rspec spec/models/user_spec.rb"]
    );
}
