//! Rails recipe: map application files to their unit and functional tests.

use super::RecipeError;
use super::recipe::{BatchCommand, Recipe};
use super::rule::{FixedSet, Matcher, Rule};

/// Glob for every functional test, run when the routes change.
pub const ALL_FUNCTIONAL_TESTS: &str = "test/functional/**/*_test.rb";

pub fn recipe() -> Result<Recipe, RecipeError> {
    Ok(Recipe::new("rails")
        .rule(Rule::derive(Matcher::regex(r"^test/.+_test\.rb$")?, "$0"))
        .rule(Rule::derive(
            Matcher::regex(r"^app/models/(.+)\.rb$")?,
            "test/unit/$1_test.rb",
        ))
        .rule(Rule::derive(
            Matcher::regex(r"^app/concerns/(.+)\.rb$")?,
            "test/unit/concerns/$1_test.rb",
        ))
        .rule(Rule::derive(
            Matcher::regex(r"^app/helpers/(.+)\.rb$")?,
            "test/unit/helpers/$1_test.rb",
        ))
        .rule(Rule::derive(
            Matcher::regex(r"^app/controllers/(.+)\.rb$")?,
            "test/functional/$1_test.rb",
        ))
        .rule(Rule::derive(
            Matcher::regex(r"^app/views/(.+)/[^/]+$")?,
            "test/functional/$1_controller_test.rb",
        ))
        .rule(Rule::fixed(
            Matcher::exact("config/routes.rb"),
            FixedSet::glob(ALL_FUNCTIONAL_TESTS)?,
        ))
        .rule(Rule::derive(
            Matcher::regex(r"^lib/(.+)\.rb$")?,
            "test/lib/$1_test.rb",
        ))
        .batch(BatchCommand::new("ruby -I. -Itest -r {files} -e ''", " -r ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{ChainContext, ChangedFileSet, Handler};
    use crate::fakes::{RecordingExecutor, RecordingLog};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Create `tests` on disk, run the recipe over `Rakefile` plus `files`,
    /// and check the batched command and that only `Rakefile` is left.
    async fn should_match(files: &[&str], tests: &[&str]) {
        let temp = TempDir::new().unwrap();
        for test in tests {
            let path = temp.path().join(test);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "").unwrap();
        }

        let executor = Arc::new(RecordingExecutor::new());
        let ctx = ChainContext::new(
            executor.clone(),
            Arc::new(RecordingLog::new()),
            temp.path().to_path_buf(),
        );

        let mut input = vec!["Rakefile"];
        input.extend_from_slice(files);
        let outcome = recipe()
            .unwrap()
            .call(ChangedFileSet::new(input), &ctx)
            .await
            .unwrap();

        let mut expected: Vec<&str> = tests.to_vec();
        expected.sort();
        assert_eq!(
            executor.commands(),
            vec![format!("ruby -I. -Itest -r {} -e ''", expected.join(" -r "))]
        );
        assert_eq!(outcome.remaining.as_slice(), ["Rakefile"]);
    }

    #[tokio::test]
    async fn test_matches_test_case_files() {
        should_match(
            &["test/1_test.rb", "test/namespace/2_test.rb"],
            &["test/1_test.rb", "test/namespace/2_test.rb"],
        )
        .await;
    }

    #[tokio::test]
    async fn test_maps_models_to_unit_tests() {
        should_match(
            &["app/models/member.rb", "app/models/article.rb"],
            &["test/unit/member_test.rb", "test/unit/article_test.rb"],
        )
        .await;
    }

    #[tokio::test]
    async fn test_maps_concerns_to_unit_concern_tests() {
        should_match(
            &["app/concerns/authenticate.rb", "app/concerns/nested_resource.rb"],
            &[
                "test/unit/concerns/authenticate_test.rb",
                "test/unit/concerns/nested_resource_test.rb",
            ],
        )
        .await;
    }

    #[tokio::test]
    async fn test_maps_helpers_to_unit_helper_tests() {
        should_match(
            &["app/helpers/members_helper.rb", "app/helpers/articles_helper.rb"],
            &[
                "test/unit/helpers/members_helper_test.rb",
                "test/unit/helpers/articles_helper_test.rb",
            ],
        )
        .await;
    }

    #[tokio::test]
    async fn test_maps_controllers_to_functional_tests() {
        should_match(
            &[
                "app/controllers/application_controller.rb",
                "app/controllers/members_controller.rb",
            ],
            &[
                "test/functional/application_controller_test.rb",
                "test/functional/members_controller_test.rb",
            ],
        )
        .await;
    }

    #[tokio::test]
    async fn test_maps_views_to_functional_tests() {
        should_match(
            &[
                "app/views/members/index.html.erb",
                "app/views/admin/articles/show.html.erb",
            ],
            &[
                "test/functional/members_controller_test.rb",
                "test/functional/admin/articles_controller_test.rb",
            ],
        )
        .await;
    }

    #[tokio::test]
    async fn test_routes_run_all_functional_tests() {
        should_match(
            &["config/routes.rb"],
            &[
                "test/functional/members_controller_test.rb",
                "test/functional/admin/articles_controller_test.rb",
            ],
        )
        .await;
    }

    #[tokio::test]
    async fn test_maps_lib_files_to_lib_tests() {
        should_match(
            &["lib/money.rb", "lib/views/date.rb"],
            &["test/lib/money_test.rb", "test/lib/views/date_test.rb"],
        )
        .await;
    }

    #[test]
    fn test_single_file_mappings() {
        let recipe = recipe().unwrap();

        let scan = recipe.scan(ChangedFileSet::new(["app/models/member.rb"]));
        assert_eq!(
            scan.derived.into_iter().collect::<Vec<_>>(),
            vec!["test/unit/member_test.rb"]
        );

        let scan = recipe.scan(ChangedFileSet::new(["app/views/members/index.html.erb"]));
        assert_eq!(
            scan.derived.into_iter().collect::<Vec<_>>(),
            vec!["test/functional/members_controller_test.rb"]
        );

        let scan = recipe.scan(ChangedFileSet::new(["config/routes.rb"]));
        assert!(scan.derived.is_empty());
        assert_eq!(
            scan.fixed,
            Some(&FixedSet::Glob(ALL_FUNCTIONAL_TESTS.to_string()))
        );
    }
}
