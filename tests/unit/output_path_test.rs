//! Tests for output-path resolution

use action_runner::config::OutputConfig;
use action_runner::core::{
    add_repository_params, expand_wildcard, parent_directory, OutputPathError,
    OutputPathResolver, ParamValue, ParameterSet, KEY_REPOSITORY_OUTPUT_PATH, KEY_USE_REPOSITORY,
};
use action_runner::infra::repository::InMemoryRepository;
use action_runner::infra::security::StaticAuthorizationPolicy;

fn repository() -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    repo.add_folder("/home/joe", None);
    repo.add_folder("/home/joe/reports", Some(true));
    repo.add_folder("/shared/locked", Some(false));
    repo.add_folder("/public", None);
    repo
}

#[test]
fn test_resolve_splits_pattern() {
    let resolver =
        OutputPathResolver::resolve("/home/janeDoe/somePath/some_directory/myImportantJob.*", "u")
            .unwrap();
    assert_eq!(resolver.directory(), "/home/janeDoe/somePath/some_directory/");
    assert_eq!(resolver.file_name(), "myImportantJob.*");
}

#[test]
fn test_resolve_rejects_bare_name() {
    assert!(OutputPathResolver::resolve("myImportantJob.*", "u").is_err());
}

#[test]
fn test_requested_directory_used_when_schedulable() {
    let repo = repository();
    let resolver = OutputPathResolver::resolve("/home/joe/reports/sales.*", "joe").unwrap();
    let path = resolver
        .resolve_output_file_path(
            &repo,
            &StaticAuthorizationPolicy::allow_all(),
            &OutputConfig::default(),
        )
        .unwrap();
    assert_eq!(path, "/home/joe/reports/sales.*");
}

#[test]
fn test_locked_directory_falls_back_to_home() {
    let repo = repository();
    let resolver = OutputPathResolver::resolve("/shared/locked/sales.*", "joe").unwrap();
    let path = resolver
        .resolve_output_file_path(
            &repo,
            &StaticAuthorizationPolicy::allow_all(),
            &OutputConfig::default(),
        )
        .unwrap();
    assert_eq!(path, "/home/joe/sales.*");
}

#[test]
fn test_missing_home_falls_back_to_default_folder() {
    let repo = repository();
    let resolver = OutputPathResolver::resolve("/nowhere/sales.pdf", "suzy").unwrap();
    let cfg = OutputConfig::default().with_default_output_folder("/public");
    let path = resolver
        .resolve_output_file_path(&repo, &StaticAuthorizationPolicy::allow_all(), &cfg)
        .unwrap();
    assert_eq!(path, "/public/sales.pdf");
}

#[test]
fn test_no_location_without_scheduling_permission() {
    let repo = repository();
    let resolver = OutputPathResolver::resolve("/home/joe/reports/sales.*", "joe").unwrap();
    let err = resolver
        .resolve_output_file_path(
            &repo,
            &StaticAuthorizationPolicy::deny_all(),
            &OutputConfig::default(),
        )
        .unwrap_err();
    // Exhaustive: no location is the only way resolution can fail.
    let OutputPathError::NoSchedulableLocation { requested, user } = err;
    assert_eq!(requested, "/home/joe/reports/sales.*");
    assert_eq!(user, "joe");
}

#[test]
fn test_parent_directory_and_wildcard() {
    assert_eq!(parent_directory("/home/someUser/somePath/someFile.txt"), "/home/someUser/somePath");
    assert_eq!(parent_directory("noSeparator"), "noSeparator");
    assert_eq!(expand_wildcard("/home/joe/sales.*", Some("xlsx")), "/home/joe/sales.xlsx");
    assert_eq!(expand_wildcard("/home/joe/sales.*", None), "/home/joe/sales");
}

#[test]
fn test_add_repository_params() {
    let mut params: ParameterSet = [("key1", "value1"), ("key2", "value2")].into_iter().collect();
    add_repository_params(&mut params, "/home/joe/reports/someJob.*");
    assert_eq!(params.len(), 4);
    assert_eq!(params.get(KEY_USE_REPOSITORY).and_then(ParamValue::as_bool), Some(true));
    assert_eq!(
        params.get(KEY_REPOSITORY_OUTPUT_PATH).and_then(ParamValue::as_str),
        Some("/home/joe/reports")
    );
}
