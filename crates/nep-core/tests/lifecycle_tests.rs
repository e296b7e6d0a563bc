use std::sync::Arc;
use std::time::Duration;

use nep_config::layout::PACKAGE_METADATA_FILE;
use nep_core::{
    DependencySpec, FsOp, LifecycleConfig, LifecycleError, PackageError, Selection, SpecError,
};
use nep_test_utils::{manager, DirCheckout, ScriptedFetcher, TestProject, CHECKOUT_FILE};
use pretty_assertions::assert_eq;
use serde_json::json;

fn specs(items: &[&str]) -> Vec<DependencySpec> {
    items.iter().map(|s| s.parse().unwrap()).collect()
}

#[tokio::test]
async fn install_example_scenario() {
    let project = TestProject::with_dependencies(json!({}));
    let fetcher = Arc::new(ScriptedFetcher::new().with_package("foo", "1.2"));

    let report = manager(fetcher, DirCheckout::new())
        .install(&project.ctx(), specs(&["foo::1.2"]))
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(project.raw_document(), json!({"dependencies": {"foo": "1.2"}}));
    assert!(project.package_dir("foo").join(CHECKOUT_FILE).is_file());
    assert!(project.package_dir("foo").join(PACKAGE_METADATA_FILE).is_file());
}

#[tokio::test]
async fn batch_isolation_keeps_only_successes() {
    let project = TestProject::with_dependencies(json!({}));
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .failing("b")
            .failing("d"),
    );
    let checkout = DirCheckout::new().failing("e");

    let report = manager(fetcher, checkout)
        .install(&project.ctx(), specs(&["a", "b", "c", "d", "e"]))
        .await
        .unwrap();

    assert_eq!(report.success_count(), 2);
    assert_eq!(report.failure_count(), 3);
    let deps = project.dependencies().await;
    assert_eq!(deps.keys().cloned().collect::<Vec<_>>(), vec!["a", "c"]);

    // Failed checkout leaves nothing behind.
    assert!(!project.package_dir("e").exists());
    let failures: Vec<_> = report.failures().map(|(s, _)| s.name().to_string()).collect();
    assert_eq!(failures, vec!["b", "d", "e"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_installs_lose_no_update() {
    for (slow, fast) in [("x", "y"), ("y", "x")] {
        let project = TestProject::with_dependencies(json!({}));
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .with_package("x", "1.0")
                .with_package("y", "2.0")
                .with_delay(slow, Duration::from_millis(40))
                .with_delay(fast, Duration::from_millis(1)),
        );

        let report = manager(fetcher, DirCheckout::new())
            .install(&project.ctx().parallel(true), specs(&["x::1.0", "y::2.0"]))
            .await
            .unwrap();

        assert!(report.is_complete());
        // Report order follows submission order, not completion order.
        assert_eq!(report.outcomes[0].spec.name(), "x");
        assert_eq!(
            project.raw_document(),
            json!({"dependencies": {"x": "1.0", "y": "2.0"}})
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_batch_matches_sequential_result() {
    let names: Vec<String> = (0..20).map(|i| format!("pkg{i}")).collect();
    let mut fetcher = ScriptedFetcher::new();
    for (i, name) in names.iter().enumerate() {
        fetcher = fetcher.with_delay(name, Duration::from_millis((20 - i as u64) * 2));
        if i % 5 == 0 {
            fetcher = fetcher.failing(name);
        }
    }
    let fetcher = Arc::new(fetcher);
    let targets: Vec<&str> = names.iter().map(String::as_str).collect();

    let sequential = TestProject::with_dependencies(json!({}));
    manager(Arc::clone(&fetcher), DirCheckout::new())
        .install(&sequential.ctx(), specs(&targets))
        .await
        .unwrap();

    let parallel = TestProject::with_dependencies(json!({}));
    manager(Arc::clone(&fetcher), DirCheckout::new())
        .with_config(LifecycleConfig::new().with_max_workers(6))
        .install(&parallel.ctx().parallel(true), specs(&targets))
        .await
        .unwrap();

    assert_eq!(sequential.dependencies().await.len(), 16);
    assert_eq!(sequential.dependencies().await, parallel.dependencies().await);
}

#[tokio::test]
async fn sequential_install_fetches_in_order() {
    let project = TestProject::with_dependencies(json!({}));
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_delay("a", Duration::from_millis(30))
            .with_delay("b", Duration::from_millis(1)),
    );

    manager(Arc::clone(&fetcher), DirCheckout::new())
        .install(&project.ctx(), specs(&["a", "b", "c"]))
        .await
        .unwrap();

    assert_eq!(fetcher.calls().await, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn canonical_name_becomes_dependency_key() {
    let project = TestProject::with_dependencies(json!({}));
    let fetcher = Arc::new(ScriptedFetcher::new().with_canonical("json", "1.2", "lua-json"));

    manager(fetcher, DirCheckout::new())
        .install(&project.ctx(), specs(&["json"]))
        .await
        .unwrap();

    assert_eq!(project.raw_document(), json!({"dependencies": {"lua-json": "1.2"}}));
    // Directory keeps the requested name.
    assert!(project.package_dir("json").is_dir());
}

#[tokio::test]
async fn install_preserves_unknown_keys() {
    let project = TestProject::new(json!({
        "name": "game",
        "scripts": {"run": "print(1)"},
        "custom": {"nested": [1, 2]},
        "dependencies": {}
    }));

    manager(Arc::new(ScriptedFetcher::new()), DirCheckout::new())
        .install(&project.ctx(), specs(&["foo::3.0"]))
        .await
        .unwrap();

    assert_eq!(
        project.raw_document(),
        json!({
            "name": "game",
            "scripts": {"run": "print(1)"},
            "custom": {"nested": [1, 2]},
            "dependencies": {"foo": "3.0"}
        })
    );
}

#[tokio::test]
async fn install_without_dependencies_region_is_noop() {
    let project = TestProject::new(json!({"name": "bare"}));
    let fetcher = Arc::new(ScriptedFetcher::new());

    let report = manager(Arc::clone(&fetcher), DirCheckout::new())
        .install(&project.ctx(), Vec::new())
        .await
        .unwrap();

    assert!(report.is_empty());
    assert!(fetcher.calls().await.is_empty());
    assert_eq!(project.raw_document(), json!({"name": "bare"}));
}

#[tokio::test]
async fn reinstall_from_document_strips_v_prefix() {
    let project = TestProject::with_dependencies(json!({"foo": "v1.0", "bar": "2.0"}));
    let fetcher = Arc::new(ScriptedFetcher::new());

    manager(Arc::clone(&fetcher), DirCheckout::new())
        .install(&project.ctx(), Vec::new())
        .await
        .unwrap();

    let mut calls = fetcher.calls().await;
    calls.sort();
    assert_eq!(calls, vec!["bar::2.0", "foo::1.0"]);
    assert_eq!(
        project.raw_document(),
        json!({"dependencies": {"foo": "1.0", "bar": "2.0"}})
    );
}

#[tokio::test]
async fn corrupt_document_aborts_install() {
    let project = TestProject::with_dependencies(json!({}));
    std::fs::write(project.root().config_file(), "{ broken").unwrap();

    let err = manager(Arc::new(ScriptedFetcher::new()), DirCheckout::new())
        .install(&project.ctx(), specs(&["foo"]))
        .await
        .unwrap_err();

    assert!(err.is_fatal_context());
    assert!(matches!(err, LifecycleError::Config(_)));
    assert!(!project.package_dir("foo").exists());
}

#[tokio::test]
async fn missing_marker_aborts_update() {
    let project = TestProject::with_dependencies(json!({"a": "1.0"}));
    std::fs::remove_file(project.root().config_file()).unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());

    let err = manager(Arc::clone(&fetcher), DirCheckout::new())
        .update(&project.ctx(), Selection::All)
        .await
        .unwrap_err();

    assert!(err.is_fatal_context());
    assert!(fetcher.calls().await.is_empty());
}

#[tokio::test]
async fn update_replaces_live_copy() {
    let project = TestProject::with_dependencies(json!({"foo": "1.0"}));
    project.add_live_package("foo", "old");
    let fetcher = Arc::new(ScriptedFetcher::new().with_package("foo", "2.0"));

    let report = manager(fetcher, DirCheckout::new())
        .update(&project.ctx(), Selection::All)
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.promoted().collect::<Vec<_>>(), vec!["foo"]);
    assert_eq!(project.package_file("foo").unwrap(), "-- foo 2.0\n");
    assert_eq!(project.raw_document(), json!({"dependencies": {"foo": "2.0"}}));
    assert!(!project.root().staging_dir().exists());
}

#[tokio::test]
async fn failed_staging_leaves_package_untouched() {
    let project = TestProject::with_dependencies(json!({"good": "1.0", "bad": "1.0"}));
    project.add_live_package("good", "old good");
    project.add_live_package("bad", "old bad");
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_package("good", "2.0")
            .failing("bad"),
    );

    let report = manager(fetcher, DirCheckout::new())
        .update(&project.ctx(), Selection::All)
        .await
        .unwrap();

    assert_eq!(project.package_file("bad").unwrap(), "old bad");
    assert_eq!(project.package_file("good").unwrap(), "-- good 2.0\n");
    assert_eq!(
        project.raw_document(),
        json!({"dependencies": {"good": "2.0", "bad": "1.0"}})
    );

    let skipped: Vec<_> = report
        .promotions
        .iter()
        .filter(|p| matches!(p.result, Err(PackageError::NotStaged { .. })))
        .map(|p| p.package.as_str())
        .collect();
    assert_eq!(skipped, vec!["bad"]);
}

#[tokio::test]
async fn failed_checkout_during_update_is_not_promoted() {
    let project = TestProject::with_dependencies(json!({"foo": "1.0"}));
    project.add_live_package("foo", "old");

    manager(
        Arc::new(ScriptedFetcher::new().with_package("foo", "2.0")),
        DirCheckout::new().failing("foo"),
    )
    .update(&project.ctx(), Selection::All)
    .await
    .unwrap();

    assert_eq!(project.package_file("foo").unwrap(), "old");
    assert!(!project.package_dir("foo").join(".partial").exists());
    assert_eq!(project.raw_document(), json!({"dependencies": {"foo": "1.0"}}));
}

#[tokio::test]
async fn update_explicit_targets_only() {
    let project = TestProject::with_dependencies(json!({"a": "1.0", "b": "1.0"}));
    project.add_live_package("a", "old a");
    project.add_live_package("b", "old b");

    let selection = Selection::parse(["b::3.0"]).unwrap();
    manager(Arc::new(ScriptedFetcher::new()), DirCheckout::new())
        .update(&project.ctx(), selection)
        .await
        .unwrap();

    assert_eq!(project.package_file("a").unwrap(), "old a");
    assert_eq!(project.package_file("b").unwrap(), "-- b 3.0\n");
    assert_eq!(
        project.raw_document(),
        json!({"dependencies": {"a": "1.0", "b": "3.0"}})
    );
}

#[tokio::test]
async fn update_discards_stale_staging_entries() {
    let project = TestProject::with_dependencies(json!({"foo": "1.0"}));
    let stale = project.root().staging_dir().join("foo");
    std::fs::create_dir_all(&stale).unwrap();
    std::fs::write(stale.join("leftover.lua"), "stale").unwrap();

    manager(Arc::new(ScriptedFetcher::new()), DirCheckout::new())
        .update(&project.ctx(), Selection::All)
        .await
        .unwrap();

    assert!(!project.package_dir("foo").join("leftover.lua").exists());
    assert!(project.package_dir("foo").join(CHECKOUT_FILE).is_file());
}

#[tokio::test]
async fn uninstall_wildcard_removes_everything() {
    let project = TestProject::with_dependencies(json!({"a": "1.0", "b": "2.0"}));
    project.add_live_package("a", "a");
    project.add_live_package("b", "b");

    let report = manager(Arc::new(ScriptedFetcher::new()), DirCheckout::new())
        .uninstall(&project.ctx(), Selection::parse(["*"]).unwrap())
        .await
        .unwrap();

    assert_eq!(report.removed, vec!["a", "b"]);
    assert!(!project.package_dir("a").exists());
    assert!(!project.package_dir("b").exists());
    assert_eq!(project.raw_document(), json!({"dependencies": {}}));
}

#[tokio::test]
async fn uninstall_missing_package_is_not_an_error() {
    let project = TestProject::with_dependencies(json!({"a": "1.0"}));

    let report = manager(Arc::new(ScriptedFetcher::new()), DirCheckout::new())
        .uninstall(&project.ctx(), Selection::parse(["ghost", "a::1.0", "a"]).unwrap())
        .await
        .unwrap();

    assert_eq!(report.removed, vec!["ghost", "a"]);
    assert!(report.warnings.is_empty());
    assert_eq!(project.raw_document(), json!({"dependencies": {}}));
}

#[tokio::test]
async fn uninstall_requires_targets() {
    let project = TestProject::with_dependencies(json!({"a": "1.0"}));
    let err = manager(Arc::new(ScriptedFetcher::new()), DirCheckout::new())
        .uninstall(&project.ctx(), Selection::parse(Vec::<String>::new()).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::NoPackagesSpecified));
    assert_eq!(project.raw_document(), json!({"dependencies": {"a": "1.0"}}));
}

#[cfg(unix)]
#[tokio::test]
async fn failed_promotion_does_not_block_others() {
    let project = TestProject::with_dependencies(json!({"a": "1.0", "b": "1.0"}));
    project.add_live_package("a", "old a");
    // A regular file where b's directory should be cannot be removed as a tree.
    std::fs::write(project.package_dir("b"), "not a directory").unwrap();

    let report = manager(Arc::new(ScriptedFetcher::new()), DirCheckout::new())
        .update(
            &project.ctx(),
            Selection::Packages(specs(&["b::2.0", "a::2.0"])),
        )
        .await
        .unwrap();

    assert!(report.staged.is_complete());
    assert!(!report.is_complete());
    assert_eq!(report.promoted().collect::<Vec<_>>(), vec!["a"]);
    assert_eq!(project.package_file("a").unwrap(), "-- a 2.0\n");

    let failed = &report.promotions[0];
    assert_eq!(failed.package, "b");
    assert!(matches!(
        failed.result,
        Err(PackageError::FilesystemFailed {
            op: FsOp::RemoveDir,
            ..
        })
    ));
    assert!(project.package_dir("b").is_file());
    assert!(!project.root().staging_dir().exists());
}

#[cfg(unix)]
#[tokio::test]
async fn uninstall_reports_unremovable_directory() {
    let project = TestProject::with_dependencies(json!({"a": "1.0", "b": "1.0"}));
    project.add_live_package("a", "a");
    std::fs::write(project.package_dir("b"), "not a directory").unwrap();

    let report = manager(Arc::new(ScriptedFetcher::new()), DirCheckout::new())
        .uninstall(&project.ctx(), Selection::All)
        .await
        .unwrap();

    assert_eq!(report.removed, vec!["a", "b"]);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("nebpack"));
    assert!(!project.package_dir("a").exists());
    assert_eq!(project.raw_document(), json!({"dependencies": {}}));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_targets_collapse_to_last() {
    let project = TestProject::with_dependencies(json!({}));
    let fetcher = Arc::new(ScriptedFetcher::new());

    let report = manager(Arc::clone(&fetcher), DirCheckout::new())
        .install(&project.ctx().parallel(true), specs(&["foo::1.0", "bar", "foo::2.0"]))
        .await
        .unwrap();

    let names: Vec<_> = report.outcomes.iter().map(|o| o.spec.to_string()).collect();
    assert_eq!(names, vec!["foo::2.0", "bar"]);
    let mut calls = fetcher.calls().await;
    calls.sort();
    assert_eq!(calls, vec!["bar", "foo::2.0"]);
    assert_eq!(project.package_file("foo").unwrap(), "-- foo 2.0\n");
    assert_eq!(
        project.raw_document(),
        json!({"dependencies": {"bar": "1.0.0", "foo": "2.0"}})
    );
}

#[tokio::test]
async fn uninstall_parent_dir_target_is_rejected() {
    let project = TestProject::with_dependencies(json!({"a": "1.0"}));
    project.add_live_package("a", "a");
    std::fs::write(project.path().join("main.lua"), "print('hi')").unwrap();

    let err = manager(Arc::new(ScriptedFetcher::new()), DirCheckout::new())
        .uninstall(
            &project.ctx(),
            Selection::Packages(vec![DependencySpec::new("..")]),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LifecycleError::InvalidSpec(SpecError::InvalidName(_))
    ));
    assert!(project.path().join("main.lua").is_file());
    assert!(project.root().config_file().is_file());
    assert_eq!(project.package_file("a").unwrap(), "a");
}

#[tokio::test]
async fn install_escaping_name_is_rejected() {
    let project = TestProject::with_dependencies(json!({}));
    let fetcher = Arc::new(ScriptedFetcher::new());
    let escaped = project
        .path()
        .parent()
        .unwrap()
        .join("nep-escaped-install-target");

    for name in ["../../nep-escaped-install-target", "a/../..", "/abs"] {
        let err = manager(Arc::clone(&fetcher), DirCheckout::new())
            .install(&project.ctx(), vec![DependencySpec::new(name)])
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidSpec(_)), "{name}");
    }

    assert!(fetcher.calls().await.is_empty());
    assert!(!escaped.exists());
    assert_eq!(project.raw_document(), json!({"dependencies": {}}));
}

#[tokio::test]
async fn recorded_path_like_names_are_skipped() {
    let project = TestProject::with_dependencies(json!({"..": "1.0", "a/b": "1.0", "ok": "1.0"}));
    std::fs::write(project.path().join("main.lua"), "print('hi')").unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());

    let installed = manager(Arc::clone(&fetcher), DirCheckout::new())
        .install(&project.ctx(), Vec::new())
        .await
        .unwrap();
    assert_eq!(installed.outcomes.len(), 1);

    let updated = manager(Arc::clone(&fetcher), DirCheckout::new())
        .update(&project.ctx(), Selection::All)
        .await
        .unwrap();
    assert_eq!(updated.promoted().collect::<Vec<_>>(), vec!["ok"]);

    let removed = manager(Arc::clone(&fetcher), DirCheckout::new())
        .uninstall(&project.ctx(), Selection::All)
        .await
        .unwrap();
    assert_eq!(removed.removed, vec!["ok"]);

    assert!(project.path().join("main.lua").is_file());
    assert_eq!(
        project.raw_document(),
        json!({"dependencies": {"..": "1.0", "a/b": "1.0"}})
    );
}

#[tokio::test]
async fn path_like_canonical_name_falls_back_to_requested() {
    let project = TestProject::with_dependencies(json!({}));
    let fetcher = Arc::new(ScriptedFetcher::new().with_canonical("foo", "1.0", "../evil"));

    let report = manager(fetcher, DirCheckout::new())
        .install(&project.ctx(), specs(&["foo"]))
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.outcomes[0].warnings.len(), 1);
    assert_eq!(project.raw_document(), json!({"dependencies": {"foo": "1.0"}}));
}
