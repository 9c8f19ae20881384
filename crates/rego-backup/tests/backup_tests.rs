//! Backup orchestrator and registry behavior

mod common;

use std::sync::Arc;

use common::{identity, registry_of, store_in, FakeComponent};
use rego_backup::{
    BackupOrchestrator, CancelToken, ComponentRegistry, MinimalCapture, StepPhase,
};
use rego_core::{ComponentKind, Error, MANIFEST_FILE};
use tempfile::TempDir;

#[test]
fn test_registry_last_registration_wins() {
    let first = FakeComponent::new(ComponentKind::Flatpak).named("first");
    let second = FakeComponent::new(ComponentKind::Flatpak).named("second");
    let fonts = FakeComponent::new(ComponentKind::Fonts);

    let mut registry = ComponentRegistry::new();
    registry.add(Arc::new(first));
    registry.add(Arc::new(fonts));
    registry.add(Arc::new(second));

    assert_eq!(registry.len(), 2);
    assert_eq!(
        registry.kinds(),
        vec![ComponentKind::Flatpak, ComponentKind::Fonts]
    );
    assert_eq!(registry.get(&ComponentKind::Flatpak).unwrap().name(), "second");
}

#[test]
fn test_registry_available_kinds_in_order() {
    let registry = registry_of(&[
        FakeComponent::new(ComponentKind::Dotfiles),
        FakeComponent::new(ComponentKind::Flatpak).unavailable(),
        FakeComponent::new(ComponentKind::Fonts),
    ]);
    assert_eq!(
        registry.available_kinds(),
        vec![ComponentKind::Dotfiles, ComponentKind::Fonts]
    );
}

#[tokio::test]
async fn test_unknown_selection_still_captures_known_kinds() {
    let temp = TempDir::new().unwrap();
    let store = store_in(temp.path());
    let dotfiles = FakeComponent::new(ComponentKind::Dotfiles).with_items(&[".bashrc"]);
    let registry = registry_of(&[dotfiles.clone()]);

    let selected = [ComponentKind::Dotfiles, ComponentKind::Custom("kde".into())];
    let manifest = BackupOrchestrator::new(&registry, &store, identity())
        .run(Some(&selected), &temp.path().join("snap"), None)
        .await
        .unwrap();

    assert_eq!(manifest.components, vec![ComponentKind::Dotfiles]);
    assert!(manifest.result(&ComponentKind::Dotfiles).unwrap().succeeded);
    assert!(dotfiles.called("capture"));
}

#[tokio::test]
async fn test_minimal_capture_skips_unknown_kinds() {
    let flatpak = FakeComponent::new(ComponentKind::Flatpak).with_items(&["org.app.A"]);
    let registry = registry_of(&[flatpak]);

    let selected = [ComponentKind::Custom("kde".into()), ComponentKind::Flatpak];
    let report = MinimalCapture::new(&registry, identity())
        .run(Some(&selected))
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.snapshot.components, vec![ComponentKind::Flatpak]);
    assert_eq!(report.snapshot.item_count(), 1);
}

#[tokio::test]
async fn test_partial_failure_is_contained() {
    let temp = TempDir::new().unwrap();
    let store = store_in(temp.path());
    let flatpak = FakeComponent::new(ComponentKind::Flatpak).with_items(&["org.app.A", "org.app.B"]);
    let packages = FakeComponent::new(ComponentKind::SystemPackages).failing_capture("dnf exploded");
    let dotfiles = FakeComponent::new(ComponentKind::Dotfiles).with_items(&[".bashrc"]);
    let registry = registry_of(&[flatpak, packages, dotfiles]);

    let target = store.new_snapshot_dir().unwrap();
    let manifest = BackupOrchestrator::new(&registry, &store, identity())
        .run(None, &target, Some("pre-reinstall".into()))
        .await
        .unwrap();

    assert_eq!(manifest.components.len(), 3);
    assert!(manifest.result(&ComponentKind::Flatpak).unwrap().succeeded);
    assert!(manifest.result(&ComponentKind::Dotfiles).unwrap().succeeded);

    let failed = manifest.result(&ComponentKind::SystemPackages).unwrap();
    assert!(!failed.succeeded);
    assert!(failed.error_message.as_deref().unwrap().contains("dnf exploded"));

    let on_disk = store.load(&target).unwrap();
    assert_eq!(on_disk.total_items(), 3);
    assert_eq!(on_disk.description.as_deref(), Some("pre-reinstall"));
    assert_eq!(on_disk.hostname, "test-host");
}

#[tokio::test]
async fn test_unavailable_and_unselected_kinds_are_skipped() {
    let temp = TempDir::new().unwrap();
    let store = store_in(temp.path());
    let flatpak = FakeComponent::new(ComponentKind::Flatpak).unavailable();
    let fonts = FakeComponent::new(ComponentKind::Fonts).with_items(&["Inter.ttf"]);
    let dotfiles = FakeComponent::new(ComponentKind::Dotfiles).with_items(&[".vimrc"]);
    let registry = registry_of(&[flatpak.clone(), dotfiles.clone(), fonts.clone()]);

    let target = temp.path().join("snap");
    let selected = [ComponentKind::Fonts, ComponentKind::Flatpak];
    let manifest = BackupOrchestrator::new(&registry, &store, identity())
        .run(Some(&selected), &target, None)
        .await
        .unwrap();

    assert_eq!(manifest.components, vec![ComponentKind::Fonts]);
    assert!(!flatpak.called("capture"));
    assert!(!dotfiles.called("capture"));
}

#[tokio::test]
async fn test_progress_reports_each_step() {
    let temp = TempDir::new().unwrap();
    let store = store_in(temp.path());
    let registry = registry_of(&[
        FakeComponent::new(ComponentKind::Flatpak).with_items(&["a"]),
        FakeComponent::new(ComponentKind::Fonts).with_items(&["b", "c"]),
    ]);

    let mut events = Vec::new();
    BackupOrchestrator::new(&registry, &store, identity())
        .run_with_progress(None, &temp.path().join("snap"), None, &mut |step| {
            events.push((step.phase, step.kind.clone(), step.current, step.total, step.results.len()));
        })
        .await
        .unwrap();

    assert_eq!(
        events,
        vec![
            (StepPhase::Started, ComponentKind::Flatpak, 1, 2, 0),
            (StepPhase::Finished, ComponentKind::Flatpak, 1, 2, 1),
            (StepPhase::Started, ComponentKind::Fonts, 2, 2, 1),
            (StepPhase::Finished, ComponentKind::Fonts, 2, 2, 2),
        ]
    );
}

#[tokio::test]
async fn test_cancelled_run_writes_no_manifest() {
    let temp = TempDir::new().unwrap();
    let store = store_in(temp.path());
    let flatpak = FakeComponent::new(ComponentKind::Flatpak).with_items(&["a"]);
    let registry = registry_of(&[flatpak.clone()]);

    let cancel = CancelToken::new();
    cancel.cancel();
    let target = temp.path().join("snap");
    let err = BackupOrchestrator::new(&registry, &store, identity())
        .with_cancel(cancel)
        .run(None, &target, None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert!(!target.join(MANIFEST_FILE).exists());
    assert!(!flatpak.called("capture"));
}

#[tokio::test]
async fn test_cancel_between_steps_keeps_in_flight_step() {
    let temp = TempDir::new().unwrap();
    let store = store_in(temp.path());
    let flatpak = FakeComponent::new(ComponentKind::Flatpak).with_items(&["a"]);
    let fonts = FakeComponent::new(ComponentKind::Fonts).with_items(&["b"]);
    let registry = registry_of(&[flatpak.clone(), fonts.clone()]);

    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let result = BackupOrchestrator::new(&registry, &store, identity())
        .with_cancel(cancel)
        .run_with_progress(None, &temp.path().join("snap"), None, &mut |step| {
            if step.phase == StepPhase::Finished {
                trigger.cancel();
            }
        })
        .await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(flatpak.called("capture"));
    assert!(!fonts.called("capture"));
}

#[tokio::test]
async fn test_uncreatable_target_is_fatal() {
    let temp = TempDir::new().unwrap();
    let store = store_in(temp.path());
    let blocker = temp.path().join("file");
    std::fs::write(&blocker, "not a dir").unwrap();
    let registry = registry_of(&[FakeComponent::new(ComponentKind::Fonts)]);

    let err = BackupOrchestrator::new(&registry, &store, identity())
        .run(None, &blocker.join("snap"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TargetDirectory { .. }));
}

#[tokio::test]
async fn test_duplicate_item_names_are_collapsed() {
    let temp = TempDir::new().unwrap();
    let store = store_in(temp.path());
    let registry = registry_of(&[
        FakeComponent::new(ComponentKind::Flatpak).with_items(&["org.app.A", "org.app.A"]),
    ]);

    let manifest = BackupOrchestrator::new(&registry, &store, identity())
        .run(None, &temp.path().join("snap"), None)
        .await
        .unwrap();
    assert_eq!(manifest.result(&ComponentKind::Flatpak).unwrap().item_count, 1);
}
