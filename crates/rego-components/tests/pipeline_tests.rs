//! Backup and restore through the real file-based adapters against
//! temporary home directories.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rego_backup::{BackupOrchestrator, ComponentRegistry, HostIdentity, RestoreOrchestrator, SnapshotStore};
use rego_components::{builtin, AdapterContext};
use rego_core::{ComponentKind, HostCapabilities, PackageManager, Settings, SystemRunner};
use tempfile::TempDir;

fn registry_for(home: &Path) -> ComponentRegistry {
    let settings = Settings {
        dotfiles: vec![".bashrc".into(), ".config/git".into()],
        ..Settings::default()
    };
    let ctx = AdapterContext::new(
        HostCapabilities::new(PackageManager::Unknown),
        settings,
        Arc::new(SystemRunner),
        home,
    );

    let mut registry = ComponentRegistry::new();
    for kind in [ComponentKind::Dotfiles, ComponentKind::Fonts] {
        if let Some(adapter) = builtin(&kind, &ctx) {
            registry.register(kind, adapter);
        }
    }
    registry
}

fn identity() -> HostIdentity {
    HostIdentity {
        hostname: "workstation".into(),
        user: "dev".into(),
        distro: Some("Fedora Linux 40".into()),
        desktop: Some("gnome".into()),
    }
}

fn populate_source_home(home: &Path) {
    fs::write(home.join(".bashrc"), "export EDITOR=vim\n").unwrap();
    fs::create_dir_all(home.join(".config/git")).unwrap();
    fs::write(home.join(".config/git/config"), "[user]\n\tname = dev\n").unwrap();
    fs::write(home.join(".config/git/ignore"), "*.swp\n").unwrap();
    let fonts = home.join(".local/share/fonts");
    fs::create_dir_all(&fonts).unwrap();
    fs::write(fonts.join("JetBrainsMono.ttf"), vec![7u8; 128]).unwrap();
}

#[tokio::test]
async fn test_backup_then_restore_to_fresh_home() {
    let source_home = TempDir::new().unwrap();
    populate_source_home(source_home.path());

    let store_root = TempDir::new().unwrap();
    let store = SnapshotStore::new(store_root.path());
    let target = store.new_snapshot_dir().unwrap();

    let source_registry = registry_for(source_home.path());
    let manifest = BackupOrchestrator::new(&source_registry, &store, identity())
        .run(None, &target, Some("pipeline".into()))
        .await
        .unwrap();
    assert!(manifest.failed_kinds().is_empty());
    assert_eq!(manifest.total_items(), 4);

    let fresh_home = TempDir::new().unwrap();
    fs::create_dir_all(fresh_home.path().join(".local/share/fonts")).unwrap();
    fs::write(fresh_home.path().join(".bashrc"), "# keep me\n").unwrap();

    let target_registry = registry_for(fresh_home.path());
    let report = RestoreOrchestrator::new(&target_registry, &store)
        .run(&target, None, false)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.items_applied(), 3);
    assert_eq!(report.items_skipped(), 1);
    assert_eq!(
        fs::read_to_string(fresh_home.path().join(".bashrc")).unwrap(),
        "# keep me\n"
    );
    assert!(fresh_home.path().join(".config/git/ignore").is_file());
    assert!(fresh_home
        .path()
        .join(".local/share/fonts/JetBrainsMono.ttf")
        .is_file());

    let again = RestoreOrchestrator::new(&target_registry, &store)
        .run(&target, None, false)
        .await
        .unwrap();
    assert!(again.is_success());
    assert_eq!(again.items_applied(), 0);
    assert_eq!(again.items_skipped(), 4);
}

#[tokio::test]
async fn test_missing_font_dir_makes_fonts_unavailable_on_restore() {
    let source_home = TempDir::new().unwrap();
    populate_source_home(source_home.path());

    let store_root = TempDir::new().unwrap();
    let store = SnapshotStore::new(store_root.path());
    let target = store.new_snapshot_dir().unwrap();
    BackupOrchestrator::new(&registry_for(source_home.path()), &store, identity())
        .run(None, &target, None)
        .await
        .unwrap();

    let fresh_home = TempDir::new().unwrap();
    let target_registry = registry_for(fresh_home.path());
    let report = RestoreOrchestrator::new(&target_registry, &store)
        .run(&target, None, true)
        .await
        .unwrap();

    assert_eq!(report.unavailable, vec![ComponentKind::Fonts]);
    assert!(report.result(&ComponentKind::Dotfiles).is_some_and(|r| r.dry_run));
    assert!(!fresh_home.path().join(".bashrc").exists());
}
