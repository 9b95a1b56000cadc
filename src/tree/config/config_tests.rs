use super::*;
use std::collections::HashMap;

#[test]
fn precedence_global_scope() {
    let global = GlobalTreeConfig::default();
    let scope = ScopeTreeConfig { delete_policy: Some(DeletePolicy::RejectNonEmpty), max_content_bytes: Some(1024), ..Default::default() };

    let eff = EffectiveConfig::from_layers(&global, Some(&scope));
    assert_eq!(eff.delete_policy, DeletePolicy::RejectNonEmpty);
    assert_eq!(eff.rename_policy, RenamePolicy::Cascade);
    assert_eq!(eff.max_content_bytes, 1024);
    assert_eq!(eff.max_path_len, 4096);
    assert!(!eff.materialize_parents);
}

#[test]
fn env_overlay() {
    let vars: HashMap<&str, &str> = [
        ("TEMPLATEFS_DELETE_POLICY", "reject_non_empty"),
        ("TEMPLATEFS_RENAME_POLICY", "Cascade"),
        ("TEMPLATEFS_MATERIALIZE_PARENTS", "true"),
        ("TEMPLATEFS_MAX_PATH_LEN", "255"),
    ].into_iter().collect();
    let cfg = GlobalTreeConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
    assert_eq!(cfg.delete_policy, DeletePolicy::RejectNonEmpty);
    assert_eq!(cfg.rename_policy, RenamePolicy::Cascade);
    assert!(cfg.materialize_parents);
    assert_eq!(cfg.max_path_len, 255);
    assert_eq!(cfg.max_content_bytes, 8 * 1024 * 1024);
}

#[test]
fn env_rejects_unknown_policy() {
    let err = GlobalTreeConfig::from_lookup(|k| (k == "TEMPLATEFS_DELETE_POLICY").then(|| "sometimes".to_string())).unwrap_err();
    assert!(err.to_string().contains("TEMPLATEFS_DELETE_POLICY"));
}

#[test]
fn json_file_with_partial_fields() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tree.json");
    std::fs::write(&path, br#"{"rename_policy":"reject_non_empty"}"#).unwrap();
    let cfg = GlobalTreeConfig::load_or_default(&path).unwrap();
    assert_eq!(cfg.rename_policy, RenamePolicy::RejectNonEmpty);
    assert_eq!(cfg.delete_policy, DeletePolicy::Cascade);
    let missing = GlobalTreeConfig::load_or_default(&tmp.path().join("absent.json")).unwrap();
    assert_eq!(missing, GlobalTreeConfig::default());
}
