use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use sortd::{CollisionPolicy, Config, DefaultFactory, Organizer, OrganizerFactory, Rule};

#[test]
fn missing_file_yields_defaults() {
    let td = TempDir::new().unwrap();
    let config = Config::load(Some(td.child("absent.toml").path())).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.settings.collision, CollisionPolicy::Rename);
    assert!(config.settings.create_dirs);
}

#[test]
fn config_file_drives_the_organizer() {
    let td = TempDir::new().unwrap();
    let cfg = td.child("config.toml");
    cfg.write_str(
        r#"
        [settings]
        collision = "fail"

        [[organize.patterns]]
        glob = "*.pdf"
        prefixes = ["invoice_"]
        destination = "invoices"

        [[organize.patterns]]
        match = "*.pdf"
        target = "papers"
        "#,
    )
    .unwrap();
    td.child("invoice_march.pdf").touch().unwrap();
    td.child("thesis.pdf").touch().unwrap();

    let config = Config::load(Some(cfg.path())).unwrap();
    let mut organizer = DefaultFactory.create(config);
    organizer.organize_dir(td.path()).unwrap();

    td.child("invoices/invoice_march.pdf")
        .assert(predicate::path::exists());
    td.child("papers/thesis.pdf").assert(predicate::path::exists());
}

#[test]
fn unknown_collision_policy_is_rejected() {
    let td = TempDir::new().unwrap();
    let cfg = td.child("config.toml");
    cfg.write_str("[settings]\ncollision = \"overwrite\"\n").unwrap();

    let err = Config::load(Some(cfg.path())).unwrap_err();
    assert!(format!("{err:#}").contains("overwrite"));
}

#[test]
fn invalid_glob_is_rejected_at_load() {
    let td = TempDir::new().unwrap();
    let cfg = td.child("config.toml");
    cfg.write_str("[[organize.patterns]]\nglob = \"[\"\ndestination = \"x\"\n")
        .unwrap();

    let err = Config::load(Some(cfg.path())).unwrap_err();
    assert!(format!("{err:#}").contains("invalid glob"));
}

#[test]
fn added_pattern_survives_save_and_reload() {
    let td = TempDir::new().unwrap();
    let cfg = td.child("nested/config.toml");

    let mut organizer = DefaultFactory.create(Config::default());
    organizer.add_pattern(Rule::new("*.log", "logs").with_suffix("_old"));
    organizer.config().save(Some(cfg.path())).unwrap();

    cfg.assert(predicate::str::contains("*.log"));
    let reloaded = Config::load(Some(cfg.path())).unwrap();
    assert_eq!(reloaded.organize.patterns, organizer.config().organize.patterns);
}
