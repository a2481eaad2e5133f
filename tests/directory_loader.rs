//! Includes resolved from statement files on disk.

mod common;

use std::fs;
use std::path::Path;
use xkbsym::xkb::include::read_source_file;
use xkbsym::xkb::keymap::LevelSyms;
use xkbsym::xkb::keysym::Keysym;
use xkbsym::{compile_symbols, Context, DirectoryLoader, IncludeLoader, LoadError, MergeMode};

const LATIN: &str = r#"[
  {
    "name": "basic",
    "default": true,
    "statements": [
      { "symbols": { "key": "AC01", "body": [ { "value": { "keysym_list": [["a"], ["A"]] } } ] } },
      { "symbols": { "key": "AC02", "body": [ { "value": { "keysym_list": [["s"], ["S"]] } } ] } }
    ]
  },
  {
    "name": "nodeadkeys",
    "statements": [
      { "include": { "include": "latin(basic)" } },
      { "symbols": { "key": "AC02", "body": [ { "value": { "keysym_list": [["ssharp"]] } } ] } }
    ]
  }
]"#;

const US: &str = r#"{
  "name": "us",
  "statements": [
    { "include": { "include": "latin(nodeadkeys)" } },
    { "var": { "name": { "array_ref": { "field": "name", "index": { "integer": 1 } } },
               "value": { "string": "English (US)" } } },
    { "modmap": { "modifier": "Lock", "keys": [ { "key_name": "CAPS" } ] } }
  ]
}"#;

fn write(root: &Path, file: &str, text: &str) {
    let dir = root.join("symbols");
    fs::create_dir_all(&dir).expect("create symbols dir");
    fs::write(dir.join(file), text).expect("write statement file");
}

#[test]
fn compiles_through_nested_includes_on_disk() {
    let root = tempfile::tempdir().expect("temp dir");
    write(root.path(), "latin.json", LATIN);
    write(root.path(), "us.json", US);

    let mut ctx = Context::new();
    let mut keymap = common::keymap(&mut ctx);
    let mut loader = DirectoryLoader::new(vec![root.path().to_path_buf()]);

    let maps = read_source_file(&root.path().join("symbols/us.json")).expect("reads");
    assert_eq!(maps.len(), 1);

    let report = compile_symbols(&mut ctx, &mut keymap, &maps[0], MergeMode::Override, &mut loader)
        .expect("compiles");
    assert!(report.is_clean());

    let ac02 = keymap.key("AC02").expect("key");
    assert_eq!(ac02.groups[0].levels[0].syms, LevelSyms::One(Keysym(0xdf)));
    assert_eq!(ac02.groups[0].levels[1].syms, LevelSyms::One(Keysym::from_char('S')));
    assert_eq!(keymap.key("CAPS").expect("key").modmap, 1 << 1);
    assert_eq!(keymap.symbols_section_name.as_deref(), Some("us"));
}

#[test]
fn default_map_is_chosen_without_name() {
    let root = tempfile::tempdir().expect("temp dir");
    write(root.path(), "latin.json", LATIN);

    let mut ctx = Context::new();
    let mut loader = DirectoryLoader::new(vec![root.path().to_path_buf()]);
    let map = loader.load(&mut ctx, "latin", None).expect("loads");
    assert_eq!(map.name, "basic");
    assert!(map.id > 0);
    assert!(ctx.diagnostics().is_empty());
}

#[test]
fn missing_file_and_map_are_errors() {
    let root = tempfile::tempdir().expect("temp dir");
    write(root.path(), "latin.json", LATIN);

    let mut ctx = Context::new();
    let mut loader = DirectoryLoader::new(vec![root.path().to_path_buf()]);
    assert!(matches!(
        loader.load(&mut ctx, "klingon", None),
        Err(LoadError::NotFound(_))
    ));
    assert!(matches!(
        loader.load(&mut ctx, "latin", Some("dvorak")),
        Err(LoadError::NoSuchMap { .. })
    ));
}

#[test]
fn malformed_file_reports_parse_error() {
    let root = tempfile::tempdir().expect("temp dir");
    write(root.path(), "broken.json", "{ \"statements\": [ { \"frob\": 1 } ] }");

    let err = read_source_file(&root.path().join("symbols/broken.json")).expect_err("fails");
    assert!(matches!(err, LoadError::Parse { .. }));
}
