use std::collections::HashMap;
use std::path::PathBuf;

use reactor_http::config::{Config, ConfigError};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn test_config_defaults() {
    let cfg = Config::from_lookup(lookup(&[])).unwrap();

    assert_eq!(cfg.listen_addr, "127.0.0.1:8080");
    assert_eq!(cfg.resource_root, PathBuf::from("resources"));
    assert_eq!(cfg.index_file, "index.html");
}

#[test]
fn test_config_env_overrides() {
    let cfg = Config::from_lookup(lookup(&[
        ("LISTEN", "0.0.0.0:3000"),
        ("RESOURCE_ROOT", "/srv/www"),
        ("INDEX_FILE", "home.html"),
    ]))
    .unwrap();

    assert_eq!(cfg.listen_addr, "0.0.0.0:3000");
    assert_eq!(cfg.resource_root, PathBuf::from("/srv/www"));
    assert_eq!(cfg.index_file, "home.html");
    assert_eq!(cfg.index_path(), PathBuf::from("/srv/www/home.html"));
}

#[test]
fn test_config_from_yaml_with_partial_fields() {
    let cfg = Config::from_yaml_str("listen_addr: \"127.0.0.1:9000\"\n").unwrap();

    assert_eq!(cfg.listen_addr, "127.0.0.1:9000");
    assert_eq!(cfg.resource_root, PathBuf::from("resources"));
    assert_eq!(cfg.index_file, "index.html");
}

#[test]
fn test_config_from_yaml_all_fields() {
    let raw = "listen_addr: \"0.0.0.0:80\"\nresource_root: public\nindex_file: main.html\n";
    let cfg = Config::from_yaml_str(raw).unwrap();

    assert_eq!(cfg.listen_addr, "0.0.0.0:80");
    assert_eq!(cfg.resource_root, PathBuf::from("public"));
    assert_eq!(cfg.index_file, "main.html");
}

#[test]
fn test_config_invalid_yaml() {
    let result = Config::from_yaml_str("listen_addr: [unclosed");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_config_missing_file() {
    let result = Config::from_lookup(lookup(&[("CONFIG", "/nonexistent/reactor-http.yaml")]));
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[test]
fn test_config_file_then_env_override() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/config.yaml");
    let cfg = Config::from_lookup(lookup(&[("CONFIG", path), ("LISTEN", "127.0.0.1:7000")])).unwrap();

    assert_eq!(cfg.listen_addr, "127.0.0.1:7000");
    assert_eq!(cfg.resource_root, PathBuf::from("tests/fixtures/www"));
    assert_eq!(cfg.index_file, "index.html");
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::default();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.listen_addr, cfg2.listen_addr);
    assert_eq!(cfg1.resource_root, cfg2.resource_root);
}
