// tests/config_load.rs
use auto_responder::config::{load_rules_default, load_rules_from, resolve_rules_path};
use auto_responder::rules::{CooldownScope, MatchMode, ReplyMode};
use rand::{rngs::StdRng, SeedableRng};
use std::{env, fs};

const RULES_JSON: &str = r#"{
  "settings": { "defaultCooldownMs": 1500, "ignorePrefixes": ["!"] },
  "rules": [
    {
      "id": "greet",
      "per": "channel",
      "action": { "mode": "send" },
      "entries": [
        { "triggers": ["hello*"], "replies": ["hi {mention}"] },
        "not an entry",
        { "triggers": [""], "replies": ["dropped"] },
        { "match": "exact", "triggers": ["yo"], "replies": ["yo"] }
      ]
    },
    { "triggers": ["bye"], "action": { "replies": ["", "see ya"] } }
  ]
}"#;

const RULES_TOML: &str = r#"
[settings]
defaultCooldownMs = 1500
ignorePrefixes = ["!"]

[[rules]]
id = "greet"
per = "channel"
action = { mode = "send" }
entries = [
  { triggers = ["hello*"], replies = ["hi {mention}"] },
  { triggers = [""], replies = ["dropped"] },
  { match = "exact", triggers = ["yo"], replies = ["yo"] },
]
"#;

fn rng() -> StdRng {
    StdRng::seed_from_u64(11)
}

#[test]
fn json_file_expands_entries_and_applies_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("rules.json");
    fs::write(&p, RULES_JSON).unwrap();

    let set = load_rules_from(&p, &mut rng()).unwrap();
    assert_eq!(set.settings.default_cooldown_ms, 1500);
    assert_eq!(set.settings.ignore_prefixes, vec!["!".to_string()]);

    let ids: Vec<&str> = set.rules.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), 3);
    // index counts object entries only; the empty-trigger entry at :1 is dropped
    assert_eq!(ids[0], "greet:0");
    assert_eq!(ids[1], "greet:2");
    assert!(ids[2].starts_with("r_"));
    assert_eq!(ids[2].len(), 10);

    let yo = set.get("greet:2").unwrap();
    assert_eq!(yo.match_mode, MatchMode::Exact);
    assert_eq!(yo.per, CooldownScope::Channel);
    assert_eq!(yo.action.mode, ReplyMode::Send);
    assert_eq!(yo.cooldown_ms, 1500);

    let bye = &set.rules[2];
    assert_eq!(bye.match_mode, MatchMode::Wildcard);
    assert_eq!(bye.action.replies, vec!["see ya".to_string()]);
    assert_eq!(bye.action.mode, ReplyMode::Reply);
}

#[test]
fn toml_file_normalizes_like_json() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("rules.toml");
    fs::write(&p, RULES_TOML).unwrap();

    let set = load_rules_from(&p, &mut rng()).unwrap();
    let ids: Vec<&str> = set.rules.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["greet:0", "greet:2"]);
    assert_eq!(set.settings.default_cooldown_ms, 1500);
    assert_eq!(set.rules[1].match_mode, MatchMode::Exact);
}

#[test]
fn unreadable_or_malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_rules_from(&dir.path().join("missing.json"), &mut rng()).is_err());

    let bad = dir.path().join("bad.json");
    fs::write(&bad, "{ not json").unwrap();
    let err = load_rules_from(&bad, &mut rng()).unwrap_err();
    assert!(format!("{err:#}").contains("bad.json"));

    let list = dir.path().join("list.json");
    fs::write(&list, "[1, 2, 3]").unwrap();
    assert!(load_rules_from(&list, &mut rng()).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not picked up.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var("RESPONDER_RULES_PATH");

    // 1) Nothing present → error
    assert!(resolve_rules_path().is_err());

    // 2) Fallback TOML in ./config/
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("rules.toml"), RULES_TOML).unwrap();
    let (path, set) = load_rules_default(&mut rng()).unwrap();
    assert!(path.ends_with("config/rules.toml"));
    assert_eq!(set.len(), 2);

    // 3) JSON wins over TOML
    fs::write(cfg_dir.join("rules.json"), RULES_JSON).unwrap();
    let (path, set) = load_rules_default(&mut rng()).unwrap();
    assert!(path.ends_with("config/rules.json"));
    assert_eq!(set.len(), 3);

    // 4) Env var wins over both
    let p_env = tmp.path().join("override.json");
    fs::write(&p_env, r#"{ "rules": [ { "id": "only", "triggers": ["x"], "action": { "replies": ["y"] } } ] }"#)
        .unwrap();
    env::set_var("RESPONDER_RULES_PATH", p_env.display().to_string());
    let (_, set) = load_rules_default(&mut rng()).unwrap();
    assert_eq!(set.len(), 1);
    assert!(set.get("only").is_some());

    // 5) Env var pointing nowhere is an error, not a silent fallback
    env::set_var("RESPONDER_RULES_PATH", tmp.path().join("nope.json").display().to_string());
    assert!(load_rules_default(&mut rng()).is_err());

    env::remove_var("RESPONDER_RULES_PATH");
    env::set_current_dir(&old).unwrap();
}
