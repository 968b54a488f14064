// tests/config_loading.rs

use std::io::Write;
use std::time::Duration;

use rosterboard::config::{load_and_validate, load_from_str, parse_color, ConfigFile};
use rosterboard::errors::RosterError;
use rosterboard::types::PendingBehaviour;
use tempfile::NamedTempFile;

fn expect_config_error(toml: &str, needle: &str) {
    let raw = load_from_str(toml).expect("toml should parse");
    match ConfigFile::try_from(raw) {
        Err(RosterError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "unexpected message: {msg}");
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_full_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r##"
[store]
url = "memory://"
key_prefix = "pg:"

[scheduler]
attempt_timeout_secs = 20
pending_duration_secs = 3
retry_interval_secs = 7
poll_interval_ms = 250
pending_behaviour = "restart"

[names]
url = "http://names.local"
timeout_secs = 2

[discord]
token_env = "MY_TOKEN"

[[category]]
name = "staff"
channel_id = 42
message_id = 4242
title = "Staff team"
color = "#ff8800"
show_group_id = true
groups = ["Admin", "moderator"]

[[category]]
name = "vip"
channel_id = 43
title = "VIPs"
groups = ["vip", "admin"]
"##
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.store.url, "memory://");
    assert_eq!(cfg.store.key_prefix, "pg:");
    assert_eq!(cfg.scheduler.attempt_timeout(), Duration::from_secs(20));
    assert_eq!(cfg.scheduler.pending_duration(), Duration::from_secs(3));
    assert_eq!(cfg.scheduler.retry_interval(), Duration::from_secs(7));
    assert_eq!(cfg.scheduler.poll_interval(), Duration::from_millis(250));
    assert_eq!(cfg.scheduler.pending_behaviour, PendingBehaviour::Restart);
    assert_eq!(cfg.names.url, "http://names.local");
    assert_eq!(cfg.names.timeout_secs, 2);
    assert_eq!(cfg.discord.token_env, "MY_TOKEN");

    let staff = cfg.category("staff").unwrap();
    assert_eq!(staff.channel_id, 42);
    assert_eq!(staff.message_id, Some(4242));
    assert_eq!(staff.color, 0xff8800);
    assert!(staff.show_group_id);

    let vip = cfg.category("vip").unwrap();
    assert_eq!(vip.message_id, None);
    assert_eq!(vip.color, 0xffffff);
    assert!(!vip.show_group_id);
}

#[test]
fn test_defaults_applied() {
    let raw = load_from_str(
        r#"
[[category]]
name = "staff"
channel_id = 1
title = "Staff"
groups = ["admin"]
"#,
    )
    .unwrap();
    let cfg = ConfigFile::try_from(raw).unwrap();

    assert_eq!(cfg.store.key_prefix, "permission_groups:");
    assert_eq!(cfg.scheduler.attempt_timeout(), Duration::from_secs(30));
    assert_eq!(cfg.scheduler.pending_duration(), Duration::from_secs(5));
    assert_eq!(cfg.scheduler.retry_interval(), Duration::from_secs(10));
    assert_eq!(cfg.scheduler.poll_interval(), Duration::from_millis(1000));
    assert_eq!(cfg.scheduler.pending_behaviour, PendingBehaviour::Coalesce);
    assert_eq!(cfg.discord.token_env, "DISCORD_TOKEN");
}

#[test]
fn test_group_lookup_is_case_insensitive() {
    let raw = load_from_str(
        r#"
[[category]]
name = "staff"
channel_id = 1
title = "Staff"
groups = ["Admin", "mod"]

[[category]]
name = "vip"
channel_id = 2
title = "VIP"
groups = ["vip", "admin"]
"#,
    )
    .unwrap();
    let cfg = ConfigFile::try_from(raw).unwrap();

    let names: Vec<&str> = cfg
        .categories_for_group("ADMIN")
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["staff", "vip"]);

    assert_eq!(cfg.categories_for_group("unknown").count(), 0);

    let tracked: Vec<String> = cfg.tracked_groups().into_iter().collect();
    assert_eq!(tracked, vec!["Admin", "admin", "mod", "vip"]);
}

#[test]
fn test_missing_categories_rejected() {
    expect_config_error("[scheduler]\nattempt_timeout_secs = 5\n", "at least one [[category]]");
}

#[test]
fn test_duplicate_category_rejected() {
    expect_config_error(
        r#"
[[category]]
name = "staff"
channel_id = 1
title = "Staff"
groups = ["admin"]

[[category]]
name = "staff"
channel_id = 2
title = "Staff again"
groups = ["mod"]
"#,
        "duplicate category name 'staff'",
    );
}

#[test]
fn test_category_without_groups_rejected() {
    expect_config_error(
        r#"
[[category]]
name = "empty"
channel_id = 1
title = "Empty"
groups = []
"#,
        "must list at least one group",
    );
}

#[test]
fn test_invalid_color_rejected() {
    expect_config_error(
        r#"
[[category]]
name = "staff"
channel_id = 1
title = "Staff"
color = "orange"
groups = ["admin"]
"#,
        "invalid color 'orange'",
    );
}

#[test]
fn test_zero_timings_rejected() {
    expect_config_error(
        r#"
[scheduler]
attempt_timeout_secs = 0

[[category]]
name = "staff"
channel_id = 1
title = "Staff"
groups = ["admin"]
"#,
        "attempt_timeout_secs",
    );
    expect_config_error(
        r#"
[scheduler]
retry_interval_secs = 0

[[category]]
name = "staff"
channel_id = 1
title = "Staff"
groups = ["admin"]
"#,
        "retry_interval_secs",
    );
}

#[test]
fn test_oversized_timings_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[scheduler]
attempt_timeout_secs = 10000000000000

[[category]]
name = "staff"
channel_id = 1
title = "Staff"
groups = ["admin"]
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(RosterError::ConfigError(msg)) => {
            assert!(msg.contains("attempt_timeout_secs must be <= 86400"), "{msg}");
        }
        other => panic!("Expected ConfigError, got: {:?}", other.map(|_| ())),
    }

    expect_config_error(
        r#"
[scheduler]
poll_interval_ms = 18446744073709551615

[[category]]
name = "staff"
channel_id = 1
title = "Staff"
groups = ["admin"]
"#,
        "poll_interval_ms",
    );

    // One day is still accepted.
    let raw = load_from_str(
        r#"
[scheduler]
attempt_timeout_secs = 86400
pending_duration_secs = 86400

[[category]]
name = "staff"
channel_id = 1
title = "Staff"
groups = ["admin"]
"#,
    )
    .unwrap();
    let cfg = ConfigFile::try_from(raw).unwrap();
    assert_eq!(cfg.scheduler.attempt_timeout(), Duration::from_secs(86400));
}

#[test]
fn test_unknown_pending_behaviour_is_a_toml_error() {
    let result = load_from_str(
        r#"
[scheduler]
pending_behaviour = "sometimes"

[[category]]
name = "staff"
channel_id = 1
title = "Staff"
groups = ["admin"]
"#,
    );
    assert!(matches!(result, Err(RosterError::TomlError(_))));
}

#[test]
fn test_parse_color() {
    assert_eq!(parse_color("#000000"), Some(0));
    assert_eq!(parse_color("ff8800"), Some(0xff8800));
    assert_eq!(parse_color("#FFF"), None);
    assert_eq!(parse_color("#gggggg"), None);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("nope.toml"));
    assert!(matches!(result, Err(RosterError::IoError(_))));
}
