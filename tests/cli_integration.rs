use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn binder(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("binder").unwrap();
    cmd.env("TCGBINDER_HOME", home).env("NO_COLOR", "1");
    cmd
}

/// Writes a collection with three cards in the default binder.
fn seed_collection(home: &Path) {
    let collection = r#"{
  "default": {
    "password": "",
    "binders": {
      "Main Binder": [
        {"id": "sv08-025", "name": "Pikachu ex", "image": "https://assets.tcgdex.net/en/sv/sv08/025", "set_name": "Surging Sparks", "set_id": "sv08"},
        {"id": "sv08-001", "name": "Exeggcute", "image": "https://assets.tcgdex.net/en/sv/sv08/001", "set_name": "Surging Sparks", "set_id": "sv08"},
        {"id": "sv03-125", "name": "Charizard ex", "image": "https://assets.tcgdex.net/en/sv/sv03/125", "set_name": "Obsidian Flames", "set_id": "sv03"}
      ]
    },
    "binder_order": ["Main Binder"],
    "binder_settings": {"Main Binder": {"rows": 3, "cols": 3, "pages": 10}},
    "dark_mode": true
  }
}"#;
    std::fs::create_dir_all(home).unwrap();
    std::fs::write(home.join("collection.json"), collection).unwrap();
}

#[test]
fn first_run_shows_the_default_binder() {
    let temp = tempfile::tempdir().unwrap();
    binder(temp.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Main Binder"))
        .stdout(predicate::str::contains("page 1/10"));
    assert!(temp.path().join("collection.json").exists());
}

#[test]
fn layout_is_validated() {
    let temp = tempfile::tempdir().unwrap();
    binder(temp.path())
        .args(["layout", "0", "3", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid input"));

    binder(temp.path())
        .args(["layout", "2", "2", "1"])
        .assert()
        .success();

    binder(temp.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("(2x2, 4 slots)"));
}

#[test]
fn binders_can_be_created_listed_and_not_all_deleted() {
    let temp = tempfile::tempdir().unwrap();
    binder(temp.path())
        .args(["binder", "create", "Trades"])
        .assert()
        .success();

    binder(temp.path())
        .args(["binder", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Main Binder"))
        .stdout(predicate::str::contains("Trades"));

    binder(temp.path())
        .args(["binder", "delete", "Trades"])
        .assert()
        .success();

    binder(temp.path())
        .args(["binder", "delete", "Main Binder"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("only binder left"));
}

#[test]
fn config_round_trips_and_rejects_bad_values() {
    let temp = tempfile::tempdir().unwrap();
    binder(temp.path())
        .args(["config", "cache-max-files", "42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cache-max-files set to 42"));

    binder(temp.path())
        .args(["config", "cache-max-files"])
        .assert()
        .success()
        .stdout(predicate::str::contains("42"));

    binder(temp.path())
        .args(["config", "search-cols", "zero"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("positive whole number"));

    binder(temp.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("catalog-url = "));
}

#[test]
fn profiles_require_the_right_password() {
    let temp = tempfile::tempdir().unwrap();
    binder(temp.path())
        .args(["profile", "create", "ash", "pikachu"])
        .assert()
        .success();

    binder(temp.path())
        .args(["profile", "login", "ash", "pikachu"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Main Binder"));

    binder(temp.path())
        .args(["profile", "login", "ash", "wrong"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid name or password"));

    binder(temp.path())
        .args(["theme", "light", "--user", "ash", "--password", "pikachu"])
        .assert()
        .success();
}

#[test]
fn removing_from_an_empty_slot_fails() {
    let temp = tempfile::tempdir().unwrap();
    binder(temp.path())
        .args(["remove", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No card in slot 1"));

    binder(temp.path())
        .args(["remove", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("start at 1"));
}

#[test]
fn seeded_cards_can_be_moved_sorted_and_bought() {
    let temp = tempfile::tempdir().unwrap();
    seed_collection(temp.path());

    binder(temp.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pikachu ex #025"));

    binder(temp.path())
        .args(["move", "1", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved Pikachu ex to slot 3"));

    binder(temp.path())
        .args(["show", "--filter", "#125"])
        .assert()
        .success()
        .stdout(predicate::str::contains("filter: #125"))
        .stdout(predicate::str::contains("Charizard ex"))
        .stdout(predicate::str::contains("Exeggcute").not());

    binder(temp.path())
        .args(["sort", "name"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sorted 3 card(s)"));

    binder(temp.path())
        .args(["buy", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://www.tcgplayer.com/search/all/product?q="))
        .stdout(predicate::str::contains("Charizard+ex+SV03"));
}

#[test]
fn empty_cache_sweeps_nothing() {
    let temp = tempfile::tempdir().unwrap();
    binder(temp.path())
        .args(["cache", "sweep"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 0 file(s)"));

    binder(temp.path())
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The image cache is empty."));
}

#[test]
fn unreachable_catalog_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    binder(temp.path())
        .args(["config", "catalog-url", "http://127.0.0.1:9"])
        .assert()
        .success();
    binder(temp.path())
        .args(["config", "fetch-timeout-secs", "2"])
        .assert()
        .success();

    binder(temp.path())
        .args(["add-set", "Surging", "Sparks"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Catalog unavailable"));

    binder(temp.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Surging").not());
}

#[test]
fn huge_layouts_and_far_moves_fail_cleanly() {
    let temp = tempfile::tempdir().unwrap();
    seed_collection(temp.path());

    binder(temp.path())
        .args(["layout", "4294967296", "4294967296", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid input"));

    binder(temp.path())
        .args(["move", "1", "18446744073709551615"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));

    binder(temp.path())
        .args(["move-to-page", "1", "18446744073709551615"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("past the end"));

    binder(temp.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("(3x3, 9 slots)"))
        .stdout(predicate::str::contains("Pikachu ex #025"));
}

#[test]
fn any_command_trims_an_overfull_cache() {
    let temp = tempfile::tempdir().unwrap();
    binder(temp.path())
        .args(["config", "cache-max-files", "3"])
        .assert()
        .success();

    let cache = temp.path().join("card_cache");
    std::fs::create_dir_all(&cache).unwrap();
    for i in 0..8 {
        std::fs::write(cache.join(format!("sv08-{:03}.jpg", i)), b"jpeg").unwrap();
    }

    binder(temp.path()).arg("show").assert().success();

    let left = std::fs::read_dir(&cache)
        .unwrap()
        .filter(|entry| {
            entry.as_ref().unwrap().path().extension().and_then(|e| e.to_str()) == Some("jpg")
        })
        .count();
    assert_eq!(left, 3);
}
