use std::fs;
use std::path::Path;

use storage_mirror::sources::{self, ConfigurationSource};
use storage_mirror::{BatchDriver, Invocation, MirrorError, ParsedArgs, Progress, Toolbox};
use storage_testing::{Call, FakeHost};

fn invocation(args: &[&str]) -> Invocation {
    let argv = std::iter::once("lvm-mirror").chain(args.iter().copied());
    match Invocation::parse_from(argv).unwrap() {
        ParsedArgs::Run(invocation) => invocation,
        ParsedArgs::Informational(info) => panic!("unexpected informational output: {info}"),
    }
}

fn lifecycle_labels(host: &FakeHost, volume: &str) -> Vec<&'static str> {
    host.ledger()
        .snapshot_calls_for(volume)
        .iter()
        .map(Call::label)
        .collect()
}

#[test]
fn default_config_mirrors_every_volume_in_sequence() {
    let host = FakeHost::new()
        .with_remote_dirs(["/srv/mirror/vg0/root", "/srv/mirror/vg0/home"]);
    let mut driver = BatchDriver::new(Toolbox::from_host(&host), Progress::new(Vec::new()));

    let summary = driver
        .run(&[ConfigurationSource::defaults_only()], &invocation(&[]))
        .unwrap();

    assert_eq!(
        summary.mirrored,
        vec!["/srv/mirror/vg0/root", "/srv/mirror/vg0/home"]
    );
    assert_eq!(
        host.ledger().labels(),
        vec![
            "check", "query", "create", "mount", "transfer", "unmount", "destroy", "check",
            "query", "create", "mount", "transfer", "unmount", "destroy",
        ]
    );
    assert!(host.live_snapshots().is_empty());
    assert_eq!(host.mounted(), None);

    let output = String::from_utf8(driver.into_progress().into_inner()).unwrap();
    assert_eq!(output, "syncing root...\n\nsyncing home...\n");
}

#[test]
fn missing_destination_stops_before_snapshotting_that_volume() {
    let host = FakeHost::new().with_remote_dir("/srv/mirror/vg0/root");
    let mut driver = BatchDriver::new(Toolbox::from_host(&host), Progress::new(Vec::new()));

    let result = driver.run(&[ConfigurationSource::defaults_only()], &invocation(&[]));

    match result {
        Err(MirrorError::DestinationMissing { path, .. }) => {
            assert_eq!(path, "/srv/mirror/vg0/home")
        }
        other => panic!("expected missing destination, got {other:?}"),
    }
    assert_eq!(
        lifecycle_labels(&host, "root"),
        vec!["query", "create", "destroy"]
    );
    assert!(host.ledger().snapshot_calls_for("home").is_empty());
    assert_eq!(host.mirrored(), vec!["/srv/mirror/vg0/root"]);
}

#[test]
fn dry_run_still_brackets_transfer_with_snapshot() {
    let host = FakeHost::new()
        .with_remote_dirs(["/srv/mirror/vg0/root", "/srv/mirror/vg0/home"]);
    let mut driver = BatchDriver::new(Toolbox::from_host(&host), Progress::new(Vec::new()));

    driver
        .run(&[ConfigurationSource::defaults_only()], &invocation(&["-n"]))
        .unwrap();

    let transfers: Vec<bool> = host
        .ledger()
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Transfer { dry_run, .. } => Some(dry_run),
            _ => None,
        })
        .collect();
    assert_eq!(transfers, vec![true, true]);
    assert_eq!(host.ledger().count(|call| call.label() == "create"), 2);
    assert_eq!(host.ledger().count(|call| call.label() == "mount"), 2);
    assert_eq!(host.ledger().count(|call| call.label() == "destroy"), 2);
    assert!(host.mirrored().is_empty());
}

#[test]
fn failing_second_source_aborts_batch_and_keeps_first() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "mirror-vg0.toml", "volumes = [\"root\"]\n");
    write(
        dir.path(),
        "mirror-vg1.toml",
        "volumes = [\"srv\", \"data\"]\nremote_host = \"mirror-b\"\n",
    );
    write(dir.path(), "mirror-vg2.toml", "volumes = [\"never\"]\n");
    let sources = sources::discover(dir.path()).unwrap();
    assert_eq!(sources.len(), 3);

    let host = FakeHost::new()
        .with_remote_dirs([
            "/srv/mirror/vg0/root",
            "/srv/mirror/vg1/srv",
            "/srv/mirror/vg1/data",
            "/srv/mirror/vg2/never",
        ])
        .failing_transfer_to("/srv/mirror/vg1/srv");
    let mut driver = BatchDriver::new(Toolbox::from_host(&host), Progress::new(Vec::new()));

    let result = driver.run(&sources, &invocation(&[]));

    assert!(matches!(result, Err(MirrorError::Transfer { ref volume, .. }) if volume == "srv"));
    assert_eq!(host.mirrored(), vec!["/srv/mirror/vg0/root"]);
    assert!(host.live_snapshots().is_empty());
    assert!(host.ledger().snapshot_calls_for("data").is_empty());
    assert!(host.ledger().snapshot_calls_for("never").is_empty());
    assert_eq!(
        host.ledger().count(|call| matches!(
            call,
            Call::DirectoryExists { host, .. } if host == "mirror-b"
        )),
        1
    );
}

#[test]
fn only_thick_snapshots_receive_a_size() {
    let host = FakeHost::new()
        .with_thin_volume("home")
        .with_remote_dirs(["/srv/mirror/vg0/root", "/srv/mirror/vg0/home"]);
    let mut driver = BatchDriver::new(Toolbox::from_host(&host), Progress::new(Vec::new()));

    driver
        .run(&[ConfigurationSource::defaults_only()], &invocation(&[]))
        .unwrap();

    let creates: Vec<(String, Option<String>)> = host
        .ledger()
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::CreateSnapshot { origin, size, .. } => Some((origin, size)),
            _ => None,
        })
        .collect();
    assert_eq!(
        creates,
        vec![
            ("vg0/root".to_string(), Some("5G".to_string())),
            ("vg0/home".to_string(), None),
        ]
    );
    assert_eq!(
        lifecycle_labels(&host, "home"),
        vec!["query", "create", "activate", "destroy"]
    );
}

#[test]
fn positional_volumes_replace_configured_list() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "mirror.toml",
        r#"
volumes = ["root", "home", "var"]

[[exclude]]
volume = "var"
patterns = ["/cache/*", "/tmp/*"]
"#,
    );
    let sources = sources::discover(dir.path()).unwrap();

    let host = FakeHost::new().with_remote_dir("/srv/mirror/vg0/var");
    let mut driver = BatchDriver::new(Toolbox::from_host(&host), Progress::new(Vec::new()));
    let summary = driver.run(&sources, &invocation(&["/var/"])).unwrap();

    assert_eq!(summary.mirrored, vec!["/srv/mirror/vg0/var"]);
    let args = host
        .ledger()
        .calls()
        .into_iter()
        .find_map(|call| match call {
            Call::Transfer { args, .. } => Some(args),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        &args[args.len() - 2..],
        ["--exclude=/cache/*", "--exclude=/tmp/*"]
    );
}

#[test]
fn malformed_source_fails_before_any_side_effect() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "mirror.toml", "volumes = [\n");
    let sources = sources::discover(dir.path()).unwrap();

    let host = FakeHost::new();
    let mut driver = BatchDriver::new(Toolbox::from_host(&host), Progress::new(Vec::new()));
    let result = driver.run(&sources, &invocation(&[]));

    assert!(matches!(result, Err(MirrorError::Configuration { .. })));
    assert!(host.ledger().calls().is_empty());
}

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}
