use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use pretty_assertions::assert_eq;
use testthings::TestScope;
use testthings::skeleton::InstallErrorKind;
use testthings::skeleton::MapFile;
use testthings::skeleton::MapSource;
use testthings::skeleton::Skeleton;
use walkdir::WalkDir;

/// Relative path and permission bits of everything under `root`.
fn dump(root: &Path) -> Vec<(String, u32)> {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            let entry = entry.unwrap();
            let rel = entry.path().strip_prefix(root).unwrap();
            let mode = entry.metadata().unwrap().permissions().mode() & 0o777;
            (rel.display().to_string(), mode)
        })
        .collect()
}

fn write(path: &Path, data: &str, mode: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, data).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[test]
fn installs_a_template_directory() {
    let t = TestScope::new("from_dir");
    let template = t.temp_dir();
    write(&template.join("foo/etc/baz.conf"), "some data", 0o600);
    write(&template.join("foo/share/baz.bin"), "some data", 0o444);
    write(&template.join("foo/bin/baz.sh"), "#!/usr/bin/env sh\nexit 0\n", 0o750);
    for dir in ["foo", "foo/bin", "foo/etc"] {
        fs::set_permissions(template.join(dir), fs::Permissions::from_mode(0o755)).unwrap();
    }
    fs::set_permissions(template.join("foo/share"), fs::Permissions::from_mode(0o555)).unwrap();
    std::os::unix::fs::symlink("etc/baz.conf", template.join("foo/link")).unwrap();

    let install_dir = t.temp_dir().join("installed");
    Skeleton::from_dir(&template).install_or_fail(&t, &install_dir);

    assert_eq!(
        dump(&install_dir),
        vec![
            ("foo".to_string(), 0o755),
            ("foo/bin".to_string(), 0o755),
            ("foo/bin/baz.sh".to_string(), 0o750),
            ("foo/etc".to_string(), 0o755),
            ("foo/etc/baz.conf".to_string(), 0o640),
            ("foo/share".to_string(), 0o755),
            ("foo/share/baz.bin".to_string(), 0o444),
        ]
    );
    assert_eq!(
        fs::read_to_string(install_dir.join("foo/bin/baz.sh")).unwrap(),
        "#!/usr/bin/env sh\nexit 0\n"
    );
    let install_mode = fs::metadata(&install_dir).unwrap().permissions().mode();
    assert_eq!(install_mode & 0o700, 0o700);

    // Restore write access so the template can be cleaned up.
    fs::set_permissions(template.join("foo/share"), fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn installed_tree_is_removable() {
    let t = TestScope::new("removable");
    let skel = MapSource::new()
        .with("ro", MapFile::dir(0o500))
        .with("ro/locked.txt", MapFile::file("locked", 0o400));
    let install_dir = t.temp_dir().join("tree");

    Skeleton::new(skel).install_or_fail(&t, &install_dir);

    assert_eq!(
        dump(&install_dir),
        vec![
            ("ro".to_string(), 0o700),
            ("ro/locked.txt".to_string(), 0o440),
        ]
    );
    fs::remove_dir_all(&install_dir).expect("installed tree should be removable");
}

#[test]
fn second_install_into_same_dir_fails() {
    let skel = Skeleton::new(MapSource::new().with("a.txt", MapFile::file("a", 0o644)));
    let install_dir = tempfile::tempdir().unwrap();

    skel.install(install_dir.path()).unwrap();
    let err = skel.install(install_dir.path()).unwrap_err();

    assert_eq!(err.path(), Path::new("a.txt"));
    assert!(matches!(err.kind(), InstallErrorKind::Create(_)), "{err}");
    assert_eq!(
        err.io_error().map(std::io::Error::kind),
        Some(std::io::ErrorKind::AlreadyExists)
    );
}

#[test]
fn install_or_fail_fails_the_scope() {
    let t = TestScope::new("fails");
    let blocker = t.temp_dir().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();
    let skel = Skeleton::new(MapSource::new().with("a.txt", MapFile::file("a", 0o644)));

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        skel.install_or_fail(&t, &blocker);
    }));

    let payload = result.unwrap_err();
    let msg = payload.downcast_ref::<String>().unwrap();
    assert!(msg.starts_with("skeleton install: "), "{msg}");
    assert!(t.failed());
}

/// Terminator that remembers the line it was asked to fail from.
#[derive(Default)]
struct CallerLine(std::sync::Mutex<Option<u32>>);

impl testthings::Terminator for CallerLine {
    #[track_caller]
    fn fatal(&self, msg: &str) -> ! {
        *self.0.lock().unwrap() = Some(std::panic::Location::caller().line());
        panic!("{msg}")
    }
}

#[test]
fn install_failures_point_at_the_call_site() {
    let recorder = CallerLine::default();
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let skel = Skeleton::new(MapSource::new().with("a.txt", MapFile::file("a", 0o644)));

    let line = line!() + 2;
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        skel.install_or_fail(&recorder, blocker.path());
    }));

    assert!(result.is_err());
    assert_eq!(*recorder.0.lock().unwrap(), Some(line));
}
