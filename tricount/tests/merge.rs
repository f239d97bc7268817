use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;

fn tricount() -> Command {
    Command::cargo_bin("tricount").unwrap()
}

#[test]
fn snapshots_become_a_signed_stream() {
    let tmp = TempDir::new().unwrap();
    tmp.child("a.txt").write_str("1 2\n2 3\n").unwrap();
    tmp.child("b.txt").write_str("1 2\n1 3\n").unwrap();
    let out = tmp.child("fd.txt");

    tricount()
        .arg("merge")
        .arg(tmp.path())
        .args(["--snapshots", "2"])
        .arg("--output")
        .arg(out.path())
        .assert()
        .success();

    let text = std::fs::read_to_string(out.path()).unwrap();
    assert_eq!(text.lines().count(), 4);
    // The first snapshot inserts both of its edges at their arrival times.
    assert_eq!(text.lines().next().unwrap(), "1 2 0 +");
    out.assert(predicate::str::contains("2 3 1 +"));
    // The second snapshot gains (1, 3) and loses (2, 3) somewhere inside
    // its interval.
    out.assert(predicate::str::contains("1 3 3 +"));
    out.assert(predicate::str::is_match(r"2 3 [34] -").unwrap());
}

#[test]
fn the_merged_stream_feeds_the_dynamic_estimator() {
    let tmp = TempDir::new().unwrap();
    tmp.child("a.txt").write_str("1 2\n2 3\n1 3\n").unwrap();
    tmp.child("b.txt").write_str("1 2\n2 3\n").unwrap();
    let out = tmp.child("fd.txt");

    tricount()
        .arg("merge")
        .arg(tmp.path())
        .args(["--snapshots", "2"])
        .arg("--output")
        .arg(out.path())
        .assert()
        .success();

    let gt = tmp.child("gt.txt");
    tricount()
        .arg("exact")
        .arg(out.path())
        .arg("--fully-dynamic")
        .arg("--output")
        .arg(gt.path())
        .assert()
        .success();
    // The triangle existed only while all three edges were live; after the
    // deletion of (1, 3) the count is back to zero.
    gt.assert(predicate::str::contains("Triangles = 0"));
    gt.assert(predicate::str::contains("Number of Edges at the end = 2"));
}
