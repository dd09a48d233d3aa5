//! End-to-end generation through the `gendata` binary with shell generators.

mod common;

use common::{list_files, skip_without_sh, ProblemFixture};

const MANIFEST: &str = r#"
config:
  extensions:
    ans: generators/sol.sh
sample:
  1.in: gen.sh 1 $SEED
  2.in: null
secret:
  - many: tree.sh
  - big.in: [gen.sh 100, fives.sh]
"#;

fn fixture() -> ProblemFixture {
    let fixture = ProblemFixture::new(MANIFEST);
    fixture.write("generators/gen.sh", "echo \"$@\"\n");
    fixture.write("generators/fives.sh", "tr 0 5\n");
    fixture.write("generators/sol.sh", "read first rest\necho \"answer $first\"\n");
    fixture.write(
        "generators/tree.sh",
        "echo a > 1.in\necho b > 2.in\necho junk > notes.txt\necho orphan > 3.ans\n",
    );
    fixture.write("data/sample/2.in", "7 manual\n");
    fixture
}

#[test]
fn generates_the_data_tree() {
    if skip_without_sh() {
        return;
    }
    let fixture = fixture();
    let output = fixture.run(&[]);
    assert!(
        output.status.success(),
        "gendata failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    assert!(fixture.read("sample/1.in").starts_with("1 "));
    assert_eq!(fixture.read("sample/1.ans"), "answer 1\n");
    assert_eq!(fixture.read("sample/2.in"), "7 manual\n");
    assert_eq!(fixture.read("sample/2.ans"), "answer 7\n");
    assert_eq!(fixture.read("secret/2-big.in"), "155\n");
    assert_eq!(fixture.read("secret/2-big.ans"), "answer 155\n");
    assert_eq!(
        list_files(&fixture.data("secret/1-many")),
        vec!["1.ans", "1.in", "2.ans", "2.in"]
    );
    assert_eq!(fixture.read("secret/1-many/1.ans"), "answer a\n");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("generated demo"), "{stdout}");
}

#[test]
fn seeds_are_stable_across_runs() {
    if skip_without_sh() {
        return;
    }
    let fixture = fixture();
    assert!(fixture.run(&[]).status.success());
    let first = fixture.read("sample/1.in");
    assert!(fixture.run(&[]).status.success());
    assert_eq!(fixture.read("sample/1.in"), first);
}

#[test]
fn failing_generator_exits_with_one() {
    if skip_without_sh() {
        return;
    }
    let fixture = ProblemFixture::new("1.in: ok.sh\n2.in: broken.sh\n");
    fixture.write("generators/ok.sh", "echo fine\n");
    fixture.write("generators/broken.sh", "exit 4\n");

    let output = fixture.run(&["-l", "error"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("terminated with error 4"), "{stderr}");
    assert_eq!(fixture.read("1.in"), "fine\n");
    assert!(!fixture.data("2.in").exists());
}

#[test]
fn schema_errors_exit_before_generating() {
    let fixture = ProblemFixture::new("1.in: gen.sh\n_bad: gen.sh\n");
    let output = fixture.run(&[]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid key"), "{stderr}");
    assert!(!fixture.data("1.in").exists());
}

#[test]
fn missing_manifest_is_fatal() {
    let fixture = ProblemFixture::new("{}");
    std::fs::remove_file(fixture.root.join("generators/gen.yaml")).expect("remove manifest");
    let output = fixture.run(&[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("gen.yaml"));
}

#[test]
fn invalid_log_level_is_rejected() {
    let fixture = ProblemFixture::new("{}");
    let output = fixture.run(&["--log-level", "loud"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid log level"));
}
