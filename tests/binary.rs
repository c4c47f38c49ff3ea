use assert_cmd::Command;
use nepalipay_runner::WORKING_DIR;
use std::path::Path;

#[test]
fn missing_working_dir_exits_nonzero() {
    if Path::new(WORKING_DIR).try_exists().unwrap() {
        eprintln!("skipping: `{WORKING_DIR}` exists");
        return;
    }
    let assert = Command::cargo_bin("nepalipay-run").unwrap().assert().failure();
    let output = assert.get_output();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to enter working directory"),
        "{stderr}"
    );
    assert!(!stderr.contains("<<<"), "{stderr}");
    assert!(output.stdout.is_empty());
}
