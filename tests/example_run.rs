//! Integration tests for the `example run` command.
use h2dispatch::cli::RunOpts;
use h2dispatch::cli::example::handle_example_run_command;
use h2dispatch::settings::Settings;
use tempfile::tempdir;

/// An integration test for the `example run` command.
#[test]
fn test_handle_example_run_command() {
    unsafe { std::env::set_var("H2DISPATCH_LOG_LEVEL", "off") };

    let tempdir = tempdir().unwrap();
    let opts = RunOpts {
        output_dir: Some(tempdir.path().to_path_buf()),
        overwrite: false,
    };
    handle_example_run_command("simple", &opts, Some(Settings::default())).unwrap();
    assert!(tempdir.path().join("summary.csv").is_file());
}
