//! Rules every production source file must follow

use architectural_enforcement::{report, violations};

#[test]
fn test_no_blocking_sleep() {
    let found = violations(&["std::thread::sleep", "thread::sleep("]);
    assert!(
        found.is_empty(),
        "Blocking sleep in async code:\n{}",
        report(&found)
    );
}

#[test]
fn test_no_blocking_io() {
    let found = violations(&["reqwest::blocking", "block_on(", "std::net::TcpStream"]);
    assert!(
        found.is_empty(),
        "Blocking I/O in async code:\n{}",
        report(&found)
    );
}

#[test]
fn test_no_unwrap_in_production() {
    let found = violations(&[".unwrap()", ".expect("]);
    assert!(
        found.is_empty(),
        "Panicking shortcut outside tests:\n{}",
        report(&found)
    );
}

#[test]
fn test_no_stdout_from_core() {
    let found: Vec<_> = violations(&["println!(", "print!("])
        .into_iter()
        .filter(|(path, _, _)| path.starts_with("conductor/core"))
        .collect();
    assert!(
        found.is_empty(),
        "Core must report through messages, not stdout:\n{}",
        report(&found)
    );
}

#[test]
fn test_cli_uses_conductor_not_backend_calls() {
    let found: Vec<_> = violations(&[".list_slides(", ".explain_slide(", ".slide_image(", ".ask("])
        .into_iter()
        .filter(|(path, _, _)| path.starts_with("conductor/cli"))
        .collect();
    assert!(
        found.is_empty(),
        "CLI calls the backend directly:\n{}",
        report(&found)
    );
}
