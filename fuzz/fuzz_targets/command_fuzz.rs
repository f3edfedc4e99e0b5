#![no_main]

use libfuzzer_sys::fuzz_target;
use emumon::{parse_command, Command};

fuzz_target!(|line: &str| {
    let command = parse_command(line);

    // Parsing has no hidden state
    assert_eq!(command, parse_command(line));

    // Only blank lines are empty commands
    assert_eq!(command == Command::Empty, line.trim().is_empty());
});
