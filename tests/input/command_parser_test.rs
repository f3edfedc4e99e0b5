use emumon::{parse_command, Command};
use test_case::test_case;

#[test_case("c", Command::Continue ; "continue")]
#[test_case("continue", Command::Continue ; "continue long form")]
#[test_case("q", Command::Quit ; "quit")]
#[test_case("si", Command::Step(1) ; "single step")]
#[test_case("si 010", Command::Step(8) ; "octal step count")]
#[test_case("info r", Command::InfoRegisters ; "info registers")]
#[test_case("info w", Command::InfoWatchpoints ; "info watchpoints")]
#[test_case("p $eax + 1", Command::Print("$eax + 1".to_string()) ; "print")]
#[test_case("w *$esp != 0", Command::Watch("*$esp != 0".to_string()) ; "watch")]
#[test_case("d 0x1f", Command::Delete(31) ; "delete hex id")]
#[test_case("help", Command::Help(None) ; "help")]
#[test_case("x 10 $esp", Command::Examine { count: 10, expression: "$esp".to_string() } ; "examine")]
fn test_valid_commands(line: &str, expected: Command) {
    assert_eq!(parse_command(line), expected);
}

#[test]
fn test_malformed_commands() {
    assert_eq!(parse_command(""), Command::Empty);
    assert_eq!(parse_command("   \t"), Command::Empty);
    assert_eq!(parse_command("foobar"), Command::Unknown("foobar".to_string()));
    assert!(matches!(parse_command("w"), Command::Invalid(_)));
    assert!(matches!(parse_command("x"), Command::Invalid(_)));
    assert!(matches!(parse_command("info x"), Command::Invalid(_)));
}

#[test]
fn test_long_input() {
    let long = format!("p {}", "1+".repeat(10_000) + "1");
    assert!(matches!(parse_command(&long), Command::Print(_)));
}

#[test]
fn test_unicode_handling() {
    let commands = ["p 你好", "w 😊+😊", "d 💡", "p \u{0000}"];

    for line in commands {
        match parse_command(line) {
            Command::Print(_) | Command::Watch(_) | Command::Invalid(_) => (),
            other => panic!("unexpected command for {line:?}: {other:?}"),
        }
    }
}
