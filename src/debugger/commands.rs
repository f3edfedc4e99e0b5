//! Monitor commands: parsing a command line and running it against a
//! `Monitor`.

use std::io::Write;

use anyhow::Result;
use log::{debug, error, warn};

use crate::debugger::core::{Monitor, StopReason};
use crate::debugger::error::ExprError;
use crate::debugger::expr::parse_number;
use crate::debugger::registers::{Register, RegisterFile};
use crate::platform::Cpu;

/// Command names and descriptions, in help order
pub const COMMANDS: &[(&str, &str)] = &[
    ("help", "Display information about all supported commands"),
    ("c", "Continue the execution of the program"),
    ("q", "Exit the monitor"),
    ("si", "Step [N] instructions exactly"),
    ("info", "[r] List registers; [w] List watchpoints"),
    ("x", "x N EXPR: examine N words of memory starting at EXPR"),
    ("p", "Print the value of the expression"),
    ("w", "Set a watchpoint on the expression"),
    ("d", "Delete watchpoint N"),
];

/// A parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help(Option<String>),
    Continue,
    Quit,
    Step(u64),
    InfoRegisters,
    InfoWatchpoints,
    Examine { count: u32, expression: String },
    Print(String),
    Watch(String),
    Delete(usize),
    /// Blank line
    Empty,
    /// Known command with unusable arguments
    Invalid(String),
    /// Unknown command name
    Unknown(String),
}

/// What the command loop should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Parse command text into a `Command`
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }

    let (name, args) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    match name {
        "help" | "h" => {
            if args.is_empty() {
                Command::Help(None)
            } else {
                Command::Help(Some(args.to_string()))
            }
        }
        "c" | "continue" => Command::Continue,
        "q" | "quit" => Command::Quit,
        "si" | "stepi" => {
            if args.is_empty() {
                Command::Step(1)
            } else {
                match parse_number(args) {
                    Some(n) => Command::Step(u64::from(n)),
                    None => Command::Invalid(format!("Invalid step count: '{}'", args)),
                }
            }
        }
        "info" | "i" => match args {
            "r" => Command::InfoRegisters,
            "w" => Command::InfoWatchpoints,
            "" => Command::Invalid("info requires 'r' or 'w'".to_string()),
            other => Command::Invalid(format!("Unknown info target '{}'", other)),
        },
        "x" => {
            let Some((count, expression)) = args.split_once(char::is_whitespace) else {
                return Command::Invalid("Usage: x N EXPR".to_string());
            };
            match parse_number(count) {
                Some(count) => Command::Examine {
                    count,
                    expression: expression.trim().to_string(),
                },
                None => Command::Invalid(format!("Invalid word count: '{}'", count)),
            }
        }
        "p" | "print" => {
            if args.is_empty() {
                Command::Invalid("print requires an expression".to_string())
            } else {
                Command::Print(args.to_string())
            }
        }
        "w" | "watch" => {
            if args.is_empty() {
                Command::Invalid("watch requires an expression".to_string())
            } else {
                Command::Watch(args.to_string())
            }
        }
        "d" | "delete" => match parse_number(args) {
            Some(n) => Command::Delete(n as usize),
            None => Command::Invalid(format!("Invalid watchpoint number: '{}'", args)),
        },
        _ => Command::Unknown(name.to_string()),
    }
}

/// Describe an expression error, pointing at the failing column when the
/// lexer rejected the input
fn describe_error(text: &str, err: &ExprError) -> String {
    if err.is_internal() {
        error!("Evaluator fault on '{}': {}", text, err);
        return format!("Internal error: {} (expression too deeply nested)", err);
    }

    match err.offset() {
        Some(offset) => {
            let column = text.get(..offset).map_or(offset, |prefix| prefix.chars().count());
            format!("Invalid expression: {}\n{}\n{:>width$}", err, text, "^", width = column + 1)
        }
        None => format!("Invalid expression: {}", err),
    }
}

fn report_stop(reason: &StopReason, eip: u32, out: &mut dyn Write) -> Result<()> {
    match reason {
        StopReason::Watchpoint(changes) => {
            for change in changes {
                writeln!(out, "\n{}\n", change)?;
            }
        }
        StopReason::Halted => writeln!(out, "Machine halted at eip 0x{:08x}", eip)?,
        StopReason::BudgetExhausted => {}
    }
    Ok(())
}

impl<C: Cpu> Monitor<C> {
    /// Run one command, writing its output to `out`
    pub fn execute(&mut self, command: &Command, out: &mut dyn Write) -> Result<Flow> {
        debug!("Executing {:?}", command);

        match command {
            Command::Empty => {}
            Command::Quit => return Ok(Flow::Quit),
            Command::Help(None) => {
                for (name, description) in COMMANDS {
                    writeln!(out, "{} - {}", name, description)?;
                }
            }
            Command::Help(Some(topic)) => match COMMANDS.iter().find(|(name, _)| *name == topic.as_str()) {
                Some((name, description)) => writeln!(out, "{} - {}", name, description)?,
                None => writeln!(out, "Unknown command '{}'", topic)?,
            },
            Command::Continue => {
                let reason = self.cont()?;
                if reason == StopReason::BudgetExhausted {
                    writeln!(out, "Stopped after {} steps", self.steps())?;
                }
                report_stop(&reason, self.machine().registers.eip(), out)?;
            }
            Command::Step(n) => {
                let reason = self.run(*n)?;
                report_stop(&reason, self.machine().registers.eip(), out)?;
            }
            Command::InfoRegisters => {
                let registers = &self.machine().registers;
                for reg in Register::ALL {
                    writeln!(out, "{}\t0x{:08x}", reg, registers.get(reg))?;
                }
                writeln!(out, "eip\t0x{:08x}", registers.eip())?;
            }
            Command::InfoWatchpoints => {
                writeln!(out, "Num\tExpression")?;
                for (id, expression) in self.list_watches() {
                    writeln!(out, "{}\t{}", id, expression)?;
                }
            }
            Command::Examine { count, expression } => match self.examine(*count, expression) {
                Ok(words) => {
                    for (address, word) in words {
                        writeln!(out, "0x{:08x}: 0x{:08x}", address, word)?;
                    }
                }
                Err(e) => writeln!(out, "{}", describe_error(expression, &e))?,
            },
            Command::Print(text) => match self.evaluate(text) {
                Ok(value) => writeln!(out, "{}", value)?,
                Err(e) => writeln!(out, "{}", describe_error(text, &e))?,
            },
            Command::Watch(text) => match self.create_watch(text) {
                Ok(id) => writeln!(out, "Watchpoint {}: {}", id, text)?,
                Err(e) => writeln!(out, "{}", describe_error(text, &e))?,
            },
            Command::Delete(id) => {
                if self.delete_watch(*id) {
                    writeln!(out, "Watchpoint {} is deleted.", id)?;
                } else {
                    writeln!(out, "Watchpoint {} doesn't exist.", id)?;
                }
            }
            Command::Invalid(message) => writeln!(out, "{}", message)?,
            Command::Unknown(name) => {
                warn!("Unknown command: {}", name);
                writeln!(out, "Unknown command '{}'", name)?;
            }
        }

        Ok(Flow::Continue)
    }

    /// Parse and run a command line
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write) -> Result<Flow> {
        self.execute(&parse_command(line), out)
    }
}

/// Register names the evaluator accepts, for completion and help output
pub fn register_names(registers: &dyn RegisterFile) -> String {
    registers
        .register_names()
        .iter()
        .map(|name| format!("${}", name))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debugger::core::MonitorConfig;
    use crate::debugger::registers::Registers;
    use crate::platform::NopCpu;

    fn monitor() -> Monitor<NopCpu> {
        Monitor::new(
            MonitorConfig {
                memory_size: 0x1000,
                ..MonitorConfig::default()
            },
            NopCpu::new(),
        )
    }

    fn run(monitor: &mut Monitor<NopCpu>, line: &str) -> String {
        let mut out = Vec::new();
        monitor.execute_line(line, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_basic_commands() {
        assert_eq!(parse_command("c"), Command::Continue);
        assert_eq!(parse_command("  q  "), Command::Quit);
        assert_eq!(parse_command("si"), Command::Step(1));
        assert_eq!(parse_command("si 0x10"), Command::Step(16));
        assert_eq!(parse_command("info r"), Command::InfoRegisters);
        assert_eq!(parse_command("info w"), Command::InfoWatchpoints);
        assert_eq!(parse_command("help p"), Command::Help(Some("p".to_string())));
        assert_eq!(parse_command(""), Command::Empty);
    }

    #[test]
    fn test_parse_expression_commands_keep_text() {
        assert_eq!(parse_command("p 1 + 2 * 3"), Command::Print("1 + 2 * 3".to_string()));
        assert_eq!(parse_command("w   $eax == 5 "), Command::Watch("$eax == 5".to_string()));
        assert_eq!(
            parse_command("x 4 $esp + 8"),
            Command::Examine { count: 4, expression: "$esp + 8".to_string() }
        );
        assert_eq!(parse_command("d 3"), Command::Delete(3));
    }

    #[test]
    fn test_parse_bad_arguments() {
        assert!(matches!(parse_command("p"), Command::Invalid(_)));
        assert!(matches!(parse_command("x 4"), Command::Invalid(_)));
        assert!(matches!(parse_command("x four $esp"), Command::Invalid(_)));
        assert!(matches!(parse_command("d"), Command::Invalid(_)));
        assert!(matches!(parse_command("d one"), Command::Invalid(_)));
        assert!(matches!(parse_command("si lots"), Command::Invalid(_)));
        assert!(matches!(parse_command("info"), Command::Invalid(_)));
        assert_eq!(parse_command("frobnicate 1"), Command::Unknown("frobnicate".to_string()));
    }

    #[test]
    fn test_print() {
        let mut monitor = monitor();
        assert_eq!(run(&mut monitor, "p (1+2)*3"), "9\n");
        assert_eq!(run(&mut monitor, "p 0-1"), "4294967295\n");
        assert_eq!(
            run(&mut monitor, "p (1+2"),
            "Invalid expression: unbalanced parentheses\n"
        );
        assert_eq!(
            run(&mut monitor, "p 1 + a"),
            "Invalid expression: no match at position 4: 'a'\n1 + a\n    ^\n"
        );
    }

    #[test]
    fn test_caret_counts_characters() {
        let mut monitor = monitor();
        assert_eq!(
            run(&mut monitor, "p 1\u{3000}+ a"),
            "Invalid expression: no match at position 6: 'a'\n1\u{3000}+ a\n    ^\n"
        );
    }

    #[test]
    fn test_nesting_fault_is_reported_as_internal() {
        let mut monitor = monitor();
        let line = format!("p {}1{}", "(".repeat(40), ")".repeat(40));
        let output = run(&mut monitor, &line);
        assert!(output.starts_with("Internal error: operator stack"), "{output}");
        assert!(!output.contains("Invalid expression"));

        let line = format!("p {}", (0..40).map(|n| n.to_string()).collect::<Vec<_>>().join(" "));
        assert!(run(&mut monitor, &line).starts_with("Invalid expression: missing operator"));
    }

    #[test]
    fn test_watch_list_delete() {
        let mut monitor = monitor();
        assert_eq!(run(&mut monitor, "w $eax"), "Watchpoint 0: $eax\n");
        assert_eq!(run(&mut monitor, "w $eip > 3"), "Watchpoint 1: $eip > 3\n");
        assert_eq!(run(&mut monitor, "info w"), "Num\tExpression\n1\t$eip > 3\n0\t$eax\n");

        assert_eq!(run(&mut monitor, "d 0"), "Watchpoint 0 is deleted.\n");
        assert_eq!(run(&mut monitor, "d 0"), "Watchpoint 0 doesn't exist.\n");
        assert_eq!(run(&mut monitor, "info w"), "Num\tExpression\n1\t$eip > 3\n");
    }

    #[test]
    fn test_step_reports_change() {
        let mut monitor = monitor();
        run(&mut monitor, "w $eip > 3");

        assert_eq!(run(&mut monitor, "si 3"), "");
        assert_eq!(
            run(&mut monitor, "si 3"),
            "\nWatchpoint 0: $eip > 3\nOld value = 0\nNew value = 1\n\n"
        );
        assert_eq!(monitor.machine().registers.eip(), 4);
    }

    #[test]
    fn test_continue_until_halt() {
        let mut monitor = monitor();
        monitor.machine_mut().registers.set_eip(0xffe);
        assert_eq!(run(&mut monitor, "c"), "Machine halted at eip 0x00001000\n");
    }

    #[test]
    fn test_examine() {
        let mut monitor = monitor();
        monitor.machine_mut().memory.write_word(0x20, 0xcafe_babe).unwrap();
        assert_eq!(
            run(&mut monitor, "x 2 0x10 + 0x10"),
            "0x00000020: 0xcafebabe\n0x00000024: 0x00000000\n"
        );
        assert!(run(&mut monitor, "x 1 0x2000").starts_with("Invalid expression: address 0x00002000"));
    }

    #[test]
    fn test_info_registers() {
        let mut monitor = monitor();
        monitor.machine_mut().registers.set(Register::Edx, 0x1234);
        let output = run(&mut monitor, "info r");
        assert!(output.starts_with("eax\t0x00000000\necx\t0x00000000\nedx\t0x00001234\n"));
        assert!(output.ends_with("eip\t0x00000000\n"));
        assert_eq!(output.lines().count(), 9);
    }

    #[test]
    fn test_help_and_unknown() {
        let mut monitor = monitor();
        assert_eq!(run(&mut monitor, "help").lines().count(), COMMANDS.len());
        assert_eq!(run(&mut monitor, "help x"), "x - x N EXPR: examine N words of memory starting at EXPR\n");
        assert_eq!(run(&mut monitor, "help zz"), "Unknown command 'zz'\n");
        assert_eq!(run(&mut monitor, "zz"), "Unknown command 'zz'\n");
    }

    #[test]
    fn test_quit() {
        let mut monitor = monitor();
        let mut out = Vec::new();
        assert_eq!(monitor.execute_line("q", &mut out).unwrap(), Flow::Quit);
        assert_eq!(monitor.execute_line("", &mut out).unwrap(), Flow::Continue);
        assert!(out.is_empty());
    }

    #[test]
    fn test_register_names() {
        let names = register_names(&Registers::new());
        assert!(names.starts_with("$eax $ecx"));
        assert!(names.ends_with("$eip"));
    }
}
