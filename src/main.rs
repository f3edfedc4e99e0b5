use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use log::{error, info, LevelFilter};

use emumon::debugger::commands::register_names;
use emumon::debugger::expr::parse_number;
use emumon::debugger::registers::Registers;
use emumon::{init_logging, parse_command, Flow, Monitor, MonitorConfig, NopCpu};

/// Options gathered from the command line
struct Options {
    config: MonitorConfig,
    image: Option<PathBuf>,
    log_level: LevelFilter,
    batch: bool,
}

/// EMUMON - expression evaluator and watchpoint monitor
fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("emumon", String::as_str);

    let options = match parse_args(args.get(1..).unwrap_or(&[])) {
        Ok(Some(options)) => options,
        Ok(None) => process::exit(0),
        Err(e) => {
            eprintln!("{}: {}", program, e);
            print_usage(program);
            process::exit(1);
        }
    };

    init_logging(options.log_level);
    info!("Starting EMUMON v{}", emumon::VERSION);

    let mut monitor = Monitor::new(options.config, NopCpu::new());
    if let Some(image) = &options.image {
        if let Err(e) = monitor.load_image(image) {
            error!("Error loading image: {:#}", e);
            process::exit(1);
        }
    }

    run_loop(&mut monitor, options.batch)?;

    info!("EMUMON exiting");
    Ok(())
}

/// Read commands from stdin until `q` or end of input
fn run_loop(monitor: &mut Monitor<NopCpu>, batch: bool) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();

    loop {
        if !batch {
            write!(stdout, "(emumon) ")?;
            stdout.flush()?;
        }

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read command")?;

        match monitor.execute(&parse_command(&line), &mut stdout) {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => {
                error!("Command '{}' failed: {:#}", line.trim(), e);
                writeln!(stdout, "Error: {:#}", e)?;
            }
        }
    }

    Ok(())
}

/// Parse arguments; `Ok(None)` means the request was fully handled (help,
/// version)
fn parse_args(args: &[String]) -> Result<Option<Options>> {
    let mut options = Options {
        config: MonitorConfig::default(),
        image: None,
        log_level: LevelFilter::Warn,
        batch: false,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-v" | "--version" => {
                println!("EMUMON v{}", emumon::VERSION);
                println!("{}", emumon::PKG_DESCRIPTION);
                return Ok(None);
            }
            "-h" | "--help" => {
                print_usage("emumon");
                return Ok(None);
            }
            "-m" | "--mem-size" => {
                let value = flag_value(args, &mut i)?;
                options.config.memory_size =
                    parse_number(value).ok_or_else(|| anyhow!("Invalid memory size: {}", value))? as usize;
            }
            "-l" | "--load-addr" => {
                let value = flag_value(args, &mut i)?;
                options.config.load_address =
                    parse_number(value).ok_or_else(|| anyhow!("Invalid load address: {}", value))?;
            }
            "--log" => {
                let value = flag_value(args, &mut i)?;
                options.log_level =
                    LevelFilter::from_str(value).map_err(|_| anyhow!("Invalid log level: {}", value))?;
            }
            "-b" | "--batch" => options.batch = true,
            arg if arg.starts_with('-') => return Err(anyhow!("Unknown option: {}", arg)),
            arg => {
                if options.image.is_some() {
                    return Err(anyhow!("Only one image may be given"));
                }
                options.image = Some(PathBuf::from(arg));
            }
        }

        i += 1;
    }

    Ok(Some(options))
}

/// Value following a flag, advancing the cursor past it
fn flag_value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{} requires a value", flag))
}

/// Print usage information
fn print_usage(program_name: &str) {
    println!("EMUMON - expression evaluator and watchpoint monitor");
    println!("Usage: {} [options] [image]", program_name);
    println!();
    println!("Options:");
    println!("  -h, --help             Display this help message");
    println!("  -v, --version          Display version information");
    println!("  -m, --mem-size BYTES   Guest memory size (default 128 MiB)");
    println!("  -l, --load-addr ADDR   Where the image is loaded (default 0x100000)");
    println!("      --log LEVEL        Log level: off, error, warn, info, debug, trace");
    println!("  -b, --batch            Do not print a prompt");
    println!();
    println!("Commands: help, c, q, si [N], info r|w, x N EXPR, p EXPR, w EXPR, d N");
    println!("Registers: {}", register_names(&Registers::new()));
}
