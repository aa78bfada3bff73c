//! sysfence - run a command under a seccomp syscall allow-list
//!
//! Commands:
//!   run [OPTS] -- CMD [ARGS]   Install the filter, then exec CMD
//!   dump [OPTS]                Print the compiled BPF program
//!   check [OPTS] NAME...       Show what the filter does with each syscall
//!   list                       Print the syscall table for this arch
//!   errnos                     Print the errno table
//!   --help                     Show usage

use std::ffi::CString;
use std::path::PathBuf;
use std::process;

use log::LevelFilter;
use sysfence::{arch, errno, syscalls, Action, Policy};

enum Command {
    Run(Vec<String>),
    Dump,
    Check(Vec<String>),
    List,
    Errnos,
}

struct Options {
    policy_file: Option<PathBuf>,
    allow: Vec<String>,
    default_action: Option<Action>,
    /// `Some` only when `--report` or `--no-report` was given.
    report: Option<bool>,
    verbose: bool,
}

fn print_usage() {
    eprintln!("sysfence - run a command under a seccomp syscall allow-list");
    eprintln!();
    eprintln!("Usage: sysfence COMMAND [OPTIONS]");
    eprintln!();
    eprintln!("  run [OPTIONS] -- CMD [ARGS]  Install filter, then exec CMD (execve is allowed)");
    eprintln!("  dump [OPTIONS]               Print the compiled BPF program");
    eprintln!("  check [OPTIONS] NAME...      Evaluate the filter for each syscall");
    eprintln!("  list                         Print the syscall table");
    eprintln!("  errnos                       Print the errno table");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --policy FILE       JSON policy (default: built-in allow-list)");
    eprintln!("  --allow A,B,...     Add syscalls to the allow-list");
    eprintln!("  --errno E           Fail disallowed calls with errno E (name or number)");
    eprintln!("  --kill              Kill the process on disallowed calls (default)");
    eprintln!("  --report            Trap and report (dump/check only; lost across exec)");
    eprintln!("  --no-report         Do not report, even if the policy or build enables it");
    eprintln!("  -v, --verbose       Debug logging");
    eprintln!("  -h, --help          Show this help");
}

fn usage_error(msg: &str) -> ! {
    eprintln!("{msg}");
    print_usage();
    process::exit(2);
}

fn parse_args() -> (Command, Options) {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut opts = Options {
        policy_file: None,
        allow: Vec::new(),
        default_action: None,
        report: None,
        verbose: false,
    };

    let Some(first) = args.first() else {
        print_usage();
        process::exit(2);
    };

    let kind = match first.as_str() {
        "run" | "--run" => "run",
        "dump" | "--dump" => "dump",
        "check" | "--check" => "check",
        "list" | "--list" => return (Command::List, opts),
        "errnos" | "--errnos" => return (Command::Errnos, opts),
        "--help" | "-h" | "help" => {
            print_usage();
            process::exit(0);
        }
        other => usage_error(&format!("Unknown command: {other}")),
    };

    let mut rest: Vec<String> = Vec::new();
    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--" => {
                rest.extend(args[i + 1..].iter().cloned());
                break;
            }
            "--policy" | "--allow" | "--errno" => {
                let Some(value) = args.get(i + 1) else {
                    usage_error(&format!("{arg} requires an argument"));
                };
                match arg {
                    "--policy" => opts.policy_file = Some(PathBuf::from(value)),
                    "--allow" => opts
                        .allow
                        .extend(value.split(',').filter(|s| !s.is_empty()).map(String::from)),
                    _ => match errno::lookup(value) {
                        Some(e) => opts.default_action = Some(Action::errno(e)),
                        None => usage_error(&format!("Unknown errno: {value}")),
                    },
                }
                i += 1;
            }
            "--kill" => opts.default_action = Some(Action::KillProcess),
            "--report" => opts.report = Some(true),
            "--no-report" => opts.report = Some(false),
            "-v" | "--verbose" => opts.verbose = true,
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            _ if arg.starts_with('-') => usage_error(&format!("Unknown option: {arg}")),
            _ => {
                rest.extend(args[i..].iter().cloned());
                break;
            }
        }
        i += 1;
    }

    let command = match kind {
        "run" => {
            if rest.is_empty() {
                usage_error("run requires a command");
            }
            Command::Run(rest)
        }
        "check" => {
            if rest.is_empty() {
                usage_error("check requires at least one syscall name");
            }
            Command::Check(rest)
        }
        _ => Command::Dump,
    };
    (command, opts)
}

fn init_logger(verbose: bool) {
    let env = env_logger::Env::default().filter_or("RUST_LOG", if verbose { "debug" } else { "warn" });
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .filter_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .init();
}

fn load_policy(opts: &Options) -> Policy {
    let mut policy = match &opts.policy_file {
        Some(path) => match Policy::load(path) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Failed to load {}: {e}", path.display());
                process::exit(1);
            }
        },
        None => Policy::default(),
    };
    for name in &opts.allow {
        if !policy.allow.contains(name) {
            policy.allow.push(name.clone());
        }
    }
    if let Some(action) = opts.default_action {
        policy.default_action = action;
    }
    if let Some(report) = opts.report {
        policy.report = report;
    }
    policy
}

fn main() {
    let (command, opts) = parse_args();
    init_logger(opts.verbose);

    let code = match command {
        Command::List => cmd_list(),
        Command::Errnos => cmd_errnos(),
        Command::Dump => cmd_dump(&load_policy(&opts)),
        Command::Check(names) => cmd_check(&load_policy(&opts), &names),
        Command::Run(argv) => cmd_run(load_policy(&opts), opts.report == Some(true), &argv),
    };
    process::exit(code);
}

fn cmd_list() -> i32 {
    let mut entries: Vec<_> = syscalls::all().collect();
    entries.sort_by_key(|e| e.nr);
    println!("# {} syscalls ({})", entries.len(), arch::NAME);
    for entry in entries {
        println!("{:4}  {}", entry.nr, entry.name());
    }
    0
}

fn cmd_errnos() -> i32 {
    for (name, value) in errno::TABLE {
        println!("{value:4}  {name}");
    }
    0
}

fn cmd_dump(policy: &Policy) -> i32 {
    match policy.build() {
        Ok(program) => {
            println!(
                "# {} instructions, {} syscalls, default {}",
                program.len(),
                program.allowed().len(),
                program.default_action()
            );
            print!("{program}");
            0
        }
        Err(e) => {
            eprintln!("{e}");
            1
        }
    }
}

fn cmd_check(policy: &Policy, names: &[String]) -> i32 {
    let program = match policy.build() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };

    let mut code = 0;
    for name in names {
        let Some(nr) = syscalls::number(name) else {
            println!("{name}: unknown on {}", arch::NAME);
            code = 1;
            continue;
        };
        let ret = program.evaluate_native(nr);
        let verdict = match Action::from_ret(ret) {
            Some(Action::Trap) if policy.report => "trap (reported)".to_string(),
            Some(action) => action.to_string(),
            None => format!("{ret:#010x}"),
        };
        println!("{name}({nr}): {verdict}");
    }
    code
}

/// Adjust a policy for `run`. The reporter's handler is lost across exec,
/// so reporting is refused when asked for on the command line and switched
/// off when it only comes from the policy file or the build default.
fn prepare_run(mut policy: Policy, report_requested: bool) -> Result<Policy, &'static str> {
    if report_requested {
        return Err("--report cannot be combined with run: signal handlers do not survive exec");
    }
    if policy.report {
        log::warn!("reporting disabled for run: signal handlers do not survive exec");
        policy.report = false;
    }
    if !policy.allow.iter().any(|s| s == "execve") {
        policy.allow.push("execve".to_string());
    }
    Ok(policy)
}

fn cmd_run(policy: Policy, report_requested: bool, argv: &[String]) -> i32 {
    let policy = match prepare_run(policy, report_requested) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("{msg}");
            return 2;
        }
    };

    let c_args: Vec<CString> = match argv.iter().map(|a| CString::new(a.as_bytes())).collect() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("Arguments must not contain NUL bytes");
            return 2;
        }
    };

    if let Err(e) = sysfence::init(&policy) {
        eprintln!("Failed to install filter: {e}");
        return 1;
    }

    // Only returns on failure
    let err = match nix::unistd::execvp(&c_args[0], &c_args) {
        Ok(never) => match never {},
        Err(e) => e,
    };
    eprintln!("exec {}: {err}", argv[0]);
    127
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_clears_default_reporting() {
        let policy = Policy {
            report: true,
            ..Policy::with_allow(&["read"])
        };
        let policy = prepare_run(policy, false).unwrap();
        assert!(!policy.report);
        assert!(policy.allow.iter().any(|s| s == "execve"));
    }

    #[test]
    fn test_run_refuses_explicit_report() {
        assert!(prepare_run(Policy::with_allow(&["read"]), true).is_err());
    }

    #[test]
    fn test_run_keeps_existing_execve() {
        let policy = prepare_run(Policy::with_allow(&["execve", "read"]), false).unwrap();
        assert_eq!(policy.allow, vec!["execve", "read"]);
    }
}
