//! Shell-script commands used to drive real processes in tests.

use proc_interact::Command;

/// `sh -c <script>`.
pub fn sh(script: &str) -> Command {
    Command::new("sh").arg("-c").arg(script)
}

/// Print each line and exit with `exit_code`.
pub fn print_lines(lines: &[&str], exit_code: i32) -> Command {
    let body: String = lines.iter().map(|l| format!("echo '{l}'; ")).collect();
    sh(&format!("{body}exit {exit_code}"))
}

/// Print `prompt` without a newline, read one line from stdin and echo it
/// back as `got:<line>`.
pub fn prompt_and_echo(prompt: &str) -> Command {
    sh(&format!(
        "printf '{prompt}'; read answer; echo \"got:$answer\""
    ))
}

/// Print `line` and then keep running (and keep stdout open) for a long
/// time.
pub fn print_then_hang(line: &str) -> Command {
    sh(&format!("echo '{line}'; exec sleep 30"))
}

/// A process that runs for a long time without output.
pub fn long_sleep() -> Command {
    Command::new("sleep").arg("30")
}
