use std::process::ExitCode;

fn main() -> ExitCode {
    parlant_console_cli::run()
}
