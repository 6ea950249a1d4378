use std::process::ExitCode;

fn main() -> ExitCode {
    certdesk_cli::run()
}
