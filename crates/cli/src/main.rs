use std::process::ExitCode;

fn main() -> ExitCode {
    goldleaf_cli::run()
}
