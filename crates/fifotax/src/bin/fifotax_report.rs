//! fifotax-report - Capital gains report from a broker transaction history.

fn main() -> std::process::ExitCode {
    fifotax::cmd::report_cmd::main()
}
