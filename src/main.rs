use std::process::ExitCode;

fn main() -> ExitCode {
    match spx_signals::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
