use std::process::ExitCode;

fn main() -> ExitCode {
    match geni_lib::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("geni: {e}");
            ExitCode::FAILURE
        }
    }
}
