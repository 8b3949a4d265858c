use std::process::ExitCode;

fn main() -> ExitCode {
    match mirac_drv::run(std::env::args().skip(1)) {
        Ok(code) => ExitCode::from(code as u8),
        Err(error) => {
            eprintln!("error: {:#}", error);
            ExitCode::from(mirac_drv::EXIT_USAGE as u8)
        }
    }
}
