use std::process::ExitCode;

use sector_pledge::app;

fn main() -> ExitCode {
    sector_pledge::logging::init();
    ExitCode::from(app::exit_code(app::report::run(), None))
}
