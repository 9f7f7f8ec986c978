use std::process::ExitCode;

use sector_pledge::app;

fn main() -> ExitCode {
    sector_pledge::logging::init();
    // Fatal errors exit 1 whatever their kind.
    ExitCode::from(app::exit_code(app::rebuild::run(), Some(1)))
}
