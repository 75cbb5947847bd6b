//! metalens binary entry point.

use metalens_mask::cli;
use metalens_mask::ui::output;

fn main() {
    if let Err(err) = cli::run() {
        output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
