//! rJobTracker main entrypoint.

use rjobtracker::run;
use rjobtracker::ui::messages::error;

fn main() {
    if let Err(e) = run() {
        error(format!("Error: {}", e));
        std::process::exit(1);
    }
}
