//! Binary entrypoint for the `backhaul` command.

use std::process;

fn main() {
    let exit_code = backhaul_cli::run();
    if exit_code != 0 {
        process::exit(exit_code);
    }
}
