use std::process::ExitCode;

use structopt::StructOpt;

use sttp_decode::{exit_code_for, run, Opt};

fn main() -> ExitCode {
    let opt = Opt::from_args();
    match run(opt) {
        Ok(()) => ExitCode::from(0),
        Err(err) => {
            eprintln!("sttp-decode: {:#}", err);
            ExitCode::from(exit_code_for(&err))
        }
    }
}
