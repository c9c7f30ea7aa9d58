use clipbake::{
    cb_error::CbError,
    convert,
    options::{self, USAGE},
};
use log::{error, info};
use std::process::ExitCode;

fn run() -> Result<(), CbError> {
    let cli = options::parse_args(std::env::args().skip(1))?;
    cli.validate()?;
    let options = cli.options()?;
    let written = convert::convert_file(&cli, &options)?;
    info!("Done, {} files written", written.len());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            if matches!(e, CbError::MissingInput | CbError::UnknownOption(_)) {
                eprintln!("{USAGE}");
            }
            ExitCode::from(e.kind().exit_code())
        }
    }
}
