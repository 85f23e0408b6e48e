use log::error;
use crate::initialization::init;

mod calendar;
mod config;
mod errors;
mod forecast;
mod initialization;
mod models;
mod predictor;
mod weather_decoding;
mod weather_matching;
mod worker;

fn main() -> anyhow::Result<()> {
    let (config, model) = init()?;

    if let Err(e) = worker::run(&config, &model) {
        error!("{}", e);
        return Err(e.into());
    }

    Ok(())
}
