use std::env;

use anyhow::{Context, bail};
use log::info;

use training_engine::{
    config::RunConfig,
    dataset::{BatchSource, create_dataloaders},
    training::TrainerBuilder,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let Some(path) = env::args().nth(1) else {
        bail!("usage: training_engine <config.json>");
    };

    let config =
        RunConfig::load(&path).with_context(|| format!("failed to load config '{path}'"))?;

    let (mut train_loader, mut test_loader, classes) = create_dataloaders(
        &config.train_dir,
        &config.test_dir,
        &config.decoder,
        config.batch_size,
        config.num_workers,
        config.seed,
    )
    .context("failed to load the datasets")?;

    let features = train_loader.dataset().features();
    config.validate(features, classes.len())?;
    info!(
        "loaded {} train batches and {} test batches over classes {classes:?}",
        train_loader.len(),
        test_loader.len()
    );

    let mut run = TrainerBuilder::new().build(&config)?;
    let history = run.run(&mut train_loader, &mut test_loader)?;

    println!("{}", serde_json::to_string_pretty(&history)?);
    Ok(())
}
