use anyhow::Result;
use clap::Parser;
use online_bayes::{config::Args, pipeline, reference::ReferenceParams, Dataset};

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();
    args.validate()?;

    let dataset = Dataset::load(&args.dataset)?;
    log::info!(
        "loaded {} examples with {} features from {}",
        dataset.examples.len(),
        dataset.n_features(),
        args.dataset.display()
    );

    let outcome = pipeline::run(&dataset, &args.run_options())?;

    let reference = match &args.reference {
        Some(path) => Some(ReferenceParams::load(
            path,
            outcome.model.labels()?,
            outcome.model.n_features()?,
        )?),
        None => None,
    };

    let stdout = std::io::stdout();
    pipeline::write_report(
        &mut stdout.lock(),
        &dataset,
        &outcome,
        reference.as_ref(),
        args.show_predictions,
    )?;

    Ok(())
}
