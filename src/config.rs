use crate::bayes::DEFAULT_VAR_SMOOTHING;
use crate::pipeline::RunOptions;
use anyhow::{ensure, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "online-bayes")]
#[command(about = "Test-then-train evaluation of an online Gaussian Naive Bayes classifier")]
pub struct Args {
    /// CSV dataset: numeric feature columns followed by a class column
    pub dataset: PathBuf,

    /// Number of leading examples used to initialize the model
    #[arg(short, long, default_value_t = 30)]
    pub warmup: usize,

    /// Comma separated class labels (default: labels in order of first appearance)
    #[arg(short, long, value_delimiter = ',')]
    pub labels: Option<Vec<String>>,

    /// CSV of reference per-class means and variances to compare against
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Fraction of the largest feature variance added to variances when scoring
    #[arg(long, default_value_t = DEFAULT_VAR_SMOOTHING)]
    pub var_smoothing: f64,

    /// Print the label predicted for every streamed example
    #[arg(long)]
    pub show_predictions: bool,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.warmup > 0, "--warmup must be at least 1");
        ensure!(
            self.var_smoothing.is_finite() && self.var_smoothing > 0.0,
            "--var-smoothing must be a positive number, got {}",
            self.var_smoothing
        );
        Ok(())
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            warmup: self.warmup,
            labels: self.labels.clone(),
            var_smoothing: self.var_smoothing,
        }
    }
}
