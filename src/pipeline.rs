use crate::bayes::NaiveBayesClassifier;
use crate::dataset::Dataset;
use crate::labels::LabelSet;
use crate::reference::{Deviation, ReferenceParams};
use crate::report::{
    self, AbcdReport, ClassificationReport, ConfusionReport, DeviationReport, Evaluation,
    ParameterTable,
};
use anyhow::{Context, Result};
use std::io::Write;

/// Knobs of one run, independent of where they came from.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub warmup: usize,
    pub labels: Option<Vec<String>>,
    pub var_smoothing: f64,
}

/// A trained model together with its test-then-train record.
pub struct Outcome {
    pub model: NaiveBayesClassifier,
    pub evaluation: Evaluation,
}

/// Seeds a model with the first `warmup` examples and streams the rest.
pub fn run(dataset: &Dataset, opts: &RunOptions) -> Result<Outcome> {
    let labels = match &opts.labels {
        Some(labels) => LabelSet::new(labels.iter().map(|label| label.trim().to_string())),
        None => LabelSet::new(dataset.discover_labels()),
    }
    .context("no usable class labels")?;

    // The first examples seed the model, the rest are streamed:
    let warmup = opts.warmup.min(dataset.examples.len());
    let (batch, stream) = dataset.examples.split_at(warmup);
    if stream.is_empty() {
        log::warn!("warm-up consumed the whole dataset, nothing left to stream");
    }

    let mut model = NaiveBayesClassifier::new().with_var_smoothing(opts.var_smoothing)?;
    model
        .initialize(batch, labels)
        .context("failed to initialize the model")?;
    log::info!("initialized on {} examples, streaming {}", batch.len(), stream.len());

    let evaluation = report::evaluate(&mut model, stream).context("streaming evaluation stopped")?;

    Ok(Outcome { model, evaluation })
}

/// Writes the full text report of a run.
pub fn write_report<W: Write>(
    out: &mut W,
    dataset: &Dataset,
    outcome: &Outcome,
    reference: Option<&ReferenceParams>,
    show_predictions: bool,
) -> Result<()> {
    let Outcome { model, evaluation } = outcome;

    if show_predictions {
        writeln!(out, "{:?}", evaluation.predicted_labels())?;
    }
    writeln!(out, "{}", ClassificationReport(evaluation))?;
    writeln!(out, "Accuracy = {}", evaluation.accuracy())?;
    writeln!(out, "Majority-class baseline accuracy = {}", evaluation.baseline_accuracy())?;
    writeln!(out)?;
    writeln!(out, "{}", ConfusionReport(evaluation))?;
    writeln!(out, "{}", AbcdReport(evaluation))?;

    let means = model.class_means()?;
    let variances = model.class_variances()?;
    writeln!(
        out,
        "{}",
        ParameterTable {
            labels: model.labels()?,
            feature_names: &dataset.feature_names,
            means: &means,
            variances: &variances,
        }
    )?;

    if let Some(reference) = reference {
        write!(
            out,
            "{}",
            DeviationReport {
                means: Deviation::between(&means, &reference.means),
                variances: Deviation::between(&variances, &reference.variances),
            }
        )?;
    }

    Ok(())
}
