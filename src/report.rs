use crate::bayes::NaiveBayesClassifier;
use crate::dataset::Example;
use crate::error::Result;
use crate::labels::{ClassId, LabelSet};
use crate::reference::Deviation;
use std::fmt;

/// Outcome of a test-then-train pass over a stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub labels: LabelSet,
    pub targets: Vec<ClassId>,
    pub predictions: Vec<ClassId>,
    /// What a majority-class (ZeroR) learner would have predicted at each step.
    pub baseline: Vec<ClassId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// One row of the abcd table. For the class under study:
/// a = neither target nor prediction, b = target only, c = prediction only,
/// d = both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Abcd {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub d: usize,
}

/// Runs the stream through `model`, predicting each example before learning
/// from it. Stops at the first error.
pub fn evaluate(model: &mut NaiveBayesClassifier, stream: &[Example]) -> Result<Evaluation> {
    let labels = model.labels()?.clone();
    let mut targets = Vec::with_capacity(stream.len());
    let mut predictions = Vec::with_capacity(stream.len());
    let mut baseline = Vec::with_capacity(stream.len());

    for (i, example) in stream.iter().enumerate() {
        let predicted = model.predict_class(&example.features)?;
        baseline.push(majority(&model.class_counts()?));
        model.update(&example.features, &example.label)?;

        targets.push(labels.require(&example.label)?);
        predictions.push(predicted);

        if (i + 1) % 100 == 0 {
            log::debug!("evaluated {} of {} examples", i + 1, stream.len());
        }
    }

    Ok(Evaluation {
        labels,
        targets,
        predictions,
        baseline,
    })
}

/// Most frequent class so far, earliest label on ties.
fn majority(counts: &[usize]) -> ClassId {
    let (best, _) = counts
        .iter()
        .enumerate()
        .fold((0, 0), |(best, most), (i, &count)| {
            if count > most {
                (i, count)
            } else {
                (best, most)
            }
        });
    ClassId(best)
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

impl Evaluation {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn predicted_labels(&self) -> Vec<&str> {
        self.predictions
            .iter()
            .map(|&id| self.labels.name(id))
            .collect()
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy_of(&self.predictions)
    }

    /// Accuracy of the majority-class baseline over the same stream.
    pub fn baseline_accuracy(&self) -> f64 {
        self.accuracy_of(&self.baseline)
    }

    fn accuracy_of(&self, predictions: &[ClassId]) -> f64 {
        let correct = self
            .targets
            .iter()
            .zip(predictions)
            .filter(|(t, p)| t == p)
            .count();
        ratio(correct as f64, self.len() as f64)
    }

    /// `matrix[target][predicted]`, both in label-set order.
    pub fn confusion_matrix(&self) -> Vec<Vec<usize>> {
        let n = self.labels.len();
        let mut matrix = vec![vec![0; n]; n];
        for (t, p) in self.targets.iter().zip(&self.predictions) {
            matrix[t.0][p.0] += 1;
        }
        matrix
    }

    pub fn abcd(&self) -> Vec<Abcd> {
        self.labels
            .iter()
            .map(|(class, _)| {
                self.targets.iter().zip(&self.predictions).fold(
                    Abcd {
                        a: 0,
                        b: 0,
                        c: 0,
                        d: 0,
                    },
                    |mut acc, (&t, &p)| {
                        match (t == class, p == class) {
                            (false, false) => acc.a += 1,
                            (true, false) => acc.b += 1,
                            (false, true) => acc.c += 1,
                            (true, true) => acc.d += 1,
                        }
                        acc
                    },
                )
            })
            .collect()
    }

    pub fn class_scores(&self) -> Vec<ClassScores> {
        self.abcd()
            .iter()
            .map(|abcd| {
                let precision = abcd.precision();
                let recall = abcd.pd();
                ClassScores {
                    precision,
                    recall,
                    f1: ratio(2.0 * precision * recall, precision + recall),
                    support: abcd.b + abcd.d,
                }
            })
            .collect()
    }

    /// Unweighted mean over classes. Support is the total.
    pub fn macro_avg(&self) -> ClassScores {
        let scores = self.class_scores();
        let n = scores.len() as f64;
        ClassScores {
            precision: scores.iter().map(|s| s.precision).sum::<f64>() / n,
            recall: scores.iter().map(|s| s.recall).sum::<f64>() / n,
            f1: scores.iter().map(|s| s.f1).sum::<f64>() / n,
            support: scores.iter().map(|s| s.support).sum(),
        }
    }

    /// Mean over classes weighted by support.
    pub fn weighted_avg(&self) -> ClassScores {
        let scores = self.class_scores();
        let total: usize = scores.iter().map(|s| s.support).sum();
        let weighted = |f: fn(&ClassScores) -> f64| {
            ratio(
                scores.iter().map(|s| f(s) * s.support as f64).sum(),
                total as f64,
            )
        };
        ClassScores {
            precision: weighted(|s| s.precision),
            recall: weighted(|s| s.recall),
            f1: weighted(|s| s.f1),
            support: total,
        }
    }
}

impl Abcd {
    fn total(&self) -> usize {
        self.a + self.b + self.c + self.d
    }

    pub fn accuracy(&self) -> f64 {
        ratio((self.a + self.d) as f64, self.total() as f64)
    }

    pub fn precision(&self) -> f64 {
        ratio(self.d as f64, (self.c + self.d) as f64)
    }

    /// Probability of detection, i.e. recall.
    pub fn pd(&self) -> f64 {
        ratio(self.d as f64, (self.b + self.d) as f64)
    }

    /// Probability of false alarm.
    pub fn pf(&self) -> f64 {
        ratio(self.c as f64, (self.a + self.c) as f64)
    }

    pub fn f(&self) -> f64 {
        let (prec, pd) = (self.precision(), self.pd());
        ratio(2.0 * prec * pd, prec + pd)
    }

    pub fn g(&self) -> f64 {
        let (pd, pf) = (self.pd(), self.pf());
        ratio(2.0 * pd * (1.0 - pf), 1.0 - pf + pd)
    }
}

/// Per-class precision/recall/F1 table followed by accuracy and averages.
pub struct ClassificationReport<'a>(pub &'a Evaluation);

impl fmt::Display for ClassificationReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eval = self.0;
        let width = eval
            .labels
            .iter()
            .map(|(_, name)| name.len())
            .chain(Some("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for ((_, name), s) in eval.labels.iter().zip(eval.class_scores()) {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, s.precision, s.recall, s.f1, s.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            eval.accuracy(),
            eval.len()
        )?;
        for (name, s) in [
            ("macro avg", eval.macro_avg()),
            ("weighted avg", eval.weighted_avg()),
        ] {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, s.precision, s.recall, s.f1, s.support
            )?;
        }
        Ok(())
    }
}

/// Rows are targets, columns predictions.
pub struct ConfusionReport<'a>(pub &'a Evaluation);

impl fmt::Display for ConfusionReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eval = self.0;
        let width = eval
            .labels
            .iter()
            .map(|(_, name)| name.len())
            .max()
            .unwrap_or(0)
            .max(6);

        write!(f, "{:>width$}", "target")?;
        for (_, name) in eval.labels.iter() {
            write!(f, " {:>width$}", name)?;
        }
        writeln!(f)?;
        for ((_, name), row) in eval.labels.iter().zip(eval.confusion_matrix()) {
            write!(f, "{:>width$}", name)?;
            for count in row {
                write!(f, " {:>width$}", count)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub struct AbcdReport<'a>(pub &'a Evaluation);

impl fmt::Display for AbcdReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eval = self.0;
        writeln!(
            f,
            " {:>5} | {:>5} | {:>5} | {:>5} | {:>5} | {:>4} | {:>4} | {:>4} | {:>4} | {:>4} | {:>4} | class",
            "num", "a", "b", "c", "d", "acc", "pre", "pd", "pf", "f", "g"
        )?;
        writeln!(
            f,
            " {:>5} | {:>5} | {:>5} | {:>5} | {:>5} | {:>4} | {:>4} | {:>4} | {:>4} | {:>4} | {:>4} | -----",
            "----", "----", "----", "----", "----", "----", "----", "----", "----", "----", "----"
        )?;
        for ((_, name), abcd) in eval.labels.iter().zip(eval.abcd()) {
            writeln!(
                f,
                " {:>5} | {:>5} | {:>5} | {:>5} | {:>5} | {:>4.2} | {:>4.2} | {:>4.2} | {:>4.2} | {:>4.2} | {:>4.2} | {}",
                abcd.total(),
                abcd.a,
                abcd.b,
                abcd.c,
                abcd.d,
                abcd.accuracy(),
                abcd.precision(),
                abcd.pd(),
                abcd.pf(),
                abcd.f(),
                abcd.g(),
                name
            )?;
        }
        Ok(())
    }
}

/// Learned (or reference) per-class parameters, one line per class and statistic.
pub struct ParameterTable<'a> {
    pub labels: &'a LabelSet,
    pub feature_names: &'a [String],
    pub means: &'a [Vec<f64>],
    pub variances: &'a [Vec<f64>],
}

impl fmt::Display for ParameterTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .labels
            .iter()
            .map(|(_, name)| name.len())
            .max()
            .unwrap_or(0);

        write!(f, "{:>width$} {:>4}", "", "")?;
        for name in self.feature_names {
            write!(f, " {:>11}", name)?;
        }
        writeln!(f)?;

        for (stat, table) in [("mean", self.means), ("var", self.variances)] {
            for ((_, label), row) in self.labels.iter().zip(table) {
                write!(f, "{:>width$} {:>4}", label, stat)?;
                for value in row {
                    write!(f, " {:>11.5}", value)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// MAE/MAPE lines for means and variances.
pub struct DeviationReport {
    pub means: Deviation,
    pub variances: Deviation,
}

impl fmt::Display for DeviationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MAE for means = {}", self.means.mae)?;
        writeln!(f, "MAE for var = {}", self.variances.mae)?;
        writeln!(f, "MAPE for means = {}", self.means.mape)?;
        writeln!(f, "MAPE for var = {}", self.variances.mape)
    }
}
