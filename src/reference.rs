use crate::labels::LabelSet;
use anyhow::{bail, ensure, Context, Result};
use csv::{ReaderBuilder, Trim};
use std::{io, path::Path};

/// Externally supplied per-class means and variances to compare a trained
/// model against. Rows are aligned with the label set.
///
/// File layout, one row per class and statistic:
///
/// ```text
/// label,stat,preg,plas,...
/// tested_positive,mean,4.86,141.2,...
/// tested_positive,var,13.99,1020.1,...
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceParams {
    pub means: Vec<Vec<f64>>,
    pub variances: Vec<Vec<f64>>,
}

/// Mean absolute error and mean absolute percentage error of one parameter table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deviation {
    pub mae: f64,
    pub mape: f64,
}

impl ReferenceParams {
    pub fn load<P: AsRef<Path>>(path: P, labels: &LabelSet, n_features: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open reference file {}", path.display()))?;
        Self::from_reader(file, labels, n_features)
            .with_context(|| format!("bad reference file {}", path.display()))
    }

    pub fn from_reader<R: io::Read>(rdr: R, labels: &LabelSet, n_features: usize) -> Result<Self> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(rdr);

        let mut means = vec![None; labels.len()];
        let mut variances = vec![None; labels.len()];
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |pos| pos.line());

            let label = record.get(0).context("missing label column")?;
            let stat = record.get(1).context("missing stat column")?;
            let Some(id) = labels.id(label) else {
                log::warn!("line {}: ignoring reference row for unknown label {:?}", line, label);
                continue;
            };

            let values = record
                .iter()
                .skip(2)
                .map(|value| {
                    value
                        .parse::<f64>()
                        .with_context(|| format!("line {}: not a number: {:?}", line, value))
                })
                .collect::<Result<Vec<_>>>()?;
            ensure!(
                values.len() == n_features,
                "line {}: {} values, model has {} features",
                line,
                values.len(),
                n_features
            );

            let slot = match stat {
                "mean" => &mut means[id.0],
                "var" => &mut variances[id.0],
                other => bail!("line {}: unknown stat {:?}, expected mean or var", line, other),
            };
            ensure!(slot.is_none(), "line {}: duplicate {} row for {:?}", line, stat, label);
            *slot = Some(values);
        }

        let collect = |rows: Vec<Option<Vec<f64>>>, stat: &str| {
            rows.into_iter()
                .zip(labels.iter())
                .map(|(row, (_, label))| {
                    row.with_context(|| format!("no {} row for label {:?}", stat, label))
                })
                .collect::<Result<Vec<_>>>()
        };

        Ok(ReferenceParams {
            means: collect(means, "mean")?,
            variances: collect(variances, "var")?,
        })
    }
}

impl Deviation {
    /// Compares `learned` against `reference` entry by entry. MAPE is taken
    /// relative to the learned value; entries where that is zero are left out.
    pub fn between(learned: &[Vec<f64>], reference: &[Vec<f64>]) -> Self {
        let pairs = learned
            .iter()
            .zip(reference)
            .flat_map(|(l, r)| l.iter().zip(r.iter()));

        let (mut abs_sum, mut n) = (0.0, 0usize);
        let (mut pct_sum, mut n_pct) = (0.0, 0usize);
        for (&l, &r) in pairs {
            abs_sum += (l - r).abs();
            n += 1;
            if l != 0.0 {
                pct_sum += ((l - r) / l).abs();
                n_pct += 1;
            }
        }

        Deviation {
            mae: if n > 0 { abs_sum / n as f64 } else { f64::NAN },
            mape: if n_pct > 0 {
                pct_sum / n_pct as f64 * 100.0
            } else {
                f64::NAN
            },
        }
    }
}
