use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::{collections::HashSet, io, path::Path};

/// One labelled row: every column but the last is a feature, the last is the class.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub features: Vec<f64>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub examples: Vec<Example>,
}

impl Dataset {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open dataset {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("failed to read {}", path.display()))
    }

    pub fn from_reader<R: io::Read>(rdr: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(rdr);

        let headers = reader.headers()?.clone();
        if headers.len() < 2 {
            bail!("need at least one feature column and a label column");
        }
        let feature_names = headers
            .iter()
            .take(headers.len() - 1)
            .map(str::to_string)
            .collect();

        let mut examples = Vec::new();
        for record in reader.records() {
            let record = record?;
            examples.push(parse_example(&record)?);
        }

        Ok(Dataset {
            feature_names,
            examples,
        })
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Distinct labels in order of first appearance.
    pub fn discover_labels(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.examples
            .iter()
            .filter(|example| seen.insert(example.label.as_str()))
            .map(|example| example.label.clone())
            .collect()
    }
}

fn parse_example(record: &StringRecord) -> Result<Example> {
    let line = record.position().map_or(0, |pos| pos.line());
    let (label, features) = match record.iter().collect::<Vec<_>>().split_last() {
        Some((&label, features)) => (label, features.to_vec()),
        None => bail!("line {}: empty record", line),
    };
    if label.is_empty() {
        bail!("line {}: missing class label", line);
    }

    let features = features
        .iter()
        .enumerate()
        .map(|(col, value)| -> Result<f64> {
            let x = value
                .parse::<f64>()
                .with_context(|| format!("line {}: column {} is not a number: {:?}", line, col + 1, value))?;
            if !x.is_finite() {
                bail!("line {}: column {} is not finite: {:?}", line, col + 1, value);
            }
            Ok(x)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Example {
        features,
        label: label.to_string(),
    })
}
