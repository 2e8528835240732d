pub mod bayes;
pub mod config;
pub mod dataset;
pub mod error;
pub mod labels;
pub mod pipeline;
pub mod reference;
pub mod report;
pub mod stats;

pub use bayes::NaiveBayesClassifier;
pub use dataset::{Dataset, Example};
pub use error::BayesError;
pub use labels::{ClassId, LabelSet};
