use crate::dataset::Example;
use crate::error::{BayesError, Result};
use crate::labels::{ClassId, LabelSet};
use crate::stats::RunningMoments;
use std::f64::consts::PI;

pub const DEFAULT_VAR_SMOOTHING: f64 = 1e-9;

/// Gaussian Naive Bayes that learns one example at a time.
///
/// The estimator starts out uninitialized. `initialize` fixes the label set and
/// the feature dimensionality from a first batch; after that `predict` and
/// `update` may be interleaved freely. Per-class statistics are kept as running
/// moments, so an update never revisits earlier examples.
#[derive(Debug, Clone)]
pub struct NaiveBayesClassifier {
    var_smoothing: f64,
    state: State,
}

#[derive(Debug, Clone)]
enum State {
    Uninitialized,
    Ready(Model),
}

#[derive(Debug, Clone)]
struct Model {
    labels: LabelSet,
    classes: Vec<RunningMoments>,
    // Every example seen, all classes pooled. Only used to scale the smoothing.
    pooled: RunningMoments,
}

impl Default for NaiveBayesClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NaiveBayesClassifier {
    pub fn new() -> Self {
        NaiveBayesClassifier {
            var_smoothing: DEFAULT_VAR_SMOOTHING,
            state: State::Uninitialized,
        }
    }

    /// Fraction of the largest feature variance added to every variance when
    /// scoring. Must be positive and finite.
    pub fn with_var_smoothing(mut self, var_smoothing: f64) -> Result<Self> {
        if !(var_smoothing.is_finite() && var_smoothing > 0.0) {
            return Err(BayesError::InvalidVarSmoothing(var_smoothing));
        }
        self.var_smoothing = var_smoothing;
        Ok(self)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// Computes the starting statistics from `batch`. Labels missing from the
    /// batch still get a class, with zero mean, variance and count.
    ///
    /// Nothing is modified unless the whole batch is valid.
    pub fn initialize(&mut self, batch: &[Example], labels: LabelSet) -> Result<()> {
        if self.is_ready() {
            return Err(BayesError::AlreadyInitialized);
        }
        let first = batch.first().ok_or(BayesError::EmptyBatch)?;
        let n_features = first.features.len();

        // Validate everything before touching state:
        let mut ids = Vec::with_capacity(batch.len());
        for example in batch {
            check_features(n_features, &example.features)?;
            ids.push(labels.require(&example.label)?);
        }

        let mut model = Model {
            classes: vec![RunningMoments::new(n_features); labels.len()],
            pooled: RunningMoments::new(n_features),
            labels,
        };
        for (example, id) in batch.iter().zip(ids) {
            model.push(id, &example.features);
        }

        log::debug!(
            "initialized with {} examples, {} features, class counts {:?}",
            batch.len(),
            n_features,
            model.counts()
        );
        self.state = State::Ready(model);

        Ok(())
    }

    /// Folds one labelled example into the running statistics of its class.
    pub fn update(&mut self, features: &[f64], label: &str) -> Result<()> {
        let model = self.model_mut()?;
        check_features(model.n_features(), features)?;
        let id = model.labels.require(label)?;
        model.push(id, features);

        Ok(())
    }

    /// Updates with a batch of examples, in order. The batch is checked up
    /// front, so an invalid example leaves the model untouched.
    pub fn partial_fit(&mut self, batch: &[Example]) -> Result<()> {
        let model = self.model_mut()?;
        let ids = batch
            .iter()
            .map(|example| {
                check_features(model.n_features(), &example.features)?;
                model.labels.require(&example.label)
            })
            .collect::<Result<Vec<_>>>()?;

        for (example, id) in batch.iter().zip(ids) {
            model.push(id, &example.features);
        }

        Ok(())
    }

    /// Returns the most probable label for `features`.
    pub fn predict(&self, features: &[f64]) -> Result<&str> {
        let id = self.predict_class(features)?;
        Ok(self.model()?.labels.name(id))
    }

    pub fn predict_class(&self, features: &[f64]) -> Result<ClassId> {
        let scores = self.joint_log_likelihood(features)?;

        // Strict comparison keeps the earliest label on ties:
        let (best, _) = scores.iter().enumerate().fold(
            (None, f64::NEG_INFINITY),
            |(best, best_score), (i, &score)| {
                if best.is_none() || score > best_score {
                    (Some(i), score)
                } else {
                    (best, best_score)
                }
            },
        );

        Ok(ClassId(best.unwrap_or(0)))
    }

    /// Per class, `ln P(c) + sum_j ln N(x_j; mean_cj, var_cj + epsilon)`.
    /// Classes that have not been seen yet score negative infinity.
    pub fn joint_log_likelihood(&self, features: &[f64]) -> Result<Vec<f64>> {
        let model = self.model()?;
        check_features(model.n_features(), features)?;

        let total = model.pooled.count() as f64;
        let epsilon = model.epsilon(self.var_smoothing);

        let scores = model
            .classes
            .iter()
            .map(|class| {
                if class.count() == 0 {
                    return f64::NEG_INFINITY;
                }
                let log_prior = (class.count() as f64 / total).ln();
                let log_likelihood = features
                    .iter()
                    .zip(class.mean())
                    .zip(class.variance())
                    .fold(0.0, |acc, ((&x, &mean), var)| {
                        let var = var + epsilon;
                        acc - 0.5 * (2.0 * PI * var).ln() - (x - mean).powi(2) / (2.0 * var)
                    });
                log_prior + log_likelihood
            })
            .collect();

        Ok(scores)
    }

    pub fn labels(&self) -> Result<&LabelSet> {
        Ok(&self.model()?.labels)
    }

    pub fn n_features(&self) -> Result<usize> {
        Ok(self.model()?.n_features())
    }

    pub fn class_counts(&self) -> Result<Vec<usize>> {
        Ok(self.model()?.counts())
    }

    /// Per-class feature means, rows in label-set order.
    pub fn class_means(&self) -> Result<Vec<Vec<f64>>> {
        Ok(self
            .model()?
            .classes
            .iter()
            .map(|class| class.mean().to_vec())
            .collect())
    }

    /// Per-class population variances, rows in label-set order. No smoothing.
    pub fn class_variances(&self) -> Result<Vec<Vec<f64>>> {
        Ok(self
            .model()?
            .classes
            .iter()
            .map(|class| class.variance())
            .collect())
    }

    fn model(&self) -> Result<&Model> {
        match &self.state {
            State::Ready(model) => Ok(model),
            State::Uninitialized => Err(BayesError::NotInitialized),
        }
    }

    fn model_mut(&mut self) -> Result<&mut Model> {
        match &mut self.state {
            State::Ready(model) => Ok(model),
            State::Uninitialized => Err(BayesError::NotInitialized),
        }
    }
}

impl Model {
    fn n_features(&self) -> usize {
        self.pooled.mean().len()
    }

    fn counts(&self) -> Vec<usize> {
        self.classes.iter().map(RunningMoments::count).collect()
    }

    fn push(&mut self, id: ClassId, features: &[f64]) {
        self.classes[id.0].push(features);
        self.pooled.push(features);
    }

    fn epsilon(&self, var_smoothing: f64) -> f64 {
        let max_var = self.pooled.variance().into_iter().fold(0.0, f64::max);
        if max_var > 0.0 {
            var_smoothing * max_var
        } else {
            // Every feature constant so far; still keep the densities finite.
            var_smoothing
        }
    }
}

fn check_features(expected: usize, features: &[f64]) -> Result<()> {
    if features.len() != expected {
        return Err(BayesError::DimensionMismatch {
            expected,
            got: features.len(),
        });
    }
    // One NaN would poison a class's moments for the rest of the run.
    match features.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(BayesError::NonFiniteFeature {
            index,
            value: features[index],
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::stats::batch_moments;
    use approx::assert_relative_eq;

    pub(crate) fn example(features: &[f64], label: &str) -> Example {
        Example {
            features: features.to_vec(),
            label: label.to_string(),
        }
    }

    /// Two overlapping Gaussian-ish clouds labelled "A" and "B", generated
    /// from a fixed LCG so every run sees the same stream.
    pub(crate) fn synthetic_stream(n: usize) -> Vec<Example> {
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            seed = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (seed >> 11) as f64 / (1u64 << 53) as f64
        };

        (0..n)
            .map(|_| {
                let is_b = next() < 0.4;
                let shift = if is_b { 1.5 } else { 0.0 };
                let features = vec![
                    shift + next() * 2.0,
                    10.0 + 3.0 * shift + next() * 5.0,
                    next() - shift * 0.5,
                ];
                Example {
                    features,
                    label: if is_b { "B" } else { "A" }.to_string(),
                }
            })
            .collect()
    }

    fn ab() -> LabelSet {
        LabelSet::new(["A", "B"]).unwrap()
    }

    fn rows_of<'a>(examples: &'a [Example], label: &str) -> Vec<&'a [f64]> {
        examples
            .iter()
            .filter(|e| e.label == label)
            .map(|e| e.features.as_slice())
            .collect()
    }

    #[test]
    fn predict_and_update_require_initialize() {
        let mut nb = NaiveBayesClassifier::new();
        assert!(!nb.is_ready());
        assert_eq!(nb.predict(&[1.0]), Err(BayesError::NotInitialized));
        assert_eq!(nb.update(&[1.0], "A"), Err(BayesError::NotInitialized));
        assert_eq!(nb.class_means(), Err(BayesError::NotInitialized));
    }

    #[test]
    fn initialize_rejects_bad_batches() {
        let mut nb = NaiveBayesClassifier::new();
        assert_eq!(nb.initialize(&[], ab()), Err(BayesError::EmptyBatch));

        let ragged = [example(&[1.0, 2.0], "A"), example(&[1.0], "B")];
        assert_eq!(
            nb.initialize(&ragged, ab()),
            Err(BayesError::DimensionMismatch {
                expected: 2,
                got: 1
            })
        );

        let foreign = [example(&[1.0], "A"), example(&[1.0], "C")];
        assert_eq!(
            nb.initialize(&foreign, ab()),
            Err(BayesError::UnknownLabel("C".to_string()))
        );
        assert!(!nb.is_ready());

        nb.initialize(&[example(&[1.0], "A")], ab()).unwrap();
        assert_eq!(
            nb.initialize(&[example(&[1.0], "A")], ab()),
            Err(BayesError::AlreadyInitialized)
        );
    }

    #[test]
    fn initialize_matches_batch_statistics() {
        let stream = synthetic_stream(30);
        let mut nb = NaiveBayesClassifier::new();
        nb.initialize(&stream, ab()).unwrap();

        let means = nb.class_means().unwrap();
        let vars = nb.class_variances().unwrap();
        for (id, label) in ab().iter() {
            let (mean, var) = batch_moments(&rows_of(&stream, label), 3);
            for j in 0..3 {
                assert_relative_eq!(means[id.0][j], mean[j], epsilon = 1e-12);
                assert_relative_eq!(vars[id.0][j], var[j], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn absent_class_starts_at_zero() {
        let mut nb = NaiveBayesClassifier::new();
        let batch = [example(&[1.0, 2.0], "A"), example(&[3.0, 6.0], "A")];
        nb.initialize(&batch, ab()).unwrap();

        assert_eq!(nb.class_counts().unwrap(), vec![2, 0]);
        assert_eq!(nb.class_means().unwrap()[1], vec![0.0, 0.0]);
        assert_eq!(nb.class_variances().unwrap()[1], vec![0.0, 0.0]);
        // An unseen class can't win.
        assert_eq!(nb.predict(&[100.0, -50.0]).unwrap(), "A");

        // ...until it has been seen.
        nb.update(&[100.0, -50.0], "B").unwrap();
        assert_eq!(nb.class_counts().unwrap(), vec![2, 1]);
        assert_eq!(nb.predict(&[100.0, -50.0]).unwrap(), "B");
    }

    #[test]
    fn incremental_updates_match_a_single_batch_pass() {
        let stream = synthetic_stream(250);
        let (head, tail) = stream.split_at(30);

        let mut nb = NaiveBayesClassifier::new();
        nb.initialize(head, ab()).unwrap();
        for e in tail {
            nb.update(&e.features, &e.label).unwrap();
        }

        let means = nb.class_means().unwrap();
        let vars = nb.class_variances().unwrap();
        let counts = nb.class_counts().unwrap();
        for (id, label) in ab().iter() {
            let rows = rows_of(&stream, label);
            assert_eq!(counts[id.0], rows.len());
            let (mean, var) = batch_moments(&rows, 3);
            for j in 0..3 {
                assert_relative_eq!(means[id.0][j], mean[j], epsilon = 1e-9);
                assert_relative_eq!(vars[id.0][j], var[j], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn partial_fit_equals_repeated_updates() {
        let stream = synthetic_stream(80);
        let (head, tail) = stream.split_at(30);

        let mut one_by_one = NaiveBayesClassifier::new();
        one_by_one.initialize(head, ab()).unwrap();
        for e in tail {
            one_by_one.update(&e.features, &e.label).unwrap();
        }

        let mut batched = NaiveBayesClassifier::new();
        batched.initialize(head, ab()).unwrap();
        batched.partial_fit(tail).unwrap();

        assert_eq!(one_by_one.class_means(), batched.class_means());
        assert_eq!(one_by_one.class_variances(), batched.class_variances());
    }

    #[test]
    fn partial_fit_is_all_or_nothing() {
        let mut nb = NaiveBayesClassifier::new();
        nb.initialize(&synthetic_stream(30), ab()).unwrap();
        let before = nb.class_counts().unwrap();

        let batch = [example(&[0.0, 0.0, 0.0], "A"), example(&[0.0, 0.0, 0.0], "Z")];
        assert_eq!(
            nb.partial_fit(&batch),
            Err(BayesError::UnknownLabel("Z".to_string()))
        );
        assert_eq!(nb.class_counts().unwrap(), before);
    }

    #[test]
    fn update_rejects_unknown_label_and_wrong_width() {
        let mut nb = NaiveBayesClassifier::new();
        nb.initialize(&synthetic_stream(30), ab()).unwrap();

        assert_eq!(
            nb.update(&[0.0, 0.0, 0.0], "tested_positive"),
            Err(BayesError::UnknownLabel("tested_positive".to_string()))
        );
        assert_eq!(
            nb.update(&[0.0], "A"),
            Err(BayesError::DimensionMismatch {
                expected: 3,
                got: 1
            })
        );
        assert_eq!(
            nb.predict(&[0.0, 0.0, 0.0, 0.0]),
            Err(BayesError::DimensionMismatch {
                expected: 3,
                got: 4
            })
        );
    }

    #[test]
    fn ties_go_to_the_first_label() {
        // Mirror-image classes, query at the midpoint:
        let batch = [
            example(&[-1.0], "B"),
            example(&[-3.0], "B"),
            example(&[1.0], "A"),
            example(&[3.0], "A"),
        ];
        let mut nb = NaiveBayesClassifier::new();
        nb.initialize(&batch, ab()).unwrap();
        assert_eq!(nb.predict(&[0.0]).unwrap(), "A");

        let mut flipped = NaiveBayesClassifier::new();
        flipped
            .initialize(&batch, LabelSet::new(["B", "A"]).unwrap())
            .unwrap();
        assert_eq!(flipped.predict(&[0.0]).unwrap(), "B");
    }

    #[test]
    fn prior_breaks_likelihood_ties() {
        let batch = [
            example(&[0.0], "A"),
            example(&[2.0], "A"),
            example(&[0.0], "B"),
            example(&[2.0], "B"),
            example(&[0.0], "B"),
            example(&[2.0], "B"),
        ];
        let mut nb = NaiveBayesClassifier::new();
        nb.initialize(&batch, ab()).unwrap();

        let scores = nb.joint_log_likelihood(&[1.0]).unwrap();
        assert_relative_eq!(scores[1] - scores[0], (4.0f64 / 2.0).ln(), epsilon = 1e-9);
        assert_eq!(nb.predict(&[1.0]).unwrap(), "B");
    }

    #[test]
    fn constant_features_stay_finite() {
        let batch = [example(&[5.0, 5.0], "A"), example(&[5.0, 5.0], "B")];
        let mut nb = NaiveBayesClassifier::new();
        nb.initialize(&batch, ab()).unwrap();

        let scores = nb.joint_log_likelihood(&[5.0, 5.0]).unwrap();
        assert!(scores.iter().all(|s| s.is_finite()));
        assert_eq!(nb.predict(&[5.0, 5.0]).unwrap(), "A");
    }

    #[test]
    fn separable_classes_are_learned() {
        let mut nb = NaiveBayesClassifier::new().with_var_smoothing(1e-6).unwrap();
        let batch = [
            example(&[0.0, 0.1], "A"),
            example(&[0.2, -0.1], "A"),
            example(&[10.0, 9.9], "B"),
            example(&[9.8, 10.1], "B"),
        ];
        nb.initialize(&batch, ab()).unwrap();
        assert_eq!(nb.predict(&[0.1, 0.0]).unwrap(), "A");
        assert_eq!(nb.predict(&[9.9, 10.0]).unwrap(), "B");
    }

    #[test]
    fn non_finite_features_are_rejected() {
        let batch = [
            example(&[0.0], "A"),
            example(&[1.0], "A"),
            example(&[10.0], "B"),
            example(&[11.0], "B"),
        ];
        let mut nb = NaiveBayesClassifier::new();
        nb.initialize(&batch, ab()).unwrap();

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                nb.update(&[bad], "B"),
                Err(BayesError::NonFiniteFeature { index: 0, .. })
            ));
            assert!(matches!(
                nb.predict(&[bad]),
                Err(BayesError::NonFiniteFeature { index: 0, .. })
            ));
        }
        assert_eq!(nb.class_counts().unwrap(), vec![2, 2]);

        // Class B is still healthy and keeps winning near its mean.
        for _ in 0..3 {
            assert_eq!(nb.predict(&[10.5]).unwrap(), "B");
            nb.update(&[10.5], "B").unwrap();
        }
        assert!(nb.class_means().unwrap()[1][0].is_finite());

        let mut fresh = NaiveBayesClassifier::new();
        let poisoned = [example(&[0.0, 1.0], "A"), example(&[2.0, f64::NAN], "B")];
        assert!(matches!(
            fresh.initialize(&poisoned, ab()),
            Err(BayesError::NonFiniteFeature { index: 1, .. })
        ));
        assert!(!fresh.is_ready());

        fresh.initialize(&batch, ab()).unwrap();
        assert!(matches!(
            fresh.partial_fit(&[example(&[f64::INFINITY], "A")]),
            Err(BayesError::NonFiniteFeature { .. })
        ));
    }

    #[test]
    fn var_smoothing_must_be_positive() {
        for bad in [0.0, -1e-9, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                NaiveBayesClassifier::new().with_var_smoothing(bad),
                Err(BayesError::InvalidVarSmoothing(_))
            ));
        }
        assert!(NaiveBayesClassifier::new().with_var_smoothing(1e-3).is_ok());
    }
}
