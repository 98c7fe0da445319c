//! Binary logistic regression over sparse TF-IDF vectors.
//!
//! The model minimizes the mean log loss plus an L2 penalty
//! `||w||^2 / (2 * C * n)` (the intercept is not penalized) with L-BFGS.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::corpus::Sentiment;
use crate::error::{Result, TweetSentError};
use crate::vectorizer::SparseVector;

pub const DEFAULT_C: f64 = 1.0;
pub const DEFAULT_MAX_ITER: usize = 1000;
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Number of correction pairs kept by L-BFGS.
const HISTORY_SIZE: usize = 10;
/// Sufficient-decrease constant of the Armijo line search.
const ARMIJO: f64 = 1e-4;
const MAX_LINE_SEARCH_STEPS: usize = 50;

/// Learned state of a [`LogisticRegression`]: what the model artifact holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    /// One weight per vocabulary column.
    pub weights: Vec<f64>,
    pub intercept: f64,
    /// Optimizer iterations used during training.
    pub n_iter: usize,
}

/// Logistic regression classifier for Positive/Negative sentiment.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    /// Inverse regularization strength.
    pub c: f64,
    pub max_iter: usize,
    /// Stop once the largest absolute gradient component falls below this.
    pub tolerance: f64,
    state: Option<ModelState>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(DEFAULT_C, DEFAULT_MAX_ITER, DEFAULT_TOLERANCE)
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let exp_z = z.exp();
        exp_z / (1.0 + exp_z)
    }
}

/// `ln(1 + e^z)` without overflow.
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0f64, |m, x| m.max(x.abs()))
}

/// Training data bound to the objective. Parameters are laid out as
/// `[w_0, ..., w_{d-1}, b]`.
struct Objective<'a> {
    x: &'a [SparseVector],
    y: Vec<f64>,
    dim: usize,
    l2: f64,
}

impl Objective<'_> {
    /// Returns the loss and its gradient at `params`.
    fn evaluate(&self, params: &[f64]) -> (f64, Vec<f64>) {
        let n = self.x.len() as f64;
        let (weights, intercept) = params.split_at(self.dim);
        let intercept = intercept[0];

        let mut loss = 0.0;
        let mut grad = vec![0.0; self.dim + 1];
        for (row, &target) in self.x.iter().zip(&self.y) {
            let z = row.dot(weights) + intercept;
            loss += softplus(z) - target * z;
            let residual = sigmoid(z) - target;
            for (i, v) in row.iter() {
                grad[i] += residual * v;
            }
            grad[self.dim] += residual;
        }

        loss /= n;
        for g in &mut grad {
            *g /= n;
        }

        loss += 0.5 * self.l2 * dot(weights, weights);
        for (g, w) in grad.iter_mut().zip(weights) {
            *g += self.l2 * w;
        }

        (loss, grad)
    }
}

impl LogisticRegression {
    /// Creates a new, unfitted instance of [`LogisticRegression`].
    ///
    /// # Arguments
    /// * `c` - Inverse regularization strength (larger means weaker).
    /// * `max_iter` - Maximum number of L-BFGS iterations.
    /// * `tolerance` - Gradient tolerance for early stopping.
    pub fn new(c: f64, max_iter: usize, tolerance: f64) -> Self {
        LogisticRegression {
            c,
            max_iter,
            tolerance,
            state: None,
        }
    }

    /// Rebuilds a fitted model from its learned state.
    pub fn from_state(state: ModelState) -> Self {
        let mut model = LogisticRegression::default();
        model.state = Some(state);
        model
    }

    /// Returns the learned state, or `None` before fitting.
    pub fn state(&self) -> Option<&ModelState> {
        self.state.as_ref()
    }

    /// Dimension of the accepted feature vectors; zero before fitting.
    pub fn n_features(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.weights.len())
    }

    /// Fits the model.
    ///
    /// # Arguments
    /// * `x` - One feature vector per example, all of the same dimension.
    /// * `y` - The sentiment of each example.
    ///
    /// # Errors
    /// Returns an error if the inputs are empty, differ in length or
    /// dimension, or contain a single sentiment only. Hitting `max_iter`
    /// before convergence is logged, not reported as an error.
    pub fn fit(&mut self, x: &[SparseVector], y: &[Sentiment]) -> Result<()> {
        if x.is_empty() {
            return Err(TweetSentError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(TweetSentError::DimensionMismatch {
                expected: x.len(),
                got: y.len(),
            });
        }
        let dim = x[0].dim();
        if let Some(row) = x.iter().find(|row| row.dim() != dim) {
            return Err(TweetSentError::DimensionMismatch {
                expected: dim,
                got: row.dim(),
            });
        }
        if !(self.c > 0.0) {
            return Err(TweetSentError::InvalidConfig(format!(
                "C must be positive, got {}",
                self.c
            )));
        }
        let first = y[0];
        if y.iter().all(|&label| label == first) {
            return Err(TweetSentError::SingleClass(first.to_string()));
        }

        let objective = Objective {
            x,
            y: y.iter().map(|s| s.as_target()).collect(),
            dim,
            l2: 1.0 / (self.c * x.len() as f64),
        };

        let (params, n_iter) = self.minimize(&objective);
        let intercept = params[dim];
        let mut weights = params;
        weights.truncate(dim);

        self.state = Some(ModelState {
            weights,
            intercept,
            n_iter,
        });
        Ok(())
    }

    /// L-BFGS with a backtracking Armijo line search.
    fn minimize(&self, objective: &Objective) -> (Vec<f64>, usize) {
        let num_params = objective.dim + 1;
        let mut params = vec![0.0; num_params];
        let (mut loss, mut grad) = objective.evaluate(&params);

        let mut history: VecDeque<(Vec<f64>, Vec<f64>, f64)> = VecDeque::with_capacity(HISTORY_SIZE);
        let mut n_iter = 0;
        let mut converged = false;

        while n_iter < self.max_iter {
            if max_abs(&grad) <= self.tolerance {
                converged = true;
                break;
            }
            n_iter += 1;

            let mut direction = Self::two_loop(&grad, &history);
            let mut slope = dot(&grad, &direction);
            if slope >= 0.0 {
                // Not a descent direction; fall back to steepest descent.
                history.clear();
                direction = grad.iter().map(|g| -g).collect();
                slope = -dot(&grad, &grad);
            }

            let mut step = if history.is_empty() {
                (1.0 / dot(&grad, &grad).sqrt()).min(1.0)
            } else {
                1.0
            };

            let mut accepted = None;
            for _ in 0..MAX_LINE_SEARCH_STEPS {
                let candidate: Vec<f64> = params
                    .iter()
                    .zip(&direction)
                    .map(|(p, d)| p + step * d)
                    .collect();
                let (candidate_loss, candidate_grad) = objective.evaluate(&candidate);
                if candidate_loss <= loss + ARMIJO * step * slope {
                    accepted = Some((candidate, candidate_loss, candidate_grad));
                    break;
                }
                step *= 0.5;
            }

            let Some((next, next_loss, next_grad)) = accepted else {
                log::warn!("line search failed at iteration {}; stopping", n_iter);
                break;
            };

            let s: Vec<f64> = next.iter().zip(&params).map(|(a, b)| a - b).collect();
            let y: Vec<f64> = next_grad.iter().zip(&grad).map(|(a, b)| a - b).collect();
            let sy = dot(&s, &y);
            if sy > 1e-10 {
                if history.len() == HISTORY_SIZE {
                    history.pop_front();
                }
                history.push_back((s, y, 1.0 / sy));
            }

            log::debug!("iteration {} - loss: {}", n_iter, next_loss);
            params = next;
            loss = next_loss;
            grad = next_grad;
        }

        if converged {
            log::info!("converged after {} iterations (loss {:.6})", n_iter, loss);
        } else if n_iter >= self.max_iter {
            log::warn!(
                "reached max_iter={} without converging (loss {:.6})",
                self.max_iter,
                loss
            );
        }

        (params, n_iter)
    }

    /// Applies the L-BFGS inverse Hessian approximation to `-grad`.
    fn two_loop(grad: &[f64], history: &VecDeque<(Vec<f64>, Vec<f64>, f64)>) -> Vec<f64> {
        let mut q = grad.to_vec();
        let mut alphas = vec![0.0; history.len()];

        for (k, (s, y, rho)) in history.iter().enumerate().rev() {
            let alpha = rho * dot(s, &q);
            for (qi, yi) in q.iter_mut().zip(y) {
                *qi -= alpha * yi;
            }
            alphas[k] = alpha;
        }

        if let Some((s, y, _)) = history.back() {
            let gamma = dot(s, y) / dot(y, y);
            for qi in &mut q {
                *qi *= gamma;
            }
        }

        for (k, (s, y, rho)) in history.iter().enumerate() {
            let beta = rho * dot(y, &q);
            for (qi, si) in q.iter_mut().zip(s) {
                *qi += si * (alphas[k] - beta);
            }
        }

        q.iter().map(|v| -v).collect()
    }

    fn fitted(&self, x: &SparseVector) -> Result<&ModelState> {
        let state = self
            .state
            .as_ref()
            .ok_or(TweetSentError::NotFitted("LogisticRegression"))?;
        if x.dim() != state.weights.len() {
            return Err(TweetSentError::DimensionMismatch {
                expected: state.weights.len(),
                got: x.dim(),
            });
        }
        Ok(state)
    }

    /// Returns the linear score `w . x + b`.
    pub fn decision_function(&self, x: &SparseVector) -> Result<f64> {
        let state = self.fitted(x)?;
        Ok(x.dot(&state.weights) + state.intercept)
    }

    /// Returns the probability of the Positive class.
    pub fn predict_proba(&self, x: &SparseVector) -> Result<f64> {
        Ok(sigmoid(self.decision_function(x)?))
    }

    /// Predicts the sentiment of a feature vector.
    ///
    /// A score of exactly zero resolves to [`Sentiment::Negative`].
    pub fn predict(&self, x: &SparseVector) -> Result<Sentiment> {
        if self.decision_function(x)? > 0.0 {
            Ok(Sentiment::Positive)
        } else {
            Ok(Sentiment::Negative)
        }
    }
}
