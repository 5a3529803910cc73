use ndarray::{Array2, ArrayView2};
use serde::{Serialize, Deserialize};

/// Trait defining the interface for loss functions
pub trait Loss: Send + Sync {
    /// Compute the loss for a batch of predictions and targets
    fn compute_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32;

    /// Compute the gradient of the loss with respect to the predictions
    fn gradient_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> Array2<f32>;
}

/// Mean squared error, averaged over the rows of the batch.
///
/// Squared errors are summed across each row before averaging, so when the
/// targets equal the predictions everywhere except one entry per row (the
/// action that was taken) the value is the mean squared error of those entries.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default)]
pub struct MSE;

impl Loss for MSE {
    fn compute_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32 {
        let rows = predictions.nrows().max(1) as f32;
        let diff = &predictions - &targets;
        (&diff * &diff).sum() / rows
    }

    fn gradient_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> Array2<f32> {
        let rows = predictions.nrows().max(1) as f32;
        (&predictions - &targets) * (2.0 / rows)
    }
}
