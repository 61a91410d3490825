//! Extended Kalman filter over a pluggable nonlinear model

use super::kalman::kalman_gain;
use crate::core::{AnalyticsError, Result};
use ndarray::{Array1, Array2};

/// Central-difference Jacobian of `f` at `x`
pub fn numerical_jacobian<F>(f: F, x: &Array1<f64>) -> Array2<f64>
where
    F: Fn(&Array1<f64>) -> Array1<f64>,
{
    let base = f(x);
    let mut jacobian = Array2::zeros((base.len(), x.len()));
    for i in 0..x.len() {
        let h = 1e-6 * x[i].abs().max(1.0);
        let mut forward = x.clone();
        forward[i] += h;
        let mut backward = x.clone();
        backward[i] -= h;
        let diff = (f(&forward) - f(&backward)) / (2.0 * h);
        jacobian.column_mut(i).assign(&diff);
    }
    jacobian
}

/// State transition and observation functions of a nonlinear system
///
/// `params` is the filter's own parameter vector, passed through unchanged.
/// The Jacobians default to central finite differences; override them when
/// closed forms are available.
pub trait ExtendedKalmanModel {
    fn transition(
        &self,
        state: &Array1<f64>,
        control: Option<&Array1<f64>>,
        params: &Array1<f64>,
    ) -> Array1<f64>;

    fn observe(&self, state: &Array1<f64>, params: &Array1<f64>) -> Array1<f64>;

    fn transition_jacobian(
        &self,
        state: &Array1<f64>,
        control: Option<&Array1<f64>>,
        params: &Array1<f64>,
    ) -> Array2<f64> {
        numerical_jacobian(|s| self.transition(s, control, params), state)
    }

    fn observation_jacobian(&self, state: &Array1<f64>, params: &Array1<f64>) -> Array2<f64> {
        numerical_jacobian(|s| self.observe(s, params), state)
    }
}

#[derive(Debug, Clone)]
pub struct ExtendedKalmanFilter<M> {
    model: M,
    params: Array1<f64>,
    process_noise: Array2<f64>,
    measurement_noise: Array2<f64>,
    state_pre: Array1<f64>,
    state_post: Array1<f64>,
    error_cov_pre: Array2<f64>,
    error_cov_post: Array2<f64>,
    gain: Array2<f64>,
}

impl<M: ExtendedKalmanModel> ExtendedKalmanFilter<M> {
    /// Dimensions are taken from the noise covariances `Q` (state) and `R`
    /// (measurement). The state starts at zero with identity covariance.
    pub fn new(model: M, process_noise: Array2<f64>, measurement_noise: Array2<f64>) -> Result<Self> {
        let n = process_noise.nrows();
        let m = measurement_noise.nrows();
        if process_noise.ncols() != n || measurement_noise.ncols() != m {
            return Err(AnalyticsError::InvalidParameter(
                "noise covariances must be square".to_string(),
            ));
        }
        Ok(Self {
            model,
            params: Array1::zeros(0),
            process_noise,
            measurement_noise,
            state_pre: Array1::zeros(n),
            state_post: Array1::zeros(n),
            error_cov_pre: Array2::eye(n),
            error_cov_post: Array2::eye(n),
            gain: Array2::zeros((n, m)),
        })
    }

    pub fn with_initial_state(mut self, state: Array1<f64>, error_cov: Array2<f64>) -> Result<Self> {
        let n = self.state_dim();
        if state.len() != n {
            return Err(AnalyticsError::DimensionMismatch {
                expected: n,
                actual: state.len(),
            });
        }
        if error_cov.dim() != (n, n) {
            return Err(AnalyticsError::InvalidParameter(format!(
                "error covariance must be {}x{}",
                n, n
            )));
        }
        self.state_pre = state.clone();
        self.state_post = state;
        self.error_cov_pre = error_cov.clone();
        self.error_cov_post = error_cov;
        Ok(self)
    }

    pub fn state_dim(&self) -> usize {
        self.process_noise.nrows()
    }

    pub fn measurement_dim(&self) -> usize {
        self.measurement_noise.nrows()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn params(&self) -> &Array1<f64> {
        &self.params
    }

    pub fn set_params(&mut self, params: Array1<f64>) {
        self.params = params;
    }

    pub fn predict(&mut self, control: Option<&Array1<f64>>) -> Result<&Array1<f64>> {
        let jacobian = self
            .model
            .transition_jacobian(&self.state_post, control, &self.params);
        let state = self.model.transition(&self.state_post, control, &self.params);
        if state.len() != self.state_dim() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: self.state_dim(),
                actual: state.len(),
            });
        }

        self.state_pre = state;
        self.error_cov_pre =
            jacobian.dot(&self.error_cov_post).dot(&jacobian.t()) + &self.process_noise;
        self.state_post = self.state_pre.clone();
        self.error_cov_post = self.error_cov_pre.clone();
        Ok(&self.state_pre)
    }

    pub fn correct(&mut self, measurement: &Array1<f64>) -> Result<&Array1<f64>> {
        if measurement.len() != self.measurement_dim() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: self.measurement_dim(),
                actual: measurement.len(),
            });
        }
        let observation = self
            .model
            .observation_jacobian(&self.state_pre, &self.params);
        self.gain = kalman_gain(&self.error_cov_pre, &observation, &self.measurement_noise);

        let residual = measurement - &self.model.observe(&self.state_pre, &self.params);
        self.state_post = &self.state_pre + &self.gain.dot(&residual);
        self.error_cov_post =
            &self.error_cov_pre - &self.gain.dot(&observation).dot(&self.error_cov_pre);
        Ok(&self.state_post)
    }

    pub fn state(&self) -> &Array1<f64> {
        &self.state_post
    }

    pub fn error_cov(&self) -> &Array2<f64> {
        &self.error_cov_post
    }

    pub fn gain(&self) -> &Array2<f64> {
        &self.gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::online::KalmanFilter;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    /// `x' = p0·x`, `z = x`
    struct Scaled;

    impl ExtendedKalmanModel for Scaled {
        fn transition(
            &self,
            state: &Array1<f64>,
            _control: Option<&Array1<f64>>,
            params: &Array1<f64>,
        ) -> Array1<f64> {
            state * params[0]
        }

        fn observe(&self, state: &Array1<f64>, _params: &Array1<f64>) -> Array1<f64> {
            state.clone()
        }
    }

    #[test]
    fn test_numerical_jacobian() {
        let j = numerical_jacobian(|x| array![x[0] * x[1], x[0] * x[0]], &array![2.0, 3.0]);
        assert_abs_diff_eq!(j[[0, 0]], 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(j[[0, 1]], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(j[[1, 0]], 4.0, epsilon = 1e-6);
        assert_abs_diff_eq!(j[[1, 1]], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_linear_model_matches_kalman() {
        let mut ekf = ExtendedKalmanFilter::new(Scaled, array![[0.01]], array![[0.5]])
            .unwrap()
            .with_initial_state(array![1.0], array![[2.0]])
            .unwrap();
        ekf.set_params(array![0.9]);

        let mut kf = KalmanFilter::new(array![[0.9]], array![[1.0]], array![[0.01]], array![[0.5]])
            .unwrap()
            .with_initial_state(array![1.0], array![[2.0]])
            .unwrap();

        for z in [1.2, 0.7, 0.9] {
            ekf.predict(None).unwrap();
            ekf.correct(&array![z]).unwrap();
            kf.predict(None).unwrap();
            kf.correct(&array![z]).unwrap();
        }
        assert_abs_diff_eq!(ekf.state()[0], kf.state()[0], epsilon = 1e-6);
        assert_abs_diff_eq!(ekf.error_cov()[[0, 0]], kf.error_cov()[[0, 0]], epsilon = 1e-6);
    }

    #[test]
    fn test_measurement_dimension() {
        let mut ekf = ExtendedKalmanFilter::new(Scaled, array![[0.01]], array![[0.5]]).unwrap();
        ekf.set_params(array![1.0]);
        ekf.predict(None).unwrap();
        assert!(ekf.correct(&array![1.0, 2.0]).is_err());
    }
}
