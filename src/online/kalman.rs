//! Linear discrete Kalman filter

use crate::algebra::pseudo_inverse;
use crate::core::{AnalyticsError, Result};
use ndarray::{Array1, Array2};

fn check_shape(name: &str, m: &Array2<f64>, rows: usize, cols: usize) -> Result<()> {
    if m.dim() != (rows, cols) {
        return Err(AnalyticsError::InvalidParameter(format!(
            "{} must be {}x{}, got {}x{}",
            name,
            rows,
            cols,
            m.nrows(),
            m.ncols()
        )));
    }
    Ok(())
}

fn check_len(v: &Array1<f64>, len: usize) -> Result<()> {
    if v.len() != len {
        return Err(AnalyticsError::DimensionMismatch {
            expected: len,
            actual: v.len(),
        });
    }
    Ok(())
}

/// Kalman gain `K = P·Hᵀ·(H·P·Hᵀ + R)⁺`
pub(crate) fn kalman_gain(
    error_cov: &Array2<f64>,
    observation: &Array2<f64>,
    measurement_noise: &Array2<f64>,
) -> Array2<f64> {
    let pht = error_cov.dot(&observation.t());
    let innovation_cov = observation.dot(&pht) + measurement_noise;
    pht.dot(&pseudo_inverse(&innovation_cov))
}

/// State estimator for `x' = A·x + B·u + w`, `z = H·x + v`
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    transition: Array2<f64>,
    control: Option<Array2<f64>>,
    observation: Array2<f64>,
    process_noise: Array2<f64>,
    measurement_noise: Array2<f64>,
    state_pre: Array1<f64>,
    state_post: Array1<f64>,
    error_cov_pre: Array2<f64>,
    error_cov_post: Array2<f64>,
    gain: Array2<f64>,
}

impl KalmanFilter {
    /// Filter with transition `A`, observation `H` and noise covariances `Q`, `R`
    ///
    /// The state starts at zero with identity covariance.
    pub fn new(
        transition: Array2<f64>,
        observation: Array2<f64>,
        process_noise: Array2<f64>,
        measurement_noise: Array2<f64>,
    ) -> Result<Self> {
        let n = transition.nrows();
        let m = observation.nrows();
        check_shape("transition matrix", &transition, n, n)?;
        check_shape("observation matrix", &observation, m, n)?;
        check_shape("process noise", &process_noise, n, n)?;
        check_shape("measurement noise", &measurement_noise, m, m)?;

        Ok(Self {
            transition,
            control: None,
            observation,
            process_noise,
            measurement_noise,
            state_pre: Array1::zeros(n),
            state_post: Array1::zeros(n),
            error_cov_pre: Array2::eye(n),
            error_cov_post: Array2::eye(n),
            gain: Array2::zeros((n, m)),
        })
    }

    /// Add a control matrix `B` (state dim × control dim)
    pub fn with_control(mut self, control: Array2<f64>) -> Result<Self> {
        check_shape("control matrix", &control, self.state_dim(), control.ncols())?;
        self.control = Some(control);
        Ok(self)
    }

    /// Set the initial state estimate and its covariance
    pub fn with_initial_state(mut self, state: Array1<f64>, error_cov: Array2<f64>) -> Result<Self> {
        let n = self.state_dim();
        check_len(&state, n)?;
        check_shape("error covariance", &error_cov, n, n)?;
        self.state_pre = state.clone();
        self.state_post = state;
        self.error_cov_pre = error_cov.clone();
        self.error_cov_post = error_cov;
        Ok(self)
    }

    pub fn state_dim(&self) -> usize {
        self.transition.nrows()
    }

    pub fn measurement_dim(&self) -> usize {
        self.observation.nrows()
    }

    /// Propagate the state one step
    ///
    /// A control vector is only accepted by a filter built with a control
    /// matrix.
    pub fn predict(&mut self, control: Option<&Array1<f64>>) -> Result<&Array1<f64>> {
        let mut state = self.transition.dot(&self.state_post);
        match (&self.control, control) {
            (Some(b), Some(u)) => {
                check_len(u, b.ncols())?;
                state += &b.dot(u);
            }
            (None, Some(_)) => {
                return Err(AnalyticsError::InvalidParameter(
                    "control vector given to a filter without a control matrix".to_string(),
                ));
            }
            _ => {}
        }
        self.state_pre = state;
        self.error_cov_pre = self
            .transition
            .dot(&self.error_cov_post)
            .dot(&self.transition.t())
            + &self.process_noise;

        // an uncorrected step carries the prediction forward
        self.state_post = self.state_pre.clone();
        self.error_cov_post = self.error_cov_pre.clone();
        Ok(&self.state_pre)
    }

    /// Fold in a measurement
    pub fn correct(&mut self, measurement: &Array1<f64>) -> Result<&Array1<f64>> {
        check_len(measurement, self.measurement_dim())?;
        self.gain = kalman_gain(&self.error_cov_pre, &self.observation, &self.measurement_noise);

        let residual = measurement - &self.observation.dot(&self.state_pre);
        self.state_post = &self.state_pre + &self.gain.dot(&residual);
        self.error_cov_post = &self.error_cov_pre
            - &self.gain.dot(&self.observation).dot(&self.error_cov_pre);
        Ok(&self.state_post)
    }

    /// Latest corrected state
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
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_single_step() {
        let mut kf = KalmanFilter::new(
            array![[1.0]],
            array![[1.0]],
            array![[0.0]],
            array![[1.0]],
        )
        .unwrap();

        kf.predict(None).unwrap();
        let state = kf.correct(&array![2.0]).unwrap();
        // equal prior and measurement variance: halfway
        assert_abs_diff_eq!(state[0], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(kf.error_cov()[[0, 0]], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(kf.gain()[[0, 0]], 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_control_input() {
        let mut kf = KalmanFilter::new(
            array![[1.0]],
            array![[1.0]],
            array![[0.0]],
            array![[1.0]],
        )
        .unwrap()
        .with_control(array![[2.0]])
        .unwrap();

        let predicted = kf.predict(Some(&array![1.5])).unwrap();
        assert_abs_diff_eq!(predicted[0], 3.0, epsilon = 1e-12);
        assert!(kf.predict(Some(&array![1.0, 1.0])).is_err());
    }

    #[test]
    fn test_control_without_control_matrix() {
        let mut kf = KalmanFilter::new(
            array![[1.0]],
            array![[1.0]],
            array![[0.0]],
            array![[1.0]],
        )
        .unwrap();

        assert!(matches!(
            kf.predict(Some(&array![1.5])),
            Err(AnalyticsError::InvalidParameter(_))
        ));
        // the rejected step leaves the state untouched
        assert_eq!(kf.state()[0], 0.0);
        assert!(kf.predict(None).is_ok());
    }

    #[test]
    fn test_shape_validation() {
        assert!(KalmanFilter::new(
            array![[1.0, 0.0], [0.0, 1.0]],
            array![[1.0]],
            array![[1.0]],
            array![[1.0]],
        )
        .is_err());
    }
}
