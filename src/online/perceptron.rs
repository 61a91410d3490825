//! Mistake-driven perceptron for 0/1 classification

use ndarray::Array1;

#[derive(Debug, Clone, PartialEq)]
pub struct Perceptron {
    weights: Array1<f64>,
    bias: f64,
    use_bias: bool,
}

impl Perceptron {
    pub fn new(dim: usize, use_bias: bool) -> Self {
        Self {
            weights: Array1::zeros(dim),
            bias: 0.0,
            use_bias,
        }
    }

    /// On a mistake, add `(y − ŷ)·x` to the weights (and `y − ŷ` to the bias)
    pub fn update(&mut self, x: &Array1<f64>, y: bool) {
        let predicted = self.predict(x);
        if predicted != y {
            let error = f64::from(u8::from(y)) - f64::from(u8::from(predicted));
            self.weights.scaled_add(error, x);
            if self.use_bias {
                self.bias += error;
            }
        }
    }

    pub fn predict(&self, x: &Array1<f64>) -> bool {
        self.weights.dot(x) + self.bias > 0.0
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_learns_and_gate_with_bias() {
        let data = [
            (array![0.0, 0.0], false),
            (array![0.0, 1.0], false),
            (array![1.0, 0.0], false),
            (array![1.0, 1.0], true),
        ];
        let mut model = Perceptron::new(2, true);
        for _ in 0..20 {
            for (x, y) in &data {
                model.update(x, *y);
            }
        }
        for (x, y) in &data {
            assert_eq!(model.predict(x), *y);
        }
        assert!(model.bias() < 0.0);
    }

    #[test]
    fn test_bias_stays_zero_when_disabled() {
        let mut model = Perceptron::new(1, false);
        model.update(&array![1.0], true);
        assert_eq!(model.weights()[0], 1.0);
        model.update(&array![-2.0], true);
        // 1 + (1 − 0)·(−2)
        assert_eq!(model.weights()[0], -1.0);
        assert_eq!(model.bias(), 0.0);
        // no update on a correct prediction
        model.update(&array![-1.0], true);
        assert_eq!(model.weights()[0], -1.0);
    }
}
