//! Incremental and lightweight learners
//!
//! Dense models work on `ndarray` vectors; Rocchio and PU learning take the
//! same sparse column matrices as the batch trainers.

pub mod ekf;
pub mod kalman;
pub mod kmeans;
pub mod knn;
pub mod lloyd;
pub mod perceptron;
pub mod pu;
pub mod ridge;
pub mod rls;
pub mod rocchio;

pub use self::ekf::{numerical_jacobian, ExtendedKalmanFilter, ExtendedKalmanModel};
pub use self::kalman::KalmanFilter;
pub use self::kmeans::{KMeans, KMeansResult};
pub use self::knn::{KnnAveraging, KnnRegression};
pub use self::lloyd::Lloyd;
pub use self::perceptron::Perceptron;
pub use self::pu::{PuLearning, PuResult};
pub use self::ridge::RidgeRegression;
pub use self::rls::RecursiveLinearRegression;
pub use self::rocchio::Rocchio;
