//! Linear classifier and regressor trainer
//!
//! Primal sub-gradient descent in the style of Pegasos: each step samples a
//! mini-batch, takes a step on the regularized hinge (or ε-insensitive)
//! loss, then projects the weights back onto the ball of radius `1/√λ`.

pub mod model;
pub mod sgd;

pub use self::model::*;
pub use self::sgd::*;
