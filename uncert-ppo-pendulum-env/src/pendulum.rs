use rand::Rng;
use std::f32::consts::PI;

/// Maximum angular velocity.
pub const MAX_SPEED: f32 = 8.0;

/// Maximum torque.
pub const MAX_TORQUE: f32 = 2.0;

/// Dimension of a single observation, `[cos(θ), sin(θ), θ_dot]`.
pub const OBS_DIM: usize = 3;

const DT: f32 = 0.05;
const G: f32 = 10.0;
const M: f32 = 1.0;
const L: f32 = 1.0;

/// Dynamics of the pendulum.
///
/// The goal is to keep the pendulum upright by applying torque.
/// `θ = 0` is upright. The reward of a step is
/// `-(θ² + 0.1⋅θ_dot² + 0.001⋅u²)`, `u` being the clamped torque.
#[derive(Debug, Clone, Default)]
pub struct Pendulum {
    theta: f32,
    theta_dot: f32,
}

fn angle_normalize(x: f32) -> f32 {
    (x + PI).rem_euclid(2.0 * PI) - PI
}

impl Pendulum {
    /// Constructs a pendulum in the given state.
    pub fn new(theta: f32, theta_dot: f32) -> Self {
        Self { theta, theta_dot }
    }

    /// Puts the pendulum in a random state.
    pub fn reset<R: Rng>(&mut self, rng: &mut R) {
        self.theta = rng.gen_range(-PI..PI);
        self.theta_dot = rng.gen_range(-1.0..1.0);
    }

    /// The observation of the current state.
    pub fn obs(&self) -> [f32; OBS_DIM] {
        [self.theta.cos(), self.theta.sin(), self.theta_dot]
    }

    /// Angle from the upright position.
    pub fn theta(&self) -> f32 {
        self.theta
    }

    /// Applies `torque` during one time step and returns the reward.
    pub fn step(&mut self, torque: f32) -> f32 {
        let u = torque.clamp(-MAX_TORQUE, MAX_TORQUE);
        let reward = -(angle_normalize(self.theta).powi(2)
            + 0.1 * self.theta_dot.powi(2)
            + 0.001 * u.powi(2));

        let theta_acc = (3.0 * G / (2.0 * L)) * self.theta.sin() + (3.0 / (M * L * L)) * u;
        self.theta_dot = (self.theta_dot + theta_acc * DT).clamp(-MAX_SPEED, MAX_SPEED);
        self.theta = angle_normalize(self.theta + self.theta_dot * DT);

        reward
    }
}
