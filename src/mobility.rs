//! The mobility contract (`SPEC_FULL.md` §6/§9): a closed-form velocity/position
//! integrator driven by periodic `apply_velocity` calls from the controller.

use crate::vector3::Vector3;

/// Time until the current acceleration would bring speed to the clamp, if ever.
#[derive(Debug, Clone, Copy, PartialEq)]
enum TimeToClamp {
    /// Speed never reaches the clamp under the current acceleration.
    Never,
    /// Already at or above the clamp: the clamp is applied with zero lead time.
    Immediate,
    /// Reaches the clamp after this many seconds of simulated time.
    After(f64),
}

/// Reference mobility substrate: stores position/velocity/acceleration and integrates
/// them piecewise across variable tick intervals, per the closed-form scheme in §9.
#[derive(Debug, Clone, Copy)]
pub struct Integrator {
    position: Vector3,
    velocity: Vector3,
    acceleration: Vector3,
    v_max: f64,
    time_to_clamp: TimeToClamp,
}

impl Integrator {
    pub fn new(position: Vector3) -> Self {
        Self {
            position,
            velocity: Vector3::ZERO,
            acceleration: Vector3::ZERO,
            v_max: 0.0,
            time_to_clamp: TimeToClamp::Never,
        }
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
    }

    /// Advances position/velocity by `dt` seconds under the currently stored
    /// acceleration and clamp, then stores the new target acceleration/clamp for the
    /// next call. This is the `apply_velocity(accel, v_max)` contract of §6: `dt` is the
    /// elapsed simulated time since the previous call.
    pub fn apply_velocity(&mut self, dt: f64, new_acceleration: Vector3, new_v_max: f64) {
        if dt > 0.0 {
            self.integrate(dt);
        }

        self.acceleration = new_acceleration;
        self.v_max = new_v_max;
        self.time_to_clamp = Self::solve_time_to_clamp(self.velocity, self.acceleration, self.v_max);
    }

    fn integrate(&mut self, dt: f64) {
        let will_reach_clamp = matches!(self.time_to_clamp, TimeToClamp::After(t) if t < dt);

        if !will_reach_clamp {
            let mut new_velocity = self.velocity + self.acceleration * dt;
            if self.v_max > 0.0 && new_velocity.magnitude() > self.v_max {
                new_velocity = new_velocity.unit() * self.v_max;
            }
            let avg_velocity = (self.velocity + new_velocity) * 0.5;
            self.position = self.position + avg_velocity * dt;
            self.velocity = new_velocity;
        } else {
            let TimeToClamp::After(t_accel) = self.time_to_clamp else { unreachable!() };
            let t_coast = dt - t_accel;

            let mut v_at_clamp = self.velocity + self.acceleration * t_accel;
            if self.v_max > 0.0 && v_at_clamp.magnitude() > self.v_max {
                v_at_clamp = v_at_clamp.unit() * self.v_max;
            }

            let avg_velocity_accel = (self.velocity + v_at_clamp) * 0.5;
            self.position = self.position + avg_velocity_accel * t_accel + v_at_clamp * t_coast;
            self.velocity = v_at_clamp;
        }

        self.time_to_clamp = Self::solve_time_to_clamp(self.velocity, self.acceleration, self.v_max);
    }

    /// Solves `|v0 + a*t|^2 = v_max^2` for the smallest non-negative `t`, per §9.
    fn solve_time_to_clamp(velocity: Vector3, acceleration: Vector3, v_max: f64) -> TimeToClamp {
        if acceleration.magnitude() == 0.0 || v_max <= 0.0 {
            return TimeToClamp::Never;
        }
        if velocity.magnitude() >= v_max {
            return TimeToClamp::Immediate;
        }

        let a = acceleration.x * acceleration.x + acceleration.y * acceleration.y + acceleration.z * acceleration.z;
        let b = 2.0 * (velocity.x * acceleration.x + velocity.y * acceleration.y + velocity.z * acceleration.z);
        let c = velocity.x * velocity.x + velocity.y * velocity.y + velocity.z * velocity.z - v_max * v_max;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return TimeToClamp::Never;
        }

        let sqrt_d = discriminant.sqrt();
        let t1 = (-b + sqrt_d) / (2.0 * a);
        let t2 = (-b - sqrt_d) / (2.0 * a);

        match (t1 >= 0.0, t2 >= 0.0) {
            (true, true) => TimeToClamp::After(t1.min(t2)),
            (true, false) => TimeToClamp::After(t1),
            (false, true) => TimeToClamp::After(t2),
            (false, false) => TimeToClamp::Never,
        }
    }
}
