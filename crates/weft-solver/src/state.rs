//! Particle state: SoA buffers for all per-particle data of one team.
//!
//! The solver reads and writes these buffers each tick. The base
//! channels hold the animated pose the particles are driven from:
//! fixed particles follow it exactly, and a reset snaps everything
//! back onto it.

use serde::{Deserialize, Serialize};
use weft_math::Vec3;
use weft_team::ForceMode;
use weft_types::{WeftError, WeftResult};

/// Construction data for one particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleSeed {
    /// Initial world position.
    pub position: Vec3,
    /// Index of the parent particle, if any.
    pub parent: Option<u32>,
    /// Fixed particles follow their base position and are never simulated.
    pub fixed: bool,
    /// Normalized distance from the fixed root, 0 at the root and 1 at the tips.
    pub depth: f32,
}

/// SoA particle buffers.
///
/// # Layout
///
/// All arrays have length `count`:
/// ```text
/// pos_x: [x0, x1, x2, ...]
/// pos_y: [y0, y1, y2, ...]
/// ...
/// ```
#[derive(Debug, Clone)]
pub struct ParticleState {
    /// Number of particles.
    pub count: usize,

    // ─── Position (current) ───
    pub pos_x: Vec<f32>,
    pub pos_y: Vec<f32>,
    pub pos_z: Vec<f32>,

    // ─── Previous position ───
    pub prev_x: Vec<f32>,
    pub prev_y: Vec<f32>,
    pub prev_z: Vec<f32>,

    // ─── Velocity ───
    pub vel_x: Vec<f32>,
    pub vel_y: Vec<f32>,
    pub vel_z: Vec<f32>,

    // ─── Base (animated) pose ───
    pub base_x: Vec<f32>,
    pub base_y: Vec<f32>,
    pub base_z: Vec<f32>,

    // ─── Structure ───
    /// Inverse mass; 0.0 for fixed particles.
    pub inv_mass: Vec<f32>,
    pub depth: Vec<f32>,
    pub parent: Vec<Option<u32>>,
    /// Rest distance to the parent (0.0 for roots).
    pub rest_length: Vec<f32>,
}

impl ParticleState {
    /// Builds particle buffers from seeds.
    ///
    /// Fixed seeds get `inv_mass = 0.0`. Rest lengths are measured from
    /// the seed positions.
    pub fn from_seeds(seeds: &[ParticleSeed], particle_mass: f32) -> WeftResult<Self> {
        if particle_mass <= 0.0 {
            return Err(WeftError::InvalidConfig(format!(
                "Particle mass must be positive, got {particle_mass}"
            )));
        }
        let n = seeds.len();
        if let Some((i, s)) = seeds
            .iter()
            .enumerate()
            .find(|(i, s)| s.parent.is_some_and(|p| p as usize >= n || p as usize == *i))
        {
            return Err(WeftError::InvariantViolation(format!(
                "Particle {i} has invalid parent {:?} (count: {n})",
                s.parent
            )));
        }

        let xs: Vec<f32> = seeds.iter().map(|s| s.position.x).collect();
        let ys: Vec<f32> = seeds.iter().map(|s| s.position.y).collect();
        let zs: Vec<f32> = seeds.iter().map(|s| s.position.z).collect();
        let inv_mass = seeds
            .iter()
            .map(|s| if s.fixed { 0.0 } else { 1.0 / particle_mass })
            .collect();
        let rest_length = seeds
            .iter()
            .map(|s| match s.parent {
                Some(p) => s.position.distance(seeds[p as usize].position),
                None => 0.0,
            })
            .collect();

        Ok(Self {
            count: n,
            pos_x: xs.clone(),
            pos_y: ys.clone(),
            pos_z: zs.clone(),
            prev_x: xs.clone(),
            prev_y: ys.clone(),
            prev_z: zs.clone(),
            vel_x: vec![0.0; n],
            vel_y: vec![0.0; n],
            vel_z: vec![0.0; n],
            base_x: xs,
            base_y: ys,
            base_z: zs,
            inv_mass,
            depth: seeds.iter().map(|s| s.depth.clamp(0.0, 1.0)).collect(),
            parent: seeds.iter().map(|s| s.parent).collect(),
            rest_length,
        })
    }

    #[inline]
    pub fn position(&self, i: usize) -> Vec3 {
        Vec3::new(self.pos_x[i], self.pos_y[i], self.pos_z[i])
    }

    #[inline]
    pub fn set_position(&mut self, i: usize, p: Vec3) {
        self.pos_x[i] = p.x;
        self.pos_y[i] = p.y;
        self.pos_z[i] = p.z;
    }

    #[inline]
    pub fn velocity(&self, i: usize) -> Vec3 {
        Vec3::new(self.vel_x[i], self.vel_y[i], self.vel_z[i])
    }

    #[inline]
    pub fn set_velocity(&mut self, i: usize, v: Vec3) {
        self.vel_x[i] = v.x;
        self.vel_y[i] = v.y;
        self.vel_z[i] = v.z;
    }

    #[inline]
    pub fn base(&self, i: usize) -> Vec3 {
        Vec3::new(self.base_x[i], self.base_y[i], self.base_z[i])
    }

    #[inline]
    pub fn set_base(&mut self, i: usize, p: Vec3) {
        self.base_x[i] = p.x;
        self.base_y[i] = p.y;
        self.base_z[i] = p.z;
    }

    #[inline]
    pub fn is_fixed(&self, i: usize) -> bool {
        self.inv_mass[i] == 0.0
    }

    /// Save current positions as "previous" for the next step.
    pub fn save_previous(&mut self) {
        self.prev_x.copy_from_slice(&self.pos_x);
        self.prev_y.copy_from_slice(&self.pos_y);
        self.prev_z.copy_from_slice(&self.pos_z);
    }

    /// Explicit Verlet prediction: p += dt * v + dt² * g for free particles,
    /// p = base for fixed ones.
    pub fn predict(&mut self, dt: f32, gravity: Vec3) {
        let dt2 = dt * dt;
        for i in 0..self.count {
            if self.is_fixed(i) {
                self.pos_x[i] = self.base_x[i];
                self.pos_y[i] = self.base_y[i];
                self.pos_z[i] = self.base_z[i];
                continue;
            }
            self.pos_x[i] += dt * self.vel_x[i] + dt2 * gravity.x;
            self.pos_y[i] += dt * self.vel_y[i] + dt2 * gravity.y;
            self.pos_z[i] += dt * self.vel_z[i] + dt2 * gravity.z;
        }
    }

    /// Update velocities from position change: v = (p_new - p_old) / dt.
    pub fn update_velocities(&mut self, dt: f32) {
        let inv_dt = 1.0 / dt;
        for i in 0..self.count {
            self.vel_x[i] = (self.pos_x[i] - self.prev_x[i]) * inv_dt;
            self.vel_y[i] = (self.pos_y[i] - self.prev_y[i]) * inv_dt;
            self.vel_z[i] = (self.pos_z[i] - self.prev_z[i]) * inv_dt;
        }
    }

    /// Apply velocity damping: v *= (1 - damping).
    pub fn damp_velocities(&mut self, damping: f32) {
        let factor = 1.0 - damping.clamp(0.0, 1.0);
        for i in 0..self.count {
            self.vel_x[i] *= factor;
            self.vel_y[i] *= factor;
            self.vel_z[i] *= factor;
        }
    }

    /// Clamp every particle speed to `max_speed`.
    pub fn limit_velocities(&mut self, max_speed: f32) {
        for i in 0..self.count {
            let v = self.velocity(i);
            let len = v.length();
            if len > max_speed {
                self.set_velocity(i, v * (max_speed / len));
            }
        }
    }

    /// Apply a one-shot external velocity to free particles.
    ///
    /// Depth-attenuated modes scale the force by particle depth, so the
    /// fixed root barely reacts and the tips take the full impulse.
    pub fn apply_force(&mut self, force: Vec3, mode: ForceMode) {
        if mode == ForceMode::None {
            return;
        }
        for i in 0..self.count {
            if self.is_fixed(i) {
                continue;
            }
            let scale = if mode.uses_depth() { self.depth[i] } else { 1.0 };
            let v = force * scale;
            if mode.is_change() {
                self.set_velocity(i, v);
            } else {
                self.set_velocity(i, self.velocity(i) + v);
            }
        }
    }

    /// Snap every particle onto its base pose and stop all motion.
    pub fn reset_to_base(&mut self) {
        self.pos_x.copy_from_slice(&self.base_x);
        self.pos_y.copy_from_slice(&self.base_y);
        self.pos_z.copy_from_slice(&self.base_z);
        self.save_previous();
        self.vel_x.fill(0.0);
        self.vel_y.fill(0.0);
        self.vel_z.fill(0.0);
    }

    /// Shift current and previous positions rigidly (teleport keeping pose).
    pub fn translate(&mut self, offset: Vec3) {
        for i in 0..self.count {
            self.pos_x[i] += offset.x;
            self.pos_y[i] += offset.y;
            self.pos_z[i] += offset.z;
            self.prev_x[i] += offset.x;
            self.prev_y[i] += offset.y;
            self.prev_z[i] += offset.z;
        }
    }

    /// Mass-weighted mean position of the free particles, falling back to
    /// the plain mean when every particle is fixed.
    pub fn center_of_mass(&self) -> Vec3 {
        if self.count == 0 {
            return Vec3::ZERO;
        }
        let mut sum = Vec3::ZERO;
        let mut weight = 0.0;
        for i in 0..self.count {
            if self.inv_mass[i] > 0.0 {
                let m = 1.0 / self.inv_mass[i];
                sum += self.position(i) * m;
                weight += m;
            }
        }
        if weight > 0.0 {
            sum / weight
        } else {
            (0..self.count).map(|i| self.position(i)).sum::<Vec3>() / self.count as f32
        }
    }

    /// Total kinetic energy of the free particles: 0.5 * Σ m_i * ||v_i||².
    pub fn kinetic_energy(&self) -> f64 {
        let mut energy = 0.0f64;
        for i in 0..self.count {
            if self.inv_mass[i] > 0.0 {
                let m = 1.0 / self.inv_mass[i] as f64;
                energy += 0.5 * m * self.velocity(i).length_squared() as f64;
            }
        }
        energy
    }
}
