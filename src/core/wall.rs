//! Arena walls, the piston, and the controller that homes it onto the
//! volume-derived target.
//!
//! Three walls are fixed: top (y = 0), bottom (y = height) and left (x = 0).
//! The right wall is the piston, a vertical plane whose x tracks volume
//! through a linear map. The piston is owned either by the
//! [`HomingController`] or by a pointer drag, never both; ownership changes
//! only through [`Piston::handle`].

use crate::config::SimConfig;
use crate::error::{Error, Result};
use crate::state::bounds::VOLUME;

/// Arena extent in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
}

impl Arena {
    pub fn new(width: f64, height: f64) -> Result<Self> {
        if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
            return Err(Error::InvalidParam(
                "arena width and height must be finite and > 0".into(),
            ));
        }
        Ok(Self { width, height })
    }

    /// Check that particles can be spawned at every piston position.
    pub fn validate_for(&self, config: &SimConfig) -> Result<()> {
        let clearance = 2.0 * config.spawn_margin + 2.0 * config.particle_radius;
        if self.height < clearance {
            return Err(Error::InvalidParam(format!(
                "arena height {} too small for spawn margin {} and radius {}",
                self.height, config.spawn_margin, config.particle_radius
            )));
        }
        let narrowest = self.width * config.piston_min_fraction;
        if narrowest < clearance {
            return Err(Error::InvalidParam(format!(
                "piston at minimum volume leaves {narrowest} px, need at least {clearance}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WallId {
    Top,
    Bottom,
    Left,
    Piston,
}

/// Wall plane orientation; decides which velocity component a reflection flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Constant-y plane; reflection flips vy.
    Horizontal,
    /// Constant-x plane; reflection flips vx.
    Vertical,
}

impl Orientation {
    /// Index of the velocity component normal to the wall.
    #[inline]
    pub fn normal_axis(self) -> usize {
        match self {
            Orientation::Vertical => 0,
            Orientation::Horizontal => 1,
        }
    }
}

impl WallId {
    pub const ALL: [WallId; 4] = [WallId::Top, WallId::Bottom, WallId::Left, WallId::Piston];

    pub fn orientation(self) -> Orientation {
        match self {
            WallId::Top | WallId::Bottom => Orientation::Horizontal,
            WallId::Left | WallId::Piston => Orientation::Vertical,
        }
    }

    /// Sign of the outward normal along the wall's normal axis.
    #[inline]
    pub fn outward(self) -> f64 {
        match self {
            WallId::Top | WallId::Left => -1.0,
            WallId::Bottom | WallId::Piston => 1.0,
        }
    }
}

/// Interior rectangle bounded by the three fixed walls and the piston.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Bounds {
    /// Coordinate of `wall`'s plane along its normal axis.
    pub fn plane(&self, wall: WallId) -> f64 {
        match wall {
            WallId::Top => self.top,
            WallId::Bottom => self.bottom,
            WallId::Left => self.left,
            WallId::Piston => self.right,
        }
    }
}

/// Linear map between volume and piston x.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PistonTrack {
    pub min_x: f64,
    pub max_x: f64,
}

impl PistonTrack {
    pub fn new(arena: &Arena, config: &SimConfig) -> Self {
        Self {
            min_x: arena.width * config.piston_min_fraction,
            max_x: arena.width * config.piston_max_fraction,
        }
    }

    /// Piston x for `volume` (L); volumes outside the range pin to the track ends.
    pub fn x_for_volume(&self, volume: f64) -> f64 {
        self.min_x + VOLUME.normalize(volume) * (self.max_x - self.min_x)
    }

    /// Volume (L) for a piston at `x`.
    pub fn volume_for_x(&self, x: f64) -> f64 {
        let frac = ((x - self.min_x) / (self.max_x - self.min_x)).clamp(0.0, 1.0);
        VOLUME.min + frac * VOLUME.span()
    }

    #[inline]
    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.min_x, self.max_x)
    }
}

/// Who currently drives the piston.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PistonOwner {
    #[default]
    AutoTracking,
    UserDragging,
}

/// Pointer interaction messages from the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerMessage {
    DragStart,
    /// Pointer moved to arena x while dragging.
    DragMove { x: f64 },
    DragEnd,
}

/// The movable right wall.
#[derive(Debug, Clone, PartialEq)]
pub struct Piston {
    /// Plane position (px).
    pub x: f64,
    /// Velocity (px per frame), set by the homing controller.
    pub vx: f64,
    owner: PistonOwner,
    track: PistonTrack,
}

impl Piston {
    /// Piston resting at the position for `volume`.
    pub fn new(track: PistonTrack, volume: f64) -> Self {
        Self {
            x: track.x_for_volume(volume),
            vx: 0.0,
            owner: PistonOwner::AutoTracking,
            track,
        }
    }

    pub fn owner(&self) -> PistonOwner {
        self.owner
    }

    pub fn track(&self) -> &PistonTrack {
        &self.track
    }

    /// Apply a pointer message. Returns the volume implied by the piston
    /// position when a drag is released.
    pub fn handle(&mut self, msg: PointerMessage) -> Option<f64> {
        use PistonOwner::*;
        match (self.owner, msg) {
            (AutoTracking, PointerMessage::DragStart) => {
                self.owner = UserDragging;
                self.vx = 0.0;
                None
            }
            (UserDragging, PointerMessage::DragMove { x }) => {
                if x.is_finite() {
                    self.x = self.track.clamp(x);
                }
                None
            }
            (UserDragging, PointerMessage::DragEnd) => {
                self.owner = AutoTracking;
                self.vx = 0.0;
                Some(self.track.volume_for_x(self.x))
            }
            (UserDragging, PointerMessage::DragStart)
            | (AutoTracking, PointerMessage::DragMove { .. })
            | (AutoTracking, PointerMessage::DragEnd) => None,
        }
    }

    /// Move along the track by `vx * dt`. A dragged piston only moves on pointer input.
    pub fn advance(&mut self, dt: f64) {
        if self.owner == PistonOwner::UserDragging {
            return;
        }
        let next = self.track.clamp(self.x + self.vx * dt);
        if next != self.x + self.vx * dt {
            self.vx = 0.0;
        }
        self.x = next;
    }
}

/// Proportional controller homing the piston onto the target for the current volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomingController {
    pub gain: f64,
    pub deadband: f64,
    pub snap: f64,
}

impl HomingController {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            gain: config.homing_gain,
            deadband: config.homing_deadband,
            snap: config.homing_snap,
        }
    }

    /// Set the piston velocity toward the target for `volume`. No-op while the
    /// user is dragging; returns whether the controller acted.
    pub fn update(&self, piston: &mut Piston, volume: f64) -> bool {
        if piston.owner == PistonOwner::UserDragging {
            return false;
        }
        let target = piston.track.x_for_volume(volume);
        let error = target - piston.x;
        if error.abs() < self.deadband {
            piston.vx = 0.0;
            if error.abs() > self.snap {
                piston.x = target;
            }
        } else {
            piston.vx = error * self.gain;
        }
        true
    }
}
