use crate::core::wall::WallId;
use crate::error::{Error, Result};
use ordered_float::NotNan;
use std::cmp::Ordering;

/// Contacts detected during a sub-step.
///
/// Tie-breaking for deterministic ordering prefers `Pair` < `Wall` when times are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// Particle-to-particle contact between particles `i` and `j` (`i < j`).
    Pair { i: usize, j: usize },
    /// Particle-to-wall contact.
    Wall { i: usize, wall: WallId },
}

impl ContactKind {
    #[inline]
    fn order_key(&self) -> (u8, usize, usize) {
        match *self {
            ContactKind::Pair { i, j } => (0, i, j),
            ContactKind::Wall { i, wall } => (1, i, wall as usize),
        }
    }
}

/// A detected contact with the estimated time it began.
///
/// - `time`: estimated touch time in frames, back-projected from penetration depth.
/// - `kind`: participants.
/// - `cc_i`, `cc_j`: collision-count snapshots for invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub time: NotNan<f64>,
    pub kind: ContactKind,
    pub cc_i: u64,
    pub cc_j: Option<u64>,
}

impl Contact {
    /// Create a new contact, validating that time is finite and non-NaN.
    pub fn new(time: f64, kind: ContactKind, cc_i: u64, cc_j: Option<u64>) -> Result<Self> {
        if !time.is_finite() {
            return Err(Error::InvalidParam("contact time must be finite".into()));
        }
        let time = NotNan::new(time)
            .map_err(|_| Error::InvalidParam("contact time cannot be NaN".into()))?;
        Ok(Self {
            time,
            kind,
            cc_i,
            cc_j,
        })
    }

    #[inline]
    pub fn time_f64(&self) -> f64 {
        self.time.into_inner()
    }

    /// Still valid if neither participant has been involved in another
    /// contact since detection. Pass `None` for `cc_j_now` on wall contacts.
    #[inline]
    pub fn is_valid(&self, cc_i_now: u64, cc_j_now: Option<u64>) -> bool {
        if self.cc_i != cc_i_now {
            return false;
        }
        match (self.cc_j, cc_j_now) {
            (Some(a), Some(b)) => a == b,
            (None, _) => true,
            (Some(_), None) => false,
        }
    }
}

impl Ord for Contact {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            Ordering::Equal => {
                let a = self.kind.order_key();
                let b = other.kind.order_key();
                match a.cmp(&b) {
                    Ordering::Equal => (self.cc_i, self.cc_j.unwrap_or(0))
                        .cmp(&(other.cc_i, other.cc_j.unwrap_or(0))),
                    o => o,
                }
            }
            o => o,
        }
    }
}

impl PartialOrd for Contact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
