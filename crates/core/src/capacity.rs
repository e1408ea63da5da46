//! Capacity policy applied to the model cache
//!
//! The sizing core only produces a target; how the cache reacts to it is a
//! policy decision. A model loader that must never evict a model it still
//! needs only grows, while a host that closes projects may want the cache to
//! shrink back.

use crate::error::Error;
use crate::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Receives the required cache size computed by each recomputation
///
/// The value is a target capacity, not a delta. Implementations must accept
/// the same value repeatedly.
pub trait CacheSizeSink: Send + Sync {
    fn set_required_capacity(&self, size: u64) -> anyhow::Result<()>;
}

impl<F> CacheSizeSink for F
where
    F: Fn(u64) + Send + Sync,
{
    fn set_required_capacity(&self, size: u64) -> anyhow::Result<()> {
        self(size);
        Ok(())
    }
}

/// How a required size turns into a new capacity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityPolicy {
    /// Capacity only ever grows to fit the largest requirement seen
    #[default]
    Grow,
    /// Capacity follows the requirement exactly
    Exact,
}

/// Limits applied after the policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityBounds {
    /// Smallest capacity ever applied
    #[serde(default)]
    pub min_capacity: u64,
    /// Largest capacity ever applied (0 = unbounded)
    #[serde(default)]
    pub max_capacity: u64,
}

impl CapacityBounds {
    /// Check that the bounds can be satisfied
    pub fn validate(&self) -> Result<()> {
        if self.max_capacity != 0 && self.min_capacity > self.max_capacity {
            return Err(Error::InvalidBounds {
                min: self.min_capacity,
                max: self.max_capacity,
            });
        }
        Ok(())
    }

    fn clamp(&self, capacity: u64) -> u64 {
        let capacity = capacity.max(self.min_capacity);
        if self.max_capacity == 0 {
            capacity
        } else {
            capacity.min(self.max_capacity)
        }
    }
}

/// Capacity knob of the model cache
pub struct CacheCapacity {
    policy: CapacityPolicy,
    bounds: CapacityBounds,
    current: Mutex<u64>,
}

impl CacheCapacity {
    /// Create a capacity holder starting at the lower bound
    pub fn new(policy: CapacityPolicy, bounds: CapacityBounds) -> Result<Self> {
        bounds.validate()?;
        Ok(Self {
            policy,
            bounds,
            current: Mutex::new(bounds.min_capacity),
        })
    }

    /// Current capacity
    pub fn capacity(&self) -> u64 {
        *self.current.lock()
    }

    /// Apply a required size and return the resulting capacity
    pub fn apply(&self, required: u64) -> u64 {
        let mut current = self.current.lock();

        let target = match self.policy {
            CapacityPolicy::Grow => (*current).max(required),
            CapacityPolicy::Exact => required,
        };
        let next = self.bounds.clamp(target);

        if next != *current {
            info!("Model cache capacity {} -> {} (required {})", *current, next, required);
            *current = next;
        } else {
            debug!("Model cache capacity unchanged at {} (required {})", next, required);
        }

        next
    }
}

impl CacheSizeSink for CacheCapacity {
    fn set_required_capacity(&self, size: u64) -> anyhow::Result<()> {
        self.apply(size);
        Ok(())
    }
}
