//! Thread-shared world handle

use super::SpatialWorld;
use crate::config::ConfigError;
use crate::core::SpatialConfig;
use crate::error::{QueryError, QueryResult};
use std::sync::{Arc, RwLock, RwLockReadGuard};

/// Cloneable handle to a world guarded by a reader-writer lock.
///
/// Writes happen only in [`update`](Self::update), once per frame. Any
/// number of threads may hold a [`snapshot`](Self::snapshot) at the same
/// time; an update waits until they are released.
#[derive(Clone)]
pub struct SharedWorld {
    inner: Arc<RwLock<SpatialWorld>>,
}

impl SharedWorld {
    /// Share an existing world
    pub fn new(world: SpatialWorld) -> Self {
        Self {
            inner: Arc::new(RwLock::new(world)),
        }
    }

    /// Build and share a world
    pub fn from_config(config: SpatialConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(SpatialWorld::new(config)?))
    }

    /// Run the frame's update phase with exclusive access
    pub fn update<R, F>(&self, apply: F) -> QueryResult<R>
    where
        F: FnOnce(&mut SpatialWorld) -> QueryResult<R>,
    {
        let mut world = self.inner.write().map_err(|_| QueryError::Poisoned)?;
        let result = apply(&mut world);
        world.advance_frame();
        log::trace!("Update phase finished, frame {}", world.frame());
        result
    }

    /// Read access for queries
    pub fn snapshot(&self) -> QueryResult<RwLockReadGuard<'_, SpatialWorld>> {
        self.inner.read().map_err(|_| QueryError::Poisoned)
    }

    /// Number of completed update phases
    pub fn frame(&self) -> QueryResult<u64> {
        Ok(self.snapshot()?.frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::foundation::math::Vec3;
    use crate::physics::{Volume, VolumeShape};
    use crate::query::{CastMode, CastQuery};

    fn shared() -> SharedWorld {
        SharedWorld::from_config(SpatialConfig::default()).unwrap()
    }

    #[test]
    fn test_update_bumps_frame() {
        let world = shared();
        assert_eq!(world.frame().unwrap(), 0);

        world
            .update(|w| {
                w.store_mut().insert(
                    Volume::new(Entity::new(1), VolumeShape::sphere(1.0), Vec3::new(0.0, 0.0, 5.0))?,
                )
            })
            .unwrap();
        assert_eq!(world.frame().unwrap(), 1);
        assert_eq!(world.snapshot().unwrap().store().len(), 1);

        // A failing update still ends the phase
        let err = world.update(|w| w.store_mut().remove(Entity::new(99)).map(|_| ()));
        assert_eq!(err, Err(QueryError::NotFound(Entity::new(99))));
        assert_eq!(world.frame().unwrap(), 2);
    }

    #[test]
    fn test_concurrent_readers_agree() {
        let world = shared();
        world
            .update(|w| {
                for id in 0..32 {
                    let center = Vec3::new((id % 4) as f32 * 0.25, 0.0, 2.0 + id as f32);
                    w.store_mut()
                        .insert(Volume::new(Entity::new(id), VolumeShape::sphere(0.5), center)?)?;
                }
                Ok(())
            })
            .unwrap();

        let query = CastQuery::ray(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0), 100.0)
            .with_mode(CastMode::AllSorted);
        let expected = world.snapshot().unwrap().cast(&query).unwrap();
        assert!(expected.hits().len() > 1);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        let guard = world.snapshot().unwrap();
                        (0..16).map(|_| guard.cast(&query).unwrap()).collect::<Vec<_>>()
                    })
                })
                .collect();
            for handle in handles {
                for result in handle.join().unwrap() {
                    assert_eq!(result, expected);
                }
            }
        });
    }

    #[test]
    fn test_poisoned_lock_reported() {
        let world = shared();
        let writer = world.clone();
        let outcome = std::thread::spawn(move || {
            let _ = writer.update::<(), _>(|_| panic!("writer failed mid-update"));
        })
        .join();
        assert!(outcome.is_err());

        assert!(matches!(world.snapshot(), Err(QueryError::Poisoned)));
        assert_eq!(world.update(|_| Ok(())), Err(QueryError::Poisoned));
    }
}
