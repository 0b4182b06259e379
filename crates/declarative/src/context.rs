//! Scoped engine handles

use crate::error::Result;
use pkgkit::{Engine, EngineFactory};
use std::ops::{Deref, DerefMut};

/// An open engine handle that is closed when dropped.
///
/// Every exit path of a `get` or `set`, including early returns through `?`,
/// releases the handle.
pub struct EngineSession<E: Engine> {
    engine: E,
}

impl<E: Engine> EngineSession<E> {
    /// Open a handle from `factory`.
    pub fn open<F>(factory: &F) -> Result<Self>
    where
        F: EngineFactory<Engine = E>,
    {
        let engine = factory.open()?;
        log::debug!("Engine session opened");
        Ok(Self { engine })
    }
}

impl<E: Engine> Deref for EngineSession<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.engine
    }
}

impl<E: Engine> DerefMut for EngineSession<E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

impl<E: Engine> Drop for EngineSession<E> {
    fn drop(&mut self) {
        self.engine.close();
        log::debug!("Engine session closed");
    }
}
