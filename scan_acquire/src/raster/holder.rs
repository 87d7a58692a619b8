use super::{Limits, Raster};
use crate::error::LogicError;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

/// Lines added at once when a write goes past the current raster height.
pub const DEFAULT_GROW_HEIGHT: u32 = 32;

/// A rectangle of pixels touched by writes, in raster coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn union(&self, other: &Region) -> Region {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Region {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }
}

fn merge(target: &mut Option<Region>, region: Region) {
    *target = Some(match target {
        Some(current) => current.union(&region),
        None => region,
    });
}

#[derive(Debug)]
struct HolderState {
    raster: Option<Raster>,
    damage: Option<Region>,
    limits: Limits,
    grow_height: u32,
}

/// Shared owner of the raster being assembled.
///
/// One writer at a time mutates the raster through [`ImageHolder::modifier`] while any number
/// of observers may query its dimensions or take snapshots from other threads.
#[derive(Debug, Clone)]
pub struct ImageHolder {
    state: Arc<RwLock<HolderState>>,
}

impl Default for ImageHolder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageHolder {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            state: Arc::new(RwLock::new(HolderState {
                raster: None,
                damage: None,
                limits,
                grow_height: DEFAULT_GROW_HEIGHT,
            })),
        }
    }

    /// Changes how many lines are added when a write needs the raster to grow.
    pub fn set_grow_height(&self, grow_height: u32) {
        self.write().grow_height = grow_height.max(1);
    }

    pub fn limits(&self) -> Limits {
        self.read(|state| state.limits.clone())
    }

    /// `(width, height)` of the current raster.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.read(|state| {
            state
                .raster
                .as_ref()
                .map(|raster| (raster.width(), raster.height()))
        })
    }

    pub fn snapshot(&self) -> Option<Raster> {
        self.read(|state| state.raster.clone())
    }

    /// Returns the region modified since the previous call.
    pub fn take_damage(&self) -> Option<Region> {
        self.write().damage.take()
    }

    pub fn modifier(&self) -> RasterModifier<'_> {
        RasterModifier {
            state: self.write(),
            damage: None,
        }
    }

    fn read<T>(&self, f: impl FnOnce(&HolderState) -> T) -> T {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write(&self) -> RwLockWriteGuard<'_, HolderState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Scoped write access to the raster of an [`ImageHolder`].
///
/// Touched regions are accumulated and published to the holder when the modifier drops.
pub struct RasterModifier<'a> {
    state: RwLockWriteGuard<'a, HolderState>,
    damage: Option<Region>,
}

impl RasterModifier<'_> {
    pub fn set_raster(&mut self, raster: Raster) {
        merge(
            &mut self.damage,
            Region {
                x: 0,
                y: 0,
                width: raster.width(),
                height: raster.height(),
            },
        );
        self.state.raster = Some(raster);
    }

    pub fn raster(&self) -> Option<&Raster> {
        self.state.raster.as_ref()
    }

    pub fn width(&self) -> u32 {
        self.raster().map_or(0, Raster::width)
    }

    pub fn height(&self) -> u32 {
        self.raster().map_or(0, Raster::height)
    }

    /// Returns the bytes of line `index`, growing the raster first when the line doesn't exist
    /// yet. `start_px` and `px_count` describe the pixels the caller is going to write.
    pub fn scan_line(
        &mut self,
        index: u32,
        start_px: u32,
        px_count: u32,
    ) -> Result<&mut [u8], LogicError> {
        let height = self
            .state
            .raster
            .as_ref()
            .ok_or(LogicError::InvalidGeometry)?
            .height();
        if index >= height {
            let grown = index
                .checked_add(self.state.grow_height)
                .ok_or(LogicError::DataTooLarge)?;
            self.set_height(grown)?;
        }
        merge(
            &mut self.damage,
            Region {
                x: start_px,
                y: index,
                width: px_count,
                height: 1,
            },
        );
        let raster = self
            .state
            .raster
            .as_mut()
            .ok_or(LogicError::InvalidGeometry)?;
        Ok(raster.row_mut(index))
    }

    /// Reallocates the raster to `height` lines preserving existing bytes.
    pub fn set_height(&mut self, height: u32) -> Result<(), LogicError> {
        let limits = self.state.limits.clone();
        let raster = self
            .state
            .raster
            .as_mut()
            .ok_or(LogicError::InvalidGeometry)?;
        if raster.height() == height {
            return Ok(());
        }
        limits.check(raster.width(), height, raster.format())?;
        raster.set_height(height);
        let width = raster.width();
        merge(
            &mut self.damage,
            Region {
                x: 0,
                y: 0,
                width,
                height,
            },
        );
        Ok(())
    }
}

impl Drop for RasterModifier<'_> {
    fn drop(&mut self) {
        if let Some(region) = self.damage.take() {
            merge(&mut self.state.damage, region);
        }
    }
}
