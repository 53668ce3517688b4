//! Bounded GL1 tile cache.

use demfile::{CoarseLayout, CoarseRaster, DemError, Gl1Tile, TileKey};
use log::{debug, info, warn};
use std::{
    collections::VecDeque,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

/// Decoded GL1 tiles for one data root, plus that root's GL30 raster.
///
/// A single mutex covers lookup and disk I/O, so concurrent misses on
/// the same tile decode it only once.
pub struct TileCache {
    inner: Mutex<Inner>,

    /// Bumped on every [`TileCache::set_path`].
    generation: AtomicU64,
}

struct Inner {
    /// Directory holding `*.SRTMGL1.hgt.lz4` tiles and
    /// `SRTMGL30_ALL.dem`.
    root: PathBuf,

    /// Maximum number of resident tiles, at least 1.
    capacity: usize,

    /// Most recently inserted first.
    tiles: VecDeque<(TileKey, Arc<Gl1Tile>)>,

    coarse_layout: CoarseLayout,

    coarse: Option<Arc<CoarseRaster>>,
}

impl TileCache {
    pub fn new<P: Into<PathBuf>>(root: P, capacity: usize) -> Self {
        Self::with_layout(root, capacity, CoarseLayout::GL30)
    }

    /// Creates a cache whose coarse raster uses `coarse_layout` instead
    /// of the global GL30 one.
    pub fn with_layout<P: Into<PathBuf>>(
        root: P,
        capacity: usize,
        coarse_layout: CoarseLayout,
    ) -> Self {
        let root = root.into();
        let coarse = open_coarse(&root, coarse_layout);
        Self {
            inner: Mutex::new(Inner {
                root,
                capacity: capacity.max(1),
                tiles: VecDeque::new(),
                coarse_layout,
                coarse,
            }),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns the tile for `key`, decoding it on a miss.
    ///
    /// Tiles that fail to load are cached as [`Gl1Tile::invalid`].
    pub fn load(&self, key: TileKey) -> Arc<Gl1Tile> {
        let mut inner = self.lock();
        if let Some((_, tile)) = inner.tiles.iter().find(|(k, _)| *k == key) {
            return tile.clone();
        }

        while inner.tiles.len() >= inner.capacity {
            if let Some((evicted, _)) = inner.tiles.pop_back() {
                debug!("evicting {evicted:?}");
            }
        }

        let tile = match Gl1Tile::load(&inner.root, key) {
            Ok(tile) => {
                debug!("loaded {}", key.file_name());
                Arc::new(tile)
            }
            Err(DemError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!("no tile {} in {:?}", key.file_name(), inner.root);
                Gl1Tile::invalid()
            }
            Err(e) => {
                warn!("failed to load {}: {e}", key.file_name());
                Gl1Tile::invalid()
            }
        };
        inner.tiles.push_front((key, tile.clone()));
        tile
    }

    /// Returns the coarse raster for the current root, if it opened.
    pub fn coarse(&self) -> Option<Arc<CoarseRaster>> {
        self.lock().coarse.clone()
    }

    /// Points the cache at a new data root.
    ///
    /// Drops every resident tile and reopens the coarse raster. Tiles
    /// already handed out stay valid.
    pub fn set_path<P: Into<PathBuf>>(&self, root: P) {
        let root = root.into();
        let mut inner = self.lock();
        info!("switching elevation data root to {root:?}");
        inner.tiles.clear();
        inner.coarse = open_coarse(&root, inner.coarse_layout);
        inner.root = root;
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Changes the tile capacity.
    ///
    /// Growing takes effect immediately; shrinking evicts on the next
    /// miss.
    pub fn resize(&self, capacity: usize) {
        self.lock().capacity = capacity.max(1);
    }

    pub fn len(&self) -> usize {
        self.lock().tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn root(&self) -> PathBuf {
        self.lock().root.clone()
    }

    /// Returns `true` if `key` is resident, including failed loads.
    pub fn contains(&self, key: TileKey) -> bool {
        self.lock().tiles.iter().any(|(k, _)| *k == key)
    }

    /// Counts [`TileCache::set_path`] calls, letting readers detect
    /// that tiles they hold belong to an old root.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

/// Private API
impl TileCache {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Inner is consistent between statements, so a panicking holder
        // cannot leave it half-updated.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn open_coarse(root: &Path, layout: CoarseLayout) -> Option<Arc<CoarseRaster>> {
    let path = root.join(demfile::GL30_FILE_NAME);
    match CoarseRaster::open_with_layout(&path, layout) {
        Ok(raster) => Some(Arc::new(raster)),
        Err(DemError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            debug!("no coarse raster at {path:?}");
            None
        }
        Err(e) => {
            warn!("failed to open {path:?}: {e}");
            None
        }
    }
}
