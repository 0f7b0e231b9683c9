use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use smallvec::SmallVec;

use crate::bounding_volume::Aabb;
use crate::math::{Point, Real};
use crate::partitioning::{BihBuildParams, BihWrap, PointVisitor, RayVisitor, SpatialObject};
use crate::query::Ray;
use crate::utils::hashmap::HashMap;

/// Number of cells of the grid along each of the X and Y axes.
pub const CELL_NUMBER: i32 = 64;
/// Side length of the square area covered by the grid, centered on the origin.
pub const HGRID_MAP_SIZE: Real = 533.333_33 * 64.0;
/// Side length of a grid cell.
pub const CELL_SIZE: Real = HGRID_MAP_SIZE / CELL_NUMBER as Real;

/// Coordinates of a cell of a [`RegularGrid2D`].
///
/// Cells outside of `0..CELL_NUMBER` on either axis are invalid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Index of the cell along X.
    pub x: i32,
    /// Index of the cell along Y.
    pub y: i32,
}

impl Cell {
    /// The cell containing the world-space position `(x, y)`.
    pub fn compute(x: Real, y: Real) -> Self {
        Self {
            x: Self::coordinate(x),
            y: Self::coordinate(y),
        }
    }

    fn coordinate(v: Real) -> i32 {
        if v.is_nan() {
            return -1;
        }
        // Saturates on overflow.
        (v / CELL_SIZE + (CELL_NUMBER / 2) as Real).floor() as i32
    }

    /// Is this cell part of the grid?
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.x >= 0 && self.x < CELL_NUMBER && self.y >= 0 && self.y < CELL_NUMBER
    }

    /// World-space X or Y coordinate of the lower border of cell number `i`.
    fn lower_border(i: i32) -> Real {
        (i - CELL_NUMBER / 2) as Real * CELL_SIZE
    }

    fn index(&self) -> usize {
        (self.x * CELL_NUMBER + self.y) as usize
    }
}

/// The stepping state of a 2D DDA along one axis.
struct DdaAxis {
    step: i32,
    t_max: Real,
    t_delta: Real,
}

impl DdaAxis {
    fn new(cell: i32, origin: Real, dir: Real, inv_dir: Real) -> Self {
        let lower = Cell::lower_border(cell);
        if dir > 0.0 {
            Self {
                step: 1,
                t_max: (lower + CELL_SIZE - origin) * inv_dir,
                t_delta: CELL_SIZE * inv_dir,
            }
        } else if dir < 0.0 {
            Self {
                step: -1,
                t_max: (lower - origin) * inv_dir,
                t_delta: -CELL_SIZE * inv_dir,
            }
        } else {
            Self {
                step: 0,
                t_max: Real::INFINITY,
                t_delta: Real::INFINITY,
            }
        }
    }
}

/// A fixed grid of [`BihWrap`] cells covering the XY footprint of the world.
///
/// An object is stored in every cell its bounds overlap, and ray queries walk the cells
/// crossed by the ray in order. Cells are created on their first insertion, so an unused area
/// of the world costs nothing.
///
/// Each cell has its own lock: operations on different cells never block each other.
pub struct RegularGrid2D<T: SpatialObject> {
    params: BihBuildParams,
    cells: Box<[OnceLock<BihWrap<T>>]>,
    members: Mutex<HashMap<T::Key, SmallVec<[Cell; 4]>>>,
}

impl<T: SpatialObject> Default for RegularGrid2D<T> {
    fn default() -> Self {
        Self::new(BihBuildParams::default())
    }
}

impl<T: SpatialObject> RegularGrid2D<T> {
    /// Creates an empty grid whose cell trees are built with `params`.
    pub fn new(params: BihBuildParams) -> Self {
        Self {
            params,
            cells: (0..CELL_NUMBER * CELL_NUMBER)
                .map(|_| OnceLock::new())
                .collect(),
            members: Mutex::new(HashMap::default()),
        }
    }

    fn members(&self) -> MutexGuard<'_, HashMap<T::Key, SmallVec<[Cell; 4]>>> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The wrapper of `cell`, if something was ever inserted there.
    pub fn cell(&self, cell: Cell) -> Option<&BihWrap<T>> {
        if cell.is_valid() {
            self.cells[cell.index()].get()
        } else {
            None
        }
    }

    fn cell_or_init(&self, cell: Cell) -> &BihWrap<T> {
        self.cells[cell.index()].get_or_init(|| BihWrap::new(self.params))
    }

    /// The range of valid cells overlapped by the XY footprint of `aabb`.
    fn covered_cells(aabb: &Aabb) -> Option<(Cell, Cell)> {
        if !aabb.is_valid() {
            return None;
        }

        let low = Cell::compute(aabb.mins.x, aabb.mins.y);
        let high = Cell::compute(aabb.maxs.x, aabb.maxs.y);
        if high.x < 0 || high.y < 0 || low.x >= CELL_NUMBER || low.y >= CELL_NUMBER {
            return None;
        }

        let clamp = |c: i32| c.clamp(0, CELL_NUMBER - 1);
        Some((
            Cell {
                x: clamp(low.x),
                y: clamp(low.y),
            },
            Cell {
                x: clamp(high.x),
                y: clamp(high.y),
            },
        ))
    }

    /// Inserts `obj` in every cell its bounds overlap.
    ///
    /// An object already in the grid is first removed from its previous cells. Returns `false`
    /// (and stores nothing) if the object lies entirely outside of the grid.
    pub fn insert(&self, obj: T) -> bool {
        let key = obj.key();
        let mut members = self.members();

        if let Some(previous) = members.remove(&key) {
            for cell in previous {
                if let Some(wrap) = self.cell(cell) {
                    let _ = wrap.remove(&key);
                }
            }
        }

        let aabb = obj.aabb();
        let Some((low, high)) = Self::covered_cells(&aabb) else {
            log::debug!(
                "Object {:?} with bounds {:?} lies outside of the grid: it will not be indexed.",
                key,
                aabb
            );
            return false;
        };

        let mut cells = SmallVec::new();
        for x in low.x..=high.x {
            for y in low.y..=high.y {
                let cell = Cell { x, y };
                self.cell_or_init(cell).insert(obj.clone());
                cells.push(cell);
            }
        }

        let _ = members.insert(key, cells);
        true
    }

    /// Removes the object identified by `key` from every cell it was inserted in.
    ///
    /// Returns `false` if the object is not in the grid.
    pub fn remove(&self, key: &T::Key) -> bool {
        let mut members = self.members();
        let Some(cells) = members.remove(key) else {
            return false;
        };

        for cell in cells {
            if let Some(wrap) = self.cell(cell) {
                let _ = wrap.remove(key);
            }
        }

        true
    }

    /// Does the grid contain the object identified by `key`?
    pub fn contains(&self, key: &T::Key) -> bool {
        self.members().contains_key(key)
    }

    /// The cells the object identified by `key` was inserted in.
    pub fn cells_of(&self, key: &T::Key) -> Option<SmallVec<[Cell; 4]>> {
        self.members().get(key).cloned()
    }

    /// The number of objects in the grid.
    pub fn size(&self) -> usize {
        self.members().len()
    }

    /// Is the grid empty?
    pub fn is_empty(&self) -> bool {
        self.members().is_empty()
    }

    /// Rebuilds the tree of every cell changed since its last rebuild.
    pub fn balance(&self) {
        for wrap in self.cells.iter().filter_map(OnceLock::get) {
            wrap.balance();
        }
    }

    fn intersect_cell_ray(
        &self,
        cell: Cell,
        ray: &Ray,
        visitor: &mut impl RayVisitor<T>,
        max_dist: &mut Real,
        stop_at_first: bool,
    ) -> bool {
        match self.cell(cell) {
            Some(wrap) => wrap.intersect_ray(ray, visitor, max_dist, stop_at_first),
            None => false,
        }
    }

    /// Casts a ray going from `ray.origin` toward `end` on the objects of the grid.
    ///
    /// The cells crossed by the XY projection of the ray are visited in order, from the
    /// cell of the origin to the cell of `end`, until a cell starts farther than `max_dist`
    /// or the ray leaves the grid. Rays starting outside of the grid hit nothing.
    ///
    /// Returns `true` if the traversal stopped early because `stop_at_first` is set and the
    /// visitor reported a hit.
    pub fn intersect_ray(
        &self,
        ray: &Ray,
        visitor: &mut impl RayVisitor<T>,
        max_dist: &mut Real,
        end: &Point<Real>,
        stop_at_first: bool,
    ) -> bool {
        let mut cell = Cell::compute(ray.origin.x, ray.origin.y);
        if !cell.is_valid() {
            return false;
        }

        let last_cell = Cell::compute(end.x, end.y);
        if cell == last_cell {
            return self.intersect_cell_ray(cell, ray, visitor, max_dist, stop_at_first);
        }

        let inv_dir = ray.inv_dir();
        let mut dda_x = DdaAxis::new(cell.x, ray.origin.x, ray.dir.x, inv_dir.x);
        let mut dda_y = DdaAxis::new(cell.y, ray.origin.y, ray.dir.y, inv_dir.y);

        if dda_x.step == 0 && dda_y.step == 0 {
            // Vertical ray: it never leaves its cell.
            return self.intersect_cell_ray(cell, ray, visitor, max_dist, stop_at_first);
        }

        loop {
            if self.intersect_cell_ray(cell, ray, visitor, max_dist, stop_at_first) {
                return true;
            }

            if cell == last_cell || dda_x.t_max.min(dda_y.t_max) > *max_dist {
                return false;
            }

            if dda_x.t_max < dda_y.t_max {
                dda_x.t_max += dda_x.t_delta;
                cell.x += dda_x.step;
            } else {
                dda_y.t_max += dda_y.t_delta;
                cell.y += dda_y.step;
            }

            if !cell.is_valid() {
                return false;
            }
        }
    }

    /// Casts a vertical ray, which only involves the cell containing its origin.
    pub fn intersect_z_aligned_ray(
        &self,
        ray: &Ray,
        visitor: &mut impl RayVisitor<T>,
        max_dist: &mut Real,
    ) -> bool {
        let cell = Cell::compute(ray.origin.x, ray.origin.y);
        self.intersect_cell_ray(cell, ray, visitor, max_dist, false)
    }

    /// Calls `visitor` on the objects of the cell containing `point` whose bounds may contain
    /// `point`.
    pub fn intersect_point(&self, point: &Point<Real>, visitor: &mut impl PointVisitor<T>) {
        if let Some(wrap) = self.cell(Cell::compute(point.x, point.y)) {
            wrap.intersect_point(point, visitor);
        }
    }
}
