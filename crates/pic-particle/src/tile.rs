//! Structure-of-arrays particle storage for one subdomain.

use pic_math::Vec3;

use crate::schema::slot;

/// Id marking a particle as destroyed. Any negative id counts as destroyed.
pub const INVALID_ID: i64 = -1;

/// Particles of one species in one subdomain.
///
/// Each attribute slot is a separate column; ids and positions are kept
/// alongside. Destroying a particle only flips its id negative, the slot is
/// reclaimed by `compact`. Indices are not stable across `compact` or
/// `partition`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParticleTile {
    ids: Vec<i64>,
    positions: Vec<Vec3>,
    columns: Vec<Vec<f64>>,
}

impl ParticleTile {
    /// Empty tile with `num_attributes` attribute columns.
    pub fn new(num_attributes: usize) -> Self {
        Self {
            ids: Vec::new(),
            positions: Vec::new(),
            columns: vec![Vec::new(); num_attributes],
        }
    }

    /// Number of slots, destroyed particles included.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn num_attributes(&self) -> usize {
        self.columns.len()
    }

    /// Number of particles with a valid id.
    pub fn num_alive(&self) -> usize {
        self.ids.iter().filter(|&&id| id >= 0).count()
    }

    #[inline]
    pub fn is_alive(&self, i: usize) -> bool {
        self.ids[i] >= 0
    }

    /// Append one particle. `attributes` fills the leading columns, the rest
    /// are zeroed.
    pub fn push(&mut self, id: i64, position: Vec3, attributes: &[f64]) {
        debug_assert!(attributes.len() <= self.columns.len());
        self.ids.push(id);
        self.positions.push(position);
        for (c, col) in self.columns.iter_mut().enumerate() {
            col.push(attributes.get(c).copied().unwrap_or(0.0));
        }
    }

    /// Append `n` zeroed slots with ids `first_id..first_id + n` and return the
    /// index of the first one.
    pub fn allocate(&mut self, n: usize, first_id: i64) -> usize {
        let base = self.len();
        let new_len = base + n;
        self.ids.extend((0..n as i64).map(|k| first_id + k));
        self.positions.resize(new_len, Vec3::zeros());
        for col in &mut self.columns {
            col.resize(new_len, 0.0);
        }
        base
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn ids_mut(&mut self) -> &mut [i64] {
        &mut self.ids
    }

    /// Mark particle `i` destroyed.
    #[inline]
    pub fn destroy(&mut self, i: usize) {
        self.ids[i] = INVALID_ID;
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.positions
    }

    /// Column of attribute `slot`.
    pub fn column(&self, slot: usize) -> &[f64] {
        &self.columns[slot]
    }

    pub fn column_mut(&mut self, slot: usize) -> &mut [f64] {
        &mut self.columns[slot]
    }

    #[inline]
    pub fn attribute(&self, slot: usize, i: usize) -> f64 {
        self.columns[slot][i]
    }

    #[inline]
    pub fn set_attribute(&mut self, slot: usize, i: usize, value: f64) {
        self.columns[slot][i] = value;
    }

    #[inline]
    pub fn weight(&self, i: usize) -> f64 {
        self.columns[slot::W][i]
    }

    /// Momentum per unit mass u = γv of particle `i`.
    #[inline]
    pub fn momentum(&self, i: usize) -> Vec3 {
        Vec3::new(
            self.columns[slot::UX][i],
            self.columns[slot::UY][i],
            self.columns[slot::UZ][i],
        )
    }

    #[inline]
    pub fn set_momentum(&mut self, i: usize, u: &Vec3) {
        self.columns[slot::UX][i] = u.x;
        self.columns[slot::UY][i] = u.y;
        self.columns[slot::UZ][i] = u.z;
    }

    /// Gathered (E, B) of particle `i`.
    #[inline]
    pub fn fields(&self, i: usize) -> (Vec3, Vec3) {
        let c = &self.columns;
        (
            Vec3::new(c[slot::EX][i], c[slot::EY][i], c[slot::EZ][i]),
            Vec3::new(c[slot::BX][i], c[slot::BY][i], c[slot::BZ][i]),
        )
    }

    #[inline]
    pub fn set_fields(&mut self, i: usize, e: &Vec3, b: &Vec3) {
        let c = &mut self.columns;
        c[slot::EX][i] = e.x;
        c[slot::EY][i] = e.y;
        c[slot::EZ][i] = e.z;
        c[slot::BX][i] = b.x;
        c[slot::BY][i] = b.y;
        c[slot::BZ][i] = b.z;
    }

    /// Stably reorder so particles whose position satisfies `pred` come
    /// first. Returns how many do.
    pub fn partition<P>(&mut self, pred: P) -> usize
    where
        P: Fn(&Vec3) -> bool,
    {
        let flags: Vec<bool> = self.positions.iter().map(&pred).collect();
        let nfine = flags.iter().filter(|&&f| f).count();
        if nfine == 0 || nfine == self.len() {
            return nfine;
        }

        let order: Vec<usize> = (0..self.len())
            .filter(|&i| flags[i])
            .chain((0..self.len()).filter(|&i| !flags[i]))
            .collect();
        self.permute(&order);
        nfine
    }

    /// Drop destroyed particles, keeping the order of the survivors. Returns
    /// the number removed.
    pub fn compact(&mut self) -> usize {
        let before = self.len();
        let keep: Vec<usize> = (0..before).filter(|&i| self.ids[i] >= 0).collect();
        if keep.len() == before {
            return 0;
        }
        self.permute(&keep);
        before - keep.len()
    }

    /// Replace the storage with the particles at `order`, in that order.
    fn permute(&mut self, order: &[usize]) {
        self.ids = order.iter().map(|&i| self.ids[i]).collect();
        self.positions = order.iter().map(|&i| self.positions[i]).collect();
        for col in &mut self.columns {
            *col = order.iter().map(|&i| col[i]).collect();
        }
    }
}
