//! Packed-vector layouts and antisymmetry helpers for amplitude tensors
//!
//! Every excitation block is described by the ordered list of index spaces of its
//! axes, e.g. EE doubles `r2[a,b,i,j]` is `[V, V, O, O]` and DIP 3h1p
//! `r2[i,j,c,k]` is `[O, O, V, O]`. All axes that live in the same space form one
//! antisymmetric group. A [`PackedLayout`] concatenates the row-major flattening of
//! each block into one vector.

use crate::error::SolverError;
use itertools::Itertools;
use nalgebra::DVector;
use ndarray::{Array3, ArrayD, ArrayView2, ArrayView3, ArrayViewD, Axis, Dimension, IxDyn};

/// Orbital index space of a tensor axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    Occupied,
    Unoccupied,
}

/// Index pattern of one amplitude block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpec {
    axes: Vec<Space>,
}

impl BlockSpec {
    pub fn new(axes: Vec<Space>) -> Self {
        BlockSpec { axes }
    }

    pub fn axes(&self) -> &[Space] {
        &self.axes
    }

    pub fn rank(&self) -> usize {
        self.axes.len()
    }

    /// Number of unoccupied (particle) indices.
    pub fn particle_rank(&self) -> usize {
        self.axes
            .iter()
            .filter(|&&s| s == Space::Unoccupied)
            .count()
    }

    pub fn shape(&self, no: usize, nu: usize) -> Vec<usize> {
        self.axes
            .iter()
            .map(|s| match s {
                Space::Occupied => no,
                Space::Unoccupied => nu,
            })
            .collect()
    }

    pub fn len(&self, no: usize, nu: usize) -> usize {
        self.shape(no, nu).iter().product()
    }

    pub fn is_empty(&self, no: usize, nu: usize) -> bool {
        self.len(no, nu) == 0
    }

    /// Axes grouped by space, in order of first appearance.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut groups: Vec<(Space, Vec<usize>)> = Vec::new();
        for (axis, &space) in self.axes.iter().enumerate() {
            match groups.iter_mut().find(|(s, _)| *s == space) {
                Some((_, members)) => members.push(axis),
                None => groups.push((space, vec![axis])),
            }
        }
        groups.into_iter().map(|(_, members)| members).collect()
    }

    /// Weight of the block in an inner product over unique amplitudes,
    /// `1 / prod(group_size!)`.
    pub fn weight(&self) -> f64 {
        self.groups()
            .iter()
            .map(|g| factorial(g.len()))
            .fold(1.0, |acc, f| acc / f)
    }

    /// Diagonal denominator `sum(eps_unocc) - sum(eps_occ)` over the block's multi-indices.
    pub fn diagonal(&self, eps_occ: &[f64], eps_unocc: &[f64]) -> ArrayD<f64> {
        let shape = self.shape(eps_occ.len(), eps_unocc.len());
        ArrayD::from_shape_fn(IxDyn(&shape), |idx| {
            idx.slice()
                .iter()
                .zip(self.axes.iter())
                .map(|(&p, space)| match space {
                    Space::Occupied => -eps_occ[p],
                    Space::Unoccupied => eps_unocc[p],
                })
                .sum()
        })
    }

    /// Multi-indices that are strictly increasing within every antisymmetric group.
    pub fn canonical_indices(&self, no: usize, nu: usize) -> Vec<Vec<usize>> {
        let groups = self.groups();
        groups
            .iter()
            .map(|g| {
                let dim = match self.axes[g[0]] {
                    Space::Occupied => no,
                    Space::Unoccupied => nu,
                };
                (0..dim).combinations(g.len()).collect::<Vec<_>>()
            })
            .multi_cartesian_product()
            .map(|choice| {
                let mut index = vec![0; self.rank()];
                for (group, values) in groups.iter().zip(choice.iter()) {
                    for (&axis, &value) in group.iter().zip(values.iter()) {
                        index[axis] = value;
                    }
                }
                index
            })
            .collect()
    }

    /// All images of `index` under permutations within each group, with the parity sign.
    pub fn permutation_images(&self, index: &[usize]) -> Vec<(Vec<usize>, f64)> {
        let groups = self.groups();
        groups
            .iter()
            .map(|g| {
                (0..g.len())
                    .permutations(g.len())
                    .map(|p| (p.clone(), parity(&p)))
                    .collect::<Vec<_>>()
            })
            .multi_cartesian_product()
            .map(|perms| {
                let mut image = index.to_vec();
                let mut sign = 1.0;
                for (group, (perm, s)) in groups.iter().zip(perms.iter()) {
                    for (slot, &from) in perm.iter().enumerate() {
                        image[group[slot]] = index[group[from]];
                    }
                    sign *= s;
                }
                (image, sign)
            })
            .collect()
    }
}

/// Layout of a packed vector built from several amplitude blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedLayout {
    no: usize,
    nu: usize,
    blocks: Vec<BlockSpec>,
}

impl PackedLayout {
    pub fn new(no: usize, nu: usize, blocks: Vec<BlockSpec>) -> Self {
        PackedLayout { no, nu, blocks }
    }

    /// `r1[a,i]` only (CIS-like space).
    pub fn ee_singles(no: usize, nu: usize) -> Self {
        use Space::*;
        Self::new(no, nu, vec![BlockSpec::new(vec![Unoccupied, Occupied])])
    }

    /// `r1[a,i]`, `r2[a,b,i,j]`.
    pub fn ee_singles_doubles(no: usize, nu: usize) -> Self {
        use Space::*;
        Self::new(
            no,
            nu,
            vec![
                BlockSpec::new(vec![Unoccupied, Occupied]),
                BlockSpec::new(vec![Unoccupied, Unoccupied, Occupied, Occupied]),
            ],
        )
    }

    /// `r1[a,i]`, `r2[a,b,i,j]`, `r3[a,b,c,i,j,k]`.
    pub fn ee_singles_doubles_triples(no: usize, nu: usize) -> Self {
        use Space::*;
        let mut layout = Self::ee_singles_doubles(no, nu);
        layout.blocks.push(BlockSpec::new(vec![
            Unoccupied, Unoccupied, Unoccupied, Occupied, Occupied, Occupied,
        ]));
        layout
    }

    /// IP `r1[i]`, `r2[i,b,j]`, `r3[i,b,c,j,k]`.
    pub fn ip_3h2p(no: usize, nu: usize) -> Self {
        use Space::*;
        Self::new(
            no,
            nu,
            vec![
                BlockSpec::new(vec![Occupied]),
                BlockSpec::new(vec![Occupied, Unoccupied, Occupied]),
                BlockSpec::new(vec![Occupied, Unoccupied, Unoccupied, Occupied, Occupied]),
            ],
        )
    }

    /// DIP `r1[i,j]`, `r2[i,j,c,k]`.
    pub fn dip_3h1p(no: usize, nu: usize) -> Self {
        use Space::*;
        Self::new(
            no,
            nu,
            vec![
                BlockSpec::new(vec![Occupied, Occupied]),
                BlockSpec::new(vec![Occupied, Occupied, Unoccupied, Occupied]),
            ],
        )
    }

    /// DIP `r1[i,j]`, `r2[i,j,c,k]`, `r3[i,j,c,d,k,l]`.
    pub fn dip_4h2p(no: usize, nu: usize) -> Self {
        use Space::*;
        let mut layout = Self::dip_3h1p(no, nu);
        layout.blocks.push(BlockSpec::new(vec![
            Occupied, Occupied, Unoccupied, Unoccupied, Occupied, Occupied,
        ]));
        layout
    }

    pub fn no(&self) -> usize {
        self.no
    }

    pub fn nu(&self) -> usize {
        self.nu
    }

    pub fn blocks(&self) -> &[BlockSpec] {
        &self.blocks
    }

    pub fn block_len(&self, block: usize) -> usize {
        self.blocks[block].len(self.no, self.nu)
    }

    pub fn offset(&self, block: usize) -> usize {
        (0..block).map(|b| self.block_len(b)).sum()
    }

    /// Total packed length.
    pub fn ndim(&self) -> usize {
        (0..self.blocks.len()).map(|b| self.block_len(b)).sum()
    }

    fn check_len(&self, len: usize) -> Result<(), SolverError> {
        if len != self.ndim() {
            return Err(SolverError::DimensionMismatch {
                expected: self.ndim(),
                found: len,
            });
        }
        Ok(())
    }

    /// Views of every block of `x`, reshaped to the block's tensor shape.
    pub fn split<'a>(&self, x: &'a [f64]) -> Result<Vec<ArrayViewD<'a, f64>>, SolverError> {
        self.check_len(x.len())?;
        let mut views = Vec::with_capacity(self.blocks.len());
        let mut offset = 0;
        for block in &self.blocks {
            let shape = block.shape(self.no, self.nu);
            let len = block.len(self.no, self.nu);
            let view = ArrayViewD::from_shape(IxDyn(&shape), &x[offset..offset + len]).map_err(
                |_| SolverError::DimensionMismatch {
                    expected: len,
                    found: x.len() - offset,
                },
            )?;
            views.push(view);
            offset += len;
        }
        Ok(views)
    }

    /// Concatenate blocks (in logical row-major order) into a packed vector.
    pub fn pack(&self, blocks: &[ArrayD<f64>]) -> Result<DVector<f64>, SolverError> {
        if blocks.len() != self.blocks.len() {
            return Err(SolverError::DimensionMismatch {
                expected: self.blocks.len(),
                found: blocks.len(),
            });
        }
        let mut data = Vec::with_capacity(self.ndim());
        for (spec, block) in self.blocks.iter().zip(blocks) {
            if block.shape() != spec.shape(self.no, self.nu).as_slice() {
                return Err(SolverError::DimensionMismatch {
                    expected: spec.len(self.no, self.nu),
                    found: block.len(),
                });
            }
            data.extend(block.iter().copied());
        }
        Ok(DVector::from_vec(data))
    }

    /// Packed diagonal approximation `sum(eps_unocc) - sum(eps_occ)` of every block.
    pub fn diagonal(&self, eps_occ: &[f64], eps_unocc: &[f64]) -> DVector<f64> {
        let mut data = Vec::with_capacity(self.ndim());
        for block in &self.blocks {
            data.extend(block.diagonal(eps_occ, eps_unocc).iter().copied());
        }
        DVector::from_vec(data)
    }

    /// Inner product over unique amplitudes, e.g. `l1.r1 + 1/4 l2.r2` for EE.
    pub fn weighted_dot(&self, x: &DVector<f64>, y: &DVector<f64>) -> Result<f64, SolverError> {
        self.check_len(x.len())?;
        self.check_len(y.len())?;
        let mut total = 0.0;
        for (b, block) in self.blocks.iter().enumerate() {
            let off = self.offset(b);
            let len = self.block_len(b);
            let dot: f64 = x.rows(off, len).dot(&y.rows(off, len));
            total += block.weight() * dot;
        }
        Ok(total)
    }

    /// Weighted squared norm of each block.
    pub fn block_weights_sqr(&self, x: &DVector<f64>) -> Result<Vec<f64>, SolverError> {
        self.check_len(x.len())?;
        Ok(self
            .blocks
            .iter()
            .enumerate()
            .map(|(b, block)| block.weight() * x.rows(self.offset(b), self.block_len(b)).norm_squared())
            .collect())
    }

    /// Zero-pad a guess that is shorter than the packed space.
    pub fn pad(&self, guess: &DVector<f64>) -> Result<DVector<f64>, SolverError> {
        pad_to(guess, self.ndim())
    }
}

/// Zero-pad `guess` to length `ndim`; longer guesses are rejected.
pub fn pad_to(guess: &DVector<f64>, ndim: usize) -> Result<DVector<f64>, SolverError> {
    if guess.len() > ndim {
        return Err(SolverError::DimensionMismatch {
            expected: ndim,
            found: guess.len(),
        });
    }
    let mut padded = DVector::zeros(ndim);
    padded.rows_mut(0, guess.len()).copy_from(guess);
    Ok(padded)
}

/// Row-major offset of `index` in a tensor of the given shape.
pub fn flat_index(shape: &[usize], index: &[usize]) -> usize {
    shape
        .iter()
        .zip(index.iter())
        .fold(0, |acc, (&dim, &i)| acc * dim + i)
}

fn factorial(n: usize) -> f64 {
    (1..=n).map(|k| k as f64).product()
}

fn parity(perm: &[usize]) -> f64 {
    let inversions = perm
        .iter()
        .enumerate()
        .flat_map(|(i, &p)| perm[i + 1..].iter().filter(move |&&q| q < p))
        .count();
    if inversions % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// Apply `A(a/bc) A(bc)` in place: `X -= P(ab) X + P(ac) X; X -= P(bc) X`.
///
/// The operator is not normalized: on a tensor that is already fully
/// antisymmetric it multiplies every entry by 6.
pub fn antisymmetrize_abc(x: &mut Array3<f64>) {
    let swapped = &x.view().permuted_axes([1, 0, 2]) + &x.view().permuted_axes([2, 1, 0]);
    *x -= &swapped;
    let swapped = x.view().permuted_axes([0, 2, 1]).to_owned();
    *x -= &swapped;
}

/// Fully antisymmetric part of `x`, i.e. `antisymmetrize_abc` divided by 6.
///
/// This is a projector, so applying it twice gives the same tensor.
pub fn antisymmetric_part(x: &Array3<f64>) -> Array3<f64> {
    let mut y = x.clone();
    antisymmetrize_abc(&mut y);
    y / 6.0
}

/// `out[a,b,c] += f * sum_e x[a,b,e] y[e,c]`
pub fn add_contract_abe_ec(out: &mut Array3<f64>, f: f64, x: ArrayView3<f64>, y: ArrayView2<f64>) {
    for (a, mut out_a) in out.outer_iter_mut().enumerate() {
        out_a.scaled_add(f, &x.index_axis(Axis(0), a).dot(&y));
    }
}

/// `out[a,b,c] += f * sum_m x[a,m] y[b,c,m]`
pub fn add_contract_am_bcm(out: &mut Array3<f64>, f: f64, x: ArrayView2<f64>, y: ArrayView3<f64>) {
    for (a, mut out_a) in out.outer_iter_mut().enumerate() {
        for (m, &x_am) in x.row(a).iter().enumerate() {
            out_a.scaled_add(f * x_am, &y.index_axis(Axis(2), m));
        }
    }
}

/// `out[a,b,c] += f * x[a,b] y[c]`
pub fn add_outer_ab_c(
    out: &mut Array3<f64>,
    f: f64,
    x: ArrayView2<f64>,
    y: ndarray::ArrayView1<f64>,
) {
    for ((a, b, c), value) in out.indexed_iter_mut() {
        *value += f * x[[a, b]] * y[c];
    }
}

/// `out[a,b,c] += f * x[a] y[b,c]`
pub fn add_outer_a_bc(
    out: &mut Array3<f64>,
    f: f64,
    x: ndarray::ArrayView1<f64>,
    y: ArrayView2<f64>,
) {
    for (a, mut out_a) in out.outer_iter_mut().enumerate() {
        out_a.scaled_add(f * x[a], &y);
    }
}
