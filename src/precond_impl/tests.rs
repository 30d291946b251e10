//! Tests for the preconditioners

#[cfg(test)]
mod tests {
    use super::super::{zero_outside_pspace, DiagonalPreconditioner, PSpaceMask, Preconditioner};
    use crate::error::SolverError;
    use crate::tensor::{flat_index, BlockSpec, PackedLayout, Space};
    use nalgebra::DVector;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn dip_4h2p_block() -> BlockSpec {
        use Space::*;
        BlockSpec::new(vec![
            Occupied, Occupied, Unoccupied, Unoccupied, Occupied, Occupied,
        ])
    }

    #[test]
    fn test_zero_denominator_leaves_entry_unchanged() {
        let precond = DiagonalPreconditioner::new(DVector::from_vec(vec![1.0, 2.0, 3.0]));
        let residual = DVector::from_vec(vec![0.5, 0.7, -0.4]);
        let q = precond.precondition(&residual, 2.0);
        assert!(q.iter().all(|x| x.is_finite()));
        assert!((q[0] - 0.5).abs() < 1e-15);
        assert_eq!(q[1], 0.7);
        assert!((q[2] - 0.4).abs() < 1e-15);
    }

    #[test]
    fn test_layout_diagonal_signs() {
        let layout = PackedLayout::ip_3h2p(2, 1);
        let precond = DiagonalPreconditioner::from_layout(&layout, &[-0.5, -0.3], &[0.2]);
        let d = precond.diagonal();
        assert_eq!(precond.dim(), layout.ndim());
        assert!((d[0] - 0.5).abs() < 1e-15);
        assert!((d[1] - 0.3).abs() < 1e-15);
        // r2[i=0,b=0,j=1] = eps_b - eps_i - eps_j
        assert!((d[2 + 1] - (0.2 + 0.5 + 0.3)).abs() < 1e-15);
    }

    #[test]
    fn test_pspace_update_writes_signed_images() {
        let (no, nu) = (5, 2);
        let layout = PackedLayout::dip_4h2p(no, nu);
        let block = dip_4h2p_block();
        let mask = PSpaceMask::from_indices(block.clone(), vec![vec![1, 0, 0, 1, 2, 3]]);
        assert!(mask.is_active(&[0, 1, 1, 0, 3, 2]));
        assert_eq!(mask.len(), 1);

        let eps_o = [-1.0, -0.9, -0.8, -0.7, -0.6];
        let eps_v = [0.3, 0.6];
        let precond = DiagonalPreconditioner::from_layout(&layout, &eps_o, &eps_v)
            .with_pspace(2, mask)
            .unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        let residual = DVector::from_fn(layout.ndim(), |_, _| rng.gen_range(-1.0..1.0));
        let omega = 0.25;
        let q = precond.precondition(&residual, omega);

        let shape = block.shape(no, nu);
        let offset = layout.offset(2);
        let at = |idx: &[usize]| offset + flat_index(&shape, idx);

        let canon = [0, 1, 0, 1, 2, 3];
        let denom = omega - precond.diagonal()[at(&canon)];
        let expected = residual[at(&canon)] / denom;
        assert!((q[at(&canon)] - expected).abs() < 1e-14);
        assert!((q[at(&[1, 0, 0, 1, 2, 3])] + expected).abs() < 1e-14);
        assert!((q[at(&[0, 1, 1, 0, 2, 3])] + expected).abs() < 1e-14);
        assert!((q[at(&[1, 0, 1, 0, 3, 2])] + expected).abs() < 1e-14);
        assert!((q[at(&[1, 0, 0, 1, 3, 2])] - expected).abs() < 1e-14);

        // inactive entries are zero with the sign of their permutation
        assert_eq!(q[at(&[0, 1, 0, 1, 2, 4])], 0.0);
        assert!(q[at(&[0, 1, 0, 1, 2, 4])].is_sign_positive());
        assert!(q[at(&[1, 0, 0, 1, 2, 4])].is_sign_negative());
        // repeated index
        assert_eq!(q[at(&[0, 0, 0, 1, 2, 3])], 0.0);

        // unrestricted blocks still get the plain diagonal update
        assert!((q[0] - residual[0] / (omega - precond.diagonal()[0])).abs() < 1e-14);
    }

    #[test]
    fn test_zero_outside_pspace_keeps_antisymmetry() {
        let (no, nu) = (5, 2);
        let block = dip_4h2p_block();
        let shape = block.shape(no, nu);
        let len = block.len(no, nu);

        // random antisymmetric block
        let mut rng = StdRng::seed_from_u64(9);
        let values: Vec<f64> = (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let mut data = vec![0.0; len];
        PSpaceMask::full(block.clone(), no, nu).fill_block(no, nu, &mut data, |flat| values[flat]);

        let keep = [0, 1, 0, 1, 2, 4];
        let mask = PSpaceMask::from_indices(block.clone(), vec![keep.to_vec()]);
        let before = data.clone();
        zero_outside_pspace(&mut data, &mask, no, nu);

        let kept = flat_index(&shape, &keep);
        assert_eq!(data[kept], before[kept]);
        let image = flat_index(&shape, &[1, 0, 0, 1, 4, 2]);
        assert_eq!(data[image], before[image]);
        assert!((data[image] - data[kept]).abs() < 1e-15);

        let nonzero = data.iter().filter(|x| **x != 0.0).count();
        // 4! hole orderings times 2 particle orderings
        assert_eq!(nonzero, 48);
    }

    #[test]
    fn test_mask_block_must_match_layout() {
        let layout = PackedLayout::dip_4h2p(4, 2);
        let precond = DiagonalPreconditioner::from_layout(&layout, &[0.0; 4], &[0.0; 2]);
        let err = precond
            .with_pspace(1, PSpaceMask::new(dip_4h2p_block()))
            .unwrap_err();
        assert_eq!(err, SolverError::PSpaceBlock { block: 1 });

        let bare = DiagonalPreconditioner::new(DVector::zeros(3));
        assert!(bare.with_pspace(0, PSpaceMask::new(dip_4h2p_block())).is_err());
    }
}
