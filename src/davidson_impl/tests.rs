//! Tests for the iterative eigensolvers

#[cfg(test)]
mod tests {
    use super::super::{
        Davidson, DavidsonParams, HistoryObserver, RayleighParams, RayleighQuotientSolver,
    };
    use crate::eigen::{eigenvalues, RootSelection};
    use crate::error::SolverError;
    use crate::operator::{DenseOperator, FnOperator};
    use crate::precond_impl::DiagonalPreconditioner;
    use nalgebra::{DMatrix, DVector};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Non-symmetric, diagonally dominant test matrix with diagonal 1, 2, ..., n.
    fn dominant_matrix(n: usize, coupling: f64, seed: u64) -> DMatrix<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        DMatrix::from_fn(n, n, |r, c| {
            if r == c {
                (r + 1) as f64
            } else {
                coupling * rng.gen_range(-1.0..1.0)
            }
        })
    }

    fn lowest_eigenvalue(a: &DMatrix<f64>) -> f64 {
        eigenvalues(a)
            .unwrap()
            .iter()
            .map(|z| z.re)
            .fold(f64::INFINITY, f64::min)
    }

    fn eigen_residual(a: &DMatrix<f64>, omega: f64, v: &DVector<f64>) -> f64 {
        (a * v - v * omega).norm() / v.norm()
    }

    fn tight_params() -> DavidsonParams {
        DavidsonParams {
            max_iterations: 200,
            convergence_threshold: 1e-10,
            ..DavidsonParams::default()
        }
    }

    #[test]
    fn test_exact_small_triangular_problem() {
        let a = DMatrix::from_row_slice(3, 3, &[1.0, 0.5, 0.2, 0.0, 2.0, 0.3, 0.0, 0.0, 3.0]);
        let op = DenseOperator::new(a.clone());
        let precond = DiagonalPreconditioner::new(a.diagonal());
        let solver = Davidson::new(&op, &precond, tight_params());

        let guess = DVector::from_vec(vec![0.1, 1.0, 0.05]);
        let solution = solver.solve(&guess, 0.0, &mut ()).unwrap();

        assert!(solution.converged);
        assert!((solution.omega - 2.0).abs() < 1e-10);
        assert!(eigen_residual(&a, solution.omega, &solution.vector) < 1e-9);
        // eigenvector of 2.0 is (1, 2, 0) up to normalization and sign
        let expected = DVector::from_vec(vec![1.0, 2.0, 0.0]).normalize();
        assert!((solution.vector.dot(&expected).abs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_lowest_root_of_dominant_matrix() {
        let a = dominant_matrix(30, 0.02, 1);
        let op = DenseOperator::new(a.clone());
        let precond = DiagonalPreconditioner::new(a.diagonal());
        let solver = Davidson::new(&op, &precond, tight_params());

        let mut history = HistoryObserver::default();
        let guess = DVector::from_vec(vec![1.0]);
        let solution = solver.solve(&guess, 1.0, &mut history).unwrap();

        assert!(solution.converged);
        assert!((solution.omega - lowest_eigenvalue(&a)).abs() < 1e-9);
        assert!((solution.vector.norm() - 1.0).abs() < 1e-10);
        assert_eq!(history.records.len(), solution.iterations);
    }

    #[test]
    fn test_restart_reaches_same_root() {
        let a = dominant_matrix(40, 0.05, 2);
        let op = DenseOperator::new(a.clone());
        let precond = DiagonalPreconditioner::new(a.diagonal());
        let guess = DVector::from_vec(vec![1.0, 0.1]);

        let free = Davidson::new(&op, &precond, tight_params())
            .solve(&guess, 1.0, &mut ())
            .unwrap();
        assert!(free.converged);
        assert!((free.omega - lowest_eigenvalue(&a)).abs() < 1e-9);

        for (max_size, depth) in [(2, 1), (3, 2), (4, 2)] {
            let mut history = HistoryObserver::default();
            let restarted = Davidson::new(
                &op,
                &precond,
                DavidsonParams {
                    max_subspace_size: max_size,
                    restart_depth: depth,
                    ..tight_params()
                },
            )
            .solve(&guess, 1.0, &mut history)
            .unwrap();

            assert!(restarted.converged, "max_size {} did not converge", max_size);
            assert!(!history.restarts.is_empty());
            assert!(history.records.iter().all(|r| r.subspace_size <= max_size));
            assert!((free.omega - restarted.omega).abs() < 1e-9);
            assert!((free.vector.dot(&restarted.vector).abs() - 1.0).abs() < 1e-7);
        }
    }

    #[test]
    fn test_restart_keeps_ritz_vector_and_correction() {
        let a = dominant_matrix(25, 0.03, 3);
        let op = DenseOperator::new(a.clone());
        let precond = DiagonalPreconditioner::new(a.diagonal());
        let mut history = HistoryObserver::default();
        let solution = Davidson::new(
            &op,
            &precond,
            DavidsonParams {
                max_subspace_size: 2,
                restart_depth: 1,
                ..tight_params()
            },
        )
        .solve(&DVector::from_vec(vec![1.0]), 1.0, &mut history)
        .unwrap();

        assert!(solution.converged);
        assert!((solution.omega - lowest_eigenvalue(&a)).abs() < 1e-9);
        assert!(eigen_residual(&a, solution.omega, &solution.vector) < 1e-9);
        // collapsed to the Ritz vector plus the new correction
        for record in history.records.iter().filter(|r| history.restarts.contains(&r.iteration)) {
            assert_eq!(record.subspace_size, 2);
        }
    }

    #[test]
    fn test_max_overlap_tracks_guess_root() {
        // the guess overlaps most with the root near 0.0 but its Rayleigh quotient sits next to 0.92
        #[rustfmt::skip]
        let a = DMatrix::from_row_slice(4, 4, &[
             0.000, -0.175,  0.128,  0.018,
            -0.039,  2.000, -0.286, -0.117,
            -0.083, -0.374,  1.000,  0.216,
             0.055, -0.267, -0.302,  3.000,
        ]);
        let op = DenseOperator::new(a.clone());
        let precond = DiagonalPreconditioner::new(a.diagonal());
        let guess = DVector::from_vec(vec![0.7, 0.6, 0.0, -0.3]);
        let unit_guess = guess.normalize();

        let tracked = Davidson::new(&op, &precond, tight_params())
            .solve(&guess, 0.0, &mut ())
            .unwrap();
        assert_eq!(tight_params().root_selection, RootSelection::MaxOverlap);
        assert!(tracked.converged);
        assert!((tracked.omega - 0.006540227638577534).abs() < 1e-6);
        assert!(eigen_residual(&a, tracked.omega, &tracked.vector) < 1e-9);

        let closest = Davidson::new(
            &op,
            &precond,
            DavidsonParams {
                root_selection: RootSelection::ClosestEnergy,
                ..tight_params()
            },
        )
        .solve(&guess, 0.0, &mut ())
        .unwrap();
        assert!(closest.converged);
        assert!((closest.omega - 0.9237751296548457).abs() < 1e-6);
        assert!(eigen_residual(&a, closest.omega, &closest.vector) < 1e-9);

        let overlap = |v: &DVector<f64>| (v.dot(&unit_guess) / v.norm()).abs();
        assert!(overlap(&tracked.vector) > 0.7);
        assert!(overlap(&closest.vector) < 0.2);
    }

    #[test]
    fn test_olsen_correction_is_on_by_default() {
        assert!(DavidsonParams::default().olsen_correction);
        let a = dominant_matrix(25, 0.03, 6);
        let op = DenseOperator::new(a.clone());
        let precond = DiagonalPreconditioner::new(a.diagonal());
        let guess = DVector::from_vec(vec![1.0]);

        for olsen_correction in [true, false] {
            let solution = Davidson::new(
                &op,
                &precond,
                DavidsonParams {
                    olsen_correction,
                    ..tight_params()
                },
            )
            .solve(&guess, 1.0, &mut ())
            .unwrap();
            assert!(solution.converged);
            assert!((solution.omega - lowest_eigenvalue(&a)).abs() < 1e-8);
        }
    }

    #[test]
    fn test_residual_trend_and_orthogonality() {
        let a = dominant_matrix(50, 0.01, 4);
        let op = DenseOperator::new(a.clone());
        let precond = DiagonalPreconditioner::new(a.diagonal());
        let mut history = HistoryObserver::default();
        let solution = Davidson::new(&op, &precond, tight_params())
            .solve(&DVector::from_vec(vec![1.0]), 0.0, &mut history)
            .unwrap();

        assert!(solution.converged);
        let first = history.records.first().unwrap().residual_norm;
        let last = history.records.last().unwrap().residual_norm;
        assert!(last < first * 1e-6);
        // new basis vectors are orthogonal to the existing basis
        for record in &history.records {
            assert!(record.max_overlap >= 0.0);
            assert!(record.max_overlap < 1e-4);
        }
    }

    #[test]
    fn test_unconverged_run_returns_last_iterate() {
        let a = dominant_matrix(30, 0.05, 5);
        let op = DenseOperator::new(a.clone());
        let precond = DiagonalPreconditioner::new(a.diagonal());
        let solution = Davidson::new(
            &op,
            &precond,
            DavidsonParams {
                max_iterations: 2,
                ..tight_params()
            },
        )
        .solve(&DVector::from_vec(vec![1.0]), 1.0, &mut ())
        .unwrap();

        assert!(!solution.converged);
        assert_eq!(solution.iterations, 2);
        assert!(solution.residual_norm.is_finite());
        assert_eq!(solution.vector.len(), 30);
    }

    #[test]
    fn test_guess_validation() {
        let a = dominant_matrix(4, 0.1, 6);
        let op = DenseOperator::new(a.clone());
        let precond = DiagonalPreconditioner::new(a.diagonal());
        let solver = Davidson::new(&op, &precond, tight_params());

        let err = solver
            .solve(&DVector::from_element(5, 1.0), 0.0, &mut ())
            .unwrap_err();
        assert_eq!(
            err,
            SolverError::DimensionMismatch {
                expected: 4,
                found: 5
            }
        );
        let err = solver.solve(&DVector::zeros(2), 0.0, &mut ()).unwrap_err();
        assert_eq!(err, SolverError::ZeroGuess);

        let bad_precond = DiagonalPreconditioner::new(DVector::from_element(3, 1.0));
        let err = Davidson::new(&op, &bad_precond, tight_params())
            .solve(&DVector::from_vec(vec![1.0]), 0.0, &mut ())
            .unwrap_err();
        assert!(matches!(err, SolverError::OperatorDimension { .. }));
    }

    #[test]
    fn test_operator_returning_wrong_length_is_rejected() {
        let op = FnOperator::new(3, |_, x: &DVector<f64>| x.rows(0, 2).into_owned());
        let precond = DiagonalPreconditioner::new(DVector::from_element(3, 1.0));
        let err = Davidson::new(&op, &precond, tight_params())
            .solve(&DVector::from_vec(vec![1.0]), 0.0, &mut ())
            .unwrap_err();
        assert_eq!(
            err,
            SolverError::OperatorDimension {
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn test_closest_energy_follows_target_root() {
        let mut a = dominant_matrix(20, 0.01, 7);
        a[(1, 1)] = 1.2;
        let op = DenseOperator::new(a.clone());
        let precond = DiagonalPreconditioner::new(a.diagonal());
        let solution = Davidson::new(
            &op,
            &precond,
            DavidsonParams {
                root_selection: RootSelection::ClosestEnergy,
                ..tight_params()
            },
        )
        .solve(&DVector::from_vec(vec![0.0, 1.0]), 1.2, &mut ())
        .unwrap();

        assert!(solution.converged);
        assert!((solution.omega - 1.2).abs() < 1e-2);
        assert!(eigen_residual(&a, solution.omega, &solution.vector) < 1e-9);
    }

    #[test]
    fn test_energy_dependent_operator() {
        // H(ω) = A + 0.1 ω I has the self-consistent root ω = λ / 0.9
        let a = dominant_matrix(15, 0.02, 8);
        let lambda = lowest_eigenvalue(&a);
        let dense = a.clone();
        let op = FnOperator::new(15, move |omega, x: &DVector<f64>| {
            &dense * x + x * (0.1 * omega)
        });
        let precond = DiagonalPreconditioner::new(a.diagonal());
        let params = RayleighParams {
            max_iterations: 500,
            convergence_threshold: 1e-10,
            shift: 0.0,
        };
        let solution = RayleighQuotientSolver::new(&op, &precond, params)
            .solve(&DVector::from_vec(vec![1.0]), 1.0, &mut ())
            .unwrap();

        assert!(solution.converged);
        assert!((solution.omega - lambda / 0.9).abs() < 1e-8);
    }

    #[test]
    fn test_rayleigh_quotient_solver() {
        let a = dominant_matrix(20, 0.02, 9);
        let op = DenseOperator::new(a.clone());
        let precond = DiagonalPreconditioner::new(a.diagonal());
        let params = RayleighParams {
            max_iterations: 500,
            convergence_threshold: 1e-9,
            shift: 0.0,
        };
        let mut history = HistoryObserver::default();
        let solution = RayleighQuotientSolver::new(&op, &precond, params)
            .solve(&DVector::from_vec(vec![1.0]), 0.0, &mut history)
            .unwrap();

        assert!(solution.converged);
        assert!((solution.omega - lowest_eigenvalue(&a)).abs() < 1e-8);
        assert!((solution.vector.norm() - 1.0).abs() < 1e-12);
        assert!(history.records.iter().all(|r| r.subspace_size == 1));
    }
}
