// src/model/factory.rs

use crate::error::{FactoryError, Result};
use crate::model::matrix::Matrix;

/// A product loaded into a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    pub product: usize,
    /// Ticks of processing left. `None` means finished and waiting for ejection.
    pub remaining: Option<u32>,
    /// Index of the manufacturing step being executed.
    pub step: usize,
}

/// A product travelling between machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transit {
    pub target: usize,
    pub remaining: u32,
}

/// The complete state of one factory for one episode.
///
/// Every "none"/"absent" cell is an `Option::None`. The state is owned by the
/// episode loop and only mutated by the step pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryState {
    /// `working_time[(m, s)]`: ticks machine `m` needs for step `s`, if it can do it.
    pub working_time: Matrix<Option<u32>>,
    /// `product_design[(p, s)]`: step `s` is still required for product `p`.
    pub product_design: Matrix<bool>,
    /// `travel_time[(from, to)]`: directed transit duration. Diagonal is `None`.
    pub travel_time: Matrix<Option<u32>>,
    pub product_bucket: Vec<Option<usize>>,
    pub occupancy: Vec<Option<Occupancy>>,
    pub transit: Vec<Option<Transit>>,
    pub failure_counter: Vec<Option<u32>>,
    /// Capability rows of failed machines, restored on recovery.
    pub failure_info: Matrix<Option<u32>>,
}

impl FactoryState {
    /// Builds a fresh factory from caller-supplied tables.
    ///
    /// Checks that all tables agree on the machine count (M) and product
    /// count (P), that every product starts in a bucket of a real machine, and
    /// that every off-diagonal travel time is present and positive.
    pub fn from_matrices(
        working_time: Matrix<Option<u32>>,
        product_design: Matrix<bool>,
        travel_time: Matrix<Option<u32>>,
        product_bucket: Vec<Option<usize>>,
    ) -> Result<Self> {
        let machines = working_time.rows();
        let products = product_design.rows();

        expect_dim("working time columns", machines, working_time.cols())?;
        expect_dim("product design columns", machines, product_design.cols())?;
        expect_dim("travel time rows", machines, travel_time.rows())?;
        expect_dim("travel time columns", machines, travel_time.cols())?;
        expect_dim("product bucket length", products, product_bucket.len())?;

        for (product, bucket) in product_bucket.iter().enumerate() {
            let Some(bucket) = *bucket else {
                return Err(FactoryError::UnplacedProduct { product });
            };
            if bucket >= machines {
                return Err(FactoryError::DimensionMismatch {
                    what: "product bucket machine index",
                    expected: machines,
                    found: bucket,
                });
            }
        }

        for from in 0..machines {
            for to in (0..machines).filter(|&to| to != from) {
                match travel_time[(from, to)] {
                    Some(t) if t > 0 => {}
                    _ => return Err(FactoryError::MissingTravelTime { from, to }),
                }
            }
        }

        Ok(Self {
            working_time,
            product_design,
            travel_time,
            product_bucket,
            occupancy: vec![None; machines],
            transit: vec![None; products],
            failure_counter: vec![None; machines],
            failure_info: Matrix::filled(machines, machines, None),
        })
    }

    pub fn machine_count(&self) -> usize {
        self.working_time.rows()
    }

    pub fn product_count(&self) -> usize {
        self.product_design.rows()
    }

    /// Lowest-index required step of a product. Steps are consumed left to right.
    pub fn next_required_step(&self, product: usize) -> Option<usize> {
        self.product_design
            .row(product)
            .iter()
            .position(|&required| required)
    }

    /// Number of required steps left across all products.
    pub fn remaining_steps(&self) -> usize {
        self.product_design.iter().filter(|&&required| required).count()
    }

    /// Number of ProductDesign cells that are absent.
    pub fn finished_steps(&self) -> usize {
        self.product_design.iter().filter(|&&required| !required).count()
    }

    pub fn is_complete(&self) -> bool {
        self.product_design.iter().all(|&required| !required)
    }

    pub fn is_failed(&self, machine: usize) -> bool {
        self.failure_counter[machine].is_some()
    }

    pub fn failed_machines(&self) -> usize {
        self.failure_counter.iter().filter(|c| c.is_some()).count()
    }

    pub fn products_in_transit(&self) -> usize {
        self.transit.iter().filter(|t| t.is_some()).count()
    }

    pub fn products_in_machines(&self) -> usize {
        self.occupancy.iter().filter(|o| o.is_some()).count()
    }

    /// Returns a description of every broken structural invariant.
    ///
    /// Each product must be in exactly one of bucket / transit / machine, and
    /// a machine may hold at most one product.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for product in 0..self.product_count() {
            let holders = self
                .occupancy
                .iter()
                .filter(|slot| slot.is_some_and(|o| o.product == product))
                .count();
            let places = usize::from(self.product_bucket[product].is_some())
                + usize::from(self.transit[product].is_some())
                + holders;
            if places != 1 {
                violations.push(format!("product {product} is in {places} places"));
            }
        }

        for (machine, slot) in self.occupancy.iter().enumerate() {
            if let Some(o) = slot {
                if o.product >= self.product_count() || o.step >= self.machine_count() {
                    violations.push(format!("machine {machine} holds out-of-range {o:?}"));
                }
            }
        }

        violations
    }
}

fn expect_dim(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(FactoryError::DimensionMismatch {
            what,
            expected,
            found,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_machine_line() -> FactoryState {
        FactoryState::from_matrices(
            Matrix::from_rows("wt", vec![vec![Some(2), None], vec![None, Some(2)]]).unwrap(),
            Matrix::from_rows("pd", vec![vec![true, true]]).unwrap(),
            Matrix::from_rows("tt", vec![vec![None, Some(1)], vec![Some(1), None]]).unwrap(),
            vec![Some(0)],
        )
        .unwrap()
    }

    #[test]
    fn fresh_factory_has_empty_dynamic_state() {
        let state = two_machine_line();
        assert_eq!(state.machine_count(), 2);
        assert_eq!(state.product_count(), 1);
        assert_eq!(state.occupancy, vec![None, None]);
        assert_eq!(state.transit, vec![None]);
        assert_eq!(state.failure_counter, vec![None, None]);
        assert!(state.failure_info.iter().all(Option::is_none));
        assert!(state.check_invariants().is_empty());
    }

    #[test]
    fn product_design_width_must_match_machine_count() {
        let err = FactoryState::from_matrices(
            Matrix::from_rows("wt", vec![vec![Some(2), None], vec![None, Some(2)]]).unwrap(),
            Matrix::from_rows("pd", vec![vec![true, true, true]]).unwrap(),
            Matrix::from_rows("tt", vec![vec![None, Some(1)], vec![Some(1), None]]).unwrap(),
            vec![Some(0)],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            FactoryError::DimensionMismatch {
                what: "product design columns",
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn bucket_must_point_at_a_machine() {
        let err = FactoryState::from_matrices(
            Matrix::from_rows("wt", vec![vec![Some(2), None], vec![None, Some(2)]]).unwrap(),
            Matrix::from_rows("pd", vec![vec![true, true]]).unwrap(),
            Matrix::from_rows("tt", vec![vec![None, Some(1)], vec![Some(1), None]]).unwrap(),
            vec![Some(5)],
        )
        .unwrap_err();
        assert!(matches!(err, FactoryError::DimensionMismatch { .. }));
    }

    #[test]
    fn zero_travel_time_is_rejected() {
        let err = FactoryState::from_matrices(
            Matrix::from_rows("wt", vec![vec![Some(2), None], vec![None, Some(2)]]).unwrap(),
            Matrix::from_rows("pd", vec![vec![true, true]]).unwrap(),
            Matrix::from_rows("tt", vec![vec![None, Some(0)], vec![Some(1), None]]).unwrap(),
            vec![Some(0)],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            FactoryError::MissingTravelTime { from: 0, to: 1 }
        ));
    }

    #[test]
    fn next_required_step_is_leftmost() {
        let mut state = two_machine_line();
        assert_eq!(state.next_required_step(0), Some(0));
        state.product_design[(0, 0)] = false;
        assert_eq!(state.next_required_step(0), Some(1));
        assert_eq!(state.finished_steps(), 1);
        state.product_design[(0, 1)] = false;
        assert_eq!(state.next_required_step(0), None);
        assert!(state.is_complete());
    }

    #[test]
    fn unplaced_product_is_rejected() {
        let err = FactoryState::from_matrices(
            Matrix::from_rows("wt", vec![vec![Some(2), None], vec![None, Some(2)]]).unwrap(),
            Matrix::from_rows("pd", vec![vec![true, true]]).unwrap(),
            Matrix::from_rows("tt", vec![vec![None, Some(1)], vec![Some(1), None]]).unwrap(),
            vec![None],
        )
        .unwrap_err();
        assert!(matches!(err, FactoryError::UnplacedProduct { product: 0 }));
    }

    #[test]
    fn invariants_flag_a_duplicated_product() {
        let mut state = two_machine_line();
        state.product_bucket[0] = None;
        state.occupancy[1] = Some(Occupancy {
            product: 0,
            remaining: Some(1),
            step: 1,
        });
        assert!(state.check_invariants().is_empty());

        // Leaving it in the bucket as well breaks mutual exclusion.
        state.product_bucket[0] = Some(0);
        assert_eq!(state.check_invariants().len(), 1);
    }
}
