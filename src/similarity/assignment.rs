//! Minimum-cost bipartite assignment.
//!
//! Thin wrapper over the Kuhn–Munkres implementation of `pathfinding` that
//! accepts rectangular matrices in either orientation.

use pathfinding::kuhn_munkres::kuhn_munkres_min;
use pathfinding::matrix::Matrix;

use crate::core::errors::{Result, ReanchorError};

/// Marker for a row that received no column
pub const UNASSIGNED: isize = -1;

/// Assign every row to a distinct column minimising the total cost.
///
/// Returns, for each row, the index of its column or [`UNASSIGNED`] when
/// there are more rows than columns.
pub fn solve(costs: &[Vec<i64>]) -> Result<Vec<isize>> {
    let rows = costs.len();
    if rows == 0 {
        return Ok(Vec::new());
    }

    let columns = costs[0].len();
    if let Some(row) = costs.iter().position(|row| row.len() != columns) {
        return Err(ReanchorError::validation_field(
            format!(
                "cost matrix is ragged: row {row} has {} columns, expected {columns}",
                costs[row].len()
            ),
            "costs",
        ));
    }

    if columns == 0 {
        return Ok(vec![UNASSIGNED; rows]);
    }

    let matrix = Matrix::from_rows(costs.iter().cloned())
        .map_err(|e| ReanchorError::validation_field(format!("invalid cost matrix: {e:?}"), "costs"))?;

    if rows <= columns {
        let (_, assignment) = kuhn_munkres_min(&matrix);
        Ok(assignment.into_iter().map(|column| column as isize).collect())
    } else {
        let (_, assignment) = kuhn_munkres_min(&matrix.transposed());
        let mut result = vec![UNASSIGNED; rows];
        for (column, row) in assignment.into_iter().enumerate() {
            result[row] = column as isize;
        }
        Ok(result)
    }
}
