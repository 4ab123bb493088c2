use crate::*;
use fixedbitset::FixedBitSet;
use ndarray::*;
use pathfinding::prelude::{kuhn_munkres_min, Matrix};

/// Scale applied to pixel distances to turn them into integer costs (`f32` does not implement `Ord`).
const COST_SCALE: f32 = 1_000.0;
/// Upper bound of a gated cost, low enough that summing a row of them cannot overflow an `i64`.
const MAX_COST: i64 = 1_000_000_000_000;

/// A committed association between a registered object and a candidate detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    /// Identifier of the registered object.
    pub id: usize,
    /// Index of the detection in the frame candidates.
    pub detection_index: usize,
    /// Centroid distance between the object's last detection and the candidate.
    pub distance: f32,
}

impl Match {
    /// Return a new Match
    pub fn new(id: usize, detection_index: usize, distance: f32) -> Match {
        Match {
            id,
            detection_index,
            distance,
        }
    }
}

/// Centroid distances between registered objects (rows) and candidate detections (columns).
pub fn distance_matrix(registered: &[ObjectDetection<'_>], candidates: &[Detection]) -> Array2<f32> {
    Array2::from_shape_fn((registered.len(), candidates.len()), |(row, col)| {
        euclidean_norm(&registered[row].detection.center(), &candidates[col].center())
    })
}

/// Matches candidates to registered objects by centroid distance.
///
/// # Parameters
///
/// * `assignment`: The assignment algorithm and its tie-breaking policies.
/// * `max_distance`: Gating threshold. Pairs further apart than this are never matched.
/// * `registered`: The last observation of every active object.
/// * `candidates`: The detections of the current frame.
///
/// # Returns
///
/// The committed matches. Every object id and every detection index appears at most once.
pub fn min_distance_matching(
    assignment: Assignment,
    max_distance: f32,
    registered: &[ObjectDetection<'_>],
    candidates: &[Detection],
) -> Vec<Match> {
    if registered.is_empty() || candidates.is_empty() {
        return vec![];
    }

    let distances = distance_matrix(registered, candidates);
    let matches = match assignment {
        Assignment::Greedy { order, conflict } => {
            greedy_matching(&distances, candidates, max_distance, order, conflict)
        }
        Assignment::Optimal => optimal_matching(&distances, max_distance),
    };

    // rows to object ids
    matches
        .into_iter()
        .map(|(row, col, distance)| Match::new(registered[row].id, col, distance))
        .collect()
}

/// Visiting order of the candidates.
fn candidate_order(candidates: &[Detection], order: CandidateOrder) -> Vec<usize> {
    let mut indices = (0..candidates.len()).collect::<Vec<_>>();
    if let CandidateOrder::ScoreDescending = order {
        // stable, equal scores keep detection order
        indices.sort_by(|&a, &b| candidates[b].score().total_cmp(&candidates[a].score()));
    }
    indices
}

/// Index and value of the smallest distance among `rows`. The first row wins ties and NaN is never picked.
fn nearest(column: ArrayView1<'_, f32>, rows: impl Iterator<Item = usize>) -> Option<(usize, f32)> {
    rows.fold(None, |nearest, row| {
        let distance = column[row];
        match nearest {
            Some((_, best)) if !(distance < best) => nearest,
            _ if distance.is_nan() => nearest,
            _ => Some((row, distance)),
        }
    })
}

/// Single pass greedy assignment returning `(row, col, distance)` triples in commit order.
fn greedy_matching(
    distances: &Array2<f32>,
    candidates: &[Detection],
    max_distance: f32,
    order: CandidateOrder,
    conflict: ConflictPolicy,
) -> Vec<(usize, usize, f32)> {
    let rows = distances.nrows();
    let mut consumed = FixedBitSet::with_capacity(rows);
    let mut matches = Vec::with_capacity(rows.min(distances.ncols()));

    for col in candidate_order(candidates, order) {
        if consumed.count_ones(..) == rows {
            break;
        }
        let column = distances.column(col);
        let nearest = match conflict {
            ConflictPolicy::NextClosest => {
                nearest(column, (0..rows).filter(|row| !consumed.contains(*row)))
            }
            ConflictPolicy::SkipCandidate => match nearest(column, 0..rows) {
                Some((row, _)) if consumed.contains(row) => None,
                nearest => nearest,
            },
        };

        match nearest {
            Some((row, distance)) if distance <= max_distance => {
                consumed.insert(row);
                matches.push((row, col, distance));
            }
            _ => {}
        }
    }

    matches
}

/// Minimum total distance assignment returning `(row, col, distance)` triples ordered by row.
fn optimal_matching(distances: &Array2<f32>, max_distance: f32) -> Vec<(usize, usize, f32)> {
    let mut costs = Matrix::new(distances.nrows(), distances.ncols(), MAX_COST);
    distances.indexed_iter().for_each(|((row, col), &distance)| {
        if distance <= max_distance {
            costs[(row, col)] = cost(distance);
        }
    });

    // kuhn_munkres_min needs at least as many columns as rows
    let transposed = costs.rows > costs.columns;
    let costs = if transposed { costs.transposed() } else { costs };
    let (_, assignment) = kuhn_munkres_min(&costs);

    let mut matches = assignment
        .into_iter()
        .enumerate()
        .map(|(i, j)| if transposed { (j, i) } else { (i, j) })
        .map(|(row, col)| (row, col, distances[[row, col]]))
        .filter(|(_, _, distance)| *distance <= max_distance)
        .collect::<Vec<_>>();
    matches.sort_by_key(|(row, _, _)| *row);
    matches
}

fn cost(distance: f32) -> i64 {
    if distance.is_finite() {
        ((distance * COST_SCALE) as i64).clamp(0, MAX_COST)
    } else {
        MAX_COST
    }
}
