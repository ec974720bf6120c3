// src/model/layouts.rs

//! Fixed factory lines.
//!
//! Both lines are banded: cell `m` owns step `m` (2 ticks) and can fall back to
//! a neighbouring step at a much higher cost. Transport downstream to the next
//! cell takes 2 ticks, upstream to the previous cell 1 tick, anything else 4.

const X: Option<u32> = None;

const fn t(ticks: u32) -> Option<u32> {
    Some(ticks)
}

pub const REFERENCE_WORKING_TIME: [[Option<u32>; 5]; 5] = [
    [t(2), t(5), X, X, X],
    [t(10), t(2), t(4), X, X],
    [X, t(10), t(2), t(4), X],
    [X, X, t(10), t(2), t(4)],
    [X, X, X, t(5), t(2)],
];

pub const REFERENCE7_WORKING_TIME: [[Option<u32>; 7]; 7] = [
    [t(2), t(5), X, X, X, X, X],
    [t(10), t(2), t(4), X, X, X, X],
    [X, t(10), t(2), X, X, X, X],
    [X, X, t(10), t(2), X, X, X],
    [X, X, X, t(10), t(2), t(4), X],
    [X, X, X, X, t(10), t(2), t(4)],
    [X, X, X, X, X, t(10), t(2)],
];

/// Travel matrix of a line of `machines` cells.
pub fn line_travel_times(machines: usize) -> Vec<Vec<Option<u32>>> {
    (0..machines)
        .map(|from| {
            (0..machines)
                .map(|to| match to {
                    _ if to == from => None,
                    _ if to == from + 1 => Some(2),
                    _ if to + 1 == from => Some(1),
                    _ => Some(4),
                })
                .collect()
        })
        .collect()
}

pub fn to_rows<const N: usize>(table: &[[Option<u32>; N]; N]) -> Vec<Vec<Option<u32>>> {
    table.iter().map(|row| row.to_vec()).collect()
}
