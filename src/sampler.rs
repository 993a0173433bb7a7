// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Classifies every cell of a grid and paints the unbounded ones.
//!
//! Each cell is an independent unit of work: map the cell to its
//! point, classify it, and if it escaped fill its rectangle.  Units
//! share nothing but the surface, which is behind a `Mutex`.  The
//! sampler returns once every unit has finished, with one outcome per
//! cell.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crossbeam::thread::ScopedJoinHandle;
use failure::Error;
use log::debug;

use crate::error::RenderError;
use crate::escape::{classify, Classification, Params};
use crate::planes::{Cell, PlaneMapper};
use crate::surface::{lock, Color, Surface};

/// How the units of a pass are run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Schedule {
    /// One after another on the calling thread.
    Inline,
    /// On this many scoped worker threads pulling from a shared queue.
    Threaded(usize),
}

impl Schedule {
    /// One worker per CPU, or inline on a single-CPU machine.
    pub fn for_threads(threads: usize) -> Self {
        if threads <= 1 {
            Schedule::Inline
        } else {
            Schedule::Threaded(threads)
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule::for_threads(num_cpus::get())
    }
}

/// What became of one cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellOutcome {
    /// Row-major cell index, `row * segments + col`.
    pub index: usize,
    /// The verdict for the cell's point.
    pub classification: Classification,
}

/// Classify one cell, painting it if it escaped.  The style change
/// and the fill happen under one lock so concurrent units cannot
/// interleave between them.
fn sample_cell<S: Surface>(
    mapper: &PlaneMapper,
    params: &Params,
    color: Color,
    surface: &Mutex<S>,
    cell: Cell,
) -> Result<CellOutcome, Error> {
    let classification = classify(mapper.cell_to_point(&cell), params);
    if classification == Classification::Unbounded {
        let rect = mapper.cell_to_rect(&cell);
        let mut surface = lock(surface)?;
        surface.set_fill_style(color)?;
        surface.fill_rect(rect)?;
    }
    Ok(CellOutcome {
        index: mapper.index(&cell),
        classification,
    })
}

fn sample_inline<S: Surface>(
    mapper: &PlaneMapper,
    params: &Params,
    color: Color,
    surface: &Mutex<S>,
) -> Result<Vec<CellOutcome>, Error> {
    mapper
        .cells()
        .map(|cell| sample_cell(mapper, params, color, surface, cell))
        .collect()
}

fn sample_threaded<S: Surface + Send>(
    mapper: &PlaneMapper,
    params: &Params,
    color: Color,
    surface: &Mutex<S>,
    threads: usize,
) -> Result<Vec<CellOutcome>, Error> {
    let cells = Mutex::new(mapper.cells());
    let abort = AtomicBool::new(false);
    let (cells, abort) = (&cells, &abort);

    let joined = crossbeam::scope(|spawner| {
        let handles: Vec<ScopedJoinHandle<Result<Vec<CellOutcome>, Error>>> = (0..threads)
            .map(|_| {
                spawner.spawn(move |_| {
                    let mut outcomes = Vec::new();
                    while !abort.load(Ordering::Relaxed) {
                        let cell = match cells.lock() {
                            Ok(mut cells) => cells.next(),
                            Err(_) => return Err(RenderError::WorkerPanicked.into()),
                        };
                        let cell = match cell {
                            Some(cell) => cell,
                            None => break,
                        };
                        match sample_cell(mapper, params, color, surface, cell) {
                            Ok(outcome) => outcomes.push(outcome),
                            Err(e) => {
                                abort.store(true, Ordering::Relaxed);
                                return Err(e);
                            }
                        }
                    }
                    Ok(outcomes)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join())
            .collect::<Vec<_>>()
    })
    .map_err(|_| RenderError::WorkerPanicked)?;

    let mut outcomes = Vec::with_capacity(mapper.len());
    for batch in joined {
        outcomes.extend(batch.map_err(|_| RenderError::WorkerPanicked)??);
    }
    outcomes.sort_by_key(|outcome| outcome.index);
    Ok(outcomes)
}

/// Run every unit of the grid and wait for all of them.
///
/// On success there is exactly one outcome per cell, ordered by
/// index.  The first surface failure stops the pass; whatever was
/// painted before it stays painted.
pub fn sample_grid<S: Surface + Send>(
    mapper: &PlaneMapper,
    params: &Params,
    color: Color,
    surface: &Mutex<S>,
    schedule: Schedule,
) -> Result<Vec<CellOutcome>, Error> {
    debug!(
        "sampling {} cells ({} per axis, step {}) with {:?}",
        mapper.len(),
        mapper.region.segments(),
        mapper.region.step(),
        schedule
    );
    match schedule {
        Schedule::Inline => sample_inline(mapper, params, color, surface),
        Schedule::Threaded(threads) => {
            sample_threaded(mapper, params, color, surface, threads.max(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planes::{CellLayout, GridRegion, Rect};
    use crate::surface::RecordingSurface;

    fn mapper(segments: usize, start: f64, end: f64) -> PlaneMapper {
        let region = GridRegion::new(segments, start, end).unwrap();
        PlaneMapper::new(region, CellLayout::new(f64::from(segments as u32), segments, 0.0, 0.0))
    }

    #[test]
    fn one_outcome_per_cell_in_order() {
        let mapper = mapper(7, -2.0, 2.0);
        for &schedule in &[Schedule::Inline, Schedule::Threaded(3)] {
            let surface = Mutex::new(RecordingSurface::new(7, 7));
            let outcomes =
                sample_grid(&mapper, &Params::default(), Color::BLACK, &surface, schedule).unwrap();
            assert_eq!(outcomes.len(), 49);
            for (i, outcome) in outcomes.iter().enumerate() {
                assert_eq!(outcome.index, i);
            }
        }
    }

    #[test]
    fn only_unbounded_cells_are_painted() {
        let mapper = mapper(2, -1.0, 1.0);
        let surface = Mutex::new(RecordingSurface::new(2, 2));
        let outcomes =
            sample_grid(&mapper, &Params::default(), Color::BLACK, &surface, Schedule::Inline)
                .unwrap();
        // (-1,-1) escapes; (0,-1), (-1,0) and (0,0) stay bounded.
        let kinds: Vec<Classification> = outcomes.iter().map(|o| o.classification).collect();
        assert_eq!(
            kinds,
            vec![
                Classification::Unbounded,
                Classification::Bounded,
                Classification::Bounded,
                Classification::Bounded,
            ]
        );
        let surface = surface.into_inner().unwrap();
        assert_eq!(surface.filled_with(Color::BLACK), vec![Rect::new(0.0, 0.0, 1.0, 1.0)]);
    }

    #[test]
    fn schedules_agree() {
        let mapper = mapper(24, -2.0, 2.0);
        let params = Params::new(2.0, 60);
        let inline = Mutex::new(RecordingSurface::new(24, 24));
        let threaded = Mutex::new(RecordingSurface::new(24, 24));
        let a = sample_grid(&mapper, &params, Color::BLACK, &inline, Schedule::Inline).unwrap();
        let b = sample_grid(&mapper, &params, Color::BLACK, &threaded, Schedule::Threaded(4))
            .unwrap();
        assert_eq!(a, b);

        let mut painted_a = inline.into_inner().unwrap().filled_with(Color::BLACK);
        let mut painted_b = threaded.into_inner().unwrap().filled_with(Color::BLACK);
        let key = |r: &Rect| (r.top as i64, r.left as i64);
        painted_a.sort_by_key(key);
        painted_b.sort_by_key(key);
        assert_eq!(painted_a, painted_b);
    }

    #[test]
    fn zero_threads_still_runs() {
        let mapper = mapper(3, -2.0, 2.0);
        let surface = Mutex::new(RecordingSurface::new(3, 3));
        let outcomes = sample_grid(
            &mapper,
            &Params::default(),
            Color::BLACK,
            &surface,
            Schedule::Threaded(0),
        )
        .unwrap();
        assert_eq!(outcomes.len(), 9);
    }

    #[test]
    fn schedule_for_threads() {
        assert_eq!(Schedule::for_threads(0), Schedule::Inline);
        assert_eq!(Schedule::for_threads(1), Schedule::Inline);
        assert_eq!(Schedule::for_threads(8), Schedule::Threaded(8));
    }
}
