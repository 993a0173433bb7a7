// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! One render pass from configuration to the last painted cell.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam::channel::{self, Receiver, TryRecvError};
use failure::Error;
use log::{debug, info};

use crate::axes::{render_axes, AxisSpec};
use crate::config::Config;
use crate::error::RenderError;
use crate::escape::Classification;
use crate::planes::{CellLayout, PlaneMapper, Rect};
use crate::sampler::{sample_grid, CellOutcome, Schedule};
use crate::surface::{lock, Surface};

/// The result of a finished pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    /// One outcome per cell, by index.
    pub cells: Vec<CellOutcome>,
}

impl Completion {
    /// How many cells were painted.
    pub fn unbounded(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.classification == Classification::Unbounded)
            .count()
    }
}

/// A configuration together with the way its units are scheduled.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Visualization {
    config: Config,
    schedule: Schedule,
}

impl Visualization {
    /// Schedule with one worker per CPU.
    pub fn new(config: Config) -> Self {
        Visualization {
            config,
            schedule: Schedule::default(),
        }
    }

    /// Replace the schedule.
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// The options this pass reads.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Render on the calling thread and return when every cell is done.
    ///
    /// The surface is resized to `size + gap` on both sides, filled
    /// with the light colour, decorated with axes, and then every
    /// unbounded cell is filled with the dark colour.
    pub fn render<S: Surface + Send>(&self, surface: &Mutex<S>) -> Result<Completion, Error> {
        let config = &self.config;
        config.validate()?;
        let region = config.region()?;
        let started = Instant::now();
        info!(
            "rendering {0}x{0} cells over [{1}, {2}]",
            config.segments, config.min, config.max
        );

        let canvas = config.canvas_size();
        let gap = f64::from(config.gap);
        let width = {
            let mut surface = lock(surface)?;
            surface.resize(canvas, canvas)?;
            surface.set_fill_style(config.light_color)?;
            surface.fill_rect(Rect::new(0.0, 0.0, f64::from(canvas), f64::from(canvas)))?;
            render_axes(
                &mut *surface,
                &AxisSpec {
                    segments: config.segments,
                    min: config.min,
                    max: config.max,
                    x_offset: gap,
                    y_offset: gap,
                },
            )?;
            f64::from(surface.size().0)
        };

        let mapper = PlaneMapper::new(region, CellLayout::new(width, config.segments, gap, gap));
        debug!("cell size {}", mapper.layout.cell_size());
        let cells = sample_grid(
            &mapper,
            &config.params(),
            config.dark_color,
            surface,
            self.schedule,
        )?;

        let completion = Completion { cells };
        info!(
            "rendered {} cells, {} unbounded, in {:?}",
            completion.cells.len(),
            completion.unbounded(),
            started.elapsed()
        );
        Ok(completion)
    }
}

/// A pass running in the background.  Resolves exactly once.
#[derive(Debug)]
pub struct RenderHandle {
    result: Receiver<Result<Completion, Error>>,
    thread: JoinHandle<()>,
}

impl RenderHandle {
    /// Block until the pass finishes.
    pub fn wait(self) -> Result<Completion, Error> {
        let result = self.result.recv();
        if self.thread.join().is_err() {
            return Err(RenderError::WorkerPanicked.into());
        }
        result.map_err(|_| RenderError::RenderAbandoned)?
    }

    /// The result, if the pass has finished.  Gives the handle back
    /// otherwise.
    pub fn try_wait(self) -> Result<Result<Completion, Error>, RenderHandle> {
        match self.result.try_recv() {
            Ok(result) => {
                let _ = self.thread.join();
                Ok(result)
            }
            Err(TryRecvError::Empty) => Err(self),
            Err(TryRecvError::Disconnected) => {
                if self.thread.join().is_err() {
                    return Ok(Err(RenderError::WorkerPanicked.into()));
                }
                Ok(Err(RenderError::RenderAbandoned.into()))
            }
        }
    }
}

/// Start a pass on its own thread and return at once.
///
/// Nothing stops a second pass from being started on the same surface
/// before the first finishes.  Both will paint into it and the final
/// picture is whatever their interleaving leaves behind.
pub fn render_visualization<S>(visualization: Visualization, surface: Arc<Mutex<S>>) -> RenderHandle
where
    S: Surface + Send + 'static,
{
    let (sender, result) = channel::bounded(1);
    let thread = thread::spawn(move || {
        let _ = sender.send(visualization.render(&*surface));
    });
    RenderHandle { result, thread }
}
