//! Polyline paths with canvas-style arcs and dash splitting

use std::f64::consts::TAU;

use crate::coords::Position;

/// Segments per full circle when flattening arcs
const ARC_SEGMENTS_PER_TURN: f64 = 96.0;

/// A set of open or closed polylines in CSS pixels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    subpaths: Vec<Vec<Position>>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.subpaths.push(vec![Position::new(x, y)]);
        self
    }

    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        match self.subpaths.last_mut() {
            Some(points) => points.push(Position::new(x, y)),
            None => self.subpaths.push(vec![Position::new(x, y)]),
        }
        self
    }

    /// Append an arc, joined to the current point by a straight line.
    ///
    /// Angles are radians measured clockwise on screen (y down), matching
    /// the 2D canvas `arc()` contract including the `anticlockwise` flag.
    pub fn arc(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        start: f64,
        end: f64,
        anticlockwise: bool,
    ) -> &mut Self {
        let sweep = arc_sweep(start, end, anticlockwise);
        let steps = ((sweep.abs() / TAU) * ARC_SEGMENTS_PER_TURN).ceil().max(1.0) as usize;

        for i in 0..=steps {
            let angle = start + sweep * (i as f64 / steps as f64);
            self.line_to(cx + radius * angle.cos(), cy + radius * angle.sin());
        }
        self
    }

    /// Close the current subpath back to its first point
    pub fn close(&mut self) -> &mut Self {
        if let Some(points) = self.subpaths.last_mut()
            && let Some(first) = points.first().copied()
        {
            points.push(first);
        }
        self
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.move_to(x, y)
            .line_to(x + width, y)
            .line_to(x + width, y + height)
            .line_to(x, y + height)
            .close()
    }

    pub fn subpaths(&self) -> &[Vec<Position>] {
        &self.subpaths
    }

    /// Split every subpath into dashes of `on` pixels separated by `off`.
    /// The pattern restarts at each subpath.
    pub fn dashed(&self, on: f64, off: f64) -> Path {
        if on <= 0.0 || off < 0.0 {
            return self.clone();
        }

        let mut out = Path::new();
        for points in &self.subpaths {
            let mut drawing = true;
            let mut remaining = on;
            let mut current: Vec<Position> = Vec::new();
            if let Some(first) = points.first() {
                current.push(*first);
            }

            for pair in points.windows(2) {
                let (mut from, to) = (pair[0], pair[1]);
                let mut length = distance(from, to);

                while length > 0.0 {
                    let step = remaining.min(length);
                    let t = step / length;
                    let point = Position::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);

                    if drawing {
                        current.push(point);
                    }
                    remaining -= step;
                    length -= step;
                    from = point;

                    if remaining <= 1e-9 {
                        if drawing {
                            if current.len() > 1 {
                                out.subpaths.push(std::mem::take(&mut current));
                            }
                            current.clear();
                            remaining = off;
                        } else {
                            current = vec![point];
                            remaining = on;
                        }
                        drawing = !drawing;
                    }
                }
            }

            if drawing && current.len() > 1 {
                out.subpaths.push(current);
            }
        }
        out
    }
}

/// Signed sweep in radians for a canvas-style arc
fn arc_sweep(start: f64, end: f64, anticlockwise: bool) -> f64 {
    if anticlockwise {
        if start - end >= TAU {
            -TAU
        } else {
            -(start - end).rem_euclid(TAU)
        }
    } else if end - start >= TAU {
        TAU
    } else {
        (end - start).rem_euclid(TAU)
    }
}

fn distance(a: Position, b: Position) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

pub fn deg_to_rad(deg: f64) -> f64 {
    deg.to_radians()
}
