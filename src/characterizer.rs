//! Routes incoming points into background, object, or the void.
//!
//! The [Characterizer] is the sink a [Scanner](crate::Scanner) feeds during
//! a scan. It is a four-state machine (idle, defining background, defining
//! an object, or deliberately discarding), and every scanning state admits
//! points for a time window measured on the *stream's own timestamps*: the
//! first accepted point starts the window, the first point past it closes
//! the window and pauses the scanner. No wall-clock timers are involved.
//!
//! ```
//! use lidar_anomaly::characterizer::Characterizer;
//! use lidar_anomaly::scanner::Flow;
//! use lidar_anomaly::{LidarPoint, Timestamp};
//!
//! let mut characterizer = Characterizer::new();
//! characterizer.set_obj_frame(1); // 1 ms window
//! characterizer.begin_object();
//! let point = LidarPoint::new(Timestamp::from_nanos(0), 255, 1., 2., 3.);
//! assert_eq!(Flow::Continue, characterizer.feed(&point));
//! let late = LidarPoint::new(Timestamp::from_nanos(2_000_000), 255, 1., 2., 3.);
//! assert_eq!(Flow::Pause, characterizer.feed(&late));
//! assert_eq!(1, characterizer.object_points().len());
//! ```
//!
//! Everything here runs on the scanner's producing thread; nothing else
//! reads or writes these fields while a scan is in flight, so there are no
//! locks to take.

use crate::scanner::Flow;
use crate::{config, Kernel, LidarPoint, Octree, Point, Timestamp};
use log::{debug, info, trace};
use std::mem;
use std::time::Instant;

const NANOS_PER_MILLI: u64 = 1_000_000;

#[derive(Clone, Copy, Debug)]
enum State {
    Idle,
    Background { first: Option<Timestamp> },
    Object { first: Option<Timestamp> },
    Discard { first: Option<Timestamp>, window: u64 },
}

/// The point-routing state machine.
#[derive(Debug)]
pub struct Characterizer {
    state: State,
    background: Vec<Point>,
    index: Option<Octree>,
    object: Vec<Point>,
    back_frame: u64,
    obj_frame: u64,
    back_distance: f64,
    min_reflectivity: f64,
    seen: u64,
    chrono: bool,
    window_started: Option<Instant>,
}

impl Characterizer {
    /// Creates a characterizer with the default windows and thresholds.
    pub fn new() -> Characterizer {
        Characterizer {
            state: State::Idle,
            background: Vec::new(),
            index: None,
            object: Vec::new(),
            back_frame: u64::from(config::DEFAULT_BACKGROUND_FRAME_MS) * NANOS_PER_MILLI,
            obj_frame: u64::from(config::DEFAULT_OBJECT_FRAME_MS) * NANOS_PER_MILLI,
            back_distance: config::DEFAULT_BACKGROUND_DISTANCE,
            min_reflectivity: config::DEFAULT_MIN_REFLECTIVITY,
            seen: 0,
            chrono: false,
            window_started: None,
        }
    }

    /// Sets the background scan window in milliseconds.
    pub fn set_back_frame(&mut self, millis: u32) {
        self.back_frame = u64::from(millis) * NANOS_PER_MILLI;
    }

    /// Returns the background scan window in milliseconds.
    pub fn back_frame(&self) -> u32 {
        (self.back_frame / NANOS_PER_MILLI) as u32
    }

    /// Sets the object scan window in milliseconds.
    pub fn set_obj_frame(&mut self, millis: u32) {
        self.obj_frame = u64::from(millis) * NANOS_PER_MILLI;
    }

    /// Returns the object scan window in milliseconds.
    pub fn obj_frame(&self) -> u32 {
        (self.obj_frame / NANOS_PER_MILLI) as u32
    }

    /// Sets the distance under which a point counts as background.
    pub fn set_back_distance(&mut self, distance: f64) {
        self.back_distance = distance;
    }

    /// Returns the background distance threshold.
    pub fn back_distance(&self) -> f64 {
        self.back_distance
    }

    /// Sets the reflectivity below which points are dropped outright.
    pub fn set_min_reflectivity(&mut self, reflectivity: f64) {
        self.min_reflectivity = reflectivity;
    }

    /// Returns the reflectivity threshold.
    pub fn min_reflectivity(&self) -> f64 {
        self.min_reflectivity
    }

    /// Enables or disables the scan chronometer.
    pub fn set_chrono(&mut self, chrono: bool) {
        self.chrono = chrono;
    }

    /// Returns true if the scan chronometer is on.
    pub fn chrono(&self) -> bool {
        self.chrono
    }

    /// Starts a background definition, discarding any previous background.
    pub fn begin_background(&mut self) {
        debug!("entering background scan");
        self.background.clear();
        self.index = None;
        self.seen = 0;
        self.window_started = None;
        self.state = State::Background { first: None };
    }

    /// Starts an object definition, replacing any previous object buffer.
    pub fn begin_object(&mut self) {
        debug!("entering object scan");
        self.object.clear();
        self.seen = 0;
        self.window_started = None;
        self.state = State::Object { first: None };
    }

    /// Starts a timed discard of incoming points.
    pub fn begin_discard(&mut self, millis: u32) {
        debug!("discarding points for {millis} ms");
        self.seen = 0;
        self.window_started = None;
        self.state = State::Discard {
            first: None,
            window: u64::from(millis) * NANOS_PER_MILLI,
        };
    }

    /// Routes one point, returning whether the scanner should keep going.
    pub fn feed(&mut self, point: &LidarPoint) -> Flow {
        if f64::from(point.reflectivity) < self.min_reflectivity {
            trace!("dropping under-reflective point at {}", point.timestamp);
            return Flow::Continue;
        }
        let at = point.timestamp;
        match self.state {
            State::Idle => Flow::Continue,

            State::Background { first: None } => {
                debug!("first background point at {at}");
                self.state = State::Background { first: Some(at) };
                self.mark_window_start();
                self.seen += 1;
                self.background.push(point.position());
                Flow::Continue
            }
            State::Background { first: Some(start) } if at < start + self.back_frame => {
                self.seen += 1;
                self.background.push(point.position());
                Flow::Continue
            }
            State::Background { .. } => {
                debug!("first out-of-frame point at {at}");
                self.state = State::Idle;
                self.freeze_background();
                Flow::Pause
            }

            State::Object { first: None } => {
                debug!("first object point at {at}");
                self.state = State::Object { first: Some(at) };
                self.mark_window_start();
                self.admit_object_point(point);
                Flow::Continue
            }
            State::Object { first: Some(start) } if at < start + self.obj_frame => {
                self.admit_object_point(point);
                Flow::Continue
            }
            State::Object { .. } => {
                debug!("first out-of-frame point at {at}");
                self.state = State::Idle;
                self.finish_object_window();
                Flow::Pause
            }

            State::Discard { first: None, window } => {
                self.state = State::Discard {
                    first: Some(at),
                    window,
                };
                self.seen += 1;
                Flow::Continue
            }
            State::Discard {
                first: Some(start),
                window,
            } if at < start + window => {
                self.seen += 1;
                Flow::Continue
            }
            State::Discard { window, .. } => {
                self.state = State::Idle;
                info!(
                    "discarded {} points over {} ms",
                    self.seen,
                    window / NANOS_PER_MILLI
                );
                Flow::Pause
            }
        }
    }

    /// Closes whatever window is open, for sources that ran dry mid-window.
    ///
    /// A stream that ends before the window does would otherwise leave the
    /// machine stuck in a scanning state with work unfinished.
    pub fn flush(&mut self) {
        match self.state {
            State::Idle => {}
            State::Background { .. } => {
                debug!("stream ended during background scan, freezing early");
                self.freeze_background();
            }
            State::Object { .. } => self.finish_object_window(),
            State::Discard { .. } => {}
        }
        self.state = State::Idle;
    }

    /// Tests a point against the frozen background.
    ///
    /// Background candidates come from a circular kernel in the YZ plane;
    /// the verdict is whether any of them is within the background distance
    /// in 3D. Without a frozen background nothing is background.
    pub fn is_background(&self, point: &Point) -> bool {
        let Some(index) = self.index.as_ref() else {
            return false;
        };
        index
            .search(&Kernel::circle(*point, self.back_distance))
            .into_iter()
            .any(|i| point.distance(&index.get(i)) < self.back_distance)
    }

    /// Returns the points admitted to the current object buffer.
    pub fn object_points(&self) -> &[Point] {
        &self.object
    }

    /// Takes the object buffer, leaving an empty one behind.
    pub fn take_object(&mut self) -> Vec<Point> {
        mem::take(&mut self.object)
    }

    /// Returns the number of background points collected.
    pub fn background_len(&self) -> usize {
        self.index
            .as_ref()
            .map_or(self.background.len(), Octree::len)
    }

    /// Returns true once a background has been defined and frozen.
    pub fn has_background(&self) -> bool {
        self.index.is_some()
    }

    /// Returns how many in-window points the current phase has examined.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    fn admit_object_point(&mut self, point: &LidarPoint) {
        self.seen += 1;
        let position = point.position();
        if self.is_background(&position) {
            trace!("rejecting background point at {}", point.timestamp);
        } else {
            self.object.push(position);
        }
    }

    fn freeze_background(&mut self) {
        let points = mem::take(&mut self.background);
        let count = points.len();
        self.index = Some(Octree::build(points));
        info!("defined background contains {count} unique points");
        self.report_window(count as u64, "background");
    }

    fn finish_object_window(&mut self) {
        info!(
            "defined object contains {} unique points ({} total points scanned)",
            self.object.len(),
            self.seen
        );
        self.report_window(self.seen, "object");
    }

    fn mark_window_start(&mut self) {
        if self.chrono {
            self.window_started = Some(Instant::now());
        }
    }

    fn report_window(&mut self, points: u64, what: &str) {
        if let Some(started) = self.window_started.take() {
            let elapsed = started.elapsed().as_secs_f64();
            if elapsed > 0. {
                println!(
                    "{what} scanning lasted {elapsed:.6} s ({:.0} points/s)",
                    points as f64 / elapsed
                );
            }
        }
    }
}

impl Default for Characterizer {
    fn default() -> Characterizer {
        Characterizer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(nanos: u64, x: f64, y: f64, z: f64) -> LidarPoint {
        LidarPoint::new(Timestamp::from_nanos(nanos), 255, x, y, z)
    }

    fn plane_background(characterizer: &mut Characterizer, n: usize) {
        characterizer.set_back_frame(1); // 1 ms
        characterizer.begin_background();
        let side = (n as f64).sqrt().ceil() as usize;
        let mut fed = 0;
        'outer: for j in 0..side {
            for k in 0..side {
                if fed == n {
                    break 'outer;
                }
                characterizer.feed(&at(fed as u64, 0., j as f64, k as f64));
                fed += 1;
            }
        }
        // out-of-window point closes and freezes
        assert_eq!(Flow::Pause, characterizer.feed(&at(2_000_000, 0., 0., 0.)));
        assert!(characterizer.has_background());
    }

    #[test]
    fn idle_drops_everything() {
        let mut characterizer = Characterizer::new();
        assert_eq!(Flow::Continue, characterizer.feed(&at(0, 1., 2., 3.)));
        assert!(characterizer.object_points().is_empty());
        assert_eq!(0, characterizer.background_len());
    }

    #[test]
    fn reflectivity_gate_drops_before_dispatch() {
        let mut characterizer = Characterizer::new();
        characterizer.set_min_reflectivity(50.);
        characterizer.begin_object();
        let dim = LidarPoint::new(Timestamp::from_nanos(0), 10, 1., 2., 3.);
        assert_eq!(Flow::Continue, characterizer.feed(&dim));
        assert!(characterizer.object_points().is_empty());
        // the dropped point must not have started the window
        assert_eq!(Flow::Continue, characterizer.feed(&at(0, 1., 2., 3.)));
        assert_eq!(1, characterizer.object_points().len());
    }

    #[test]
    fn object_window_cutoff() {
        let mut characterizer = Characterizer::new();
        characterizer.obj_frame = 1000; // sub-millisecond window, set directly
        characterizer.begin_object();
        assert_eq!(Flow::Continue, characterizer.feed(&at(0, 1., 0., 0.)));
        assert_eq!(Flow::Continue, characterizer.feed(&at(500, 2., 0., 0.)));
        assert_eq!(Flow::Continue, characterizer.feed(&at(999, 3., 0., 0.)));
        assert_eq!(Flow::Pause, characterizer.feed(&at(1000, 4., 0., 0.)));
        assert_eq!(3, characterizer.object_points().len());
        // back to idle: further points are dropped
        assert_eq!(Flow::Continue, characterizer.feed(&at(1001, 5., 0., 0.)));
        assert_eq!(3, characterizer.object_points().len());
    }

    #[test]
    fn background_rejection_uses_3d_distance() {
        let mut characterizer = Characterizer::new();
        plane_background(&mut characterizer, 1000);

        characterizer.set_back_distance(0.5);
        characterizer.begin_object();
        characterizer.feed(&at(0, 1., 0., 0.));
        assert_eq!(1, characterizer.object_points().len(), "far from the plane");

        characterizer.set_back_distance(2.0);
        characterizer.begin_object();
        characterizer.feed(&at(0, 1., 0., 0.));
        assert_eq!(0, characterizer.object_points().len(), "within the plane's reach");
    }

    #[test]
    fn first_object_point_counts_toward_window_even_if_background() {
        let mut characterizer = Characterizer::new();
        plane_background(&mut characterizer, 100);
        characterizer.set_back_distance(10.);
        characterizer.obj_frame = 1000;
        characterizer.begin_object();
        // on the plane: rejected as background, but still opens the window
        characterizer.feed(&at(0, 0., 1., 1.));
        assert_eq!(0, characterizer.object_points().len());
        assert_eq!(Flow::Pause, characterizer.feed(&at(5000, 500., 0., 0.)));
    }

    #[test]
    fn discard_counts_and_pauses() {
        let mut characterizer = Characterizer::new();
        characterizer.begin_discard(1); // 1 ms
        assert_eq!(Flow::Continue, characterizer.feed(&at(0, 1., 0., 0.)));
        assert_eq!(Flow::Continue, characterizer.feed(&at(999_999, 1., 0., 0.)));
        assert_eq!(Flow::Pause, characterizer.feed(&at(1_000_000, 1., 0., 0.)));
        assert_eq!(2, characterizer.seen());
        assert!(characterizer.object_points().is_empty());
    }

    #[test]
    fn flush_freezes_a_partial_background() {
        let mut characterizer = Characterizer::new();
        characterizer.begin_background();
        characterizer.feed(&at(0, 0., 0., 0.));
        characterizer.feed(&at(1, 0., 1., 0.));
        assert!(!characterizer.has_background());
        characterizer.flush();
        assert!(characterizer.has_background());
        assert_eq!(2, characterizer.background_len());
    }

    #[test]
    fn object_buffer_is_replaced_not_accumulated() {
        let mut characterizer = Characterizer::new();
        characterizer.obj_frame = 1000;
        characterizer.begin_object();
        characterizer.feed(&at(0, 1., 0., 0.));
        characterizer.feed(&at(1000, 0., 0., 0.)); // closes
        assert_eq!(1, characterizer.object_points().len());
        characterizer.begin_object();
        assert!(characterizer.object_points().is_empty());
    }
}
