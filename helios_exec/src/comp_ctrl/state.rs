//! Implementations for the CompCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

// Internal
use super::{
    CompCtrlError, CompGrid, GridCompensation, Params, ProbeDriveError, ProbeHost, ProbeSample,
    ProbeSampleStore, TransformSink,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Compensation control module state
#[derive(Debug)]
pub struct CompCtrl {
    params: Params,

    store: ProbeSampleStore,

    /// Grid built from the stored samples, shared with the installed
    /// transform while compensation is enabled. Allocated once at
    /// construction and zeroed when discarded.
    grid: Arc<CompGrid>,

    state: CompState,

    cancel: Arc<AtomicBool>,
}

/// Options of a single probe sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeRequest {
    /// Number of samples to collect.
    pub samples: usize,

    /// Units: millimeters
    pub max_travel_mm: f64,

    /// Units: millimeters/minute
    pub feed_rate_mm_min: f64,
}

/// Result of a completed probe sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Every stored sample, including those from earlier sequences.
    pub points: Vec<ProbeSample>,

    /// Number of samples added by this sequence.
    pub new_points: usize,

    /// True if the sequence stopped early on request.
    pub cancelled: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Whether compensation is being applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompState {
    Disabled,
    Enabled,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ProbeRequest {
    /// Check the travel and feed rate are usable.
    pub fn validate(&self) -> Result<(), CompCtrlError> {
        if !self.max_travel_mm.is_finite() || self.max_travel_mm <= 0.0 {
            return Err(CompCtrlError::InvalidParams(format!(
                "max_travel_mm must be finite and positive, found {}",
                self.max_travel_mm
            )));
        }

        if !self.feed_rate_mm_min.is_finite() || self.feed_rate_mm_min <= 0.0 {
            return Err(CompCtrlError::InvalidParams(format!(
                "feed_rate_mm_min must be finite and positive, found {}",
                self.feed_rate_mm_min
            )));
        }

        Ok(())
    }
}

impl CompCtrl {
    /// Create a new controller, reserving all sample and grid storage up
    /// front.
    pub fn new(params: &Params) -> Result<Self, CompCtrlError> {
        params.validate()?;

        let store = ProbeSampleStore::with_capacity(params.max_count)?;
        let grid = Arc::new(CompGrid::new(params.size_mm, params.grid_size)?);

        info!(
            "CompCtrl initialised, {0}x{0} grid over +/-{1} mm, {2} samples max",
            params.grid_size, params.size_mm, params.max_count
        );

        Ok(Self {
            params: params.clone(),
            store,
            grid,
            state: CompState::Disabled,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// A request for a single sample using the configured probe settings.
    pub fn default_request(&self) -> ProbeRequest {
        ProbeRequest {
            samples: 1,
            max_travel_mm: self.params.probe_max_travel_mm,
            feed_rate_mm_min: self.params.probe_feed_rate_mm_min,
        }
    }

    /// Run a probe sequence and install the resulting compensation.
    ///
    /// Compensation is disabled while probing. On success every stored
    /// sample, old and new, is spread over the grid and the grid is installed
    /// into `sink`. On failure the samples added by this sequence are
    /// dropped, the grid is discarded and compensation stays disabled.
    pub fn probe_sequence<H, S>(
        &mut self,
        request: &ProbeRequest,
        host: &mut H,
        sink: &mut S,
    ) -> Result<ProbeReport, CompCtrlError>
    where
        H: ProbeHost + ?Sized,
        S: TransformSink + ?Sized,
    {
        request.validate()?;

        self.cancel.store(false, Ordering::SeqCst);

        host.wait_for_idle();

        sink.remove_transform();
        self.state = CompState::Disabled;

        let start_len = self.store.len();

        let cancelled = match self.collect_samples(request, host) {
            Ok(c) => c,
            Err(e) => {
                warn!("Probe sequence failed: {}", e);
                self.abort(start_len);
                return Err(e);
            }
        };

        if let Err(e) = self.install_from_samples(sink) {
            warn!("Could not build the compensation grid: {}", e);
            self.abort(start_len);
            return Err(e);
        }

        let new_points = self.store.len() - start_len;
        if cancelled {
            info!("Probe sequence cancelled after {} samples", new_points);
        }

        Ok(ProbeReport {
            points: self.store.as_slice().to_vec(),
            new_points,
            cancelled,
        })
    }

    /// Clear all samples and disable compensation.
    pub fn reset<S: TransformSink + ?Sized>(&mut self, sink: &mut S) {
        sink.remove_transform();
        self.store.clear();
        self.discard_grid();

        debug!("Compensation grid cleared and disabled");
    }

    /// Install a previously saved grid, which must match the configured grid.
    pub fn install_grid<S: TransformSink + ?Sized>(
        &mut self,
        grid: CompGrid,
        sink: &mut S,
    ) -> Result<(), CompCtrlError> {
        if !grid.is_compatible(self.params.size_mm, self.params.grid_size) {
            return Err(CompCtrlError::IncompatibleGrid);
        }

        let grid = Arc::new(grid);
        sink.install_transform(Arc::new(GridCompensation::new(grid.clone())));
        self.grid = grid;
        self.state = CompState::Enabled;

        Ok(())
    }

    /// Load a grid from a file and install it.
    pub fn load_grid<P: AsRef<Path>, S: TransformSink + ?Sized>(
        &mut self,
        path: P,
        sink: &mut S,
    ) -> Result<(), CompCtrlError> {
        let grid = CompGrid::load(path)?;
        self.install_grid(grid, sink)
    }

    /// Z offset at the given position, zero while compensation is disabled.
    pub fn offset_at(&self, x_mm: f64, y_mm: f64) -> f64 {
        match self.state {
            CompState::Enabled => self.grid.offset_at(x_mm, y_mm),
            CompState::Disabled => 0.0,
        }
    }

    /// Shared flag which stops a running probe sequence after the current
    /// sample.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// The installed grid, `None` while compensation is disabled.
    pub fn grid(&self) -> Option<&CompGrid> {
        match self.state {
            CompState::Enabled => Some(&self.grid),
            CompState::Disabled => None,
        }
    }

    pub fn samples(&self) -> &[ProbeSample] {
        self.store.as_slice()
    }

    pub fn state(&self) -> CompState {
        self.state
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Collect the requested samples into the store.
    ///
    /// Returns true if the sequence was cancelled.
    fn collect_samples<H: ProbeHost + ?Sized>(
        &mut self,
        request: &ProbeRequest,
        host: &mut H,
    ) -> Result<bool, CompCtrlError> {
        for _ in 0..request.samples {
            if self.cancel.load(Ordering::SeqCst) {
                return Ok(true);
            }

            if self.store.is_full() {
                return Err(CompCtrlError::CapacityExceeded {
                    max_count: self.store.max_count(),
                });
            }

            host.wait_for_idle();

            let pos = host.current_machine_position();
            let deflection_mm =
                host.run_probe(request.max_travel_mm, request.feed_rate_mm_min, false)?;

            let sample = ProbeSample {
                x_mm: pos[0],
                y_mm: pos[1],
                z_offset_mm: pos[2] - deflection_mm - host.probe_height(),
            };

            if !(sample.x_mm.is_finite()
                && sample.y_mm.is_finite()
                && sample.z_offset_mm.is_finite())
            {
                return Err(CompCtrlError::ProbeFailed(ProbeDriveError::Fault(format!(
                    "non-finite reading at ({}, {}, {}) with deflection {} mm",
                    pos[0], pos[1], pos[2], deflection_mm
                ))));
            }

            self.store.push(sample)?;

            info!(
                "Point #{}: {},{},{}",
                self.store.len() - 1,
                sample.x_mm,
                sample.y_mm,
                sample.z_offset_mm
            );
        }

        Ok(self.cancel.load(Ordering::SeqCst))
    }

    /// Rebuild the grid from the stored samples and install it.
    fn install_from_samples<S: TransformSink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> Result<(), CompCtrlError> {
        // The transform has been removed, so unless someone else still holds
        // the grid it is rebuilt in place.
        match Arc::get_mut(&mut self.grid) {
            Some(g) => g.rebuild(self.store.as_slice()),
            None => self.grid = Arc::new(self.build_grid()?),
        }

        sink.install_transform(Arc::new(GridCompensation::new(self.grid.clone())));
        self.state = CompState::Enabled;

        Ok(())
    }

    fn build_grid(&self) -> Result<CompGrid, CompCtrlError> {
        CompGrid::build(
            self.params.size_mm,
            self.params.grid_size,
            self.store.as_slice(),
        )
    }

    /// Drop the samples added since `len` and leave compensation disabled.
    fn abort(&mut self, len: usize) {
        self.store.truncate(len);
        self.discard_grid();
    }

    /// Zero the grid, keeping its storage, and disable compensation.
    fn discard_grid(&mut self) {
        if let Some(g) = Arc::get_mut(&mut self.grid) {
            g.rebuild(&[]);
        }
        self.state = CompState::Disabled;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        comp_ctrl::{
            CompensationTransform, MotionQueue, PositionSource, ProbeDrive, ProbeDriveError,
        },
        kin_ctrl::CartesianPos,
    };

    /// Host which probes a fixed list of positions.
    struct MockHost {
        positions: Vec<CartesianPos>,
        deflections_mm: Vec<f64>,
        next: usize,
        fail_at: Option<usize>,
        idle_waits: usize,
        cancel_after: Option<(usize, Arc<AtomicBool>)>,
    }

    impl MockHost {
        fn new(points: &[(f64, f64, f64)]) -> Self {
            Self {
                positions: points
                    .iter()
                    .map(|&(x, y, z)| CartesianPos::new(x, y, z))
                    .collect(),
                deflections_mm: vec![1.0; points.len()],
                next: 0,
                fail_at: None,
                idle_waits: 0,
                cancel_after: None,
            }
        }
    }

    impl MotionQueue for MockHost {
        fn wait_for_idle(&mut self) {
            self.idle_waits += 1;
        }
    }

    impl PositionSource for MockHost {
        fn current_machine_position(&self) -> CartesianPos {
            self.positions[self.next % self.positions.len()]
        }
    }

    impl ProbeDrive for MockHost {
        fn run_probe(
            &mut self,
            max_travel_mm: f64,
            _feed_rate_mm_min: f64,
            _reverse: bool,
        ) -> Result<f64, ProbeDriveError> {
            if self.fail_at == Some(self.next) {
                return Err(ProbeDriveError::NotTriggered { max_travel_mm });
            }

            let d = self.deflections_mm[self.next % self.deflections_mm.len()];
            self.next += 1;

            if let Some((n, flag)) = &self.cancel_after {
                if self.next == *n {
                    flag.store(true, Ordering::SeqCst);
                }
            }

            Ok(d)
        }

        fn probe_height(&self) -> f64 {
            5.0
        }
    }

    #[derive(Default)]
    struct MockSink {
        transform: Option<Arc<dyn CompensationTransform>>,
        removals: usize,
    }

    impl TransformSink for MockSink {
        fn install_transform(&mut self, transform: Arc<dyn CompensationTransform>) {
            self.transform = Some(transform);
        }

        fn remove_transform(&mut self) {
            self.transform = None;
            self.removals += 1;
        }

        fn has_transform(&self) -> bool {
            self.transform.is_some()
        }
    }

    fn request(samples: usize) -> ProbeRequest {
        ProbeRequest {
            samples,
            ..CompCtrl::new(&Params::default())
                .unwrap()
                .default_request()
        }
    }

    #[test]
    fn test_single_sample_scenario() {
        let mut comp = CompCtrl::new(&Params::default()).unwrap();
        let mut host = MockHost::new(&[(10.0, 10.0, 6.5)]);
        let mut sink = MockSink::default();

        let report = comp
            .probe_sequence(&comp.default_request(), &mut host, &mut sink)
            .unwrap();

        assert_eq!(
            report.points,
            vec![ProbeSample {
                x_mm: 10.0,
                y_mm: 10.0,
                z_offset_mm: 0.5
            }]
        );
        assert_eq!(report.new_points, 1);
        assert!(!report.cancelled);
        assert_eq!(comp.state(), CompState::Enabled);
        assert!(host.idle_waits >= 2);

        let t = sink.transform.as_ref().unwrap();
        assert!((t.offset_at(10.0, 10.0) - 0.5).abs() < 1e-9);
        assert!((t.offset_at(-290.0, -290.0) - 0.5).abs() < 1e-9);
        assert!((comp.offset_at(10.0, 10.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_samples() {
        let mut comp = CompCtrl::new(&Params::default()).unwrap();
        let mut host = MockHost::new(&[(0.0, 0.0, 0.0)]);
        let mut sink = MockSink::default();

        let report = comp
            .probe_sequence(&request(0), &mut host, &mut sink)
            .unwrap();

        assert!(report.points.is_empty());
        assert!(sink.has_transform());
        assert_eq!(sink.transform.as_ref().unwrap().offset_at(50.0, -20.0), 0.0);
    }

    #[test]
    fn test_sequences_accumulate() {
        let mut comp = CompCtrl::new(&Params::default()).unwrap();
        let mut host = MockHost::new(&[(-100.0, 0.0, 6.0), (100.0, 0.0, 7.0)]);
        let mut sink = MockSink::default();

        comp.probe_sequence(&request(1), &mut host, &mut sink).unwrap();
        assert!((comp.offset_at(100.0, 0.0)).abs() < 1e-9);

        let report = comp.probe_sequence(&request(1), &mut host, &mut sink).unwrap();
        assert_eq!(report.points.len(), 2);
        assert_eq!(report.new_points, 1);
        assert_eq!(sink.removals, 2);

        // Node values now lie between the two samples
        let v = comp.offset_at(0.0, 0.0);
        assert!(v > 0.0 && v < 1.0, "{}", v);
    }

    #[test]
    fn test_failure_rolls_back() {
        let mut comp = CompCtrl::new(&Params::default()).unwrap();
        let mut host = MockHost::new(&[(0.0, 0.0, 6.0), (50.0, 50.0, 6.2), (90.0, 0.0, 6.4)]);
        let mut sink = MockSink::default();

        comp.probe_sequence(&request(1), &mut host, &mut sink).unwrap();
        assert!(sink.has_transform());

        host.fail_at = Some(2);
        match comp.probe_sequence(&request(2), &mut host, &mut sink) {
            Err(CompCtrlError::ProbeFailed(ProbeDriveError::NotTriggered { max_travel_mm })) => {
                assert_eq!(max_travel_mm, 100.0)
            }
            r => panic!("Expected probe failure, got {:?}", r),
        }

        assert_eq!(comp.samples().len(), 1);
        assert_eq!(comp.state(), CompState::Disabled);
        assert!(comp.grid().is_none());
        assert!(!sink.has_transform());
        assert_eq!(comp.offset_at(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_capacity_exceeded() {
        let params = Params {
            max_count: 2,
            ..Default::default()
        };
        let mut comp = CompCtrl::new(&params).unwrap();
        let mut host = MockHost::new(&[(0.0, 0.0, 6.0)]);
        let mut sink = MockSink::default();

        match comp.probe_sequence(&request(3), &mut host, &mut sink) {
            Err(CompCtrlError::CapacityExceeded { max_count }) => assert_eq!(max_count, 2),
            r => panic!("Expected capacity error, got {:?}", r),
        }

        assert!(comp.samples().is_empty());
        assert!(!sink.has_transform());
    }

    #[test]
    fn test_cancel() {
        let mut comp = CompCtrl::new(&Params::default()).unwrap();
        let mut host = MockHost::new(&[(0.0, 0.0, 6.0), (20.0, 0.0, 6.0), (40.0, 0.0, 6.0)]);
        let mut sink = MockSink::default();

        // A stale flag is cleared when the sequence starts
        comp.cancel_handle().store(true, Ordering::SeqCst);

        host.cancel_after = Some((2, comp.cancel_handle()));
        let report = comp.probe_sequence(&request(3), &mut host, &mut sink).unwrap();

        assert!(report.cancelled);
        assert_eq!(report.new_points, 2);
        assert_eq!(comp.state(), CompState::Enabled);
        assert!(sink.has_transform());
    }

    #[test]
    fn test_reset_idempotent() {
        let mut comp = CompCtrl::new(&Params::default()).unwrap();
        let mut host = MockHost::new(&[(0.0, 0.0, 6.0)]);
        let mut sink = MockSink::default();

        comp.probe_sequence(&request(1), &mut host, &mut sink).unwrap();

        for _ in 0..2 {
            comp.reset(&mut sink);
            assert!(comp.samples().is_empty());
            assert!(comp.grid().is_none());
            assert_eq!(comp.state(), CompState::Disabled);
            assert!(!sink.has_transform());
        }
    }

    #[test]
    fn test_install_grid() {
        let mut comp = CompCtrl::new(&Params::default()).unwrap();
        let mut sink = MockSink::default();

        assert!(matches!(
            comp.install_grid(CompGrid::new(300.0, 8).unwrap(), &mut sink),
            Err(CompCtrlError::IncompatibleGrid)
        ));
        assert!(!sink.has_transform());

        let samples = [ProbeSample {
            x_mm: 0.0,
            y_mm: 0.0,
            z_offset_mm: -0.25,
        }];
        comp.install_grid(CompGrid::build(300.0, 24, &samples).unwrap(), &mut sink)
            .unwrap();
        assert_eq!(comp.state(), CompState::Enabled);
        assert!((comp.offset_at(100.0, 100.0) + 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_reading_rolls_back() {
        let mut comp = CompCtrl::new(&Params::default()).unwrap();
        let mut host = MockHost::new(&[(0.0, 0.0, 6.0), (50.0, 50.0, 6.2)]);
        let mut sink = MockSink::default();

        comp.probe_sequence(&request(1), &mut host, &mut sink).unwrap();

        host.deflections_mm = vec![1.0, f64::NAN];
        match comp.probe_sequence(&request(1), &mut host, &mut sink) {
            Err(CompCtrlError::ProbeFailed(ProbeDriveError::Fault(_))) => (),
            r => panic!("Expected a fault, got {:?}", r),
        }

        assert_eq!(comp.samples().len(), 1);
        assert_eq!(comp.state(), CompState::Disabled);
        assert!(comp.grid().is_none());
        assert!(!sink.has_transform());
        assert_eq!(comp.offset_at(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_invalid_request_leaves_state() {
        let mut comp = CompCtrl::new(&Params::default()).unwrap();
        let mut host = MockHost::new(&[(0.0, 0.0, 6.0)]);
        let mut sink = MockSink::default();

        comp.probe_sequence(&request(1), &mut host, &mut sink).unwrap();
        let waits = host.idle_waits;

        let bad_requests = [
            ProbeRequest {
                max_travel_mm: -5.0,
                ..request(1)
            },
            ProbeRequest {
                max_travel_mm: f64::INFINITY,
                ..request(1)
            },
            ProbeRequest {
                feed_rate_mm_min: 0.0,
                ..request(1)
            },
            ProbeRequest {
                feed_rate_mm_min: f64::NAN,
                ..request(1)
            },
        ];

        for r in bad_requests.iter() {
            assert!(matches!(
                comp.probe_sequence(r, &mut host, &mut sink),
                Err(CompCtrlError::InvalidParams(_))
            ));
        }

        assert_eq!(host.idle_waits, waits);
        assert_eq!(sink.removals, 1);
        assert!(sink.has_transform());
        assert_eq!(comp.state(), CompState::Enabled);
        assert_eq!(comp.samples().len(), 1);
    }

    #[test]
    fn test_grid_storage_reused() {
        let mut comp = CompCtrl::new(&Params::default()).unwrap();
        let mut host = MockHost::new(&[(0.0, 0.0, 6.0), (40.0, 0.0, 6.5)]);
        let mut sink = MockSink::default();

        comp.probe_sequence(&request(1), &mut host, &mut sink).unwrap();
        let ptr = comp.grid().unwrap().offsets().as_ptr();

        comp.reset(&mut sink);
        comp.probe_sequence(&request(1), &mut host, &mut sink).unwrap();

        assert_eq!(comp.grid().unwrap().offsets().as_ptr(), ptr);
        assert!((comp.offset_at(40.0, 0.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_grid_allocated_at_construction() {
        let params = Params {
            grid_size: 1 << 31,
            ..Default::default()
        };

        assert!(matches!(
            CompCtrl::new(&params),
            Err(CompCtrlError::OutOfMemory)
        ));
    }

    #[test]
    fn test_invalid_params() {
        let params = Params {
            grid_size: 0,
            ..Default::default()
        };

        assert!(matches!(
            CompCtrl::new(&params),
            Err(CompCtrlError::InvalidParams(_))
        ));
    }
}
