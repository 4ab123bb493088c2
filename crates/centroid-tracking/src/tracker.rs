use crate::*;
use fixedbitset::FixedBitSet;
use tracing::{debug, info};

/// The association algorithm plugged into an [`ObjectTracker`].
pub trait MatchingStrategy {
    /// Associates the detections of `frame` with the registered objects.
    ///
    /// # Parameters
    ///
    /// * `info`: The sequence metadata, used to scale the matching tolerance.
    /// * `frame`: Index of the frame being processed.
    /// * `registered`: The last observation of every active object.
    /// * `candidates`: The filtered detections of the frame.
    ///
    /// # Returns
    ///
    /// The matched pairs. No object id and no detection index may appear twice.
    fn match_objects(
        &mut self,
        info: &SequenceInfo,
        frame: usize,
        registered: &[ObjectDetection<'_>],
        candidates: &[Detection],
    ) -> Vec<Match>;

    /// Whether an unmatched detection becomes a new object. Rejected detections are discarded.
    fn admits_registration(&self, _detection: &Detection) -> bool {
        true
    }

    /// Checks the strategy against the sequence before any frame is processed.
    fn validate(&self, _info: &SequenceInfo) -> Result<()> {
        Ok(())
    }
}

/// Progress of a tracking run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    NotStarted,
    /// `frame` is the last processed frame.
    Running { frame: usize },
    Completed,
}

/// What happened in one processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameSummary {
    pub frame: usize,
    /// Detections left after filtering.
    pub detections: usize,
    pub matched: usize,
    pub registered: usize,
    /// Unmatched detections the strategy refused to register.
    pub discarded: usize,
    pub unregistered: usize,
}

/// Progress callback receiving the processed frame index and the sequence length.
pub type ProgressFn = Box<dyn FnMut(usize, usize)>;

/// This is the multi-object tracker.
///
/// Every frame of the sequence goes through the same steps, in order:
///
/// 1. The detections of the frame are obtained from the detection source and filtered.
/// 2. The matching strategy associates them with the active objects, and each match updates its object.
/// 3. Unmatched detections are registered as new objects.
/// 4. Objects missing for more than `frames_to_unregister_missing_objects` frames are unregistered.
///
/// # Examples
///
/// ```
/// use centroid_tracking::{
///     BoundingBox, CentroidTracker, Detection, ObjectTracker, Sequence, SequenceInfo, TrackerConfig,
/// };
///
/// let detections = vec![
///     vec![Detection::new(None, BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.9, "ball")],
///     vec![Detection::new(None, BoundingBox::new(2.0, 1.0, 10.0, 10.0), 0.8, "ball")],
/// ];
/// let sequence = Sequence::blank(SequenceInfo::new(640, 480, 30.0), detections.len());
///
/// let mut tracker = ObjectTracker::with_precomputed(
///     sequence,
///     detections,
///     CentroidTracker::new(20.0),
///     &TrackerConfig::default(),
/// )
/// .unwrap();
///
/// let objects = tracker.run().unwrap();
/// assert_eq!(objects.len(), 1);
/// assert_eq!(objects[0].len(), 2);
/// ```
pub struct ObjectTracker<S, F = ()> {
    sequence: Sequence<F>,
    source: DetectionSource<F>,
    filters: FilterChain,
    strategy: S,
    /// Number of frames an object can be missing before it is unregistered.
    frames_to_unregister_missing_objects: usize,
    objects: TrackedObjects,
    state: TrackerState,
    progress: Option<ProgressFn>,
}

impl<S: std::fmt::Debug, F> std::fmt::Debug for ObjectTracker<S, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectTracker")
            .field("info", self.sequence.info())
            .field("frames", &self.sequence.len())
            .field("source", &self.source)
            .field("filters", &self.filters)
            .field("strategy", &self.strategy)
            .field(
                "frames_to_unregister_missing_objects",
                &self.frames_to_unregister_missing_objects,
            )
            .field("objects", &self.objects.len())
            .field("state", &self.state)
            .finish()
    }
}

impl<S: MatchingStrategy, F> ObjectTracker<S, F> {
    /// Returns a new ObjectTracker
    ///
    /// # Parameters
    ///
    /// * `sequence`: The frames to track and their metadata.
    /// * `detector`: An object detector run on every frame.
    /// * `detections`: Precomputed detections, one list per frame. Used instead of `detector` when both are given.
    /// * `strategy`: The matching algorithm.
    /// * `config`: Filtering and lifecycle options.
    ///
    /// Fails if no detection source is given, if the precomputed detections do not cover the sequence, or if the
    /// configuration is invalid.
    pub fn new(
        sequence: Sequence<F>,
        detector: Option<Box<dyn ObjectDetector<F>>>,
        detections: Option<Vec<Vec<Detection>>>,
        strategy: S,
        config: &TrackerConfig,
    ) -> Result<ObjectTracker<S, F>> {
        let source = DetectionSource::resolve(detector, detections, sequence.len())?;
        config.validate()?;
        strategy.validate(sequence.info())?;

        let mut objects = TrackedObjects::new();
        objects.with_max_history(config.max_history);

        Ok(ObjectTracker {
            sequence,
            source,
            filters: config.filter_chain(),
            strategy,
            frames_to_unregister_missing_objects: config.frames_to_unregister_missing_objects,
            objects,
            state: TrackerState::NotStarted,
            progress: None,
        })
    }

    /// Returns a new ObjectTracker fed with precomputed detections.
    pub fn with_precomputed(
        sequence: Sequence<F>,
        detections: Vec<Vec<Detection>>,
        strategy: S,
        config: &TrackerConfig,
    ) -> Result<ObjectTracker<S, F>> {
        Self::new(sequence, None, Some(detections), strategy, config)
    }

    /// Returns a new ObjectTracker running `detector` on every frame.
    pub fn with_detector<D>(
        sequence: Sequence<F>,
        detector: D,
        strategy: S,
        config: &TrackerConfig,
    ) -> Result<ObjectTracker<S, F>>
    where
        D: ObjectDetector<F> + 'static,
    {
        Self::new(sequence, Some(Box::new(detector)), None, strategy, config)
    }

    /// Appends a filter after the configured ones.
    pub fn with_filter<N: Into<String>>(&mut self, name: N, filter: DetectionFilter) -> &mut Self {
        self.filters.push(name, filter);
        self
    }

    /// Set a callback invoked after each processed frame.
    pub fn with_progress<P>(&mut self, progress: P) -> &mut Self
    where
        P: FnMut(usize, usize) + 'static,
    {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn sequence(&self) -> &Sequence<F> {
        &self.sequence
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    /// Return the registry of tracked objects
    pub fn tracked_objects(&self) -> &TrackedObjects {
        &self.objects
    }

    pub fn into_tracked_objects(self) -> TrackedObjects {
        self.objects
    }

    /// Returns the filtered detections of `frame`.
    pub fn objects_in_frame(&mut self, frame: usize) -> Result<Vec<Detection>> {
        let detections = self.source.detections(&self.sequence, frame)?;
        Ok(self.filters.apply(detections))
    }

    /// Processes the next frame. Returns `None` once the whole sequence has been processed.
    pub fn step(&mut self) -> Result<Option<FrameSummary>> {
        let frame = match self.state {
            TrackerState::NotStarted => 0,
            TrackerState::Running { frame } => frame + 1,
            TrackerState::Completed => return Ok(None),
        };
        if frame >= self.sequence.len() {
            self.state = TrackerState::Completed;
            return Ok(None);
        }

        // Step 1
        // Get and filter the detections of the frame.
        let candidates = self.objects_in_frame(frame)?;
        let mut summary = FrameSummary {
            frame,
            detections: candidates.len(),
            ..Default::default()
        };

        // Step 2
        // Match the candidates with the active objects, then update the matched objects.
        let registered = self.objects.registered();
        let matches =
            self.strategy
                .match_objects(self.sequence.info(), frame, &registered, &candidates);
        drop(registered);
        self.check_matches(frame, &matches, candidates.len())?;

        let mut candidates = candidates.into_iter().map(Some).collect::<Vec<_>>();
        for &Match {
            id,
            detection_index,
            ..
        } in &matches
        {
            if let Some(detection) = candidates[detection_index].take() {
                self.objects.update(detection, id, frame)?;
                summary.matched += 1;
            }
        }

        // Step 3
        // Register the unmatched candidates.
        for detection in candidates.into_iter().flatten() {
            if self.strategy.admits_registration(&detection) {
                self.objects.register(detection, frame);
                summary.registered += 1;
            } else {
                debug!(frame, center = %detection.center(), "registration refused");
                summary.discarded += 1;
            }
        }

        // Step 4
        // Unregister the objects missing for too long.
        let active = self.active_count();
        self.objects
            .unregister_missing(frame, self.frames_to_unregister_missing_objects);
        summary.unregistered = active - self.active_count();

        debug!(
            frame,
            detections = summary.detections,
            matched = summary.matched,
            registered = summary.registered,
            discarded = summary.discarded,
            unregistered = summary.unregistered,
            "frame processed"
        );

        self.state = TrackerState::Running { frame };
        if let Some(progress) = self.progress.as_mut() {
            progress(frame, self.sequence.len());
        }
        Ok(Some(summary))
    }

    /// Processes every remaining frame and returns the tracked objects.
    pub fn run(&mut self) -> Result<&TrackedObjects> {
        info!(
            frames = self.sequence.len(),
            width = self.sequence.info().width,
            height = self.sequence.info().height,
            "tracking started"
        );
        while self.step()?.is_some() {}
        info!(objects = self.objects.len(), "tracking completed");
        Ok(&self.objects)
    }

    fn active_count(&self) -> usize {
        self.objects.iter().filter(|object| object.is_active()).count()
    }

    /// Rejects strategy output that is not a one-to-one matching over the frame candidates.
    fn check_matches(&self, frame: usize, matches: &[Match], candidates: usize) -> Result<()> {
        let mut ids = FixedBitSet::with_capacity(self.objects.len());
        let mut detections = FixedBitSet::with_capacity(candidates);
        matches.iter().try_for_each(|&Match { id, detection_index, .. }| {
            let invalid = |reason: &'static str| TrackingError::InvalidMatch {
                id,
                detection_index,
                frame,
                reason,
            };
            if detection_index >= candidates {
                return Err(invalid("detection index out of range"));
            }
            if id >= self.objects.len() {
                return Err(TrackingError::UnknownObject(id));
            }
            if self.objects[id].is_unregistered() {
                return Err(TrackingError::AlreadyUnregistered(id));
            }
            if ids.put(id) {
                return Err(invalid("object matched twice"));
            }
            if detections.put(detection_index) {
                return Err(invalid("detection matched twice"));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use anyhow::Result;
    use itertools::Itertools;
    use rand::prelude::*;
    use rand_pcg::Pcg32;
    use std::{cell::RefCell, collections::HashSet, rc::Rc};

    fn detection(x: f32, y: f32, score: f32) -> Detection {
        Detection::new(None, BoundingBox::new(x - 1.0, y - 1.0, 2.0, 2.0), score, "ball")
    }

    fn info() -> SequenceInfo {
        SequenceInfo::new(100, 100, 25.0)
    }

    fn tracker(
        detections: Vec<Vec<Detection>>,
        max_distance: f32,
        config: &TrackerConfig,
    ) -> Result<ObjectTracker<CentroidTracker>> {
        let sequence = Sequence::blank(info(), detections.len());
        Ok(ObjectTracker::with_precomputed(
            sequence,
            detections,
            CentroidTracker::new(max_distance),
            config,
        )?)
    }

    /// Records the pairs returned by the wrapped strategy.
    #[derive(Debug)]
    struct Recording {
        inner: CentroidTracker,
        matches: Rc<RefCell<Vec<(usize, Vec<Match>)>>>,
    }

    impl MatchingStrategy for Recording {
        fn match_objects(
            &mut self,
            info: &SequenceInfo,
            frame: usize,
            registered: &[ObjectDetection<'_>],
            candidates: &[Detection],
        ) -> Vec<Match> {
            let matches = self.inner.match_objects(info, frame, registered, candidates);
            self.matches.borrow_mut().push((frame, matches.clone()));
            matches
        }
    }

    /// Returns whatever it was built with once the first frame is done.
    #[derive(Debug)]
    struct Fixed(Vec<Match>);

    impl MatchingStrategy for Fixed {
        fn match_objects(
            &mut self,
            _info: &SequenceInfo,
            frame: usize,
            _registered: &[ObjectDetection<'_>],
            _candidates: &[Detection],
        ) -> Vec<Match> {
            if frame == 0 {
                return vec![];
            }
            self.0.clone()
        }
    }

    #[test]
    fn empty_first_frame() -> Result<()> {
        let mut tracker = tracker(
            vec![
                vec![],
                vec![
                    detection(10.0, 10.0, 0.9),
                    detection(50.0, 50.0, 0.9),
                    detection(90.0, 90.0, 0.9),
                ],
            ],
            5.0,
            &TrackerConfig::default(),
        )?;

        let summary = tracker.step()?.unwrap();
        assert_eq!(summary.registered, 0);
        assert!(tracker.tracked_objects().is_empty());

        let objects = tracker.run()?;
        assert_eq!(objects.iter().map(|o| o.id()).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(objects.iter().all(|o| o.first_frame() == 1));
        assert_eq!(tracker.state(), TrackerState::Completed);
        Ok(())
    }

    #[test]
    fn match_within_tolerance() -> Result<()> {
        let mut tracker = tracker(
            vec![vec![detection(10.0, 10.0, 0.9)], vec![detection(12.0, 11.0, 0.9)]],
            5.0,
            &TrackerConfig::default(),
        )?;
        let objects = tracker.run()?;
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].len(), 2);
        assert_eq!(objects[0].last().detection.center(), Point::new(12.0, 11.0));
        Ok(())
    }

    #[test]
    fn no_match_beyond_tolerance() -> Result<()> {
        let mut tracker = tracker(
            vec![vec![detection(10.0, 10.0, 0.9)], vec![detection(500.0, 500.0, 0.9)]],
            5.0,
            &TrackerConfig::default(),
        )?;
        let objects = tracker.run()?;
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].len(), 1);
        assert_eq!(objects[1].first_frame(), 1);
        Ok(())
    }

    #[test]
    fn eviction_during_run() -> Result<()> {
        let mut detections = vec![vec![]; 20];
        detections[5] = vec![detection(10.0, 10.0, 0.9)];
        // same spot after eviction spawns a new id
        detections[17] = vec![detection(10.0, 10.0, 0.9)];

        let mut config = TrackerConfig::default();
        config.with_frames_to_unregister(10);
        let mut tracker = tracker(detections, 5.0, &config)?;

        while let Some(summary) = tracker.step()? {
            let object = tracker.tracked_objects().get(0);
            match summary.frame {
                0..=4 => assert!(object.is_none()),
                5..=15 => assert!(object.unwrap().is_active()),
                16 => {
                    assert_eq!(summary.unregistered, 1);
                    assert!(object.unwrap().is_unregistered());
                }
                _ => assert!(object.unwrap().is_unregistered()),
            }
        }

        let objects = tracker.tracked_objects();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1].first_frame(), 17);
        assert!(objects[1].is_active());
        Ok(())
    }

    #[test]
    fn zero_frames_to_unregister() -> Result<()> {
        let mut config = TrackerConfig::default();
        config.with_frames_to_unregister(0);
        let mut tracker = tracker(
            vec![vec![detection(10.0, 10.0, 0.9)], vec![], vec![detection(10.0, 10.0, 0.9)]],
            5.0,
            &config,
        )?;
        let objects = tracker.run()?;
        assert_eq!(objects.len(), 2);
        assert!(objects[0].is_unregistered());
        assert!(objects[1].is_active());
        Ok(())
    }

    #[test]
    fn filters_apply_before_matching() -> Result<()> {
        let mut config = TrackerConfig::default();
        config
            .with_min_score(0.5)
            .with_classes(["ball"])
            .with_avoid_duplicated(true);
        let person = Detection::new(None, BoundingBox::new(70.0, 70.0, 4.0, 4.0), 0.9, "person");
        let mut tracker = tracker(
            vec![vec![
                detection(10.0, 10.0, 0.9),
                detection(10.5, 10.0, 0.8),
                detection(40.0, 40.0, 0.2),
                person,
            ]],
            5.0,
            &config,
        )?;
        assert_eq!(tracker.objects_in_frame(0)?.len(), 1);
        let objects = tracker.run()?;
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].first().detection.score(), 0.9);
        Ok(())
    }

    #[test]
    fn custom_filter_runs_last() -> Result<()> {
        let mut tracker = tracker(
            vec![vec![detection(10.0, 10.0, 0.9), detection(80.0, 80.0, 0.9)]],
            5.0,
            &TrackerConfig::default(),
        )?;
        tracker.with_filter(
            "left_half",
            Rc::new(|detections: Vec<Detection>| {
                detections
                    .into_iter()
                    .filter(|detection| detection.center().x < 50.0)
                    .collect()
            }),
        );
        assert_eq!(tracker.run()?.len(), 1);
        Ok(())
    }

    #[test]
    fn configuration_errors() {
        let sequence = Sequence::blank(info(), 3);
        assert!(matches!(
            ObjectTracker::new(
                sequence.clone(),
                None,
                None,
                CentroidTracker::new(5.0),
                &TrackerConfig::default()
            ),
            Err(TrackingError::MissingDetectionSource)
        ));
        assert!(matches!(
            ObjectTracker::with_precomputed(
                sequence.clone(),
                vec![vec![]; 2],
                CentroidTracker::new(5.0),
                &TrackerConfig::default()
            ),
            Err(TrackingError::DetectionsLengthMismatch {
                frames: 3,
                detections: 2
            })
        ));
        assert!(matches!(
            ObjectTracker::with_precomputed(
                sequence,
                vec![vec![]; 3],
                CentroidTracker::new(-5.0),
                &TrackerConfig::default()
            ),
            Err(TrackingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn detector_source() -> Result<()> {
        let sequence = Sequence::new(info(), vec![10.0f32, 11.0, 12.0, 80.0]);
        let detector = |x: &f32| -> anyhow::Result<Vec<Detection>> { Ok(vec![detection(*x, 10.0, 0.9)]) };
        let mut tracker = ObjectTracker::with_detector(
            sequence,
            detector,
            CentroidTracker::new(5.0),
            &TrackerConfig::default(),
        )?;
        let objects = tracker.run()?;
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].len(), 3);
        assert_eq!(objects[1].first_frame(), 3);
        Ok(())
    }

    #[test]
    fn empty_sequence_completes() -> Result<()> {
        let mut tracker = tracker(vec![], 5.0, &TrackerConfig::default())?;
        assert_eq!(tracker.state(), TrackerState::NotStarted);
        assert!(tracker.run()?.is_empty());
        assert_eq!(tracker.state(), TrackerState::Completed);
        assert!(tracker.step()?.is_none());
        Ok(())
    }

    #[test]
    fn positions_in_time() -> Result<()> {
        let detections = vec![vec![detection(10.0, 10.0, 0.9)], vec![], vec![detection(11.0, 10.0, 0.9)]];
        let sequence = Sequence::blank(info(), 3).with_timestamps(vec![0, 40, 80])?;
        let mut tracker = ObjectTracker::with_precomputed(
            sequence,
            detections,
            CentroidTracker::new(5.0),
            &TrackerConfig::default(),
        )?;
        tracker.run()?;

        let timestamps = tracker.sequence().timestamps().unwrap_or_default();
        assert_eq!(
            tracker.tracked_objects()[0].positions_in_time(timestamps),
            vec![
                (0, Some(Point::new(10.0, 10.0))),
                (40, None),
                (80, Some(Point::new(11.0, 10.0)))
            ]
        );
        Ok(())
    }

    #[test]
    fn progress_is_reported() -> Result<()> {
        let seen = Rc::new(RefCell::new(vec![]));
        let mut tracker = tracker(vec![vec![]; 3], 5.0, &TrackerConfig::default())?;
        let progress = seen.clone();
        tracker.with_progress(move |frame, frames| progress.borrow_mut().push((frame, frames)));
        tracker.run()?;
        assert_eq!(*seen.borrow(), vec![(0, 3), (1, 3), (2, 3)]);
        Ok(())
    }

    #[test]
    fn invalid_strategy_output() -> Result<()> {
        let detections = vec![
            vec![detection(10.0, 10.0, 0.9), detection(50.0, 50.0, 0.9)],
            vec![detection(10.0, 10.0, 0.9), detection(50.0, 50.0, 0.9)],
        ];
        let cases = vec![
            vec![Match::new(0, 0, 0.0), Match::new(1, 0, 0.0)],
            vec![Match::new(0, 0, 0.0), Match::new(0, 1, 0.0)],
            vec![Match::new(0, 2, 0.0)],
        ];
        for matches in cases {
            let sequence = Sequence::blank(info(), 2);
            let mut tracker = ObjectTracker::with_precomputed(
                sequence,
                detections.clone(),
                Fixed(matches),
                &TrackerConfig::default(),
            )?;
            tracker.step()?;
            assert!(matches!(tracker.step(), Err(TrackingError::InvalidMatch { frame: 1, .. })));
        }

        let sequence = Sequence::blank(info(), 2);
        let mut tracker = ObjectTracker::with_precomputed(
            sequence,
            vec![vec![detection(10.0, 10.0, 0.9)]; 2],
            Fixed(vec![Match::new(4, 0, 0.0)]),
            &TrackerConfig::default(),
        )?;
        tracker.step()?;
        assert!(matches!(tracker.step(), Err(TrackingError::UnknownObject(4))));
        Ok(())
    }

    /// Returns the matches listed for each frame.
    struct Scripted(Vec<Vec<Match>>);

    impl MatchingStrategy for Scripted {
        fn match_objects(
            &mut self,
            _info: &SequenceInfo,
            frame: usize,
            _registered: &[ObjectDetection<'_>],
            _candidates: &[Detection],
        ) -> Vec<Match> {
            self.0.get(frame).cloned().unwrap_or_default()
        }
    }

    #[test]
    fn unregistered_match_leaves_frame_untouched() -> Result<()> {
        // object 1 is missed at frame 1 and unregistered, object 0 keeps being matched
        let detections = vec![
            vec![detection(10.0, 10.0, 0.9), detection(50.0, 50.0, 0.9)],
            vec![detection(10.0, 10.0, 0.9)],
            vec![detection(10.0, 10.0, 0.9), detection(50.0, 50.0, 0.9)],
        ];
        let sequence = Sequence::blank(info(), detections.len());
        let mut config = TrackerConfig::default();
        config.with_frames_to_unregister(0);
        let strategy = Scripted(vec![
            vec![],
            vec![Match::new(0, 0, 0.0)],
            vec![Match::new(0, 0, 0.0), Match::new(1, 1, 0.0)],
        ]);
        let mut tracker = ObjectTracker::with_precomputed(sequence, detections, strategy, &config)?;
        tracker.step()?;
        tracker.step()?;
        assert!(tracker.tracked_objects()[1].is_unregistered());

        assert!(matches!(tracker.step(), Err(TrackingError::AlreadyUnregistered(1))));
        let objects = tracker.tracked_objects();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].len(), 2);
        assert_eq!(objects[1].len(), 1);
        Ok(())
    }

    /// Returns a psuedo-random (deterministic) f32 between -0.5 and +0.5
    fn next_f32(rng: &mut Pcg32) -> f32 {
        (rng.next_u32() as f64 / u32::MAX as f64) as f32 - 0.5
    }

    #[test]
    fn randomized_tracking_properties() -> Result<()> {
        let mut rng = Pcg32::seed_from_u64(0);
        let frames = 200;

        let detections = (0..frames)
            .map(|_| {
                let count = rng.gen_range(0..8);
                (0..count)
                    .map(|_| {
                        detection(
                            (next_f32(&mut rng) + 0.5) * 100.0,
                            (next_f32(&mut rng) + 0.5) * 100.0,
                            next_f32(&mut rng) + 0.5,
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let total = detections.iter().map(Vec::len).sum::<usize>();

        let recorded = Rc::new(RefCell::new(vec![]));
        let strategy = Recording {
            inner: CentroidTracker::new(15.0),
            matches: recorded.clone(),
        };
        let mut config = TrackerConfig::default();
        config.with_frames_to_unregister(3);
        let sequence = Sequence::blank(info(), frames);
        let mut tracker =
            ObjectTracker::with_precomputed(sequence, detections.clone(), strategy, &config)?;

        let mut snapshots: Vec<TrackedObjects> = vec![];
        while tracker.step()?.is_some() {
            snapshots.push(tracker.tracked_objects().clone());
        }
        let objects = tracker.tracked_objects();

        // one-to-one matching
        for (frame, matches) in recorded.borrow().iter() {
            assert!(matches.iter().map(|m| m.id).all_unique(), "frame {}", frame);
            assert!(matches.iter().map(|m| m.detection_index).all_unique(), "frame {}", frame);
            assert!(matches.iter().all(|m| m.distance <= 15.0));
        }

        // every detection ends up in exactly one history
        let tracked = objects.iter().map(|o| o.len()).sum::<usize>();
        assert_eq!(tracked, total);
        let ids = objects
            .iter()
            .flat_map(|o| o.history().map(|entry| *entry.detection.id()))
            .collect::<HashSet<_>>();
        assert_eq!(ids.len(), total);
        for (frame, frame_detections) in detections.iter().enumerate() {
            let seen = objects.active_at(frame);
            assert_eq!(seen.len(), frame_detections.len());
        }

        // ids are dense and histories only grow
        assert!(objects.iter().enumerate().all(|(index, o)| o.id() == index));
        for (earlier, later) in snapshots.iter().tuple_windows() {
            for object in earlier.iter() {
                let grown = &later[object.id()];
                assert!(grown.len() >= object.len());
                assert!(object
                    .history()
                    .all(|entry| grown.find_in_frame(entry.frame).is_some()));
                if object.is_unregistered() {
                    assert!(grown.is_unregistered());
                    assert_eq!(grown.len(), object.len());
                }
            }
        }
        Ok(())
    }

    #[test]
    fn moving_objects_keep_their_ids() -> Result<()> {
        let mut rng = Pcg32::seed_from_u64(0);
        let iterations = 100;

        let detections = (0..iterations)
            .map(|iteration| {
                let step = iteration as f32 * 0.5;
                let mut frame = vec![
                    // move right
                    detection(5.0 + step + next_f32(&mut rng), 20.0 + next_f32(&mut rng), 0.9),
                    // move down and left
                    detection(95.0 - step + next_f32(&mut rng), 5.0 + step + next_f32(&mut rng), 0.8),
                ];
                // a third object that disappears for a while
                if !(40..45).contains(&iteration) {
                    frame.push(detection(50.0 + next_f32(&mut rng), 80.0, 0.7));
                }
                frame
            })
            .collect::<Vec<_>>();

        let mut config = TrackerConfig::default();
        config.with_frames_to_unregister(10);
        let mut tracker = tracker(detections, 3.0, &config)?;
        let objects = tracker.run()?;

        assert_eq!(objects.len(), 3);
        assert_eq!(objects[0].len(), iterations);
        assert_eq!(objects[1].len(), iterations);
        assert_eq!(objects[2].len(), iterations - 5);
        assert_eq!(objects.positions(2, iterations)?[42], None);
        Ok(())
    }
}
