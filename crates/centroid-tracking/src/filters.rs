use crate::Detection;
use fixedbitset::FixedBitSet;
use std::{fmt, rc::Rc};

/// A function that consumes the detections of a frame and returns the ones that pass.
pub type DetectionFilter = Rc<dyn Fn(Vec<Detection>) -> Vec<Detection>>;

/// Keeps the detections with a score of at least `min_score`.
pub fn min_score(min_score: f32) -> DetectionFilter {
    Rc::new(move |detections: Vec<Detection>| {
        detections
            .into_iter()
            .filter(|detection| detection.score() >= min_score)
            .collect()
    })
}

/// Keeps the detections whose label is one of `classes`.
pub fn classes(classes: Vec<String>) -> DetectionFilter {
    Rc::new(move |detections: Vec<Detection>| {
        detections
            .into_iter()
            .filter(|detection| classes.iter().any(|class| class == detection.label()))
            .collect()
    })
}

/// Suppresses multiple detections of the same object.
///
/// Detections are visited by descending score; one is dropped when its intersection over union with an
/// already kept detection exceeds `iou_threshold`. Survivors keep their original order.
pub fn avoid_duplicated(iou_threshold: f32) -> DetectionFilter {
    Rc::new(move |detections: Vec<Detection>| {
        let mut order = (0..detections.len()).collect::<Vec<_>>();
        // stable, so equal scores keep detection order
        order.sort_by(|&a, &b| detections[b].score().total_cmp(&detections[a].score()));

        let mut kept = FixedBitSet::with_capacity(detections.len());
        for &candidate in &order {
            let duplicated = kept.ones().any(|other| {
                detections[candidate]
                    .bbox()
                    .intersection_over_union(detections[other].bbox())
                    > iou_threshold
            });
            if !duplicated {
                kept.insert(candidate);
            }
        }

        detections
            .into_iter()
            .enumerate()
            .filter_map(|(index, detection)| kept.contains(index).then_some(detection))
            .collect()
    })
}

/// An ordered list of filters applied to the detections of every frame.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<(String, DetectionFilter)>,
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.filters.iter().map(|(name, _)| name))
            .finish()
    }
}

impl FilterChain {
    pub fn new() -> FilterChain {
        FilterChain::default()
    }

    /// Appends a filter. Filters run in the order they were pushed.
    pub fn push<S: Into<String>>(&mut self, name: S, filter: DetectionFilter) -> &mut Self {
        self.filters.push((name.into(), filter));
        self
    }

    /// Returns the names of the registered filters in application order.
    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn apply(&self, detections: Vec<Detection>) -> Vec<Detection> {
        self.filters
            .iter()
            .fold(detections, |detections, (_, filter)| (filter)(detections))
    }
}

#[cfg(test)]
mod tests {
    use crate::filters::*;
    use crate::*;

    fn detection(x: f32, score: f32, label: &str) -> Detection {
        Detection::new(None, BoundingBox::new(x, 0.0, 10.0, 10.0), score, label)
    }

    #[test]
    fn filter_min_score() {
        let detections = vec![
            detection(0.0, 0.1, "car"),
            detection(20.0, 0.5, "car"),
            detection(40.0, 0.9, "car"),
        ];
        let filtered = (min_score(0.5))(detections);
        assert_eq!(
            filtered.iter().map(|d| d.score()).collect::<Vec<_>>(),
            vec![0.5, 0.9]
        );
    }

    #[test]
    fn filter_classes() {
        let detections = vec![
            detection(0.0, 0.9, "car"),
            detection(20.0, 0.9, "person"),
            detection(40.0, 0.9, "truck"),
        ];
        let filtered = (classes(vec!["car".to_string(), "truck".to_string()]))(detections);
        assert_eq!(
            filtered.iter().map(|d| d.label()).collect::<Vec<_>>(),
            vec!["car", "truck"]
        );
    }

    #[test]
    fn filter_duplicated() {
        let detections = vec![
            detection(0.0, 0.6, "ball"),
            detection(1.0, 0.8, "ball"),
            detection(50.0, 0.3, "ball"),
            detection(2.0, 0.7, "ball"),
        ];
        let filtered = (avoid_duplicated(0.5))(detections);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].score(), 0.8);
        assert_eq!(filtered[1].score(), 0.3);
    }

    #[test]
    fn chain_applies_in_order() {
        let mut chain = FilterChain::new();
        chain
            .push("min_score", min_score(0.5))
            .push("classes", classes(vec!["car".to_string()]));
        assert_eq!(chain.names(), vec!["min_score", "classes"]);

        let filtered = chain.apply(vec![
            detection(0.0, 0.4, "car"),
            detection(20.0, 0.9, "car"),
            detection(40.0, 0.9, "person"),
        ]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].bbox().x(), 20.0);

        assert!(FilterChain::new().apply(vec![]).is_empty());
    }
}
