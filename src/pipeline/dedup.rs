// src/pipeline/dedup.rs
//! Cross-source de-duplication.
//!
//! Two events match iff their normalized titles are equal AND their start
//! times differ by at most the tolerance. Matches are closed transitively with
//! a disjoint-set, so A~B and B~C put A, B and C in one group even when A and C
//! are further apart than the tolerance.
//!
//! Within a title bucket, events are sorted by start time and only neighbours
//! are unioned: on a line, the neighbour chain yields the same components as
//! all pairwise matches, independent of input order.

use chrono::{DateTime, Duration, FixedOffset};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::model::{Source, SourceEvent};

/// A cluster of records describing one real meeting.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupGroup {
    /// Members in input order.
    members: Vec<SourceEvent>,
    canonical: usize,
}

impl DedupGroup {
    fn new(members: Vec<SourceEvent>) -> Self {
        let canonical = select_canonical(&members);
        Self { members, canonical }
    }

    pub fn canonical(&self) -> &SourceEvent {
        &self.members[self.canonical]
    }

    pub fn members(&self) -> &[SourceEvent] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Union of all members' attendees, lowercased and trimmed.
    pub fn merged_attendees(&self) -> BTreeSet<String> {
        self.members
            .iter()
            .flat_map(|m| m.attendees.iter())
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect()
    }

    /// Distinct contributing sources, in `Source` order.
    pub fn sources(&self) -> Vec<Source> {
        self.members
            .iter()
            .map(|m| m.source)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Earliest member start.
    pub fn reference_start(&self) -> DateTime<FixedOffset> {
        self.members
            .iter()
            .map(|m| m.start)
            .min()
            .unwrap_or_else(|| self.canonical().start)
    }
}

/// Lowercase, trim, collapse internal whitespace.
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The matching rule on its own. Conjunctive on purpose: title AND time.
pub fn is_same_meeting(a: &SourceEvent, b: &SourceEvent, tolerance: Duration) -> bool {
    normalize_title(&a.title) == normalize_title(&b.title)
        && (a.start - b.start).abs() <= tolerance
}

/// Group events into same-meeting clusters. Groups come back ordered by the
/// input position of their first member. A tolerance too large for
/// `Duration` saturates.
pub fn dedupe(events: Vec<SourceEvent>, tolerance_minutes: i64) -> Vec<DedupGroup> {
    let tolerance = Duration::try_minutes(tolerance_minutes.max(0)).unwrap_or(Duration::MAX);
    dedupe_within(events, tolerance)
}

/// [`dedupe`] with a prebuilt window; negative windows act as zero.
pub fn dedupe_within(events: Vec<SourceEvent>, tolerance: Duration) -> Vec<DedupGroup> {
    let n = events.len();
    if n == 0 {
        return Vec::new();
    }
    let tolerance = tolerance.max(Duration::zero());

    let mut buckets: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, ev) in events.iter().enumerate() {
        buckets.entry(normalize_title(&ev.title)).or_default().push(i);
    }

    let mut uf = UnionFind::new(n);
    for idx in buckets.values_mut() {
        idx.sort_by(|&a, &b| events[a].start.cmp(&events[b].start).then(a.cmp(&b)));
        for pair in idx.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if events[b].start - events[a].start <= tolerance {
                uf.union(a, b);
            }
        }
    }

    let mut group_of_root: HashMap<usize, usize> = HashMap::new();
    let mut grouped: Vec<Vec<usize>> = Vec::new();
    for i in 0..n {
        let root = uf.find(i);
        let g = *group_of_root.entry(root).or_insert_with(|| {
            grouped.push(Vec::new());
            grouped.len() - 1
        });
        grouped[g].push(i);
    }

    let mut slots: Vec<Option<SourceEvent>> = events.into_iter().map(Some).collect();
    grouped
        .into_iter()
        .map(|idx| {
            let members = idx.into_iter().filter_map(|i| slots[i].take()).collect();
            DedupGroup::new(members)
        })
        .collect()
}

/// Preference: manual source, then a non-empty description, then the most
/// attendees. Remaining ties go to source order, id and start time so that
/// swapping two distinct records never changes the pick; input order only
/// separates records identical in all of those.
fn select_canonical(members: &[SourceEvent]) -> usize {
    members
        .iter()
        .enumerate()
        .min_by(|a, b| canonical_order(*a, *b))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn canonical_order((ia, a): (usize, &SourceEvent), (ib, b): (usize, &SourceEvent)) -> Ordering {
    let manual = |e: &SourceEvent| e.source == Source::Manual;
    let has_desc = |e: &SourceEvent| !e.description.trim().is_empty();
    manual(b)
        .cmp(&manual(a))
        .then_with(|| has_desc(b).cmp(&has_desc(a)))
        .then_with(|| b.attendees.len().cmp(&a.attendees.len()))
        .then_with(|| a.source.cmp(&b.source))
        .then_with(|| a.id.cmp(&b.id))
        .then_with(|| a.start.cmp(&b.start))
        .then_with(|| ia.cmp(&ib))
}

/// Disjoint-set over input positions (union by rank, path halving).
#[derive(Debug)]
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            Ordering::Less => self.parent[ra] = rb,
            Ordering::Greater => self.parent[rb] = ra,
            Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 2, 14, h, m, 0)
            .unwrap()
    }

    fn ev(id: &str, source: Source, title: &str, h: u32, m: u32) -> SourceEvent {
        SourceEvent::new(id, source, title, at(h, m), at(h, m) + Duration::minutes(30))
    }

    #[test]
    fn normalize_title_collapses_whitespace() {
        assert_eq!(normalize_title("  Team \t  Sync\n"), "team sync");
    }

    #[test]
    fn same_title_within_tolerance_merges() {
        let groups = dedupe(
            vec![
                ev("g1", Source::Google, "Team Meeting", 10, 0),
                ev("o1", Source::Outlook, "team  meeting", 10, 5),
            ],
            5,
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].sources(), vec![Source::Google, Source::Outlook]);
    }

    #[test]
    fn different_titles_never_merge() {
        let groups = dedupe(
            vec![
                ev("g1", Source::Google, "Team Meeting", 10, 0),
                ev("o1", Source::Outlook, "Client Meeting", 10, 0),
            ],
            5,
        );
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn outside_tolerance_stays_apart() {
        let groups = dedupe(
            vec![
                ev("g1", Source::Google, "Sync", 10, 0),
                ev("o1", Source::Outlook, "Sync", 10, 6),
            ],
            5,
        );
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn chain_is_closed_transitively() {
        let groups = dedupe(
            vec![
                ev("c", Source::Ical, "Sync", 10, 8),
                ev("a", Source::Google, "Sync", 10, 0),
                ev("b", Source::Outlook, "Sync", 10, 4),
            ],
            5,
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
    }

    #[test]
    fn canonical_prefers_manual_then_description_then_attendees() {
        let manual = ev("m", Source::Manual, "Sync", 10, 0);
        let described = ev("g", Source::Google, "Sync", 10, 1).with_description("agenda");
        let crowded = ev("o", Source::Outlook, "Sync", 10, 2).with_attendees(["a@x", "b@x"]);

        let g = &dedupe(vec![crowded.clone(), described.clone(), manual], 5)[0];
        assert_eq!(g.canonical().id, "m");

        let g = &dedupe(vec![crowded.clone(), described], 5)[0];
        assert_eq!(g.canonical().id, "g");

        let plain = ev("i", Source::Ical, "Sync", 10, 3);
        let g = &dedupe(vec![plain, crowded], 5)[0];
        assert_eq!(g.canonical().id, "o");
    }

    #[test]
    fn identical_records_fall_back_to_input_order() {
        let a = ev("same", Source::Google, "Sync", 10, 0).with_organizer("first@x");
        let b = ev("same", Source::Google, "Sync", 10, 0).with_organizer("second@x");
        let g = &dedupe(vec![a, b], 5)[0];
        assert_eq!(g.canonical().organizer.as_deref(), Some("first@x"));
    }

    #[test]
    fn merged_attendees_are_a_normalized_union() {
        let a = ev("a", Source::Google, "Sync", 10, 0).with_attendees(["Sam@X.com", "kim@x.com"]);
        let b = ev("b", Source::Outlook, "Sync", 10, 1).with_attendees(["sam@x.com", "lee@y.com"]);
        let g = &dedupe(vec![a, b], 5)[0];
        let got: Vec<_> = g.merged_attendees().into_iter().collect();
        assert_eq!(got, vec!["kim@x.com", "lee@y.com", "sam@x.com"]);
    }

    #[test]
    fn groups_follow_first_member_input_order() {
        let groups = dedupe(
            vec![
                ev("b1", Source::Google, "Beta", 9, 0),
                ev("a1", Source::Google, "Alpha", 8, 0),
                ev("b2", Source::Outlook, "Beta", 9, 1),
            ],
            5,
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].canonical().title, "Beta");
        assert_eq!(groups[1].canonical().title, "Alpha");
        assert_eq!(groups[0].reference_start(), at(9, 0));
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(dedupe(Vec::new(), 5).is_empty());
    }

    #[test]
    fn oversized_tolerance_saturates() {
        let a = SourceEvent::new("a", Source::Google, "Sync", at(9, 0), at(9, 30));
        let b = SourceEvent::new("b", Source::Outlook, "Sync", at(17, 0), at(17, 30));
        let groups = dedupe(vec![a, b], i64::MAX / 2);
        assert_eq!(groups.len(), 1);
    }
}
