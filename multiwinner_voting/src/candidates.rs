use log::{debug, warn};

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    fmt::Display,
};

/// The index of a candidate, as found in the ballot source.
///
/// Indices are not required to be positive: some sources number candidates
/// from 0, others from 1.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct CandidateId(pub i32);

impl Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered candidate.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    /// The last space-delimited token of the name.
    pub last_name: String,
}

impl Candidate {
    fn new(id: CandidateId, name: &str) -> Candidate {
        let last_name = match name.rfind(' ') {
            Some(pos) => name[pos + 1..].to_string(),
            None => name.to_string(),
        };
        Candidate {
            id,
            name: name.to_string(),
            last_name,
        }
    }
}

impl Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The candidates of one election, and the optional vote counts used to order
/// them for display.
///
/// The context is passed explicitly to every tally, so that several elections
/// can be counted in the same process.
///
/// ```
/// use multiwinner_voting::{CandidateId, ElectionContext};
///
/// let mut ctx = ElectionContext::new();
/// ctx.register(1, "Alice Smith");
/// ctx.register(2, "Bob Jones");
/// assert_eq!(ctx.count(), 2);
/// assert_eq!(ctx.lookup(CandidateId(1)).map(|c| c.last_name.as_str()), Some("Smith"));
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ElectionContext {
    candidates: BTreeMap<CandidateId, Candidate>,
    counts: Option<HashMap<CandidateId, i64>>,
    max_name_length: usize,
}

impl ElectionContext {
    pub fn new() -> ElectionContext {
        ElectionContext::default()
    }

    /// Registers a candidate under the given index.
    ///
    /// Registering an index twice is not an error: the last registration
    /// wins, both for `lookup` and for `all`.
    pub fn register(&mut self, index: i32, name: &str) -> Candidate {
        let cand = Candidate::new(CandidateId(index), name);
        if let Some(previous) = self.candidates.insert(cand.id, cand.clone()) {
            warn!(
                "register: index {} re-registered: {:?} replaces {:?}",
                index, name, previous.name
            );
        }
        self.max_name_length = self.max_name_length.max(name.chars().count());
        debug!("register: {}: {}", index, name);
        cand
    }

    pub fn lookup(&self, id: CandidateId) -> Option<&Candidate> {
        self.candidates.get(&id)
    }

    pub fn contains(&self, id: CandidateId) -> bool {
        self.candidates.contains_key(&id)
    }

    /// All the registered candidates, sorted by index.
    pub fn all(&self) -> impl Iterator<Item = &Candidate> + '_ {
        self.candidates.values()
    }

    pub fn ids(&self) -> Vec<CandidateId> {
        self.candidates.keys().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.candidates.len()
    }

    /// The longest name registered so far, in characters.
    pub fn max_name_length(&self) -> usize {
        self.max_name_length
    }

    /// Replaces the vote counts used to order the candidates.
    pub fn set_counts(&mut self, counts: HashMap<CandidateId, i64>) {
        self.counts = Some(counts);
    }

    pub fn clear_counts(&mut self) {
        self.counts = None;
    }

    pub fn counts(&self) -> Option<&HashMap<CandidateId, i64>> {
        self.counts.as_ref()
    }

    /// The candidate ordering, using the counts currently set (if any).
    pub fn ordering(&self) -> CandidateOrdering<'_> {
        CandidateOrdering {
            candidates: &self.candidates,
            counts: self.counts.as_ref(),
        }
    }

    /// The candidate ordering with an explicit snapshot of counts.
    pub fn ordering_with<'a>(
        &'a self,
        counts: Option<&'a HashMap<CandidateId, i64>>,
    ) -> CandidateOrdering<'a> {
        CandidateOrdering {
            candidates: &self.candidates,
            counts,
        }
    }

    /// The name of a candidate, or its index if it is not registered.
    pub fn name(&self, id: CandidateId) -> String {
        self.lookup(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn last_name(&self, id: CandidateId) -> String {
        self.lookup(id)
            .map(|c| c.last_name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

/// Total order over candidates: by count (descending) when counts are set,
/// a candidate without a count having 0, then by name ignoring case, then by
/// index. Unregistered candidates come after the registered ones with the
/// same count.
#[derive(Debug, Clone, Copy)]
pub struct CandidateOrdering<'a> {
    candidates: &'a BTreeMap<CandidateId, Candidate>,
    counts: Option<&'a HashMap<CandidateId, i64>>,
}

impl<'a> CandidateOrdering<'a> {
    pub fn compare(&self, a: CandidateId, b: CandidateId) -> Ordering {
        let by_count = match self.counts {
            Some(counts) => {
                let ca = counts.get(&a).copied().unwrap_or(0);
                let cb = counts.get(&b).copied().unwrap_or(0);
                cb.cmp(&ca)
            }
            None => Ordering::Equal,
        };
        by_count
            .then_with(|| self.compare_names(a, b))
            .then_with(|| a.cmp(&b))
    }

    fn compare_names(&self, a: CandidateId, b: CandidateId) -> Ordering {
        match (self.candidates.get(&a), self.candidates.get(&b)) {
            (Some(ca), Some(cb)) => ca
                .name
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(cb.name.chars().flat_map(char::to_lowercase)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    pub fn sort(&self, ids: &mut [CandidateId]) {
        ids.sort_by(|a, b| self.compare(*a, *b));
    }

    /// Sorts a tally by decreasing value. Equal values follow the candidate
    /// ordering.
    pub fn sort_desc_by_value<V: PartialOrd + Copy>(
        &self,
        tally: &HashMap<CandidateId, V>,
    ) -> Vec<(CandidateId, V)> {
        let mut res: Vec<(CandidateId, V)> = tally.iter().map(|(cid, v)| (*cid, *v)).collect();
        res.sort_by(|(ca, va), (cb, vb)| {
            vb.partial_cmp(va)
                .unwrap_or(Ordering::Equal)
                .then_with(|| self.compare(*ca, *cb))
        });
        res
    }
}
