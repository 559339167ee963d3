//! Per-file event collections
//!
//! Files are keyed by the DXT `file_id` hash rather than the recorded path:
//! Darshan truncates long paths, and two different files can end up with the
//! same truncated name.

use crate::event::Event;
use std::collections::{BTreeMap, HashMap};

/// All events recorded against one file
#[derive(Debug, Clone)]
pub struct FileAggregate {
    id: String,
    name: String,
    events: Vec<Event>,
}

impl FileAggregate {
    /// Create an empty aggregate
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            events: Vec::new(),
        }
    }

    /// Create an aggregate from a batch of events, already in canonical order
    pub fn from_events(
        id: impl Into<String>,
        name: impl Into<String>,
        events: impl IntoIterator<Item = Event>,
    ) -> Self {
        let mut file = Self::new(id, name);
        file.events.extend(events);
        file.sort_events();
        file
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Events in canonical sweep order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Append an event; order is restored by [`FileTable::finish`]
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Stable sort, so events equal on every sort key keep trace order
    fn sort_events(&mut self) {
        self.events.sort_by(Event::canonical_cmp);
    }

    /// Each rank's own events, in canonical order
    pub fn by_rank(&self) -> BTreeMap<u32, Vec<&Event>> {
        let mut ranks: BTreeMap<u32, Vec<&Event>> = BTreeMap::new();
        for event in &self.events {
            ranks.entry(event.rank()).or_default().push(event);
        }
        ranks
    }
}

/// Files in the order they were first seen in the trace
#[derive(Debug, Clone, Default)]
pub struct FileTable {
    files: Vec<FileAggregate>,
    index: HashMap<String, usize>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a file by id, creating it on first sight
    ///
    /// Returns the aggregate and whether it was just created. The name given
    /// on first sight is kept.
    pub fn entry(&mut self, id: &str, name: &str) -> (&mut FileAggregate, bool) {
        match self.index.get(id) {
            Some(&idx) => (&mut self.files[idx], false),
            None => {
                let idx = self.files.len();
                self.files.push(FileAggregate::new(id, name));
                self.index.insert(id.to_string(), idx);
                (&mut self.files[idx], true)
            }
        }
    }

    /// Insert a complete aggregate, replacing any existing file with that id
    pub fn insert(&mut self, file: FileAggregate) {
        match self.index.get(file.id()) {
            Some(&idx) => self.files[idx] = file,
            None => {
                self.index.insert(file.id().to_string(), self.files.len());
                self.files.push(file);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&FileAggregate> {
        self.index.get(id).map(|&idx| &self.files[idx])
    }

    /// Put every file's events into canonical order
    pub fn finish(&mut self) {
        for file in &mut self.files {
            file.sort_events();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileAggregate> {
        self.files.iter()
    }

    pub fn files(&self) -> &[FileAggregate] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total number of events across all files
    pub fn event_count(&self) -> usize {
        self.files.iter().map(FileAggregate::len).sum()
    }
}
