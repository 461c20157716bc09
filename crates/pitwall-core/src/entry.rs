use serde::{Deserialize, Serialize};

/// One car on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Entrant {
    pub driver_guid: String,
    pub driver_name: String,
    #[serde(default)]
    pub team: String,
    pub car_model: String,
    #[serde(default)]
    pub skin: String,
    /// Zero-based grid slot. Lower pit boxes start further up the grid.
    #[serde(default)]
    pub pit_box: usize,
}

impl Entrant {
    pub fn new(driver_guid: impl Into<String>, driver_name: impl Into<String>, car_model: impl Into<String>) -> Self {
        Self {
            driver_guid: driver_guid.into(),
            driver_name: driver_name.into(),
            car_model: car_model.into(),
            ..Default::default()
        }
    }
}

/// An ordered list of entrants. Order is grid order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryList(Vec<Entrant>);

impl EntryList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entrant> {
        self.0.iter()
    }

    pub fn entrants(&self) -> &[Entrant] {
        &self.0
    }

    /// Mutable access for filters that remove, reorder, or alter entrants.
    pub fn entrants_mut(&mut self) -> &mut Vec<Entrant> {
        &mut self.0
    }

    /// Append an entrant, keeping the pit box it already carries.
    pub fn push(&mut self, entrant: Entrant) {
        self.0.push(entrant);
    }

    /// Append an entrant in the next free grid slot.
    pub fn add_to_back_of_grid(&mut self, mut entrant: Entrant) {
        entrant.pit_box = self.0.len();
        self.0.push(entrant);
    }

    /// Reassign pit boxes by list position, starting at `first`.
    pub fn renumber_pit_boxes(&mut self, first: usize) {
        for (i, entrant) in self.0.iter_mut().enumerate() {
            entrant.pit_box = first + i;
        }
    }

    /// Driver GUIDs in list order.
    pub fn guids(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.driver_guid.as_str()).collect()
    }
}

impl FromIterator<Entrant> for EntryList {
    fn from_iter<I: IntoIterator<Item = Entrant>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Entrant> for EntryList {
    fn extend<I: IntoIterator<Item = Entrant>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for EntryList {
    type Item = Entrant;
    type IntoIter = std::vec::IntoIter<Entrant>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a EntryList {
    type Item = &'a Entrant;
    type IntoIter = std::slice::Iter<'a, Entrant>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
