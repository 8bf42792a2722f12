use std::collections::HashMap;

use super::model::{Floater, ObservationRow};

// ---------------------------------------------------------------------------
// FloaterIndex – rows grouped per floater
// ---------------------------------------------------------------------------

/// Rows partitioned by floater identifier.
///
/// Floaters keep the order in which their identifier first appeared; each
/// floater's observations keep the order of the incoming rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloaterIndex {
    floaters: Vec<Floater>,
    by_id: HashMap<String, usize>,
}

impl FloaterIndex {
    /// Group loader rows by identifier.
    pub fn from_rows(rows: impl IntoIterator<Item = ObservationRow>) -> Self {
        let mut index = FloaterIndex::default();
        for row in rows {
            let slot = match index.by_id.get(&row.float_id) {
                Some(&slot) => slot,
                None => {
                    let slot = index.floaters.len();
                    index.floaters.push(Floater {
                        id: row.float_id.clone(),
                        observations: Vec::new(),
                    });
                    index.by_id.insert(row.float_id, slot);
                    slot
                }
            };
            index.floaters[slot].observations.push(row.observation);
        }
        index
    }

    pub fn get(&self, id: &str) -> Option<&Floater> {
        self.by_id.get(id).map(|&slot| &self.floaters[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Floater> {
        self.floaters.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.floaters.iter().map(|f| f.id.as_str())
    }

    /// Number of floaters.
    pub fn len(&self) -> usize {
        self.floaters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.floaters.is_empty()
    }

    /// Number of observations across all floaters.
    pub fn total_observations(&self) -> usize {
        self.floaters.iter().map(Floater::len).sum()
    }
}
