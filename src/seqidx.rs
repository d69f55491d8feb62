use rustc_hash::FxHashMap;

/// Interns sequence names so intervals can be partitioned and compared by a
/// small integer instead of by string.
#[derive(Default, Debug, Clone)]
pub struct SequenceIndex {
    name_to_id: FxHashMap<String, u32>,
    id_to_name: Vec<String>,
}

impl SequenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert_id(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = self.id_to_name.len() as u32;
        self.name_to_id.insert(name.to_owned(), id);
        self.id_to_name.push(name.to_owned());
        id
    }

    pub fn get_id(&self, name: &str) -> Option<u32> {
        self.name_to_id.get(name).copied()
    }

    pub fn get_name(&self, id: u32) -> Option<&str> {
        self.id_to_name.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }

    /// Ids ordered by natural sequence-name order (chr2 before chr10).
    pub fn natural_order(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = (0..self.id_to_name.len() as u32).collect();
        ids.sort_by(|&a, &b| natord::compare(&self.id_to_name[a as usize], &self.id_to_name[b as usize]));
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_stable_and_dense() {
        let mut index = SequenceIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.get_or_insert_id("chr10"), 0);
        assert_eq!(index.get_or_insert_id("chr2"), 1);
        assert_eq!(index.get_or_insert_id("chr10"), 0);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get_id("chr2"), Some(1));
        assert_eq!(index.get_id("chrX"), None);
        assert_eq!(index.get_name(0), Some("chr10"));
    }

    #[test]
    fn test_natural_order() {
        let mut index = SequenceIndex::new();
        for name in ["chr10", "chr2", "chr1", "chrX"] {
            index.get_or_insert_id(name);
        }
        let names: Vec<&str> = index
            .natural_order()
            .into_iter()
            .filter_map(|id| index.get_name(id))
            .collect();
        assert_eq!(names, vec!["chr1", "chr2", "chr10", "chrX"]);
    }
}
