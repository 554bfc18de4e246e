use indexmap::IndexMap;

use crate::adjustment::AdjustmentProfile;

#[derive(Debug, Clone, Default)]
pub struct AdjustmentTable {
    profiles: IndexMap<String, AdjustmentProfile>,
}

impl AdjustmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    // Later profiles for the same device replace earlier ones.
    pub fn merge(&mut self, profiles: impl IntoIterator<Item = AdjustmentProfile>) {
        for profile in profiles {
            self.profiles.insert(profile.device.clone(), profile);
        }
    }

    pub fn get(&self, device: &str) -> Option<&AdjustmentProfile> {
        self.profiles.get(device)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl FromIterator<AdjustmentProfile> for AdjustmentTable {
    fn from_iter<I: IntoIterator<Item = AdjustmentProfile>>(iter: I) -> Self {
        let mut table = Self::new();
        table.merge(iter);
        table
    }
}
