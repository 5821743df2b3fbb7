use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// One concrete assignment of matrix axes to values.
pub type Combination = IndexMap<String, Value>;

/// Matrix strategy: named axes plus `include` / `exclude` adjustments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    #[serde(flatten)]
    pub axes: IndexMap<String, Vec<Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<Combination>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<Combination>,
}

impl Matrix {
    /// Size of the plain cartesian product, saturating on overflow.
    pub fn product_size(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        self.axes
            .values()
            .fold(1usize, |acc, values| acc.saturating_mul(values.len()))
    }

    /// Expand into concrete combinations.
    ///
    /// Exclusions drop every product combination matching all keys of an entry.
    /// Each include entry extends the combinations whose original axis values it
    /// agrees with; if it agrees with none it becomes a combination of its own.
    pub fn expand(&self) -> Vec<Combination> {
        let mut combinations: Vec<Combination> = if self.axes.is_empty() {
            Vec::new()
        } else {
            self.axes
                .iter()
                .fold(vec![Combination::new()], |acc, (axis, values)| {
                    acc.iter()
                        .flat_map(|partial| {
                            values.iter().map(move |value| {
                                let mut next = partial.clone();
                                next.insert(axis.clone(), value.clone());
                                next
                            })
                        })
                        .collect()
                })
        };

        combinations.retain(|combination| {
            !self
                .exclude
                .iter()
                .any(|entry| matches_all(combination, entry))
        });

        let product_len = combinations.len();
        for entry in &self.include {
            let mut extended = false;
            for combination in combinations.iter_mut().take(product_len) {
                if self.agrees_on_axes(combination, entry) {
                    for (key, value) in entry {
                        combination.insert(key.clone(), value.clone());
                    }
                    extended = true;
                }
            }
            if !extended {
                combinations.push(entry.clone());
            }
        }

        combinations
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.axes.is_empty() && self.include.is_empty() {
            return Err("matrix must declare at least one axis or include entry".to_string());
        }
        for (axis, values) in &self.axes {
            if values.is_empty() {
                return Err(format!("matrix axis '{}' has no values", axis));
            }
        }
        Ok(())
    }

    fn agrees_on_axes(&self, combination: &Combination, entry: &Combination) -> bool {
        entry
            .iter()
            .filter(|(key, _)| self.axes.contains_key(*key))
            .all(|(key, value)| combination.get(key) == Some(value))
    }
}

fn matches_all(combination: &Combination, entry: &Combination) -> bool {
    entry
        .iter()
        .all(|(key, value)| combination.get(key) == Some(value))
}
