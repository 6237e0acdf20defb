//! Parameters of the small-world method.
//!
//! All knobs are optional and named; they can be set on the struct directly
//! or parsed from a JSON option map with [`SmallWorldParams::from_options`].
//! Unknown option names are ignored so callers can pass a superset; a
//! present option with the wrong type fails with
//! [`IndexError::BadParameter`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{IndexError, Result};

/// Names of the parameters that may change after the index is built.
pub const QUERY_TIME_PARAM_NAMES: &[&str] = &["initSearchAttempts"];

/// Tunables for building and searching a small-world graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SmallWorldParams {
    /// Neighbors to connect per insertion; also the `k` of the walk that
    /// finds them.
    #[serde(rename = "NN")]
    pub nn: usize,

    /// Walk attempts per insertion.
    pub init_index_attempts: usize,

    /// Walk attempts per query. The only knob that may change after build.
    pub init_search_attempts: usize,

    /// Parallel build workers; 0 or 1 builds serially.
    pub index_thread_qty: usize,

    /// Master RNG seed. When absent one is drawn from OS entropy, so
    /// reproducible builds require setting it explicitly.
    pub seed: Option<u64>,
}

impl Default for SmallWorldParams {
    fn default() -> Self {
        Self {
            nn: 5,
            init_index_attempts: 2,
            init_search_attempts: 10,
            index_thread_qty: default_thread_qty(),
            seed: None,
        }
    }
}

fn default_thread_qty() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl SmallWorldParams {
    /// Parse parameters from a named-option map.
    ///
    /// Absent options take their defaults; unrecognized options are
    /// ignored.
    pub fn from_options(options: &Map<String, Value>) -> Result<Self> {
        let params: Self = serde_json::from_value(Value::Object(options.clone()))
            .map_err(|e| IndexError::BadParameter(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Reject parameter combinations the graph cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.nn == 0 {
            return Err(IndexError::BadParameter(
                "NN must be positive: every published node needs a neighborhood".into(),
            ));
        }
        Ok(())
    }

    /// Apply a query-time option map. Only `initSearchAttempts` is
    /// recognized; everything else is ignored.
    pub fn apply_query_time_options(&mut self, options: &Map<String, Value>) -> Result<()> {
        if let Some(value) = options.get("initSearchAttempts") {
            let attempts = value.as_u64().ok_or_else(|| {
                IndexError::BadParameter(format!(
                    "initSearchAttempts must be an unsigned integer, got {value}"
                ))
            })?;
            self.init_search_attempts = attempts as usize;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let params = SmallWorldParams::default();
        assert_eq!(params.nn, 5);
        assert_eq!(params.init_index_attempts, 2);
        assert_eq!(params.init_search_attempts, 10);
        assert!(params.index_thread_qty >= 1);
        assert_eq!(params.seed, None);
    }

    #[test]
    fn empty_option_map_yields_defaults() {
        let params = SmallWorldParams::from_options(&Map::new()).unwrap();
        assert_eq!(params, SmallWorldParams::default());
    }

    #[test]
    fn named_options_override_defaults() {
        let params = SmallWorldParams::from_options(&options(json!({
            "NN": 10,
            "initIndexAttempts": 4,
            "initSearchAttempts": 32,
            "indexThreadQty": 8,
            "seed": 1234,
        })))
        .unwrap();
        assert_eq!(params.nn, 10);
        assert_eq!(params.init_index_attempts, 4);
        assert_eq!(params.init_search_attempts, 32);
        assert_eq!(params.index_thread_qty, 8);
        assert_eq!(params.seed, Some(1234));
    }

    #[test]
    fn unknown_options_are_ignored() {
        let params = SmallWorldParams::from_options(&options(json!({
            "NN": 7,
            "someFutureKnob": "whatever",
        })))
        .unwrap();
        assert_eq!(params.nn, 7);
    }

    #[test]
    fn wrong_type_fails() {
        let err = SmallWorldParams::from_options(&options(json!({
            "NN": "five",
        })))
        .unwrap_err();
        assert!(matches!(err, IndexError::BadParameter(_)));
    }

    #[test]
    fn zero_nn_rejected() {
        let err =
            SmallWorldParams::from_options(&options(json!({ "NN": 0 }))).unwrap_err();
        assert!(matches!(err, IndexError::BadParameter(_)));
    }

    #[test]
    fn query_time_update_touches_only_search_attempts() {
        let mut params = SmallWorldParams::default();
        params
            .apply_query_time_options(&options(json!({
                "initSearchAttempts": 3,
                "NN": 100,
            })))
            .unwrap();
        assert_eq!(params.init_search_attempts, 3);
        assert_eq!(params.nn, 5);
    }

    #[test]
    fn query_time_update_rejects_wrong_type() {
        let mut params = SmallWorldParams::default();
        let err = params
            .apply_query_time_options(&options(json!({ "initSearchAttempts": -1 })))
            .unwrap_err();
        assert!(matches!(err, IndexError::BadParameter(_)));
    }
}
