//! Gradient-boosted tree ensembles exported by XGBoost (`save_model("*.json")`).
//!
//! Only the parts needed for inference are read: tree topology, split
//! thresholds, leaf values, the tree-to-class map and the base score.
//! Categorical splits are not supported and are rejected at load time.

use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use super::{argmax, Classifier, ModelFormat};
use crate::error::{PredictError, Result};

const LEAF: i32 = -1;

#[derive(Debug, Deserialize)]
struct XgbDocument {
    learner: XgbLearner,
}

#[derive(Debug, Deserialize)]
struct XgbLearner {
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: XgbBooster,
    learner_model_param: XgbModelParam,
    objective: XgbObjective,
}

#[derive(Debug, Deserialize)]
struct XgbBooster {
    name: String,
    #[serde(default)]
    model: Option<XgbTreeModel>,
}

#[derive(Debug, Deserialize)]
struct XgbTreeModel {
    trees: Vec<XgbTree>,
    tree_info: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct XgbTree {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
    #[serde(default)]
    split_type: Vec<u8>,
}

/// `default_left` is written as 0/1 by recent releases and as booleans by older ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(u8),
}

impl Flag {
    fn is_set(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Int(i) => *i != 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct XgbModelParam {
    base_score: String,
    num_class: String,
    num_feature: String,
}

#[derive(Debug, Deserialize)]
struct XgbObjective {
    name: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Node {
    left: i32,
    right: i32,
    feature: usize,
    /// Split threshold, or the leaf value when `left == LEAF`.
    value: f32,
    default_left: bool,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.left == LEAF
    }
}

#[derive(Debug, Clone)]
struct RegTree {
    nodes: Vec<Node>,
}

impl RegTree {
    fn leaf_value(&self, features: &[f32]) -> f32 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                return node.value;
            }
            let x = features[node.feature];
            let go_left = if x.is_nan() {
                node.default_left
            } else {
                x < node.value
            };
            idx = if go_left { node.left } else { node.right } as usize;
        }
    }
}

/// How per-class margins become a class index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    /// `multi:softmax` / `multi:softprob`
    Argmax,
    /// Logistic objectives: class 1 when the margin is positive
    Logistic,
    /// `binary:hinge`
    Hinge,
}

#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    trees: Vec<RegTree>,
    tree_group: Vec<usize>,
    num_groups: usize,
    num_features: usize,
    base_margin: Vec<f32>,
    decision: Decision,
    objective: String,
    feature_names: Vec<String>,
}

impl TreeEnsemble {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let model = Self::from_json(&content)?;
        debug!(
            trees = model.num_trees(),
            objective = model.objective(),
            named_columns = model.feature_names.len(),
            "Loaded XGBoost ensemble"
        );
        Ok(model)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let doc: XgbDocument = serde_json::from_str(content)?;
        Self::from_document(doc).map_err(PredictError::Model)
    }

    fn from_document(doc: XgbDocument) -> std::result::Result<Self, String> {
        let learner = doc.learner;

        if learner.gradient_booster.name != "gbtree" {
            return Err(format!(
                "unsupported booster {:?} (only gbtree)",
                learner.gradient_booster.name
            ));
        }
        let model = learner
            .gradient_booster
            .model
            .ok_or_else(|| "gbtree booster has no model".to_string())?;

        let param = &learner.learner_model_param;
        let num_class: usize = param
            .num_class
            .trim()
            .parse()
            .map_err(|_| format!("invalid num_class {:?}", param.num_class))?;
        let num_features: usize = param
            .num_feature
            .trim()
            .parse()
            .map_err(|_| format!("invalid num_feature {:?}", param.num_feature))?;
        if num_features == 0 {
            return Err("num_feature must be > 0".to_string());
        }
        let num_groups = num_class.max(1);

        let objective = learner.objective.name.clone();
        let decision = match objective.as_str() {
            "multi:softmax" | "multi:softprob" if num_groups >= 2 => Decision::Argmax,
            "binary:logistic" | "binary:logitraw" | "reg:logistic" if num_groups == 1 => {
                Decision::Logistic
            }
            "binary:hinge" if num_groups == 1 => Decision::Hinge,
            other => {
                return Err(format!(
                    "objective {other:?} with num_class {num_class} is not a classifier"
                ))
            }
        };

        let base_scores = parse_base_score(&param.base_score)?;
        let base_margin = match (base_scores.len(), decision) {
            (1, Decision::Logistic) => vec![logit(base_scores[0])?],
            (1, _) => vec![base_scores[0]; num_groups],
            (n, Decision::Argmax) if n == num_groups => base_scores,
            (n, _) => {
                return Err(format!(
                    "base_score has {n} entries, expected 1 or {num_groups}"
                ))
            }
        };

        if model.trees.len() != model.tree_info.len() {
            return Err(format!(
                "{} trees but {} tree_info entries",
                model.trees.len(),
                model.tree_info.len()
            ));
        }
        if model.trees.is_empty() {
            return Err("model has no trees".to_string());
        }

        let mut tree_group = Vec::with_capacity(model.tree_info.len());
        for (t, group) in model.tree_info.iter().enumerate() {
            let group = usize::try_from(*group)
                .ok()
                .filter(|g| *g < num_groups)
                .ok_or_else(|| format!("tree[{t}] assigned to invalid class {group}"))?;
            tree_group.push(group);
        }

        let trees = model
            .trees
            .into_iter()
            .enumerate()
            .map(|(t, tree)| build_tree(t, tree, num_features))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            trees,
            tree_group,
            num_groups,
            num_features,
            base_margin,
            decision,
            objective,
            feature_names: learner.feature_names,
        })
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn objective(&self) -> &str {
        &self.objective
    }

    /// Raw per-class margins (base score included).
    pub fn margins(&self, features: &[f32]) -> Result<Vec<f32>> {
        if features.len() != self.num_features {
            return Err(PredictError::Model(format!(
                "TreeEnsemble input dim mismatch: got {}, expected {}",
                features.len(),
                self.num_features
            )));
        }

        let mut margins = self.base_margin.clone();
        for (tree, group) in self.trees.iter().zip(&self.tree_group) {
            margins[*group] += tree.leaf_value(features);
        }
        Ok(margins)
    }
}

impl Classifier for TreeEnsemble {
    fn format(&self) -> ModelFormat {
        ModelFormat::Xgboost
    }

    fn num_features(&self) -> usize {
        self.num_features
    }

    fn feature_names(&self) -> Vec<String> {
        self.feature_names.clone()
    }

    fn num_classes(&self) -> usize {
        if self.num_groups == 1 {
            2
        } else {
            self.num_groups
        }
    }

    fn predict_class(&self, features: &[f32]) -> Result<u32> {
        let margins = self.margins(features)?;
        match self.decision {
            Decision::Argmax => argmax(&margins)
                .map(|c| c as u32)
                .ok_or_else(|| PredictError::Model("ensemble produced no finite margin".to_string())),
            Decision::Logistic | Decision::Hinge => Ok(u32::from(margins[0] > 0.0)),
        }
    }
}

fn build_tree(t: usize, tree: XgbTree, num_features: usize) -> std::result::Result<RegTree, String> {
    let n = tree.left_children.len();
    if n == 0 {
        return Err(format!("tree[{t}] has no nodes"));
    }
    if tree.right_children.len() != n
        || tree.split_indices.len() != n
        || tree.split_conditions.len() != n
        || tree.default_left.len() != n
    {
        return Err(format!("tree[{t}] node arrays differ in length"));
    }
    if tree.split_type.iter().any(|s| *s != 0) {
        return Err(format!("tree[{t}] uses categorical splits"));
    }

    let mut nodes = Vec::with_capacity(n);
    for i in 0..n {
        let left = tree.left_children[i];
        let right = tree.right_children[i];
        let is_leaf = left == LEAF;

        let feature = if is_leaf {
            0
        } else {
            // Children always follow their parent, which rules out cycles.
            let in_range = |c: i32| c > i as i32 && (c as usize) < n;
            if !in_range(left) || !in_range(right) {
                return Err(format!("tree[{t}] node {i} has invalid children"));
            }
            usize::try_from(tree.split_indices[i])
                .ok()
                .filter(|f| *f < num_features)
                .ok_or_else(|| {
                    format!(
                        "tree[{t}] node {i} splits on feature {} (num_feature {num_features})",
                        tree.split_indices[i]
                    )
                })?
        };

        let value = tree.split_conditions[i];
        if !value.is_finite() {
            return Err(format!("tree[{t}] node {i} has non-finite value"));
        }

        nodes.push(Node {
            left,
            right,
            feature,
            value,
            default_left: tree.default_left[i].is_set(),
        });
    }

    Ok(RegTree { nodes })
}

/// Base score is `"5E-1"` or, since XGBoost 2.1, `"[5E-1,5E-1]"`.
fn parse_base_score(raw: &str) -> std::result::Result<Vec<f32>, String> {
    let inner = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let scores = inner
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<f32>()
                .map_err(|_| format!("invalid base_score {raw:?}"))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if scores.is_empty() || scores.iter().any(|s| !s.is_finite()) {
        return Err(format!("invalid base_score {raw:?}"));
    }
    Ok(scores)
}

fn logit(p: f32) -> std::result::Result<f32, String> {
    if p <= 0.0 || p >= 1.0 {
        return Err(format!("base_score {p} must be in (0, 1) for a logistic objective"));
    }
    Ok((p / (1.0 - p)).ln())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Three classes, two features. Class 0 wins for small x0, class 2 for
    // large x0.
    const MULTI: &str = r#"{
      "learner": {
        "feature_names": ["x0", "x1"],
        "gradient_booster": {
          "name": "gbtree",
          "model": {
            "gbtree_model_param": {"num_parallel_tree": "1", "num_trees": "3"},
            "tree_info": [0, 1, 2],
            "trees": [
              {"left_children": [1, -1, -1], "right_children": [2, -1, -1],
               "split_indices": [0, 0, 0], "split_conditions": [10.0, 1.0, -1.0],
               "default_left": [0, 0, 0], "split_type": [0, 0, 0]},
              {"left_children": [1, -1, -1], "right_children": [2, -1, -1],
               "split_indices": [1, 0, 0], "split_conditions": [0.5, 0.0, 0.0],
               "default_left": [1, 0, 0], "split_type": [0, 0, 0]},
              {"left_children": [1, -1, -1], "right_children": [2, -1, -1],
               "split_indices": [0, 0, 0], "split_conditions": [10.0, -1.0, 1.5],
               "default_left": [false, false, false]}
            ]
          }
        },
        "learner_model_param": {"base_score": "5E-1", "num_class": "3", "num_feature": "2"},
        "objective": {"name": "multi:softprob"}
      },
      "version": [2, 0, 3]
    }"#;

    const BINARY: &str = r#"{
      "learner": {
        "gradient_booster": {
          "name": "gbtree",
          "model": {
            "tree_info": [0],
            "trees": [
              {"left_children": [1, -1, -1], "right_children": [2, -1, -1],
               "split_indices": [0, 0, 0], "split_conditions": [3.0, -0.4, 0.4],
               "default_left": [0, 0, 0]}
            ]
          }
        },
        "learner_model_param": {"base_score": "[5E-1]", "num_class": "0", "num_feature": "1"},
        "objective": {"name": "binary:logistic"}
      }
    }"#;

    #[test]
    fn multiclass_argmax() {
        let model = TreeEnsemble::from_json(MULTI).unwrap();
        assert_eq!(model.num_trees(), 3);
        assert_eq!(model.num_classes(), 3);
        assert_eq!(model.num_features(), 2);
        assert_eq!(model.feature_names(), vec!["x0".to_string(), "x1".to_string()]);

        assert_eq!(model.predict_class(&[5.0, 1.0]).unwrap(), 0);
        assert_eq!(model.predict_class(&[20.0, 1.0]).unwrap(), 2);
    }

    #[test]
    fn threshold_is_strict_less_than() {
        let model = TreeEnsemble::from_json(MULTI).unwrap();
        // x0 == 10 goes right
        let margins = model.margins(&[10.0, 1.0]).unwrap();
        assert_eq!(margins, vec![0.5 - 1.0, 0.5 + 0.0, 0.5 + 1.5]);
    }

    #[test]
    fn missing_value_follows_default_direction() {
        let model = TreeEnsemble::from_json(MULTI).unwrap();
        let margins = model.margins(&[f32::NAN, f32::NAN]).unwrap();
        // tree0 and tree2 default right, tree1 default left
        assert_eq!(margins, vec![-0.5, 0.5, 2.0]);
    }

    #[test]
    fn binary_logistic_thresholds_margin() {
        let model = TreeEnsemble::from_json(BINARY).unwrap();
        assert_eq!(model.num_classes(), 2);
        assert_eq!(model.objective(), "binary:logistic");
        assert_eq!(model.predict_class(&[1.0]).unwrap(), 0);
        assert_eq!(model.predict_class(&[4.0]).unwrap(), 1);
    }

    fn mutated(edit: impl FnOnce(&mut serde_json::Value)) -> String {
        let mut doc: serde_json::Value = serde_json::from_str(MULTI).unwrap();
        edit(&mut doc);
        doc.to_string()
    }

    #[test]
    fn rejects_categorical_splits() {
        let doc = mutated(|d| {
            d["learner"]["gradient_booster"]["model"]["trees"][0]["split_type"] =
                serde_json::json!([1, 0, 0]);
        });
        let err = TreeEnsemble::from_json(&doc).unwrap_err();
        assert!(err.to_string().contains("categorical"));
    }

    #[test]
    fn rejects_out_of_range_feature() {
        let doc = mutated(|d| {
            d["learner"]["gradient_booster"]["model"]["trees"][1]["split_indices"] =
                serde_json::json!([7, 0, 0]);
        });
        assert!(matches!(TreeEnsemble::from_json(&doc), Err(PredictError::Model(_))));
    }

    #[test]
    fn rejects_backward_children() {
        let doc = mutated(|d| {
            d["learner"]["gradient_booster"]["model"]["trees"][1]["left_children"] =
                serde_json::json!([0, -1, -1]);
        });
        assert!(TreeEnsemble::from_json(&doc).is_err());
    }

    #[test]
    fn rejects_mismatched_tree_info() {
        let doc = mutated(|d| {
            d["learner"]["gradient_booster"]["model"]["tree_info"] = serde_json::json!([0, 1]);
        });
        assert!(TreeEnsemble::from_json(&doc).is_err());
    }

    #[test]
    fn rejects_regression_objective() {
        let doc = MULTI.replace("multi:softprob", "reg:squarederror");
        assert!(TreeEnsemble::from_json(&doc).is_err());
    }

    #[test]
    fn rejects_wrong_input_length() {
        let model = TreeEnsemble::from_json(MULTI).unwrap();
        assert!(matches!(model.margins(&[1.0]), Err(PredictError::Model(_))));
        assert!(matches!(
            model.predict_class(&[1.0, 2.0, 3.0]),
            Err(PredictError::Model(_))
        ));
    }

    #[test]
    fn parses_base_score_forms() {
        assert_eq!(parse_base_score("5E-1").unwrap(), vec![0.5]);
        assert_eq!(parse_base_score("[5E-1,2.5E-1]").unwrap(), vec![0.5, 0.25]);
        assert!(parse_base_score("nope").is_err());
    }
}
