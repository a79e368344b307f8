use std::path::{Path, PathBuf};

use yaml_rust::{Yaml, YamlLoader};

use super::algorithm_b::{AlgorithmBParams, TieBreak, UnreachablePolicy};
use super::error::{TapError, TapResult};
use super::frank_wolfe::FrankWolfeParams;
use super::root_finding::RootSolverKind;


#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Algorithm {
    B,
    FrankWolfe,
}

/// Everything needed to run one assignment from the command line.
#[derive(Clone, Debug, PartialEq)]
pub struct AssignmentConfig {
    pub network_path: PathBuf,
    pub trips_path: PathBuf,
    /// Where to write link flows, if anywhere.
    pub output_path: Option<PathBuf>,
    pub length_cost: f64,
    pub toll_cost: f64,
    pub algorithm: Algorithm,
    pub iteration_limit: usize,
    /// Solved to in turn, so the run reports progress at each.
    pub accuracies: Vec<f64>,
    pub algorithm_b: AlgorithmBParams,
    pub frank_wolfe: FrankWolfeParams,
}

impl AssignmentConfig {
    pub fn from_file(path: &Path) -> TapResult<AssignmentConfig> {
        let file_contents = std::fs::read_to_string(path)?;
        let yaml_cfgs = YamlLoader::load_from_str(&file_contents)?;
        let yaml_cfg = match yaml_cfgs.get(0) {
            Some(yaml_cfg) => yaml_cfg,
            None => return Err(TapError::Config(format!("{} is empty", path.display()))),
        };
        let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
        AssignmentConfig::from_yaml(yaml_cfg, config_dir)
    }

    /// Reads a config whose relative paths are relative to `base_dir`.
    pub fn from_yaml(yaml_cfg: &Yaml, base_dir: &Path) -> TapResult<AssignmentConfig> {
        let network_path = str_to_absolute_path(required_str(yaml_cfg, "network_path")?,
                                                base_dir);
        let trips_path = str_to_absolute_path(required_str(yaml_cfg, "trips_path")?, base_dir);
        let output_path = optional_str(yaml_cfg, "output_path")?
            .map(|path| str_to_absolute_path(path, base_dir));

        let algorithm = match optional_str(yaml_cfg, "algorithm")?.unwrap_or("b") {
            "b" | "B" | "algorithm_b" => Algorithm::B,
            "frank_wolfe" => Algorithm::FrankWolfe,
            other => return Err(TapError::Config(format!("unknown algorithm '{}'", other))),
        };

        let accuracies = match &yaml_cfg["accuracies"] {
            Yaml::Array(values) => values.iter()
                .map(|value| as_float(value).ok_or_else(
                    || TapError::Config(String::from("accuracies must be numbers"))))
                .collect::<TapResult<Vec<f64>>>()?,
            Yaml::BadValue | Yaml::Null => vec![1e-4],
            value => match as_float(value) {
                Some(accuracy) => vec![accuracy],
                None => return Err(TapError::Config(String::from("bad value for accuracies"))),
            },
        };
        if accuracies.is_empty() {
            return Err(TapError::Config(String::from("no accuracies given")));
        }

        let default_solver = RootSolverKind::default();
        let root_iterations = usize_or(yaml_cfg, "root_iterations", 0)?;
        let root_solver = match optional_str(yaml_cfg, "root_solver")? {
            Some(name) => {
                let iterations = if root_iterations > 0 {
                    root_iterations
                } else {
                    default_iterations(name)
                };
                RootSolverKind::from_name(name, iterations).ok_or_else(
                    || TapError::Config(format!("unknown root solver '{}'", name)))?
            }
            None if root_iterations > 0 => RootSolverKind::from_name("secant", root_iterations)
                .unwrap_or(default_solver),
            None => default_solver,
        };

        let unreachable = match optional_str(yaml_cfg, "unreachable")?.unwrap_or("warn") {
            "warn" => UnreachablePolicy::Warn,
            "reject" => UnreachablePolicy::Reject,
            other => return Err(TapError::Config(
                format!("unknown unreachable destination policy '{}'", other))),
        };

        let defaults = AlgorithmBParams::default();
        let ab_cfg = &yaml_cfg["algorithm_b"];
        let tie_break = match optional_str(ab_cfg, "tie_break")? {
            None | Some("distance_then_id") => TieBreak::DistanceThenId,
            Some("settle_order") => TieBreak::SettleOrder,
            Some(other) => return Err(TapError::Config(
                format!("unknown tie break '{}'", other))),
        };
        let algorithm_b = AlgorithmBParams {
            used_flow_epsilon: float_or(ab_cfg, "used_flow_epsilon",
                                        defaults.used_flow_epsilon)?,
            lazy_recheck_period: usize_or(ab_cfg, "lazy_recheck_period",
                                          defaults.lazy_recheck_period)?.max(1),
            equilibration_pass_limit: usize_or(ab_cfg, "equilibration_pass_limit",
                                               defaults.equilibration_pass_limit)?,
            root_solver,
            unreachable,
            tie_break,
        };

        Ok(AssignmentConfig {
            network_path,
            trips_path,
            output_path,
            length_cost: float_or(yaml_cfg, "length_cost", 0.)?,
            toll_cost: float_or(yaml_cfg, "toll_cost", 0.)?,
            algorithm,
            iteration_limit: usize_or(yaml_cfg, "iteration_limit", 100)?,
            accuracies,
            algorithm_b,
            frank_wolfe: FrankWolfeParams { root_solver, unreachable },
        })
    }
}

fn default_iterations(solver_name: &str) -> usize {
    match solver_name {
        "bisection" => 60,
        "regula_falsi" => 40,
        _ => 25,
    }
}

pub fn str_to_absolute_path(path_str: &str, default_base_dir: &Path) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        default_base_dir.join(path)
    }
}

fn is_missing(value: &Yaml) -> bool {
    value.is_badvalue() || value.is_null()
}

// yaml reads "4" as an integer and "4.0" as a real; both are fine where a float is wanted
fn as_float(value: &Yaml) -> Option<f64> {
    match value {
        Yaml::Integer(ii) => Some(*ii as f64),
        other => other.as_f64(),
    }
}

fn float_or(yaml_cfg: &Yaml, key: &str, default: f64) -> TapResult<f64> {
    let value = &yaml_cfg[key];
    if is_missing(value) {
        return Ok(default);
    }
    as_float(value).ok_or_else(|| TapError::Config(format!("'{}' must be a number", key)))
}

fn usize_or(yaml_cfg: &Yaml, key: &str, default: usize) -> TapResult<usize> {
    let value = &yaml_cfg[key];
    if is_missing(value) {
        return Ok(default);
    }
    match value.as_i64() {
        Some(ii) if ii >= 0 => Ok(ii as usize),
        _ => Err(TapError::Config(format!("'{}' must be a non-negative integer", key))),
    }
}

fn optional_str<'a>(yaml_cfg: &'a Yaml, key: &str) -> TapResult<Option<&'a str>> {
    let value = &yaml_cfg[key];
    if is_missing(value) {
        return Ok(None);
    }
    match value.as_str() {
        Some(ss) => Ok(Some(ss)),
        None => Err(TapError::Config(format!("'{}' must be a string", key))),
    }
}

fn required_str<'a>(yaml_cfg: &'a Yaml, key: &str) -> TapResult<&'a str> {
    optional_str(yaml_cfg, key)?.ok_or_else(|| TapError::Config(format!("no {}", key)))
}
