// One-dimensional root finders used for flow shifts and line searches.
//
// Every solver assumes the function is non-decreasing on [lower, upper] (true of sums of
// increasing link costs).  If the function is already non-negative at `lower`, `lower` is the
// answer; if it is still non-positive at `upper`, `upper` is.  When the iteration budget runs
// out the latest estimate is returned; callers clamp it into range.

static FLAT_TOLERANCE: f64 = 1e-18;


pub trait RootSolver {
    fn solve<F>(&self, func: F, lower: f64, upper: f64) -> f64
        where F: Fn(f64) -> f64;
}


#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SecantSolver {
    iteration_limit: usize,
}

impl SecantSolver {
    pub fn new(iteration_limit: usize) -> SecantSolver {
        SecantSolver { iteration_limit }
    }
}

impl Default for SecantSolver {
    fn default() -> SecantSolver {
        SecantSolver::new(25)
    }
}

impl RootSolver for SecantSolver {
    fn solve<F>(&self, func: F, lower: f64, upper: f64) -> f64
        where F: Fn(f64) -> f64 {
        let mut first = lower;
        let mut first_eval = func(first);
        if first_eval >= 0. {
            return first;
        }
        let mut second = upper;
        let mut second_eval = func(second);
        if second_eval <= 0. {
            return second;
        }

        let mut estimate = first;
        for _ in 0..self.iteration_limit {
            let slope = second_eval - first_eval;
            if slope.abs() <= FLAT_TOLERANCE || !slope.is_finite() {
                break;
            }
            estimate = first - first_eval * (second - first) / slope;
            first = second;
            first_eval = second_eval;
            second = estimate;
            second_eval = func(second);
            if second_eval == 0. {
                break;
            }
        }
        estimate
    }
}


#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BisectionSolver {
    iteration_limit: usize,
}

impl BisectionSolver {
    pub fn new(iteration_limit: usize) -> BisectionSolver {
        BisectionSolver { iteration_limit }
    }
}

impl Default for BisectionSolver {
    fn default() -> BisectionSolver {
        BisectionSolver::new(60)
    }
}

impl RootSolver for BisectionSolver {
    fn solve<F>(&self, func: F, lower: f64, upper: f64) -> f64
        where F: Fn(f64) -> f64 {
        let (mut lower, mut upper) = (lower, upper);
        if func(lower) >= 0. {
            return lower;
        }
        if func(upper) <= 0. {
            return upper;
        }

        let mut midpoint = lower;
        for _ in 0..self.iteration_limit {
            midpoint = 0.5 * (lower + upper);
            let mid_eval = func(midpoint);
            if mid_eval == 0. {
                break;
            } else if mid_eval > 0. {
                upper = midpoint;
            } else {
                lower = midpoint;
            }
        }
        midpoint
    }
}


#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegulaFalsiSolver {
    iteration_limit: usize,
}

impl RegulaFalsiSolver {
    pub fn new(iteration_limit: usize) -> RegulaFalsiSolver {
        RegulaFalsiSolver { iteration_limit }
    }
}

impl Default for RegulaFalsiSolver {
    fn default() -> RegulaFalsiSolver {
        RegulaFalsiSolver::new(40)
    }
}

impl RootSolver for RegulaFalsiSolver {
    fn solve<F>(&self, func: F, lower: f64, upper: f64) -> f64
        where F: Fn(f64) -> f64 {
        let (mut lower, mut upper) = (lower, upper);
        let mut lower_eval = func(lower);
        if lower_eval >= 0. {
            return lower;
        }
        let mut upper_eval = func(upper);
        if upper_eval <= 0. {
            return upper;
        }

        let mut estimate = lower;
        for _ in 0..self.iteration_limit {
            if (lower_eval - upper_eval).abs() <= FLAT_TOLERANCE {
                break;
            }
            estimate = lower + (upper - lower) * (lower_eval / (lower_eval - upper_eval));
            let estimate_eval = func(estimate);
            if estimate_eval == 0. {
                break;
            } else if estimate_eval > 0. {
                upper = estimate;
                upper_eval = estimate_eval;
            } else {
                lower = estimate;
                lower_eval = estimate_eval;
            }
        }
        estimate
    }
}


/// Run-time choice of root finder, as named in configuration files.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RootSolverKind {
    Secant(SecantSolver),
    Bisection(BisectionSolver),
    RegulaFalsi(RegulaFalsiSolver),
}

impl RootSolverKind {
    pub fn from_name(name: &str, iteration_limit: usize) -> Option<RootSolverKind> {
        match name {
            "secant" => Some(RootSolverKind::Secant(SecantSolver::new(iteration_limit))),
            "bisection" => Some(RootSolverKind::Bisection(BisectionSolver::new(iteration_limit))),
            "regula_falsi" => Some(RootSolverKind::RegulaFalsi(
                RegulaFalsiSolver::new(iteration_limit))),
            _ => None,
        }
    }
}

impl Default for RootSolverKind {
    fn default() -> RootSolverKind {
        RootSolverKind::Secant(SecantSolver::default())
    }
}

impl RootSolver for RootSolverKind {
    fn solve<F>(&self, func: F, lower: f64, upper: f64) -> f64
        where F: Fn(f64) -> f64 {
        match self {
            RootSolverKind::Secant(ss) => ss.solve(func, lower, upper),
            RootSolverKind::Bisection(bs) => bs.solve(func, lower, upper),
            RootSolverKind::RegulaFalsi(rf) => rf.solve(func, lower, upper),
        }
    }
}
