// Flow-to-cost functions for network links, and the sums of shifted link costs that the
// equilibration step root-finds over.
use std::fmt;
use std::ops::{AddAssign, MulAssign, SubAssign};


/// Polynomial stored as coefficients from the constant term upwards, evaluated with the
/// Horner scheme.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct HornerPolynomial {
    coeffs: Vec<f64>,
}

impl HornerPolynomial {
    pub fn new(coeffs: Vec<f64>) -> HornerPolynomial {
        HornerPolynomial { coeffs }
    }

    pub fn constant(value: f64) -> HornerPolynomial {
        HornerPolynomial { coeffs: vec![value] }
    }

    /// The monomial x^degree.
    pub fn monomial(degree: usize) -> HornerPolynomial {
        let mut coeffs = vec![0.; degree + 1];
        coeffs[degree] = 1.;
        HornerPolynomial { coeffs }
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    pub fn eval(&self, xx: f64) -> f64 {
        self.coeffs.iter().rev().fold(0., |acc, cc| acc * xx + cc)
    }

    /// Replaces p(x) with p(x + delta).
    pub fn shift_x(&mut self, delta: f64) {
        if delta == 0. {
            return;
        }
        let degree = self.coeffs.len().saturating_sub(1);
        // repeated synthetic division by (x - delta)
        for ii in 0..degree {
            for jj in (ii..degree).rev() {
                let carry = delta * self.coeffs[jj + 1];
                self.coeffs[jj] += carry;
            }
        }
    }

    /// Replaces p(x) with p(factor * x).
    pub fn multiply_x(&mut self, factor: f64) {
        let mut multiple = 1.;
        for cc in self.coeffs.iter_mut() {
            *cc *= multiple;
            multiple *= factor;
        }
    }

    pub fn add_constant(&mut self, value: f64) {
        if self.coeffs.is_empty() {
            self.coeffs.push(0.);
        }
        self.coeffs[0] += value;
    }

    fn combine(&mut self, other: &HornerPolynomial, sign: f64) {
        if other.coeffs.len() > self.coeffs.len() {
            self.coeffs.resize(other.coeffs.len(), 0.);
        }
        for (mine, theirs) in self.coeffs.iter_mut().zip(other.coeffs.iter()) {
            *mine += sign * theirs;
        }
    }
}

impl AddAssign<&HornerPolynomial> for HornerPolynomial {
    fn add_assign(&mut self, other: &HornerPolynomial) {
        self.combine(other, 1.);
    }
}

impl SubAssign<&HornerPolynomial> for HornerPolynomial {
    fn sub_assign(&mut self, other: &HornerPolynomial) {
        self.combine(other, -1.);
    }
}

impl MulAssign<f64> for HornerPolynomial {
    fn mul_assign(&mut self, factor: f64) {
        for cc in self.coeffs.iter_mut() {
            *cc *= factor;
        }
    }
}

impl fmt::Display for HornerPolynomial {
    fn fmt(&self, ff: &mut fmt::Formatter) -> fmt::Result {
        write!(ff, "HornerPolynomial:")?;
        for (power, cc) in self.coeffs.iter().enumerate() {
            write!(ff, " + {}x^{}", cc, power)?;
        }
        Ok(())
    }
}


/// A BPR function with a real-valued exponent, which has no polynomial form.
#[derive(Clone, Debug, PartialEq)]
pub struct BprFunction {
    zero_flow_time: f64,
    capacity: f64,
    alpha: f64,
    beta: f64,
    extra_cost: f64,
    // flow added to the argument before evaluation
    offset: f64,
}

impl BprFunction {
    fn eval(&self, flow: f64) -> f64 {
        let ratio = (flow + self.offset).max(0.) / self.capacity;
        self.extra_cost + self.zero_flow_time * (1. + self.alpha * ratio.powf(self.beta))
    }
}


#[derive(Clone, Debug, PartialEq)]
pub enum CostFunction {
    Polynomial(HornerPolynomial),
    Bpr(BprFunction),
}

impl CostFunction {
    /// Builds `zero_flow_time * (1 + alpha * (flow / capacity)^beta) + extra_cost`.  Integer
    /// exponents give a polynomial, anything else is evaluated with `powf`.
    pub fn bpr(zero_flow_time: f64, capacity: f64, alpha: f64, beta: f64, extra_cost: f64)
               -> CostFunction {
        if capacity <= 0. || alpha == 0. {
            return CostFunction::constant(zero_flow_time + extra_cost);
        }
        if beta >= 0. && beta.fract() == 0. {
            let mut hp = HornerPolynomial::monomial(beta as usize);
            hp.multiply_x(1. / capacity);
            hp *= alpha;
            hp.add_constant(1.);
            hp *= zero_flow_time;
            hp.add_constant(extra_cost);
            CostFunction::Polynomial(hp)
        } else {
            CostFunction::Bpr(BprFunction {
                zero_flow_time, capacity, alpha, beta, extra_cost, offset: 0.,
            })
        }
    }

    pub fn constant(value: f64) -> CostFunction {
        CostFunction::Polynomial(HornerPolynomial::constant(value))
    }

    pub fn polynomial(coeffs: Vec<f64>) -> CostFunction {
        CostFunction::Polynomial(HornerPolynomial::new(coeffs))
    }

    /// Cost of the placeholder reverse arcs that never carry flow.
    pub fn infinite() -> CostFunction {
        CostFunction::constant(f64::INFINITY)
    }

    pub fn eval(&self, flow: f64) -> f64 {
        match self {
            CostFunction::Polynomial(hp) => hp.eval(flow),
            CostFunction::Bpr(bpr) => bpr.eval(flow),
        }
    }

    /// Returns the function `x -> self(x + delta)`.
    pub fn shifted(&self, delta: f64) -> CostFunction {
        let mut shifted = self.clone();
        match &mut shifted {
            CostFunction::Polynomial(hp) => hp.shift_x(delta),
            CostFunction::Bpr(bpr) => bpr.offset += delta,
        }
        shifted
    }

    pub fn is_infinite(&self) -> bool {
        self.eval(0.).is_infinite()
    }
}

impl fmt::Display for CostFunction {
    fn fmt(&self, ff: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CostFunction::Polynomial(hp) => write!(ff, "{}", hp),
            CostFunction::Bpr(bpr) => write!(ff, "BprFunction({}, {}, {}, {}, {})",
                                             bpr.zero_flow_time, bpr.capacity, bpr.alpha,
                                             bpr.beta, bpr.extra_cost),
        }
    }
}


/// Difference between two sets of link costs as a function of a flow shift `x`:
///
/// `sum(add_f(add_flow + x)) - sum(sub_f(sub_flow - x))`
///
/// Terms are accumulated with `+=` / `-=` of (cost function, current flow) pairs.
#[derive(Default)]
pub struct SummedFunction<'a> {
    add: Vec<(&'a CostFunction, f64)>,
    subtract: Vec<(&'a CostFunction, f64)>,
}

impl<'a> SummedFunction<'a> {
    pub fn new() -> SummedFunction<'a> {
        SummedFunction { add: vec![], subtract: vec![] }
    }

    pub fn eval(&self, xx: f64) -> f64 {
        let gained: f64 = self.add.iter().map(|(ff, flow)| ff.eval(flow + xx)).sum();
        let lost: f64 = self.subtract.iter().map(|(ff, flow)| ff.eval(flow - xx)).sum();
        gained - lost
    }

    pub fn len(&self) -> usize {
        self.add.len() + self.subtract.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> AddAssign<(&'a CostFunction, f64)> for SummedFunction<'a> {
    fn add_assign(&mut self, term: (&'a CostFunction, f64)) {
        self.add.push(term);
    }
}

impl<'a> SubAssign<(&'a CostFunction, f64)> for SummedFunction<'a> {
    fn sub_assign(&mut self, term: (&'a CostFunction, f64)) {
        self.subtract.push(term);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_horner_eval() {
        // 1 + 2x + 3x^2
        let hp = HornerPolynomial::new(vec![1., 2., 3.]);
        assert_eq!(hp.eval(0.), 1.);
        assert_eq!(hp.eval(2.), 17.);
        assert_eq!(HornerPolynomial::default().eval(5.), 0.);
    }

    #[test]
    fn test_shift_x() {
        let mut hp = HornerPolynomial::new(vec![1., -2., 0., 0.5]);
        let original = hp.clone();
        hp.shift_x(1.5);
        for xx in &[-2., 0., 0.3, 4.] {
            assert_abs_diff_eq!(hp.eval(*xx), original.eval(xx + 1.5), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_multiply_x_and_combine() {
        let mut hp = HornerPolynomial::new(vec![0., 1., 1.]);
        hp.multiply_x(2.);
        // 2x + 4x^2
        assert_eq!(hp.coeffs(), &[0., 2., 4.]);
        hp -= &HornerPolynomial::new(vec![1., 2., 4., 1.]);
        assert_eq!(hp.coeffs(), &[-1., 0., 0., -1.]);
        hp += &HornerPolynomial::constant(1.);
        assert_eq!(hp.eval(2.), -8.);
    }

    #[test]
    fn test_bpr_polynomial_matches_formula() {
        let cf = CostFunction::bpr(6., 25900., 0.15, 4., 1.5);
        match &cf {
            CostFunction::Polynomial(_) => (),
            _ => panic!("integer exponent should give a polynomial"),
        }
        for flow in &[0., 1000., 25900., 40000.] {
            let expected = 1.5 + 6. * (1. + 0.15 * (flow / 25900_f64).powi(4));
            assert_abs_diff_eq!(cf.eval(*flow), expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_bpr_real_exponent() {
        let cf = CostFunction::bpr(2., 100., 0.5, 2.5, 0.);
        match &cf {
            CostFunction::Bpr(_) => (),
            _ => panic!("real exponent has no polynomial form"),
        }
        assert_abs_diff_eq!(cf.eval(100.), 3., epsilon = 1e-12);
        let shifted = cf.shifted(50.);
        assert_abs_diff_eq!(shifted.eval(50.), cf.eval(100.), epsilon = 1e-12);
        // negative arguments are clamped rather than producing NaN
        assert_eq!(cf.eval(-10.), 2.);
    }

    #[test]
    fn test_infinite() {
        let cf = CostFunction::infinite();
        assert!(cf.is_infinite());
        assert!(cf.shifted(3.).eval(1.).is_infinite());
        assert!(!CostFunction::constant(2.).is_infinite());
    }

    #[test]
    fn test_summed_function() {
        let cheap = CostFunction::polynomial(vec![1., 1.]);
        let dear = CostFunction::polynomial(vec![2., 0., 1.]);
        let mut sf = SummedFunction::new();
        assert!(sf.is_empty());
        sf += (&cheap, 3.);
        sf -= (&dear, 2.);
        assert_eq!(sf.len(), 2);
        // (1 + 3 + x) - (2 + (2 - x)^2)
        for xx in &[0., 0.5, 2.] {
            let expected = (4. + xx) - (2. + (2. - xx) * (2. - xx));
            assert_abs_diff_eq!(sf.eval(*xx), expected, epsilon = 1e-12);
        }
    }
}
