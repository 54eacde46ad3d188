use anyhow::{Result, bail};
use std::{fmt::Debug, ops::RangeBounds};

pub fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }

    Ok(())
}

pub fn check_prob(prob: f64) -> Result<()> {
    check_num(prob, 0.0..=1.0)
}

pub fn check_finite(num: f64) -> Result<()> {
    if !num.is_finite() {
        bail!("number must be finite, but is {num}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_num_accepts_values_in_range() {
        assert!(check_num(3, 1..10).is_ok());
        assert!(check_num(0.5, 0.0..=1.0).is_ok());
        assert!(check_num(10, 1..).is_ok());
    }

    #[test]
    fn check_num_rejects_values_out_of_range() {
        let err = check_num(10, 1..10).unwrap_err();
        assert_eq!(err.to_string(), "number must be in the range 1..10, but is 10");
        assert!(check_prob(1.5).is_err());
        assert!(check_prob(-0.1).is_err());
        assert!(check_prob(f64::NAN).is_err());
    }

    #[test]
    fn check_finite_rejects_infinities_and_nan() {
        assert!(check_finite(0.1).is_ok());
        assert!(check_finite(f64::INFINITY).is_err());
        assert!(check_finite(f64::NAN).is_err());
    }
}
