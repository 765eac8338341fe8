use benor_common::Value;

/// Strict-majority detection over binary votes.
///
/// Returns `Zero` if at least `threshold` votes are zero, `One` if at least
/// `threshold` are one, `None` otherwise. Callers pass a threshold above half
/// of the input length, so at most one value can qualify.
pub fn resolve(values: &[Value], threshold: usize) -> Option<Value> {
    let ones = values.iter().filter(|v| **v == Value::One).count();
    let zeros = values.len() - ones;

    if zeros >= threshold {
        Some(Value::Zero)
    } else if ones >= threshold {
        Some(Value::One)
    } else {
        None
    }
}
