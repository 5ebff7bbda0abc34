use super::types::Drive;
use crate::error::BalanceError;

/// Target utilization for the node: the mean of every drive's `percent_used`.
pub(crate) fn compute_goal(drives: &[Drive]) -> Result<f64, BalanceError> {
    if drives.is_empty() {
        return Err(BalanceError::EmptyDriveSet);
    }
    let sum: f64 = drives.iter().map(Drive::percent_used).sum();
    Ok(sum / drives.len() as f64)
}
