use crate::balancer::Drive;
use crate::error::BalanceError;
use crate::executor::shell_quote;

/// `df` invocation listing log volumes in bytes, one per line.
pub(crate) fn df_command(mount_filter: &str) -> String {
    format!(
        "df -k -B1 --output=size,used,avail,target | grep {} | sort",
        shell_quote(mount_filter)
    )
}

/// Parse one `size used avail target` line into a drive.
pub(crate) fn parse_df_line(line: &str) -> Result<Drive, BalanceError> {
    let malformed = || BalanceError::MalformedReport(line.to_string());

    let mut fields = line.split_whitespace();
    let mut number = || -> Result<u64, BalanceError> {
        fields.next().and_then(|f| f.parse().ok()).ok_or_else(malformed)
    };
    let total = number()?;
    let used = number()?;
    let free = number()?;
    let path = fields.next().ok_or_else(malformed)?;

    Ok(Drive::new(total, used, free, path))
}

/// Parse a full `df` report, keeping only lines whose mount contains `mount_filter`.
pub(crate) fn parse_df_lines(
    lines: &[String],
    mount_filter: &str,
) -> Result<Vec<Drive>, BalanceError> {
    let mut drives = Vec::new();
    for line in lines {
        if !line.contains(mount_filter) {
            continue;
        }
        drives.push(parse_df_line(line)?);
    }
    drives.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(drives)
}
