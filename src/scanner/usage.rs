use crate::balancer::{Candidate, PartitionId};
use crate::executor::shell_quote;
use tracing::debug;

/// `du` invocation listing the `limit` largest entries of a data directory.
pub(crate) fn du_command(data_dir: &str, limit: usize) -> String {
    format!("cd {} && du -sb * | sort -h | tail -{limit}", shell_quote(data_dir))
}

/// Parse `size name` lines into partition sizes, largest first.
///
/// Entries that are not `<topic>-<index>` directories (checkpoint files,
/// `-delete` or `-future` directories, payload files) are skipped.
pub(crate) fn parse_du_lines(lines: &[String]) -> Vec<Candidate> {
    let mut entries: Vec<Candidate> = lines
        .iter()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let size: u64 = fields.next()?.parse().ok()?;
            let name = fields.next()?;
            match name.parse::<PartitionId>() {
                Ok(partition) => Some(Candidate::new(size, partition)),
                Err(e) => {
                    debug!("Skipping du entry: {}", e);
                    None
                }
            }
        })
        .collect();

    entries.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
    entries
}
