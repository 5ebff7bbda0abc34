use super::support::{df_report, du_report};
use crate::error::BalanceError;
use crate::scanner::{df_command, du_command, parse_df_lines, parse_du_lines};

#[test]
fn test_parse_df_report() {
    let drives = parse_df_lines(&df_report(), "data").unwrap();
    assert_eq!(drives.len(), 4);
    assert_eq!(drives[2].path, "/data/kafka3");
    assert_eq!(drives[2].total_bytes, 2_128_439_787_520);
    assert_eq!(drives[2].used_bytes, 1_702_751_830_016);
    assert_eq!(drives[2].free_bytes, 425_687_957_504);
    assert_eq!(drives[2].bytes_needed, 0);
}

#[test]
fn test_parse_df_skips_other_mounts() {
    let lines = vec![
        "52710469632 10737418240 41973051392 /".to_string(),
        "2128439787520 474803814400 1556468125696 /data/kafka1".to_string(),
    ];
    let drives = parse_df_lines(&lines, "data").unwrap();
    assert_eq!(drives.len(), 1);
    assert_eq!(drives[0].path, "/data/kafka1");
}

#[test]
fn test_parse_df_rejects_malformed_line() {
    let lines = vec!["2128439787520 lots 1556468125696 /data/kafka1".to_string()];
    assert!(matches!(parse_df_lines(&lines, "data"), Err(BalanceError::MalformedReport(_))));
}

#[test]
fn test_parse_du_sorts_largest_first_and_skips_non_partitions() {
    let mut lines = du_report();
    lines.push("4096\tcleaner-offset-checkpoint".to_string());
    lines.push("20\tmeta.properties".to_string());
    lines.push("900000000000\torders-3.5f2a-delete".to_string());

    let entries = parse_du_lines(&lines);
    assert_eq!(entries.len(), 16);
    assert!(entries.windows(2).all(|w| w[0].size_bytes >= w[1].size_bytes));
    assert_eq!(entries[0].partition.to_string(), "testTopic-1");
    assert_eq!(entries[15].partition.to_string(), "testTopic3-0");
}

#[test]
fn test_report_commands_quote_paths() {
    assert_eq!(
        df_command("data"),
        "df -k -B1 --output=size,used,avail,target | grep 'data' | sort"
    );
    assert_eq!(
        du_command("/data/kafka3/data", 80),
        "cd '/data/kafka3/data' && du -sb * | sort -h | tail -80"
    );
}
