use crate::balancer::Drive;
use crate::config::BalancerConfig;
use anyhow::Result;
use clap::Parser;
use std::io::{BufRead, Write};

#[derive(Debug, Parser)]
#[command(name = "logdir-balancer")]
#[command(
    about = "Rebalance partition data across the local log volumes of one broker",
    long_about = None
)]
pub(crate) struct Cli {
    #[arg(help = "Broker host to balance, as <user>@<host> or <host>")]
    pub target: Option<String>,
    #[arg(long, help = "Path to the KEY=\"VALUE\" config file")]
    pub config: Option<String>,
    #[arg(long, help = "Id of the broker running on the target host")]
    pub broker_id: Option<u32>,
    #[arg(long = "env", help = "Environment tag substituted for {env} in endpoints")]
    pub environment: Option<String>,
    #[arg(long, default_value_t = false, help = "Do not ask for confirmation")]
    pub yes: bool,
    #[arg(
        long,
        default_value_t = false,
        help = "Only print drive usage and the goal analysis; move nothing"
    )]
    pub report_only: bool,
}

impl Cli {
    /// Command-line values win over file and environment configuration.
    pub(crate) fn apply_to(&self, config: &mut BalancerConfig) {
        if let Some(target) = &self.target {
            match target.split_once('@') {
                Some((user, host)) => {
                    config.user = Some(user.to_string());
                    config.host = Some(host.to_string());
                }
                None => config.host = Some(target.clone()),
            }
        }
        if let Some(id) = self.broker_id {
            config.broker_id = Some(id);
        }
        if let Some(env) = &self.environment {
            config.environment_tag.clone_from(env);
        }
    }
}

/// Ask the operator whether to go ahead. An empty answer counts as yes.
pub(crate) fn confirm(input: &mut impl BufRead, output: &mut impl Write) -> Result<bool> {
    write!(output, "Balance partitions? [Y/n]: ")?;
    output.flush()?;

    let mut answer = String::new();
    // Closed input is not consent.
    if input.read_line(&mut answer)? == 0 {
        return Ok(false);
    }
    Ok(matches!(answer.trim(), "" | "Y" | "y"))
}

/// Drive usage table shown before the operator decides.
pub(crate) fn write_drive_table(
    output: &mut impl Write,
    drives: &[Drive],
    goal: Option<f64>,
) -> Result<()> {
    writeln!(
        output,
        "{:<24} {:>16} {:>16} {:>16} {:>7} {:>18}",
        "MOUNT", "SIZE", "USED", "AVAIL", "USE%", "BYTES NEEDED"
    )?;
    for d in drives {
        writeln!(
            output,
            "{:<24} {:>16} {:>16} {:>16} {:>6.1}% {:>18}",
            d.path,
            d.total_bytes,
            d.used_bytes,
            d.free_bytes,
            d.percent_used() * 100.0,
            d.bytes_needed
        )?;
    }
    if let Some(goal) = goal {
        writeln!(output, "Goal utilization: {:.2}%", goal * 100.0)?;
    }
    writeln!(output)?;
    Ok(())
}
