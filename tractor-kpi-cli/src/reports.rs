use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use std::io::Write;

use tractor_kpi::{DataQuality, KpiReport, KpiRow};

const SEAT_LABELS: [&str; 4] = ["Leading Player (Pos 1)", "2nd Player", "3rd Player", "4th Player"];

fn seat_label(seat: u32) -> String {
    usize::try_from(seat)
        .ok()
        .and_then(|seat| seat.checked_sub(1))
        .and_then(|idx| SEAT_LABELS.get(idx))
        .map_or_else(|| format!("Seat {seat}"), |label| (*label).to_string())
}

fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

/// Per-seat points per round plus the total across seats, when any seat has one.
fn round_points(row: &KpiRow) -> (Vec<(u32, f64)>, f64) {
    let points: Vec<(u32, f64)> = row
        .positions
        .iter()
        .filter_map(|(seat, columns)| columns.points_per_round.map(|p| (*seat, p)))
        .collect();
    let total = points.iter().map(|(_, p)| p).sum();
    (points, total)
}

pub fn generate_console_report<W: Write + ?Sized>(
    out: &mut W,
    report: &KpiReport,
    verbose: bool,
) -> Result<()> {
    writeln!(out, "{}", "📊 Tractor KPI Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "======================".cyan())?;
    writeln!(out, "Build versions: {}", report.rows.len())?;
    writeln!(out, "Total games: {}", report.total_games())?;
    writeln!(out)?;

    if report.is_empty() {
        writeln!(out, "{}", "No build version logged a finished game.".yellow())?;
    }

    for row in &report.rows {
        writeln!(out, "{} {}", "▶".bright_blue(), row.build_version.bold())?;
        writeln!(out, "   Games: {}", row.total_games)?;
        if let (Some(attacking), Some(defending)) =
            (row.attacking_team_win_rate, row.defending_team_win_rate)
        {
            writeln!(
                out,
                "   Team win rate: attacking {} / defending {}",
                percent(attacking).green(),
                percent(defending).yellow()
            )?;
        }
        if let Some(rounds) = row.total_rounds {
            write!(out, "   Rounds: {rounds}")?;
            if let Some(per_game) = row.avg_rounds_per_game {
                write!(out, " ({per_game:.1} per game)")?;
            }
            writeln!(out)?;
        }
        if let Some(rate) = row.attacking_round_win_rate {
            writeln!(out, "   Attacking round win rate: {}", percent(rate))?;
        }
        let seat_rates: Vec<String> = row
            .positions
            .iter()
            .filter_map(|(seat, columns)| columns.win_rate.map(|rate| format!("P{seat} {}", percent(rate))))
            .collect();
        if !seat_rates.is_empty() {
            writeln!(out, "   Seat win rates: {}", seat_rates.join(", "))?;
        }
        if let Some(points) = row.avg_kitty_points {
            writeln!(out, "   Avg kitty points: {points:.1}")?;
        }
        if let Some(score) = row.avg_decision_score {
            writeln!(
                out,
                "   AI decisions: {} (avg score {score:.3})",
                row.total_decisions.unwrap_or_default()
            )?;
        }
        writeln!(out)?;
    }

    write_quality_console(out, &report.quality, verbose)?;
    Ok(())
}

fn write_quality_console<W: Write + ?Sized>(
    out: &mut W,
    quality: &DataQuality,
    verbose: bool,
) -> Result<()> {
    writeln!(out, "{}", "🔎 Data Quality".bright_yellow().bold())?;
    writeln!(out, "{}", "===============".yellow())?;
    writeln!(
        out,
        "Lines read: {} (events {}, malformed {}, blank {})",
        quality.lines_read, quality.events_parsed, quality.malformed_lines, quality.blank_lines
    )?;
    if quality.read_failures > 0 {
        writeln!(out, "Read failures: {}", quality.read_failures.to_string().red())?;
    }
    if quality.unversioned_events > 0 {
        writeln!(out, "Events without build version: {}", quality.unversioned_events)?;
    }
    if quality.has_warnings() {
        writeln!(out, "Warnings: {}", quality.warnings.len().to_string().red())?;
    } else {
        writeln!(out, "Warnings: {}", "0".green())?;
    }
    if verbose {
        for (field, count) in &quality.missing_fields {
            writeln!(out, "   missing {field}: {count}")?;
        }
        for warning in &quality.warnings {
            writeln!(out, "   • {}", warning.to_string().red())?;
        }
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(out: &mut W, report: &KpiReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_csv_report<W: Write + ?Sized>(out: &mut W, report: &KpiReport) -> Result<()> {
    report.write_csv(out)?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(
    out: &mut W,
    report: &KpiReport,
    generated: DateTime<Utc>,
    verbose: bool,
) -> Result<()> {
    if report.is_empty() {
        writeln!(out, "# No data found")?;
        return Ok(());
    }

    writeln!(out, "# 🎮 Tractor AI Performance Report\n")?;
    writeln!(out, "**Generated:** {}\n", generated.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "**App Versions:** {}\n", report.rows.len())?;
    writeln!(out, "**Total Games:** {}\n", report.total_games())?;

    for row in &report.rows {
        write_markdown_row(out, row)?;
    }

    write_quality_markdown(out, &report.quality, verbose)?;
    Ok(())
}

fn write_markdown_row<W: Write + ?Sized>(out: &mut W, row: &KpiRow) -> Result<()> {
    writeln!(out, "## 📊 App Version: `{}`\n", row.build_version)?;

    writeln!(out, "### 🏆 Game Performance\n")?;
    writeln!(out, "- **Total Games:** {}", row.total_games)?;
    if let Some(rate) = row.attacking_team_win_rate {
        writeln!(out, "- **Attacking Team Win Rate:** {}", percent(rate))?;
    }
    if let Some(rate) = row.defending_team_win_rate {
        writeln!(out, "- **Defending Team Win Rate:** {}", percent(rate))?;
    }
    if let Some(rounds) = row.total_rounds {
        writeln!(out, "- **Total Rounds:** {rounds}")?;
    }
    if let Some(per_game) = row.avg_rounds_per_game {
        writeln!(out, "- **Avg Rounds per Game:** {per_game:.1}")?;
    }
    if let Some(rate) = row.attacking_round_win_rate {
        writeln!(out, "- **Attacking Round Win Rate:** {}", percent(rate))?;
    }
    writeln!(out)?;

    writeln!(out, "### 🎯 Position Performance (Win Rates)\n")?;
    for (seat, columns) in &row.positions {
        if let Some(rate) = columns.win_rate {
            writeln!(out, "- **{}:** {} win rate", seat_label(*seat), percent(rate))?;
        }
    }
    writeln!(out)?;

    writeln!(out, "### 🎯 Total Points Collected Per Round (By Position)\n")?;
    let (points, total) = round_points(row);
    if total > 0.0 {
        for (seat, per_round) in &points {
            writeln!(
                out,
                "- **{}:** {per_round:.1} points per round ({} of total)",
                seat_label(*seat),
                percent(per_round / total)
            )?;
        }
        writeln!(out, "- **Total Round Points:** {total:.1} per round (out of ~200 available)")?;
    }
    writeln!(out)?;

    writeln!(out, "### 🎮 Player Performance\n")?;
    if let Some(rate) = row.avg_player_win_rate {
        writeln!(out, "- **Average Player Win Rate:** {}", percent(rate))?;
    }
    if let Some(points) = row.avg_points_per_trick {
        writeln!(out, "- **Average Points per Trick:** {points:.1}")?;
    }
    writeln!(out)?;

    writeln!(out, "### 📈 Efficiency Metrics\n")?;
    if let Some(points) = row.avg_final_points {
        writeln!(out, "- **Avg Final Points per Round:** {points:.1}")?;
    }
    if let Some(points) = row.avg_kitty_points {
        writeln!(out, "- **Avg Kitty Points:** {points:.1}")?;
    }
    if let Some(score) = row.avg_decision_score {
        writeln!(out, "- **Avg AI Decision Score:** {score:.3}")?;
    }
    writeln!(out)?;

    writeln!(out, "### 🧠 Most Used AI Strategies\n")?;
    if row.strategies.is_empty() {
        writeln!(out, "- No frequently used strategies identified")?;
    } else {
        if !row.strategies.leading.is_empty() {
            writeln!(out, "**🎯 Leading Strategies:**\n")?;
            for (point, count) in &row.strategies.leading {
                writeln!(out, "- `{point}`: {count} uses")?;
            }
        }
        if !row.strategies.following.is_empty() {
            writeln!(out, "\n**🤝 Following Strategies:**\n")?;
            for (point, count) in &row.strategies.following {
                writeln!(out, "- `{point}`: {count} uses")?;
            }
        }
    }
    writeln!(out, "\n---\n")?;
    Ok(())
}

fn write_quality_markdown<W: Write + ?Sized>(
    out: &mut W,
    quality: &DataQuality,
    verbose: bool,
) -> Result<()> {
    writeln!(out, "## 🔎 Data Quality\n")?;
    writeln!(out, "- **Lines Read:** {}", quality.lines_read)?;
    writeln!(out, "- **Events Parsed:** {}", quality.events_parsed)?;
    writeln!(out, "- **Malformed Lines:** {}", quality.malformed_lines)?;
    writeln!(out, "- **Warnings:** {}", quality.warnings.len())?;
    if verbose {
        if !quality.missing_fields.is_empty() {
            writeln!(out, "\n| Missing field | Records |\n|---|---|")?;
            for (field, count) in &quality.missing_fields {
                writeln!(out, "| `{field}` | {count} |")?;
            }
        }
        for warning in &quality.warnings {
            writeln!(out, "- {warning}")?;
        }
    }
    Ok(())
}
