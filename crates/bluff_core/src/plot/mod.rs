//! # Plot Module
//!
//! Chart rendering as hand-assembled SVG strings. No drawing library;
//! every figure is a string of `<rect>`, `<circle>` and `<text>`
//! elements with a fixed layout.
//!
//! [`generate_all_plots`] writes the standard figure set for a run and
//! skips figures whose experiment data is absent.

use crate::analysis::metrics::{calculate_all_stats, PlayerStats};
use crate::data::unique_models;
use crate::error::Result;
use crate::models::{ExperimentId, GameLog, EXPERIMENT_IDS};
use crate::report::shorten_model_name;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

const WIDTH: u32 = 800;
const MARGIN_LEFT: u32 = 220;
const MARGIN_TOP: u32 = 60;
const BAR_HEIGHT: u32 = 24;
const BAR_GAP: u32 = 12;

type Rgb = (u8, u8, u8);

// Single-hue ramps, light to dark.
const BLUES: (Rgb, Rgb) = ((0xc6, 0xdb, 0xef), (0x08, 0x51, 0x9c));
const REDS: (Rgb, Rgb) = ((0xfc, 0xbb, 0xa1), (0xa5, 0x0f, 0x15));

const STEELBLUE: &str = "#4682b4";
const CORAL: &str = "#ff7f50";

fn lerp_color(ramp: (Rgb, Rgb), t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    let channel = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        channel(ramp.0 .0, ramp.1 .0),
        channel(ramp.0 .1, ramp.1 .1),
        channel(ramp.0 .2, ramp.1 .2)
    )
}

/// Diverging ramp for the heatmap: green through yellow to red.
fn heat_color(t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        lerp_color(((0x1a, 0x98, 0x50), (0xff, 0xff, 0xbf)), t * 2.0)
    } else {
        lerp_color(((0xff, 0xff, 0xbf), (0xd7, 0x30, 0x27)), (t - 0.5) * 2.0)
    }
}

fn svg_open(out: &mut String, width: u32, height: u32, title: &str) {
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        w = width,
        h = height
    );
    let _ = writeln!(
        out,
        "  <rect width=\"{}\" height=\"{}\" fill=\"white\"/>",
        width, height
    );
    let _ = writeln!(
        out,
        "  <text x=\"{}\" y=\"28\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"16\" font-weight=\"bold\">{}</text>",
        width / 2,
        title
    );
}

fn svg_text(out: &mut String, x: f64, y: f64, anchor: &str, size: u32, text: &str) {
    let _ = writeln!(
        out,
        "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"{}\" font-family=\"sans-serif\" font-size=\"{}\">{}</text>",
        x, y, anchor, size, text
    );
}

/// Horizontal bar chart of a per-model rate, sorted ascending so the
/// best model lands on top visually darkest.
fn rate_bar_chart(
    stats: &BTreeMap<String, PlayerStats>,
    title: &str,
    ramp: (Rgb, Rgb),
    value: fn(&PlayerStats) -> f64,
) -> String {
    let mut entries: Vec<(&str, f64)> = stats
        .values()
        .map(|s| (s.model_id.as_str(), value(s)))
        .collect();
    entries.sort_by(|a, b| a.1.total_cmp(&b.1));

    let rows = entries.len() as u32;
    let height = MARGIN_TOP + rows * (BAR_HEIGHT + BAR_GAP) + 30;
    let plot_width = f64::from(WIDTH - MARGIN_LEFT - 80);
    let max = entries.iter().map(|e| e.1).fold(0.0_f64, f64::max).max(1e-9);

    let mut out = String::new();
    svg_open(&mut out, WIDTH, height, title);

    for (i, (model, v)) in entries.iter().enumerate() {
        let y = f64::from(MARGIN_TOP + i as u32 * (BAR_HEIGHT + BAR_GAP));
        let w = plot_width * (v / max);
        let t = if entries.len() > 1 {
            i as f64 / (entries.len() - 1) as f64
        } else {
            1.0
        };
        let _ = writeln!(
            out,
            "  <rect x=\"{}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{}\" fill=\"{}\"/>",
            MARGIN_LEFT,
            y,
            w,
            BAR_HEIGHT,
            lerp_color(ramp, t)
        );
        svg_text(
            &mut out,
            f64::from(MARGIN_LEFT) - 8.0,
            y + f64::from(BAR_HEIGHT) / 2.0 + 4.0,
            "end",
            12,
            shorten_model_name(model),
        );
        svg_text(
            &mut out,
            f64::from(MARGIN_LEFT) + w + 6.0,
            y + f64::from(BAR_HEIGHT) / 2.0 + 4.0,
            "start",
            12,
            &format!("{:.1}%", v * 100.0),
        );
    }

    out.push_str("</svg>\n");
    out
}

/// Win rate per model, Blues ramp.
pub fn win_rate_chart(stats: &BTreeMap<String, PlayerStats>, title: &str) -> String {
    rate_bar_chart(stats, title, BLUES, |s| s.win_rate)
}

/// Challenge frequency per model, Reds ramp.
pub fn paranoia_chart(stats: &BTreeMap<String, PlayerStats>, title: &str) -> String {
    rate_bar_chart(stats, title, REDS, |s| s.paranoia_frequency)
}

/// Lie frequency vs lie success rate. Marker size and color follow the
/// model's win rate.
pub fn deception_scatter(stats: &BTreeMap<String, PlayerStats>, title: &str) -> String {
    let height = 520u32;
    let plot_left = 90.0;
    let plot_top = f64::from(MARGIN_TOP);
    let plot_width = f64::from(WIDTH) - plot_left - 40.0;
    let plot_height = f64::from(height) - plot_top - 80.0;

    let mut out = String::new();
    svg_open(&mut out, WIDTH, height, title);

    let _ = writeln!(
        out,
        "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"none\" stroke=\"#cccccc\"/>",
        plot_left, plot_top, plot_width, plot_height
    );
    svg_text(
        &mut out,
        plot_left + plot_width / 2.0,
        f64::from(height) - 20.0,
        "middle",
        13,
        "Lie Frequency",
    );
    svg_text(&mut out, 20.0, plot_top - 10.0, "start", 13, "Lie Success Rate");

    for s in stats.values() {
        let cx = plot_left + s.lie_frequency.clamp(0.0, 1.0) * plot_width;
        let cy = plot_top + (1.0 - s.lie_success_rate.clamp(0.0, 1.0)) * plot_height;
        let r = 6.0 + s.win_rate.clamp(0.0, 1.0) * 14.0;
        let _ = writeln!(
            out,
            "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{:.1}\" fill=\"{}\" fill-opacity=\"0.8\"/>",
            cx,
            cy,
            r,
            lerp_color(BLUES, s.win_rate)
        );
        svg_text(
            &mut out,
            cx,
            cy - r - 4.0,
            "middle",
            11,
            shorten_model_name(&s.model_id),
        );
    }

    out.push_str("</svg>\n");
    out
}

/// Grouped bars per model: lie frequency under experiment 1 next to
/// experiment 2.
pub fn lie_frequency_comparison_chart(
    exp1_stats: &BTreeMap<String, PlayerStats>,
    exp2_stats: &BTreeMap<String, PlayerStats>,
    title: &str,
) -> String {
    let models: Vec<&String> = exp1_stats
        .keys()
        .filter(|m| exp2_stats.contains_key(*m))
        .collect();

    let height = 460u32;
    let plot_left = 70.0;
    let plot_top = f64::from(MARGIN_TOP) + 20.0;
    let plot_height = f64::from(height) - plot_top - 90.0;
    let group_width = (f64::from(WIDTH) - plot_left - 40.0) / models.len().max(1) as f64;
    let bar_width = (group_width * 0.35).min(40.0);

    let mut out = String::new();
    svg_open(&mut out, WIDTH, height, title);

    // Legend.
    let _ = writeln!(
        out,
        "  <rect x=\"{}\" y=\"40\" width=\"14\" height=\"14\" fill=\"{}\"/>",
        WIDTH - 300,
        STEELBLUE
    );
    svg_text(&mut out, f64::from(WIDTH - 280), 52.0, "start", 12, "Experiment 1");
    let _ = writeln!(
        out,
        "  <rect x=\"{}\" y=\"40\" width=\"14\" height=\"14\" fill=\"{}\"/>",
        WIDTH - 160,
        CORAL
    );
    svg_text(&mut out, f64::from(WIDTH - 140), 52.0, "start", 12, "Experiment 2");

    for (i, model) in models.iter().enumerate() {
        let group_x = plot_left + i as f64 * group_width;
        let pairs = [
            (exp1_stats[*model].lie_frequency, STEELBLUE, 0.0),
            (exp2_stats[*model].lie_frequency, CORAL, bar_width + 4.0),
        ];
        for (v, color, offset) in pairs {
            let h = plot_height * v.clamp(0.0, 1.0);
            let x = group_x + group_width / 2.0 - bar_width - 2.0 + offset;
            let _ = writeln!(
                out,
                "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"/>",
                x,
                plot_top + plot_height - h,
                bar_width,
                h,
                color
            );
        }
        svg_text(
            &mut out,
            group_x + group_width / 2.0,
            plot_top + plot_height + 20.0,
            "middle",
            11,
            shorten_model_name(model),
        );
    }

    out.push_str("</svg>\n");
    out
}

/// Instruction violation rate per model under the honesty instruction,
/// with 5% and 10% reference lines. Bars are green below 5%, orange
/// below 10%, red at or above.
pub fn violation_chart(stats: &BTreeMap<String, PlayerStats>, title: &str) -> String {
    let models: Vec<(&str, f64)> = stats
        .values()
        .map(|s| {
            (
                s.model_id.as_str(),
                s.instruction_violation_rate.unwrap_or(0.0),
            )
        })
        .collect();

    let height = 460u32;
    let plot_left = 70.0;
    let plot_top = f64::from(MARGIN_TOP) + 10.0;
    let plot_height = f64::from(height) - plot_top - 90.0;
    let group_width = (f64::from(WIDTH) - plot_left - 40.0) / models.len().max(1) as f64;
    let max_rate = models
        .iter()
        .map(|m| m.1)
        .fold(0.15_f64, f64::max);

    let mut out = String::new();
    svg_open(&mut out, WIDTH, height, title);

    for (threshold, label) in [(0.05, "5%"), (0.10, "10%")] {
        let y = plot_top + plot_height * (1.0 - threshold / max_rate);
        let _ = writeln!(
            out,
            "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"#888888\" stroke-dasharray=\"6 4\"/>",
            plot_left,
            y,
            f64::from(WIDTH) - 40.0,
            y
        );
        svg_text(&mut out, plot_left - 6.0, y + 4.0, "end", 11, label);
    }

    for (i, (model, rate)) in models.iter().enumerate() {
        let color = if *rate < 0.05 {
            "#2ca02c"
        } else if *rate < 0.10 {
            "#ff7f0e"
        } else {
            "#d62728"
        };
        let h = plot_height * (rate / max_rate).clamp(0.0, 1.0);
        let x = plot_left + i as f64 * group_width + group_width * 0.2;
        let _ = writeln!(
            out,
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"/>",
            x,
            plot_top + plot_height - h,
            group_width * 0.6,
            h,
            color
        );
        svg_text(
            &mut out,
            x + group_width * 0.3,
            plot_top + plot_height - h - 6.0,
            "middle",
            11,
            &format!("{:.1}%", rate * 100.0),
        );
        svg_text(
            &mut out,
            x + group_width * 0.3,
            plot_top + plot_height + 20.0,
            "middle",
            11,
            shorten_model_name(model),
        );
    }

    out.push_str("</svg>\n");
    out
}

/// Model-by-experiment grid of lie frequency with annotated cells.
pub fn lie_frequency_heatmap(games: &[GameLog], title: &str) -> String {
    let models = unique_models(games);
    let cell_w = 120.0;
    let cell_h = 44.0;
    let grid_left = f64::from(MARGIN_LEFT);
    let grid_top = f64::from(MARGIN_TOP) + 30.0;
    let height = (grid_top + models.len() as f64 * cell_h + 40.0) as u32;

    let mut out = String::new();
    svg_open(&mut out, WIDTH, height, title);

    for (col, exp) in EXPERIMENT_IDS.iter().enumerate() {
        svg_text(
            &mut out,
            grid_left + col as f64 * cell_w + cell_w / 2.0,
            grid_top - 10.0,
            "middle",
            12,
            &format!("Experiment {}", exp.as_u8()),
        );
    }

    for (row, model) in models.iter().enumerate() {
        let y = grid_top + row as f64 * cell_h;
        svg_text(
            &mut out,
            grid_left - 8.0,
            y + cell_h / 2.0 + 4.0,
            "end",
            12,
            shorten_model_name(model),
        );

        for (col, exp) in EXPERIMENT_IDS.iter().enumerate() {
            let exp_games: Vec<GameLog> = games
                .iter()
                .filter(|g| g.experiment_id == *exp)
                .cloned()
                .collect();
            let x = grid_left + col as f64 * cell_w;

            if exp_games.is_empty() {
                let _ = writeln!(
                    out,
                    "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"#eeeeee\" stroke=\"white\"/>",
                    x, y, cell_w, cell_h
                );
                continue;
            }

            let stats = crate::analysis::metrics::calculate_player_stats(model, &exp_games, None);
            let _ = writeln!(
                out,
                "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\" stroke=\"white\"/>",
                x,
                y,
                cell_w,
                cell_h,
                heat_color(stats.lie_frequency)
            );
            svg_text(
                &mut out,
                x + cell_w / 2.0,
                y + cell_h / 2.0 + 4.0,
                "middle",
                12,
                &format!("{:.2}", stats.lie_frequency),
            );
        }
    }

    out.push_str("</svg>\n");
    out
}

/// Distribution of game lengths in turns, one translucent overlay per
/// experiment condition.
pub fn game_length_histogram(games: &[GameLog], title: &str) -> String {
    const BINS: usize = 20;
    let height = 460u32;
    let plot_left = 70.0;
    let plot_top = f64::from(MARGIN_TOP) + 20.0;
    let plot_width = f64::from(WIDTH) - plot_left - 40.0;
    let plot_height = f64::from(height) - plot_top - 80.0;

    let max_turns = games
        .iter()
        .map(|g| g.total_turns)
        .max()
        .unwrap_or(1)
        .max(1) as f64;
    let bin_width = plot_width / BINS as f64;

    let mut out = String::new();
    svg_open(&mut out, WIDTH, height, title);

    let colors = [STEELBLUE, CORAL, "#2ca02c"];
    let mut max_count = 1usize;
    let mut binned: Vec<(ExperimentId, [usize; BINS])> = Vec::new();

    for exp in EXPERIMENT_IDS {
        let mut bins = [0usize; BINS];
        for game in games.iter().filter(|g| g.experiment_id == exp) {
            let idx = ((f64::from(game.total_turns) / max_turns) * BINS as f64) as usize;
            bins[idx.min(BINS - 1)] += 1;
        }
        max_count = max_count.max(bins.iter().copied().max().unwrap_or(0));
        if bins.iter().any(|c| *c > 0) {
            binned.push((exp, bins));
        }
    }

    for (series, (exp, bins)) in binned.iter().enumerate() {
        let color = colors[series % colors.len()];
        let legend_x = f64::from(WIDTH) - 220.0;
        let legend_y = 40.0 + series as f64 * 18.0;
        let _ = writeln!(
            out,
            "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"14\" height=\"14\" fill=\"{}\" fill-opacity=\"0.5\"/>",
            legend_x,
            legend_y - 11.0,
            color
        );
        svg_text(
            &mut out,
            legend_x + 20.0,
            legend_y,
            "start",
            12,
            &format!("Experiment {}", exp.as_u8()),
        );

        for (i, count) in bins.iter().enumerate() {
            if *count == 0 {
                continue;
            }
            let h = plot_height * (*count as f64 / max_count as f64);
            let _ = writeln!(
                out,
                "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\" fill-opacity=\"0.5\"/>",
                plot_left + i as f64 * bin_width,
                plot_top + plot_height - h,
                bin_width,
                h,
                color
            );
        }
    }

    svg_text(
        &mut out,
        plot_left + plot_width / 2.0,
        f64::from(height) - 20.0,
        "middle",
        13,
        "Game Length (turns)",
    );

    out.push_str("</svg>\n");
    out
}

fn write_svg(out_dir: &Path, file_name: &str, svg: &str) -> Result<PathBuf> {
    let path = out_dir.join(file_name);
    fs::write(&path, svg)?;
    Ok(path)
}

/// Render the standard figure set into `out_dir` and return the paths
/// written. Figures whose experiment data is absent are skipped.
pub fn generate_all_plots(games: &[GameLog], out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let models = unique_models(games);
    let mut written = Vec::new();

    let by_experiment = |exp: ExperimentId| -> Vec<GameLog> {
        games
            .iter()
            .filter(|g| g.experiment_id == exp)
            .cloned()
            .collect()
    };

    let exp1_games = by_experiment(ExperimentId::FullRules);
    let exp2_games = by_experiment(ExperimentId::AsymmetricHonesty);
    let exp3_games = by_experiment(ExperimentId::HonestyInstruction);

    let exp1_stats = (!exp1_games.is_empty())
        .then(|| calculate_all_stats(&models, &exp1_games, Some(ExperimentId::FullRules)));
    let exp2_stats = (!exp2_games.is_empty())
        .then(|| calculate_all_stats(&models, &exp2_games, Some(ExperimentId::AsymmetricHonesty)));
    let exp3_stats = (!exp3_games.is_empty())
        .then(|| calculate_all_stats(&models, &exp3_games, Some(ExperimentId::HonestyInstruction)));

    if let Some(stats) = &exp1_stats {
        written.push(write_svg(
            out_dir,
            "exp1_win_rates.svg",
            &win_rate_chart(stats, "Win Rates (Experiment 1: Full Rules)"),
        )?);
        written.push(write_svg(
            out_dir,
            "exp1_deception.svg",
            &deception_scatter(stats, "Deception Profile (Experiment 1)"),
        )?);
        written.push(write_svg(
            out_dir,
            "exp1_paranoia.svg",
            &paranoia_chart(stats, "Challenge Frequency (Experiment 1)"),
        )?);
    }

    if let Some(stats) = &exp2_stats {
        written.push(write_svg(
            out_dir,
            "exp2_win_rates.svg",
            &win_rate_chart(stats, "Win Rates (Experiment 2: Asymmetric Honesty)"),
        )?);
    }

    if let Some(stats) = &exp3_stats {
        written.push(write_svg(
            out_dir,
            "exp3_violations.svg",
            &violation_chart(stats, "Instruction Violations (Experiment 3)"),
        )?);
    }

    if let (Some(exp1), Some(exp2)) = (&exp1_stats, &exp2_stats) {
        written.push(write_svg(
            out_dir,
            "compare_lie_frequency.svg",
            &lie_frequency_comparison_chart(exp1, exp2, "Lie Frequency: Experiment 1 vs 2"),
        )?);
    }

    if !games.is_empty() {
        written.push(write_svg(
            out_dir,
            "lie_frequency_heatmap.svg",
            &lie_frequency_heatmap(games, "Lie Frequency by Model and Experiment"),
        )?);
        written.push(write_svg(
            out_dir,
            "game_length_distribution.svg",
            &game_length_histogram(games, "Game Length Distribution"),
        )?);
    }

    Ok(written)
}
