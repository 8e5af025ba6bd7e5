//! Terminal formatting of fit results.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::domain::{FitDetails, FitResult, Mode};
use crate::fit::cmc::format_general;

/// Format the full fit summary: header, equation, R² and mode-specific details.
pub fn format_fit_summary(mode: Mode, fit: &FitResult) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== graphfit - {} ===\n", mode.display_name()));
    out.push_str(&format!("Equation: {}\n", fit.equation));
    match fit.r_squared {
        Some(r2) => out.push_str(&format!("R²: {r2:.6}\n")),
        None => out.push_str("R²: n/a (per-series values below)\n"),
    }
    out.push_str(&format!("{}\n", fit.description));

    let details = format_details(&fit.details);
    if !details.is_empty() {
        out.push('\n');
        out.push_str(&details);
    }
    out
}

fn format_details(details: &FitDetails) -> String {
    let mut out = String::new();
    match details {
        FitDetails::Line(p) => {
            out.push_str(&format!("- slope    : {:.6}\n", p.slope));
            out.push_str(&format!("- intercept: {:.6}\n", p.intercept));
        }
        FitDetails::Transformed(t) => {
            out.push_str(&format!("- slope    : {:.6}\n", t.slope));
            out.push_str(&format!("- intercept: {:.6}\n", t.intercept));
            out.push_str(&format!("- transformed points: {}\n", fmt_pairs(&t.transformed_points)));
        }
        FitDetails::SoundWave(s) => {
            out.push_str(&format!("- velocity : {:.4} m/s\n", s.velocity));
            out.push_str(&format!("- intercept: {:.6}\n", s.intercept));
            out.push_str(&format!("- transformed points: {}\n", fmt_pairs(&s.transformed_points)));
        }
        FitDetails::Cmc(c) => {
            out.push_str(&format!("- CMC      : {}\n", format_general(c.cmc_value, 6)));
            out.push_str(&format!("- plateau  : {:.4}\n", c.cmc_surface_tension));
            out.push_str(&format!("- a, b, c  : {}\n", fmt_vec(&[c.a, c.b, c.c])));
            out.push_str(&format!("- pre-CMC  : {}\n", c.equation_pre_cmc));
            out.push_str(&format!("- post-CMC : {}\n", c.equation_post_cmc));
            out.push_str(&format!("- method   : {}\n", c.method.display_name()));
        }
        FitDetails::Planck(p) => {
            out.push_str(&format!("- h        : {} J·s\n", format_general(p.planck_constant, 6)));
            out.push_str(&format!(
                "- accepted : {} J·s ({:.2}% error)\n",
                format_general(p.accepted_planck_constant, 9),
                p.percent_error
            ));
            out.push_str(&format!("- work fn  : {:.4} eV\n", p.work_function_ev));
            out.push_str(&format!("- ν unit   : {}\n", p.frequency_unit));
        }
        FitDetails::Diffraction(d) => {
            out.push_str(&format!("- I₀       : {:.4}\n", d.i0));
            out.push_str(&format!("- α        : {:.4}\n", d.alpha));
            out.push_str(&format!("- θ₀       : {:.6}\n", d.theta0));
        }
        FitDetails::StoppingPotentials { series_fits } => {
            let rows: Vec<Vec<String>> = series_fits
                .iter()
                .map(|s| {
                    vec![
                        s.label.clone(),
                        format!("{:.4}", s.stopping_potential),
                        format!("{:?}", s.method).to_lowercase(),
                    ]
                })
                .collect();
            out.push_str(&format_table(&["series", "V0 [V]", "method"], &rows));
        }
        FitDetails::Damped { series_fits } => {
            let rows: Vec<Vec<String>> = series_fits
                .iter()
                .map(|s| {
                    vec![
                        s.label.clone(),
                        format!("{:.6}", s.damping_constant),
                        format!("{:.4}", s.initial_amplitude),
                        format!("{:.6}", s.r_squared),
                        s.points_used.to_string(),
                    ]
                })
                .collect();
            out.push_str(&format_table(&["series", "delta", "phi0", "R²", "n"], &rows));
        }
        FitDetails::Resonances { series_fits } => {
            let rows: Vec<Vec<String>> = series_fits
                .iter()
                .map(|s| {
                    vec![
                        s.label.clone(),
                        format!("{:.4}", s.resonance_frequency),
                        format!("{:.4}", s.peak_amplitude),
                    ]
                })
                .collect();
            out.push_str(&format_table(&["series", "f_res", "peak"], &rows));
        }
        FitDetails::WaveGroups { series_fits } => {
            let rows: Vec<Vec<String>> = series_fits
                .iter()
                .map(|g| {
                    vec![
                        g.label.clone(),
                        format!("{:.4}", g.velocity),
                        format!("{:.6}", g.r_squared),
                        g.transformed_points.len().to_string(),
                    ]
                })
                .collect();
            out.push_str(&format_table(&["group", "v [m/s]", "R²", "n"], &rows));
        }
    }
    out
}

/// Fixed-width table: first column left-aligned, the rest right-aligned.
pub(crate) fn format_table(header: &[&str], rows: &[Vec<String>]) -> String {
    const FIRST: usize = 20;
    const OTHER: usize = 12;

    let mut out = String::new();
    let line = |cells: &[String]| -> String {
        let mut s = String::new();
        for (i, c) in cells.iter().enumerate() {
            if i == 0 {
                s.push_str(&format!("{:<FIRST$}", truncate(c, FIRST)));
            } else {
                s.push_str(&format!(" {c:>OTHER$}"));
            }
        }
        s.trim_end().to_string()
    };

    let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
    out.push_str(&line(&header));
    out.push('\n');
    let rule: Vec<String> = (0..header.len())
        .map(|i| "-".repeat(if i == 0 { FIRST } else { OTHER }))
        .collect();
    out.push_str(&line(&rule));
    out.push('\n');
    for r in rows {
        out.push_str(&line(r));
        out.push('\n');
    }
    out
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn fmt_pairs(v: &[[f64; 2]]) -> String {
    let parts: Vec<String> = v.iter().map(|p| format!("({:.4}, {:.4})", p[0], p[1])).collect();
    parts.join(" ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LineParams, Resonance};

    #[test]
    fn line_summary_lists_equation_and_params() {
        let fit = FitResult {
            equation: "y = 2.0000x + 1.0000".into(),
            description: "Fitted a straight line.".into(),
            r_squared: Some(1.0),
            details: FitDetails::Line(LineParams {
                slope: 2.0,
                intercept: 1.0,
            }),
        };
        let txt = format_fit_summary(Mode::StraightLine, &fit);
        let expected = concat!(
            "=== graphfit - Straight Line Fit ===\n",
            "Equation: y = 2.0000x + 1.0000\n",
            "R²: 1.000000\n",
            "Fitted a straight line.\n",
            "\n",
            "- slope    : 2.000000\n",
            "- intercept: 1.000000\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn series_table_has_one_line_per_series() {
        let fit = FitResult {
            equation: String::new(),
            description: String::new(),
            r_squared: None,
            details: FitDetails::Resonances {
                series_fits: vec![
                    Resonance {
                        label: "I_d = 1".into(),
                        resonance_frequency: 0.5,
                        peak_amplitude: 12.0,
                    },
                    Resonance {
                        label: "a very long damping label indeed".into(),
                        resonance_frequency: 0.6,
                        peak_amplitude: 8.0,
                    },
                ],
            },
        };
        let txt = format_fit_summary(Mode::PohlsForced, &fit);
        assert!(txt.contains("R²: n/a"));
        assert!(txt.contains("I_d = 1                    0.5000      12.0000"));
        assert!(txt.contains("a very long damping."));
    }
}
