//! Rule charts using Plotters, rendered to SVG

use std::path::Path;

use plotters::prelude::*;

use crate::pipeline::MiningReport;
use crate::rules::AssociationRule;

/// Bars drawn in the leverage chart
pub const TOP_RULES: usize = 15;

/// Colour ramp from weak (blue) to strong (red) lift
fn lift_color(lift: f64, min_lift: f64, max_lift: f64) -> RGBColor {
    let span = (max_lift - min_lift).max(f64::EPSILON);
    let t = ((lift - min_lift) / span).clamp(0.0, 1.0);
    RGBColor((255.0 * t) as u8, 40, (255.0 * (1.0 - t)) as u8)
}

/// Scatter of support against confidence, one point per rule, coloured by lift
pub fn create_rule_scatter(rules: &[AssociationRule], output_path: &Path) -> crate::Result<()> {
    if rules.is_empty() {
        anyhow::bail!("no rules to plot");
    }

    let max_support = rules.iter().map(|r| r.support).fold(0.0, f64::max);
    let finite_lifts = rules.iter().map(|r| r.lift).filter(|l| l.is_finite());
    let (min_lift, max_lift) = finite_lifts.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), l| {
        (lo.min(l), hi.max(l))
    });

    let root = SVGBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Association Rules: Support vs Confidence", ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..(max_support * 1.1).max(0.01), 0f64..1.05f64)?;

    chart
        .configure_mesh()
        .x_desc("Support")
        .y_desc("Confidence")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(rules.iter().map(|rule| {
        let color = lift_color(rule.lift, min_lift, max_lift);
        Circle::new((rule.support, rule.confidence), 5, color.filled())
    }))?;

    root.present()?;
    tracing::info!(output = %output_path.display(), "rule scatter saved");
    Ok(())
}

/// Bar chart of the strongest rules by leverage
pub fn create_leverage_chart(rules: &[AssociationRule], output_path: &Path) -> crate::Result<()> {
    let top: Vec<&AssociationRule> = rules.iter().take(TOP_RULES).collect();
    if top.is_empty() {
        anyhow::bail!("no rules to plot");
    }
    let max_leverage = top.iter().map(|r| r.leverage).fold(0.0, f64::max);

    let root = SVGBackend::new(output_path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Top Rules by Leverage", ("sans-serif", 26))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..(top.len() as f64), 0f64..(max_leverage * 1.1).max(0.001))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Rule rank")
        .y_desc("Leverage")
        .x_label_formatter(&|x| format!("{}", *x as usize + 1))
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(top.iter().enumerate().map(|(rank, rule)| {
        let color = if rule.has_infinite_conviction() { RED } else { BLUE };
        Rectangle::new(
            [(rank as f64 + 0.1, 0.0), (rank as f64 + 0.9, rule.leverage.max(0.0))],
            color.filled(),
        )
    }))?;

    root.present()?;
    tracing::info!(output = %output_path.display(), "leverage chart saved");
    Ok(())
}

/// Print run statistics and the top rules to the console
pub fn print_rule_statistics(report: &MiningReport) {
    println!("\n=== Mining Statistics ===");
    println!("Baskets: {}", report.n_baskets);
    println!("Distinct items: {}", report.n_items);
    println!("Minimum support: {:.4}", report.min_support);
    println!(
        "Frequent itemsets: {} (largest: {} items)",
        report.frequent.len(),
        report.frequent.max_len()
    );
    println!("Rules passing conviction: {}", report.n_candidate_rules);
    println!("Rules passing business filter: {}", report.rules.len());

    println!("\nTop rules by leverage:");
    println!(
        "  {:<40} | {:>7} | {:>7} | {:>6} | {:>8}",
        "Rule", "Support", "Conf", "Lift", "Leverage"
    );
    for rule in report.rules.iter().take(10) {
        println!(
            "  {:<40} | {:>7.4} | {:>7.3} | {:>6.2} | {:>8.4}",
            rule.describe(),
            rule.support,
            rule.confidence,
            rule.lift,
            rule.leverage
        );
    }
}

/// Write both charts next to `base_output_path` and print statistics
pub fn generate_visualization_report(
    report: &MiningReport,
    base_output_path: &Path,
) -> crate::Result<()> {
    create_rule_scatter(&report.rules, base_output_path)?;

    let stem = base_output_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "rules".to_string());
    let leverage_path = base_output_path.with_file_name(format!("{stem}_leverage.svg"));
    create_leverage_chart(&report.rules, &leverage_path)?;

    print_rule_statistics(report);
    Ok(())
}
