//! Plain-text reports printed by the CLI.

use crate::budget::Budget;
use crate::estimation::{BdiSimulationReport, ChannelReport};
use crate::format::{format_currency, format_decimal, format_percent};
use crate::reporting::SCurve;

/// Totals, BDI, sell price and channel/category breakdown.
pub fn summary(budget: &Budget) -> String {
    let estimate = budget.estimate();
    let breakdown = budget.breakdown();
    let mut lines = Vec::new();

    lines.push("Itens selecionados:".to_string());
    if estimate.items.is_empty() {
        lines.push("  (nenhum)".to_string());
    }
    for item in &estimate.items {
        lines.push(format!(
            "  {:<8} {:<45} {:>10} {:<3} x {:>14} = {:>16}",
            item.code,
            truncate(&item.description, 45),
            format_decimal(item.quantity, 2),
            item.unit,
            format_currency(item.unit_total_cost),
            format_currency(item.line_total),
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "Mão de obra:     {:>18}  ({})",
        format_currency(estimate.labor_cost),
        format_percent(breakdown.labor_share_percent)
    ));
    lines.push(format!(
        "Materiais:       {:>18}  ({})",
        format_currency(estimate.material_cost),
        format_percent(breakdown.material_share_percent)
    ));
    lines.push(format!("Custo direto:    {:>18}", format_currency(estimate.direct_cost)));
    lines.push(format!("BDI:             {:>18}", format_percent(estimate.bdi_percent)));
    lines.push(format!("Preço de venda:  {:>18}", format_currency(estimate.sell_price)));
    lines.push(format!(
        "Custo por m²:    {:>18}  (área {} m²)",
        format_currency(estimate.cost_per_m2),
        budget.config().area_obra
    ));

    if !breakdown.categories.is_empty() {
        lines.push(String::new());
        lines.push("Por categoria:".to_string());
        for category in &breakdown.categories {
            lines.push(format!(
                "  {:<20} {:>18}  {:>8}",
                category.category,
                format_currency(category.total),
                format_percent(category.share_percent)
            ));
        }
    }

    lines.join("\n")
}

/// ABC curve table.
pub fn abc(budget: &Budget) -> String {
    let rows = budget.abc();
    if rows.is_empty() {
        return "Nenhum item com quantidade informada.".to_string();
    }

    let mut lines = vec![format!(
        "{:<5} {:<50} {:>16} {:>9} {:>9}",
        "Classe", "Item", "Custo", "%", "% acum."
    )];
    for row in rows {
        lines.push(format!(
            "{:<6} {:<50} {:>16} {:>9} {:>9}",
            row.class,
            truncate(&row.name, 50),
            format_currency(row.cost),
            format_percent(row.percent_of_total),
            format_percent(row.cumulative_percent)
        ));
    }
    lines.join("\n")
}

/// Monthly disbursement table.
pub fn schedule(budget: &Budget, months: u32, curve: &SCurve) -> String {
    let rows = budget.schedule(months, curve);
    if rows.is_empty() {
        return "Cronograma vazio: informe quantidades e uma duração positiva.".to_string();
    }

    let mut lines = vec![format!(
        "{:>4} {:>9} {:>18} {:>18}",
        "Mês", "% acum.", "Desembolso", "Acumulado"
    )];
    for row in rows {
        lines.push(format!(
            "{:>4} {:>9} {:>18} {:>18}",
            row.month,
            format_percent(row.cumulative_percent),
            format_currency(row.monthly_amount),
            format_currency(row.cumulative_amount)
        ));
    }
    lines.join("\n")
}

/// Two-channel BDI simulation report.
pub fn bdi(budget: &Budget) -> String {
    match budget.simulate_bdi() {
        Ok(report) => render_simulation(&report),
        Err(e) => format!("Simulação de BDI indisponível: {}", e),
    }
}

fn render_simulation(report: &BdiSimulationReport) -> String {
    let mut lines = Vec::new();
    lines.extend(render_channel("Mão de obra", &report.labor));
    lines.extend(render_channel("Materiais", &report.material));
    lines.push(String::new());
    lines.push(format!("Custo direto:          {:>18}", format_currency(report.direct_cost)));
    lines.push(format!("Preço de venda:        {:>18}", format_currency(report.sell_price)));
    lines.push(format!(
        "BDI efetivo:           {:>18}",
        format_percent(report.effective_bdi_percent)
    ));
    lines.push(format!(
        "Receita após impostos: {:>18}",
        format_currency(report.revenue_after_tax)
    ));
    lines.push(format!(
        "Margem:                {:>18}  ({})",
        format_currency(report.margin.amount),
        format_percent(report.margin.percent)
    ));
    lines.join("\n")
}

fn render_channel(label: &str, channel: &ChannelReport) -> Vec<String> {
    vec![
        format!("{}:", label),
        format!("  Custo direto:     {:>18}", format_currency(channel.direct_cost)),
        format!(
            "  Fator BDI:        {:>18}  ({})",
            format_decimal(channel.factor, 4),
            format_percent(channel.bdi_percent)
        ),
        format!("  Preço de venda:   {:>18}", format_currency(channel.sell_price)),
        format!("  Faturamento:      {:>18}", format_currency(channel.invoiced_revenue)),
        format!("  Impostos:         {:>18}", format_currency(channel.taxes)),
        format!("  Lucro:            {:>18}", format_currency(channel.profit)),
    ]
}

/// Composition catalog with current unit costs.
pub fn compositions(budget: &Budget) -> String {
    let mut lines = vec![format!(
        "{:<8} {:<14} {:<45} {:<3} {:>14} {:>14} {:>14}",
        "Código", "Categoria", "Descrição", "Un", "Material", "Mão de obra", "Total"
    )];
    for c in budget.compositions().iter() {
        lines.push(format!(
            "{:<8} {:<14} {:<45} {:<3} {:>14} {:>14} {:>14}",
            c.code(),
            c.category(),
            truncate(c.description(), 45),
            c.unit().symbol(),
            format_currency(c.unit_material_cost()),
            format_currency(c.unit_labor_cost()),
            format_currency(c.unit_total_cost())
        ));
    }
    lines.join("\n")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
