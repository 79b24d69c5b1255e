//! Semicolon-separated exports for spreadsheet tools.
//!
//! Files start with a UTF-8 byte order mark and use decimal commas, which is
//! what pt-BR spreadsheet software expects.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rust_decimal::Decimal;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::catalog::{CompositionCatalog, MaterialCatalog};
use crate::error::ExportError;
use crate::estimation::{AggregatedMaterial, composition_materials, total_weight};
use crate::format::format_decimal;
use crate::pricing::MaterialPriceTable;

const BOM: &[u8] = "\u{feff}".as_bytes();

/// Header of the consolidated materials export.
pub const MATERIALS_HEADER: [&str; 4] = ["Material", "Qtd Estimada", "Unid.", "Peso (kg)"];

/// Header of the per-service export.
pub const DETAILED_HEADER: [&str; 5] = ["Serviço", "Material", "Qtd Estimada", "Unid.", "Peso (kg)"];

/// Consolidated materials, one row per material sorted by display name,
/// followed by a total weight row.
pub fn materials_csv(entries: &BTreeMap<String, AggregatedMaterial>) -> Result<String, ExportError> {
    let mut rows: Vec<&AggregatedMaterial> = entries.values().collect();
    rows.sort_by(|a, b| compare_names(&a.name, &b.name));

    let mut writer = writer();
    writer.write_record(MATERIALS_HEADER)?;

    for entry in rows {
        writer.write_record([
            entry.name.as_str(),
            format_amount(entry).as_str(),
            entry.unit_label.as_str(),
            format_weight(entry.weight_kg).as_str(),
        ])?;
    }

    let total = format_decimal(total_weight(entries), 2);
    writer.write_record(["Peso total", "", "", total.as_str()])?;

    finish(writer)
}

/// Materials grouped by service: a heading row per selected composition,
/// followed by one sub-row per material it consumes.
pub fn detailed_csv(
    catalog: &CompositionCatalog,
    materials: &MaterialCatalog,
    prices: &MaterialPriceTable,
) -> Result<String, ExportError> {
    let mut writer = writer();
    writer.write_record(DETAILED_HEADER)?;

    for composition in catalog.selected() {
        let heading = format!(
            "{} - {} ({} {})",
            composition.code(),
            composition.description(),
            format_decimal(composition.quantity(), 2),
            composition.unit().symbol()
        );
        writer.write_record([heading.as_str(), "", "", "", ""])?;

        for entry in composition_materials(composition, materials, prices) {
            writer.write_record([
                "",
                entry.name.as_str(),
                format_amount(&entry).as_str(),
                entry.unit_label.as_str(),
                format_weight(entry.weight_kg).as_str(),
            ])?;
        }
    }

    finish(writer)
}

fn writer() -> ::csv::Writer<Vec<u8>> {
    ::csv::WriterBuilder::new()
        .delimiter(b';')
        .terminator(::csv::Terminator::Any(b'\n'))
        .from_writer(BOM.to_vec())
}

fn finish(writer: ::csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// Order names the way a pt-BR reader expects: accents and case only break ties.
fn compare_names(a: &str, b: &str) -> Ordering {
    sort_key(a).cmp(&sort_key(b)).then_with(|| a.cmp(b))
}

fn sort_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn format_amount(entry: &AggregatedMaterial) -> String {
    if entry.unit.is_discrete() {
        format_decimal(entry.amount, 0)
    } else {
        format_decimal(entry.amount, 2)
    }
}

fn format_weight(weight: Option<Decimal>) -> String {
    weight.map(|w| format_decimal(w, 2)).unwrap_or_default()
}
