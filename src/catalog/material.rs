//! Material reference data.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Unit-of-measure kind. Determines how aggregated amounts are rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Area,
    Length,
    Mass,
    Volume,
    /// Discrete pieces (blocks, boxes, fittings).
    Count,
    /// Discrete packages (bags, cans, buckets).
    Container,
}

impl UnitKind {
    /// Returns true if amounts in this unit must be bought in whole units.
    pub fn is_discrete(&self) -> bool {
        matches!(self, UnitKind::Count | UnitKind::Container)
    }

    /// Default short symbol for the unit.
    pub fn symbol(&self) -> &'static str {
        match self {
            UnitKind::Area => "m²",
            UnitKind::Length => "m",
            UnitKind::Mass => "kg",
            UnitKind::Volume => "m³",
            UnitKind::Count => "un",
            UnitKind::Container => "emb",
        }
    }

    /// Apply the rounding policy: discrete kinds round up, continuous kinds stay fractional.
    pub fn round_amount(&self, amount: Decimal) -> Decimal {
        if self.is_discrete() {
            amount.ceil()
        } else {
            amount
        }
    }
}

impl std::str::FromStr for UnitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "area" | "m2" | "m²" => Ok(UnitKind::Area),
            "length" | "m" => Ok(UnitKind::Length),
            "mass" | "kg" => Ok(UnitKind::Mass),
            "volume" | "m3" | "m³" => Ok(UnitKind::Volume),
            "count" | "un" => Ok(UnitKind::Count),
            "container" | "emb" => Ok(UnitKind::Container),
            _ => Err(format!("invalid unit kind '{}'", s)),
        }
    }
}

/// A catalog material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub name: String,
    pub unit: UnitKind,
    /// Label shown next to quantities (e.g. "sc" for bags).
    pub unit_label: String,
    /// Weight of one unit in kilograms, when it is worth tracking.
    pub unit_weight_kg: Option<Decimal>,
    pub default_price: Decimal,
}

impl Material {
    /// Create a material whose label is the unit's default symbol.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit: UnitKind,
        default_price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit,
            unit_label: unit.symbol().to_string(),
            unit_weight_kg: None,
            default_price,
        }
    }

    /// Override the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.unit_label = label.into();
        self
    }

    /// Set the per-unit weight in kilograms.
    pub fn with_weight(mut self, kg: Decimal) -> Self {
        self.unit_weight_kg = Some(kg);
        self
    }

    /// Unit weight only when it is strictly positive.
    pub fn positive_weight(&self) -> Option<Decimal> {
        self.unit_weight_kg.filter(|w| *w > Decimal::ZERO)
    }
}

/// Id-indexed, ordered collection of materials.
#[derive(Debug, Clone, Default)]
pub struct MaterialCatalog {
    materials: Vec<Material>,
    index: HashMap<String, usize>,
}

impl MaterialCatalog {
    /// Build a catalog. Later duplicates of an id replace earlier ones.
    pub fn new(materials: Vec<Material>) -> Self {
        let mut catalog = Self::default();
        for material in materials {
            catalog.insert(material);
        }
        catalog
    }

    /// Catalog seeded with the default material set.
    pub fn seeded() -> Self {
        Self::new(default_materials())
    }

    fn insert(&mut self, material: Material) {
        match self.index.get(&material.id) {
            Some(&pos) => {
                tracing::warn!("Duplicate material id {}, keeping the last entry", material.id);
                self.materials[pos] = material;
            }
            None => {
                self.index.insert(material.id.clone(), self.materials.len());
                self.materials.push(material);
            }
        }
    }

    /// Look up a material by id.
    pub fn get(&self, id: &str) -> Option<&Material> {
        self.index.get(id).map(|&i| &self.materials[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Materials in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

/// Default material set with reference prices (BRL).
pub fn default_materials() -> Vec<Material> {
    vec![
        Material::new("cimento", "Cimento CP-II 50kg", UnitKind::Container, dec!(38.00))
            .with_label("sc")
            .with_weight(dec!(50)),
        Material::new("areia_media", "Areia média lavada", UnitKind::Volume, dec!(120.00))
            .with_weight(dec!(1500)),
        Material::new("brita_1", "Brita 1", UnitKind::Volume, dec!(135.00)).with_weight(dec!(1450)),
        Material::new("cal_hidratada", "Cal hidratada CH-III 20kg", UnitKind::Container, dec!(18.50))
            .with_label("sc")
            .with_weight(dec!(20)),
        Material::new("agua", "Água", UnitKind::Volume, dec!(9.00)),
        Material::new("bloco_ceramico", "Bloco cerâmico 9x19x19", UnitKind::Count, dec!(1.35))
            .with_weight(dec!(2.6)),
        Material::new("aco_ca50", "Aço CA-50 10mm", UnitKind::Mass, dec!(8.90)).with_weight(dec!(1)),
        Material::new("arame_recozido", "Arame recozido nº 18", UnitKind::Mass, dec!(16.00))
            .with_weight(dec!(1)),
        Material::new("tabua_pinus", "Tábua de pinus 2,5x30cm", UnitKind::Length, dec!(14.00))
            .with_weight(dec!(4.2)),
        Material::new("prego", "Prego 17x27 com cabeça", UnitKind::Mass, dec!(22.00)).with_weight(dec!(1)),
        Material::new("argamassa_colante", "Argamassa colante AC-II 20kg", UnitKind::Container, dec!(26.00))
            .with_label("sc")
            .with_weight(dec!(20)),
        Material::new("piso_ceramico", "Piso cerâmico 45x45 PEI-4", UnitKind::Area, dec!(39.90))
            .with_weight(dec!(16)),
        Material::new("rejunte", "Rejunte cimentício", UnitKind::Mass, dec!(6.50)).with_weight(dec!(1)),
        Material::new("tinta_latex", "Tinta látex acrílica 18L", UnitKind::Container, dec!(289.00))
            .with_label("lata")
            .with_weight(dec!(25)),
        Material::new("selador", "Selador acrílico 18L", UnitKind::Container, dec!(160.00))
            .with_label("lata")
            .with_weight(dec!(22)),
        Material::new("cabo_2_5", "Cabo flexível 2,5mm²", UnitKind::Length, dec!(2.60))
            .with_weight(dec!(0.03)),
        Material::new("eletroduto", "Eletroduto corrugado 3/4\"", UnitKind::Length, dec!(2.10))
            .with_weight(dec!(0.08)),
        Material::new("caixa_4x2", "Caixa de luz 4x2", UnitKind::Count, dec!(3.20))
            .with_weight(dec!(0.05)),
        Material::new("tubo_pvc_25", "Tubo PVC soldável 25mm", UnitKind::Length, dec!(6.80))
            .with_weight(dec!(0.2)),
        Material::new("joelho_pvc_25", "Joelho PVC soldável 25mm", UnitKind::Count, dec!(1.90))
            .with_weight(dec!(0.02)),
    ]
}
