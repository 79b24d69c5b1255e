//! Service compositions: labor and material recipes per unit of work.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::material::UnitKind;
use super::role::Role;
use crate::error::CatalogError;
use crate::format::clamp_input;

/// Hours of one worker role per unit of the composition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaborHours {
    /// Role id as written in the catalog. May name a role the rate table
    /// does not know; such entries cost nothing.
    pub role: String,
    pub hours: Decimal,
}

/// One bill-of-materials line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BomLine {
    pub material_id: String,
    pub consumption_per_unit: Decimal,
    /// Loss allowance, applied as `1 + loss_percent / 100`.
    pub loss_percent: Decimal,
}

impl BomLine {
    /// Consumption including the loss allowance.
    pub fn gross_consumption(&self) -> Decimal {
        self.consumption_per_unit
            .saturating_mul(Decimal::ONE + self.loss_percent / dec!(100))
    }
}

/// A purchasable service with its recipe, runtime quantity and cached unit costs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Composition {
    code: String,
    category: String,
    description: String,
    unit: UnitKind,
    professionals: Vec<LaborHours>,
    helpers: Vec<LaborHours>,
    materials: Vec<BomLine>,
    quantity: Decimal,
    unit_material_cost: Decimal,
    unit_labor_cost: Decimal,
    unit_total_cost: Decimal,
}

impl Composition {
    /// Create an empty composition.
    pub fn new(
        code: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
        unit: UnitKind,
    ) -> Self {
        Self {
            code: code.into(),
            category: category.into(),
            description: description.into(),
            unit,
            professionals: Vec::new(),
            helpers: Vec::new(),
            materials: Vec::new(),
            quantity: Decimal::ZERO,
            unit_material_cost: Decimal::ZERO,
            unit_labor_cost: Decimal::ZERO,
            unit_total_cost: Decimal::ZERO,
        }
    }

    /// Add professional hours per unit.
    pub fn with_professional(mut self, role: impl Into<String>, hours: Decimal) -> Self {
        self.professionals.push(LaborHours {
            role: role.into(),
            hours: clamp_input(hours),
        });
        self
    }

    /// Add helper hours per unit.
    pub fn with_helper(mut self, role: impl Into<String>, hours: Decimal) -> Self {
        self.helpers.push(LaborHours {
            role: role.into(),
            hours: clamp_input(hours),
        });
        self
    }

    /// Add a bill-of-materials line.
    pub fn with_material(
        mut self,
        material_id: impl Into<String>,
        consumption_per_unit: Decimal,
        loss_percent: Decimal,
    ) -> Self {
        self.materials.push(BomLine {
            material_id: material_id.into(),
            consumption_per_unit: clamp_input(consumption_per_unit),
            loss_percent: clamp_input(loss_percent),
        });
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn unit(&self) -> UnitKind {
        self.unit
    }

    pub fn professionals(&self) -> &[LaborHours] {
        &self.professionals
    }

    pub fn helpers(&self) -> &[LaborHours] {
        &self.helpers
    }

    /// Professionals followed by helpers.
    pub fn labor(&self) -> impl Iterator<Item = &LaborHours> {
        self.professionals.iter().chain(self.helpers.iter())
    }

    pub fn materials(&self) -> &[BomLine] {
        &self.materials
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit_material_cost(&self) -> Decimal {
        self.unit_material_cost
    }

    pub fn unit_labor_cost(&self) -> Decimal {
        self.unit_labor_cost
    }

    pub fn unit_total_cost(&self) -> Decimal {
        self.unit_total_cost
    }

    /// Set the runtime quantity. Negative values are clamped to zero.
    pub fn set_quantity(&mut self, quantity: Decimal) {
        if quantity.is_sign_negative() && !quantity.is_zero() {
            tracing::warn!(
                "Negative quantity {} for composition {} clamped to zero",
                quantity,
                self.code
            );
        }
        self.quantity = clamp_input(quantity);
    }

    /// Overwrite the cached unit costs. Only the cost engine's recalculation pass calls this.
    pub(crate) fn set_unit_costs(&mut self, material: Decimal, labor: Decimal) {
        self.unit_material_cost = material;
        self.unit_labor_cost = labor;
        self.unit_total_cost = material.saturating_add(labor);
    }
}

/// Code-indexed, ordered collection of compositions.
#[derive(Debug, Clone, Default)]
pub struct CompositionCatalog {
    compositions: Vec<Composition>,
    index: HashMap<String, usize>,
}

impl CompositionCatalog {
    /// Build a catalog. Later duplicates of a code replace earlier ones.
    pub fn new(compositions: Vec<Composition>) -> Self {
        let mut catalog = Self::default();
        for composition in compositions {
            match catalog.index.get(composition.code()) {
                Some(&pos) => {
                    tracing::warn!(
                        "Duplicate composition code {}, keeping the last entry",
                        composition.code()
                    );
                    catalog.compositions[pos] = composition;
                }
                None => {
                    catalog
                        .index
                        .insert(composition.code().to_string(), catalog.compositions.len());
                    catalog.compositions.push(composition);
                }
            }
        }
        catalog
    }

    /// Catalog seeded with the default composition set.
    pub fn seeded() -> Self {
        Self::new(default_compositions())
    }

    pub fn get(&self, code: &str) -> Option<&Composition> {
        self.index.get(code).map(|&i| &self.compositions[i])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Compositions in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Composition> {
        self.compositions.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Composition> {
        self.compositions.iter_mut()
    }

    /// Compositions with a positive quantity, in catalog order.
    pub fn selected(&self) -> impl Iterator<Item = &Composition> {
        self.compositions
            .iter()
            .filter(|c| c.quantity() > Decimal::ZERO)
    }

    pub fn len(&self) -> usize {
        self.compositions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compositions.is_empty()
    }

    /// Set the quantity of one composition.
    pub fn set_quantity(&mut self, code: &str, quantity: Decimal) -> Result<(), CatalogError> {
        let pos = *self
            .index
            .get(code)
            .ok_or_else(|| CatalogError::UnknownComposition {
                code: code.to_string(),
            })?;
        self.compositions[pos].set_quantity(quantity);
        Ok(())
    }

    /// Reset every quantity to zero.
    pub fn clear_quantities(&mut self) {
        for composition in &mut self.compositions {
            composition.quantity = Decimal::ZERO;
        }
    }
}

/// Default composition set.
pub fn default_compositions() -> Vec<Composition> {
    let mason = Role::Mason.id();
    let helper = Role::Helper.id();

    vec![
        Composition::new(
            "EST-001",
            "Estrutura",
            "Concreto estrutural fck 25 MPa, preparo em betoneira",
            UnitKind::Volume,
        )
        .with_professional(mason, dec!(1.6))
        .with_helper(helper, dec!(6.0))
        .with_material("cimento", dec!(7.2), dec!(5))
        .with_material("areia_media", dec!(0.68), dec!(10))
        .with_material("brita_1", dec!(0.84), dec!(5))
        .with_material("agua", dec!(0.18), dec!(0)),
        Composition::new("EST-002", "Estrutura", "Armação de aço CA-50", UnitKind::Mass)
            .with_professional(Role::RebarWorker.id(), dec!(0.08))
            .with_helper(helper, dec!(0.05))
            .with_material("aco_ca50", dec!(1.0), dec!(10))
            .with_material("arame_recozido", dec!(0.025), dec!(5)),
        Composition::new(
            "EST-003",
            "Estrutura",
            "Fôrma de madeira para vigas e pilares",
            UnitKind::Area,
        )
        .with_professional(Role::Carpenter.id(), dec!(1.2))
        .with_helper(helper, dec!(0.6))
        .with_material("tabua_pinus", dec!(2.8), dec!(15))
        .with_material("prego", dec!(0.15), dec!(10)),
        Composition::new(
            "ALV-001",
            "Alvenaria",
            "Alvenaria de vedação com bloco cerâmico 9x19x19",
            UnitKind::Area,
        )
        .with_professional(mason, dec!(0.8))
        .with_helper(helper, dec!(0.4))
        .with_material("bloco_ceramico", dec!(27), dec!(5))
        .with_material("cimento", dec!(0.06), dec!(10))
        .with_material("cal_hidratada", dec!(0.1), dec!(10))
        .with_material("areia_media", dec!(0.012), dec!(10)),
        Composition::new(
            "REV-001",
            "Revestimento",
            "Chapisco em parede, traço 1:3",
            UnitKind::Area,
        )
        .with_professional(mason, dec!(0.1))
        .with_helper(helper, dec!(0.1))
        .with_material("cimento", dec!(0.05), dec!(10))
        .with_material("areia_media", dec!(0.006), dec!(10)),
        Composition::new(
            "REV-002",
            "Revestimento",
            "Reboco paulista, espessura 2cm",
            UnitKind::Area,
        )
        .with_professional(mason, dec!(0.6))
        .with_helper(helper, dec!(0.6))
        .with_material("cimento", dec!(0.12), dec!(10))
        .with_material("cal_hidratada", dec!(0.18), dec!(10))
        .with_material("areia_media", dec!(0.024), dec!(10)),
        Composition::new("PIS-001", "Pisos", "Contrapiso, espessura 4cm", UnitKind::Area)
            .with_professional(mason, dec!(0.3))
            .with_helper(helper, dec!(0.35))
            .with_material("cimento", dec!(0.26), dec!(10))
            .with_material("areia_media", dec!(0.045), dec!(10)),
        Composition::new(
            "PIS-002",
            "Pisos",
            "Piso cerâmico 45x45 assentado com argamassa colante",
            UnitKind::Area,
        )
        .with_professional(Role::Tiler.id(), dec!(0.5))
        .with_helper(helper, dec!(0.25))
        .with_material("piso_ceramico", dec!(1.0), dec!(10))
        .with_material("argamassa_colante", dec!(0.25), dec!(5))
        .with_material("rejunte", dec!(0.35), dec!(10)),
        Composition::new(
            "PIN-001",
            "Pintura",
            "Pintura látex acrílica, duas demãos, com selador",
            UnitKind::Area,
        )
        .with_professional(Role::Painter.id(), dec!(0.35))
        .with_helper(helper, dec!(0.1))
        .with_material("tinta_latex", dec!(0.017), dec!(5))
        .with_material("selador", dec!(0.008), dec!(5)),
        Composition::new(
            "ELE-001",
            "Instalações",
            "Ponto elétrico completo (tomada ou iluminação)",
            UnitKind::Count,
        )
        .with_professional(Role::Electrician.id(), dec!(1.2))
        .with_helper(helper, dec!(0.6))
        .with_material("cabo_2_5", dec!(12), dec!(10))
        .with_material("eletroduto", dec!(6), dec!(10))
        .with_material("caixa_4x2", dec!(1), dec!(0)),
        Composition::new(
            "HID-001",
            "Instalações",
            "Ponto de água fria em PVC 25mm",
            UnitKind::Count,
        )
        .with_professional(Role::Plumber.id(), dec!(1.5))
        .with_helper(helper, dec!(0.8))
        .with_material("tubo_pvc_25", dec!(4), dec!(10))
        .with_material("joelho_pvc_25", dec!(4), dec!(5)),
    ]
}
