//! Worker roles recognized by the labor rate table.

use serde::{Deserialize, Serialize};

/// Recognized worker roles. Compositions reference them by [`Role::id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "pedreiro")]
    Mason,
    #[serde(rename = "servente")]
    Helper,
    #[serde(rename = "carpinteiro")]
    Carpenter,
    #[serde(rename = "armador")]
    RebarWorker,
    #[serde(rename = "eletricista")]
    Electrician,
    #[serde(rename = "encanador")]
    Plumber,
    #[serde(rename = "pintor")]
    Painter,
    #[serde(rename = "azulejista")]
    Tiler,
}

impl Role {
    /// Every recognized role, in display order.
    pub const ALL: [Role; 8] = [
        Role::Mason,
        Role::Helper,
        Role::Carpenter,
        Role::RebarWorker,
        Role::Electrician,
        Role::Plumber,
        Role::Painter,
        Role::Tiler,
    ];

    /// Stable identifier used in catalogs and persisted config.
    pub fn id(&self) -> &'static str {
        match self {
            Role::Mason => "pedreiro",
            Role::Helper => "servente",
            Role::Carpenter => "carpinteiro",
            Role::RebarWorker => "armador",
            Role::Electrician => "eletricista",
            Role::Plumber => "encanador",
            Role::Painter => "pintor",
            Role::Tiler => "azulejista",
        }
    }

    /// Display name.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Mason => "Pedreiro",
            Role::Helper => "Servente",
            Role::Carpenter => "Carpinteiro",
            Role::RebarWorker => "Armador",
            Role::Electrician => "Eletricista",
            Role::Plumber => "Encanador",
            Role::Painter => "Pintor",
            Role::Tiler => "Azulejista",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.id() == wanted)
            .ok_or_else(|| format!("unknown role '{}'", s))
    }
}
