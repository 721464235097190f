//! Structure catalogue and display modes.
//!
//! The marker tracker reports structures by a short id (`"bcc"`, `"fcc"`,
//! `"hcp"`). Scene nodes follow a fixed naming scheme derived from those ids,
//! see [`StructureNodeNames`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the crystal structures a printed marker can identify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    /// Body-centred cubic.
    Bcc,
    /// Face-centred cubic.
    Fcc,
    /// Hexagonal close-packed.
    Hcp,
}

/// Static description shown by the UI when a structure becomes active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StructureInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub atom_count: u32,
    pub details: &'static str,
}

impl Structure {
    pub const ALL: [Structure; 3] = [Structure::Bcc, Structure::Fcc, Structure::Hcp];

    /// Tracker vocabulary id.
    pub fn id(self) -> &'static str {
        match self {
            Structure::Bcc => "bcc",
            Structure::Fcc => "fcc",
            Structure::Hcp => "hcp",
        }
    }

    pub fn info(self) -> StructureInfo {
        match self {
            Structure::Bcc => StructureInfo {
                name: "BCC - Body-Centred Cubic",
                description: "Body-centred cubic lattice",
                atom_count: 9,
                details: "8 corner atoms + 1 centre atom",
            },
            Structure::Fcc => StructureInfo {
                name: "FCC - Face-Centred Cubic",
                description: "Face-centred cubic lattice",
                atom_count: 14,
                details: "8 corner atoms + 6 face atoms",
            },
            Structure::Hcp => StructureInfo {
                name: "HCP - Hexagonal Close-Packed",
                description: "Hexagonal close-packed lattice",
                atom_count: 17,
                details: "12 hexagon corners + 2 centres + 3 middle atoms",
            },
        }
    }

    /// Scene node names for this structure.
    pub fn node_names(self) -> StructureNodeNames {
        StructureNodeNames::for_structure(self)
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Returned when a tracker id is outside the known vocabulary.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown structure id `{0}`")]
pub struct UnknownStructure(pub String);

impl FromStr for Structure {
    type Err = UnknownStructure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Structure::ALL
            .into_iter()
            .find(|st| st.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStructure(s.to_owned()))
    }
}

/// The two mutually exclusive visual representations of a structure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Ball model of every atom.
    #[default]
    Atom,
    /// Line drawing of the unit cell.
    Schematic,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 2] = [DisplayMode::Atom, DisplayMode::Schematic];

    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Atom => DisplayMode::Schematic,
            DisplayMode::Schematic => DisplayMode::Atom,
        }
    }

    /// Suffix used in representation node names.
    pub fn id(self) -> &'static str {
        match self {
            DisplayMode::Atom => "atom",
            DisplayMode::Schematic => "schematic",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Atom => "Atom",
            DisplayMode::Schematic => "Schematic",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Node names for one structure: its marker frame and both representations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructureNodeNames {
    pub target: String,
    pub atom: String,
    pub schematic: String,
}

impl StructureNodeNames {
    pub fn for_structure(structure: Structure) -> Self {
        let id = structure.id();
        Self {
            target: format!("{id}-target"),
            atom: format!("{id}-{}", DisplayMode::Atom.id()),
            schematic: format!("{id}-{}", DisplayMode::Schematic.id()),
        }
    }

    pub fn representation(&self, mode: DisplayMode) -> &str {
        match mode {
            DisplayMode::Atom => &self.atom,
            DisplayMode::Schematic => &self.schematic,
        }
    }
}
